// The infra module contains implementations of core traits
// plus the process-wide logging facility.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "pi/mod.rs"]
pub mod pi;
