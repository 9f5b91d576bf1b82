// The core module contains the platform-agnostic logic.
// Each feature gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "extensions/mod.rs"]
pub mod extensions;

#[path = "pi/mod.rs"]
pub mod pi;
