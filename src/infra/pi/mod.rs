pub mod shell_probe;

pub use shell_probe::{request_reboot, ShellThermalProbe};
