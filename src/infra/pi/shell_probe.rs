use crate::core::pi::{PiError, ThermalProbe};
use async_trait::async_trait;
use tokio::process::Command;

/// Reads the temperature by running a shell command, e.g. the thermal zone
/// file piped through awk, or `vcgencmd measure_temp`.
pub struct ShellThermalProbe {
    command: String,
}

impl ShellThermalProbe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl ThermalProbe for ShellThermalProbe {
    async fn read_celsius(&self) -> Result<f64, PiError> {
        let output = run_shell(&self.command).await?;
        parse_celsius(&output)
    }
}

/// Asks the host to reboot. Needs passwordless sudo for `reboot`.
pub async fn request_reboot() -> Result<(), PiError> {
    run_shell("sudo reboot").await.map(|_| ())
}

async fn run_shell(command: &str) -> Result<String, PiError> {
    let output = Command::new("sh").arg("-c").arg(command).output().await?;

    if !output.status.success() {
        return Err(PiError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Accepts `48.5`, raw millidegrees (`48500`) and vcgencmd's `temp=48.5'C`.
pub fn parse_celsius(raw: &str) -> Result<f64, PiError> {
    let cleaned = raw
        .trim()
        .trim_start_matches("temp=")
        .trim_end_matches("'C")
        .trim();

    let value: f64 = cleaned
        .parse()
        .map_err(|_| PiError::Parse(raw.trim().to_string()))?;

    if !value.is_finite() {
        return Err(PiError::Parse(raw.trim().to_string()));
    }

    Ok(if value >= 1000.0 { value / 1000.0 } else { value })
}
