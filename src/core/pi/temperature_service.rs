use async_trait::async_trait;
use chrono::NaiveDateTime;

pub const HIGH_CELSIUS: f64 = 60.0;
pub const CRITICAL_CELSIUS: f64 = 80.0;

#[derive(Debug, thiserror::Error)]
pub enum PiError {
    #[error("Failed to run temperature command: {0}")]
    Io(#[from] std::io::Error),
    #[error("Temperature command exited with {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },
    #[error("Could not read a temperature from {0:?}")]
    Parse(String),
}

/// Source of the host CPU temperature.
#[async_trait]
pub trait ThermalProbe: Send + Sync {
    async fn read_celsius(&self) -> Result<f64, PiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureLevel {
    Normal,
    High,
    Critical,
}

impl TemperatureLevel {
    pub fn classify(celsius: f64) -> Self {
        if celsius > CRITICAL_CELSIUS {
            TemperatureLevel::Critical
        } else if celsius > HIGH_CELSIUS {
            TemperatureLevel::High
        } else {
            TemperatureLevel::Normal
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemperatureReport {
    pub celsius: f64,
    pub level: TemperatureLevel,
    /// Critical and automatic reboots are enabled.
    pub reboot: bool,
    pub message: String,
}

impl TemperatureReport {
    /// `celsius` is shown as read, never rounded, so the text always agrees
    /// with the classification.
    pub fn new(celsius: f64, now: NaiveDateTime, auto_reboot: bool) -> Self {
        let level = TemperatureLevel::classify(celsius);
        let reboot = level == TemperatureLevel::Critical && auto_reboot;
        let body = match level {
            TemperatureLevel::Critical => critical_text(celsius, reboot),
            TemperatureLevel::High => format!(
                "Temperature High: {:?} °C, Consider Rebooting or Cooling",
                celsius
            ),
            TemperatureLevel::Normal => format!("Temperature: {:?} °C", celsius),
        };

        Self {
            celsius,
            level,
            reboot,
            message: format!("{}{}", now.format("[%Y-%m-%d %H:%M:%S]: "), body),
        }
    }

    /// Alert text for the reporting channel, without the timestamp prefix.
    pub fn alert(&self) -> Option<String> {
        match self.level {
            TemperatureLevel::Critical => Some(critical_text(self.celsius, self.reboot)),
            _ => None,
        }
    }
}

fn critical_text(celsius: f64, reboot: bool) -> String {
    if reboot {
        format!("Temperature Too High: {:?} °C, Rebooting", celsius)
    } else {
        format!(
            "Temperature Too High: {:?} °C, Automatic Reboot Disabled",
            celsius
        )
    }
}

pub struct TemperatureService<P: ThermalProbe> {
    probe: P,
    auto_reboot: bool,
}

impl<P: ThermalProbe> TemperatureService<P> {
    pub fn new(probe: P, auto_reboot: bool) -> Self {
        Self { probe, auto_reboot }
    }

    pub async fn check(&self, now: NaiveDateTime) -> Result<TemperatureReport, PiError> {
        let celsius = self.probe.read_celsius().await?;
        Ok(TemperatureReport::new(celsius, now, self.auto_reboot))
    }
}
