pub mod temperature_service;

pub use temperature_service::{
    PiError, TemperatureLevel, TemperatureReport, TemperatureService, ThermalProbe,
};
