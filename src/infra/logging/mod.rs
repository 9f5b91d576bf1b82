pub mod formatter;
pub mod package_logger;
pub mod rotating_file;

pub use package_logger::{
    init, setup_package_logger, LogRegistry, LoggingConfig, LoggingError, LoggingGuard,
    PackageLogger,
};
