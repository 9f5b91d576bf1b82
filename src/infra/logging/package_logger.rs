// Per-package loggers on top of tracing.
//
// Each package ("main", "discord.cogs.pi", ...) owns one console handler and
// one rotating file under `<root>/<package path>.log`. Events from this crate
// are routed to the longest registered package prefix of their module path.
// Anything else (serenity, poise, reqwest) goes to a stock fmt layer.

use super::formatter::{LogRecord, MessageVisitor};
use super::rotating_file::{RotatingFile, DEFAULT_MAX_BYTES};
use chrono::Local;
use dashmap::DashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{filter_fn, FilterExt};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter for third-party crates when `RUST_LOG` is not set.
const DEFAULT_FALLBACK_FILTER: &str = "warn,serenity::http=info";

/// Package that catches crate events no other package claims.
pub const ROOT_PACKAGE: &str = "main";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid package name: {0:?}")]
    InvalidPackage(String),
    #[error("Failed to prepare log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
    #[error("Logging has not been initialised")]
    NotInitialized,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub root: PathBuf,
    /// First module path segment of events this registry owns.
    pub crate_name: &'static str,
    pub max_bytes: u64,
    /// Rolled files to keep; 0 truncates the file on rollover.
    pub backup_count: usize,
    /// Hand file writes to a background worker thread.
    pub non_blocking: bool,
}

impl LoggingConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            crate_name: env!("CARGO_CRATE_NAME"),
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: 0,
            non_blocking: true,
        }
    }
}

/// Handle returned by `setup_package_logger`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLogger {
    pub package: String,
    pub path: PathBuf,
    pub file_level: LevelFilter,
    pub console_level: LevelFilter,
}

struct PackageSink {
    logger: PackageLogger,
    file: Mutex<Box<dyn Write + Send>>,
}

struct RegistryInner {
    config: LoggingConfig,
    packages: DashMap<String, Arc<PackageSink>>,
    console: Mutex<Box<dyn Write + Send>>,
    guards: Mutex<Vec<WorkerGuard>>,
}

/// Process-wide set of package loggers. Also the tracing layer that feeds them.
#[derive(Clone)]
pub struct LogRegistry {
    inner: Arc<RegistryInner>,
}

impl LogRegistry {
    pub fn new(config: LoggingConfig) -> Self {
        Self::with_console(config, Box::new(io::stdout()))
    }

    pub fn with_console(config: LoggingConfig, console: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                packages: DashMap::new(),
                console: Mutex::new(console),
                guards: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the logger for `package`, creating its handlers on first use.
    ///
    /// Repeated calls for the same package return the existing logger and
    /// never attach a second set of handlers; the levels of the first call win.
    pub fn setup_package_logger(
        &self,
        package: &str,
        file_level: LevelFilter,
        console_level: LevelFilter,
    ) -> Result<PackageLogger, LoggingError> {
        if package.is_empty() || package.split('.').any(str::is_empty) {
            return Err(LoggingError::InvalidPackage(package.to_string()));
        }

        if let Some(existing) = self.get(package) {
            return Ok(existing);
        }

        let sink = self
            .inner
            .packages
            .entry(package.to_string())
            .or_try_insert_with(|| {
                self.open_sink(package, file_level, console_level)
                    .map(Arc::new)
            })?
            .clone();

        Ok(sink.logger.clone())
    }

    pub fn get(&self, package: &str) -> Option<PackageLogger> {
        self.inner
            .packages
            .get(package)
            .map(|sink| sink.logger.clone())
    }

    fn open_sink(
        &self,
        package: &str,
        file_level: LevelFilter,
        console_level: LevelFilter,
    ) -> Result<PackageSink, LoggingError> {
        let config = &self.inner.config;
        let path = log_path(&config.root, package);
        let io_err = |source| LoggingError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            create_log_dir(parent).map_err(io_err)?;
        }
        let file =
            RotatingFile::open(&path, config.max_bytes, config.backup_count).map_err(io_err)?;

        let file: Box<dyn Write + Send> = if config.non_blocking {
            let (writer, guard) = tracing_appender::non_blocking(file);
            if let Ok(mut guards) = self.inner.guards.lock() {
                guards.push(guard);
            }
            Box::new(writer)
        } else {
            Box::new(file)
        };

        Ok(PackageSink {
            logger: PackageLogger {
                package: package.to_string(),
                path,
                file_level,
                console_level,
            },
            file: Mutex::new(file),
        })
    }

    /// Drops the background writer guards, which blocks until every queued
    /// record has reached its file. Records logged afterwards are discarded.
    pub fn shutdown(&self) {
        let guards = match self.inner.guards.lock() {
            Ok(mut guards) => std::mem::take(&mut *guards),
            Err(_) => return,
        };
        drop(guards);
    }

    /// Package an event target belongs to, if this registry owns it at all.
    /// Besides module paths of this crate, a bare registered package name
    /// (`target: "main"`) or any dotted name (`target: "discord.cogs.pi"`)
    /// is accepted.
    fn package_for(&self, target: &str) -> Option<String> {
        if !target.contains("::") && self.inner.packages.contains_key(target) {
            return Some(target.to_string());
        }
        package_for_target(self.inner.config.crate_name, target)
    }

    /// Whether events with this target are handled here rather than by the
    /// third-party fmt layer.
    pub fn owns(&self, target: &str) -> bool {
        self.package_for(target).is_some()
    }

    fn resolve(&self, target: &str) -> Option<Arc<PackageSink>> {
        let package = self.package_for(target)?;

        let mut candidate = package.as_str();
        loop {
            if let Some(sink) = self.inner.packages.get(candidate) {
                return Some(Arc::clone(&sink));
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => break,
            }
        }

        self.inner
            .packages
            .get(ROOT_PACKAGE)
            .map(|sink| Arc::clone(&sink))
    }
}

impl<S> Layer<S> for LogRegistry
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let Some(sink) = self.resolve(meta.target()) else {
            return;
        };

        let level = *meta.level();
        let to_file = level <= sink.logger.file_level;
        let to_console = level <= sink.logger.console_level;
        if !to_file && !to_console {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let span = ctx.event_span(event);

        let record = LogRecord {
            level,
            timestamp: Local::now(),
            module: meta.module_path().unwrap_or_else(|| meta.target()),
            function: span.as_ref().map(|span| span.name()).unwrap_or("-"),
            line: meta.line(),
            message: visitor.finish(),
        };

        // Write failures are dropped; there is nowhere left to report them.
        if to_console {
            if let Ok(mut console) = self.inner.console.lock() {
                let _ = console.write_all(record.render_colored().as_bytes());
            }
        }
        if to_file {
            if let Ok(mut file) = sink.file.lock() {
                let _ = file.write_all(record.render().as_bytes());
            }
        }
    }
}

/// `logs` + `a.b.c` => `logs/a/b/c.log`
pub fn log_path(root: &Path, package: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(package.split('.'));
    path.set_extension("log");
    path
}

/// Maps a module-path target owned by this crate to a dotted package name.
/// The crate root itself maps to `main`. Explicit dotted targets are taken
/// as package names.
pub fn package_for_target(crate_name: &str, target: &str) -> Option<String> {
    if !target.contains("::") && target.contains('.') {
        return target
            .split('.')
            .all(|segment| !segment.is_empty())
            .then(|| target.to_string());
    }

    let mut segments = target.split("::");
    if segments.next()? != crate_name {
        return None;
    }

    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        Some(ROOT_PACKAGE.to_string())
    } else {
        Some(rest.join("."))
    }
}

#[cfg(unix)]
fn create_log_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
}

#[cfg(not(unix))]
fn create_log_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

static GLOBAL: OnceLock<LogRegistry> = OnceLock::new();

/// Flushes the package log files when dropped. Hold it in `main` until the
/// last record has been logged.
#[must_use = "dropping the guard flushes and stops file logging"]
pub struct LoggingGuard {
    registry: LogRegistry,
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        self.registry.shutdown();
    }
}

/// Installs the process-wide subscriber: the package registry plus a fmt
/// layer for third-party crates.
pub fn init(config: LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let crate_name = config.crate_name;
    let registry = GLOBAL.get_or_init(|| LogRegistry::new(config)).clone();

    let routed = registry.clone();
    let fallback = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FALLBACK_FILTER))
        .add_directive(format!("{}=off", crate_name).parse()?)
        .and(filter_fn(move |meta| !routed.owns(meta.target())));

    tracing_subscriber::registry()
        .with(registry.clone())
        .with(tracing_subscriber::fmt::layer().with_filter(fallback))
        .try_init()?;

    Ok(LoggingGuard { registry })
}

/// Process-wide entry point used by every component.
pub fn setup_package_logger(
    package: &str,
    file_level: LevelFilter,
    console_level: LevelFilter,
) -> Result<PackageLogger, LoggingError> {
    GLOBAL
        .get()
        .ok_or(LoggingError::NotInitialized)?
        .setup_package_logger(package, file_level, console_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn test_registry(root: &Path) -> (LogRegistry, SharedBuffer) {
        let console = SharedBuffer::default();
        let mut config = LoggingConfig::new(root);
        config.crate_name = "pi_bot";
        config.non_blocking = false;
        (
            LogRegistry::with_console(config, Box::new(console.clone())),
            console,
        )
    }

    #[test]
    fn test_log_path_mirrors_package() {
        let path = log_path(Path::new("logs"), "a.b.c");
        assert_eq!(path, Path::new("logs").join("a").join("b").join("c.log"));
    }

    #[test]
    fn test_package_for_target() {
        assert_eq!(
            package_for_target("pi_bot", "pi_bot::discord::cogs::pi"),
            Some("discord.cogs.pi".to_string())
        );
        assert_eq!(
            package_for_target("pi_bot", "pi_bot"),
            Some("main".to_string())
        );
        assert_eq!(package_for_target("pi_bot", "serenity::gateway"), None);
        assert_eq!(package_for_target("pi_bot", "pi_botany::x"), None);
        assert_eq!(
            package_for_target("pi_bot", "discord.cogs.pi"),
            Some("discord.cogs.pi".to_string())
        );
        assert_eq!(package_for_target("pi_bot", "discord..pi"), None);
        assert_eq!(package_for_target("pi_bot", "serenity"), None);
    }

    #[test]
    fn test_explicit_dotted_target() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = test_registry(dir.path());
        let root = registry
            .setup_package_logger("main", LevelFilter::INFO, LevelFilter::OFF)
            .unwrap();
        let cog = registry
            .setup_package_logger("discord.cogs.pi", LevelFilter::INFO, LevelFilter::OFF)
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(registry.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "discord.cogs.pi", "RaspberryPiUtils is ready.");
            tracing::info!(target: "discord.cogs.gpt", "ChatGpt is ready.");
            tracing::info!(target: "main", "Session closed");
        });

        let cog_file = fs::read_to_string(&cog.path).unwrap();
        let root_file = fs::read_to_string(&root.path).unwrap();
        assert!(cog_file.contains("RaspberryPiUtils is ready."));
        // Unregistered dotted packages fall back to the root logger
        assert!(root_file.contains("ChatGpt is ready."));
        assert!(root_file.contains("Session closed"));

        assert!(registry.owns("discord.cogs.pi"));
        assert!(registry.owns("main"));
        assert!(!registry.owns("serenity::gateway"));
        assert!(!registry.owns("reqwest"));
    }

    #[test]
    fn test_shutdown_flushes_background_writer() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LoggingConfig::new(dir.path());
        config.crate_name = "pi_bot";
        let registry = LogRegistry::with_console(config, Box::new(io::sink()));
        let logger = registry
            .setup_package_logger("main", LevelFilter::INFO, LevelFilter::OFF)
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(registry.clone());
        tracing::subscriber::with_default(subscriber, || {
            for i in 0..2000 {
                tracing::info!(target: "pi_bot", "record {}", i);
            }
            tracing::info!(target: "pi_bot", "Session closed");
        });
        drop(LoggingGuard {
            registry: registry.clone(),
        });

        let file = fs::read_to_string(&logger.path).unwrap();
        assert_eq!(file.matches("--- Message ---").count(), 2001);
        assert!(file.contains("record 1999"));
        assert!(file.contains("Session closed"));
    }

    #[test]
    fn test_setup_creates_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = test_registry(dir.path());

        let logger = registry
            .setup_package_logger("a.b.c", LevelFilter::INFO, LevelFilter::DEBUG)
            .unwrap();

        assert_eq!(logger.path, dir.path().join("a").join("b").join("c.log"));
        assert!(logger.path.exists());
    }

    #[test]
    fn test_setup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, console) = test_registry(dir.path());

        let first = registry
            .setup_package_logger("a.b.c", LevelFilter::INFO, LevelFilter::DEBUG)
            .unwrap();
        let second = registry
            .setup_package_logger("a.b.c", LevelFilter::ERROR, LevelFilter::ERROR)
            .unwrap();
        assert_eq!(first, second);

        let subscriber = tracing_subscriber::registry().with(registry.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "pi_bot::a::b::c", "only once");
        });

        // One handler set means exactly one copy per output
        assert_eq!(console.contents().matches("only once").count(), 1);
        let file = fs::read_to_string(&first.path).unwrap();
        assert_eq!(file.matches("only once").count(), 1);
    }

    #[test]
    fn test_file_level_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, console) = test_registry(dir.path());
        let logger = registry
            .setup_package_logger("a.b.c", LevelFilter::INFO, LevelFilter::DEBUG)
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(registry.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "pi_bot::a::b::c", "debug detail");
            tracing::warn!(target: "pi_bot::a::b::c", "hot cpu");
        });

        let file = fs::read_to_string(&logger.path).unwrap();
        assert!(!file.contains("debug detail"));
        assert!(file.contains("[WARNING]"));
        assert!(file.contains("hot cpu"));

        // Console is more permissive and sees both
        let console = console.contents();
        assert!(console.contains("debug detail"));
        assert!(console.contains("hot cpu"));
    }

    #[test]
    fn test_routes_to_longest_prefix_then_root() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = test_registry(dir.path());
        let root = registry
            .setup_package_logger("main", LevelFilter::INFO, LevelFilter::OFF)
            .unwrap();
        let cogs = registry
            .setup_package_logger("discord.cogs", LevelFilter::INFO, LevelFilter::OFF)
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(registry.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "pi_bot::discord::cogs::pi", "from pi");
            tracing::info!(target: "pi_bot::core::ai", "from ai");
            tracing::info!(target: "serenity::gateway", "from serenity");
        });

        let cogs_file = fs::read_to_string(&cogs.path).unwrap();
        let root_file = fs::read_to_string(&root.path).unwrap();
        assert!(cogs_file.contains("from pi"));
        assert!(!cogs_file.contains("from ai"));
        assert!(root_file.contains("from ai"));
        assert!(!root_file.contains("from serenity"));
    }

    #[test]
    fn test_structured_fields_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = test_registry(dir.path());
        let logger = registry
            .setup_package_logger("main", LevelFilter::INFO, LevelFilter::OFF)
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(registry.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "pi_bot", extension = "pi", "Extension loaded");
        });

        let file = fs::read_to_string(&logger.path).unwrap();
        assert!(file.contains("Extension loaded extension=pi"));
    }

    #[test]
    fn test_rejects_empty_segments() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = test_registry(dir.path());

        assert!(matches!(
            registry.setup_package_logger("a..b", LevelFilter::INFO, LevelFilter::INFO),
            Err(LoggingError::InvalidPackage(_))
        ));
        assert!(registry.get("a..b").is_none());
    }
}
