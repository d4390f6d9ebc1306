//! http-control logging system
//!
//! Provides structured logging with configurable levels and output formats.
//! Uses the tracing crate; the library only emits events, and applications
//! (or the demo binary) decide whether to install a subscriber.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to output
    pub level: Level,
    /// Enable colored output
    pub color: bool,
    /// Show timestamps
    pub show_timestamps: bool,
    /// Show target/module name
    pub show_target: bool,
    /// Enable JSON format for machine parsing
    pub json_format: bool,
    /// Enable span events for tracing
    pub enable_spans: bool,
    /// Output to file instead of stdout
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            color: true,
            show_timestamps: false,
            show_target: false,
            json_format: false,
            enable_spans: false,
            file_output: None,
        }
    }
}

impl LoggingConfig {
    /// Create config for different application modes
    pub fn for_mode(mode: ApplicationMode) -> Self {
        match mode {
            ApplicationMode::Embedded => Self {
                level: Level::WARN,
                color: false, // Shares the host application's terminal
                show_timestamps: true,
                show_target: true,
                json_format: false,
                enable_spans: false,
                file_output: None,
            },
            ApplicationMode::Demo => Self {
                level: Level::INFO,
                color: true,
                show_timestamps: false,
                show_target: false,
                json_format: false,
                enable_spans: false,
                file_output: None,
            },
            ApplicationMode::Test => Self {
                level: Level::DEBUG,
                color: false,
                show_timestamps: true,
                show_target: true,
                json_format: false,
                enable_spans: true,
                file_output: None,
            },
        }
    }

    /// Create config from CLI arguments
    pub fn from_args(quiet: bool, verbose: bool, json: bool) -> Self {
        let level = if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            Level::INFO
        };

        Self {
            level,
            color: !quiet && !json && io::stdout().is_terminal(),
            show_timestamps: verbose || json,
            show_target: verbose,
            json_format: json,
            enable_spans: verbose,
            file_output: None,
        }
    }
}

/// Application modes with different logging requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationMode {
    /// Library running inside a host application
    Embedded,
    /// The bundled demo binary
    Demo,
    /// Test mode - maximum detail for testing
    Test,
}

impl ApplicationMode {
    fn log_file_name(self) -> &'static str {
        match self {
            ApplicationMode::Embedded => "embedded.log",
            ApplicationMode::Demo => "demo.log",
            ApplicationMode::Test => "test.log",
        }
    }
}

/// Initialize the logging system
///
/// Fails with `AlreadyExists` when the host application installed its own
/// global subscriber first.
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("http_control={}", config.level)));

    let registry = Registry::default().with(env_filter);

    let result = if let Some(log_file) = config.file_output {
        let file_appender = tracing_appender::rolling::never(
            log_file.parent().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path")
            })?,
            log_file.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file name")
            })?,
        );

        if config.json_format {
            fmt::layer()
                .json()
                .with_current_span(config.enable_spans)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender)
                .with_subscriber(registry)
                .try_init()
        } else {
            let fmt_layer = fmt::layer()
                .with_target(config.show_target)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file_appender);

            if config.show_timestamps {
                fmt_layer
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_subscriber(registry)
                    .try_init()
            } else {
                fmt_layer.with_subscriber(registry).try_init()
            }
        }
    } else if config.json_format {
        fmt::layer()
            .json()
            .with_current_span(config.enable_spans)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stdout)
            .with_subscriber(registry)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(config.show_target)
            .with_level(true)
            .with_ansi(config.color)
            .with_writer(io::stdout);

        if config.show_timestamps {
            fmt_layer
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_subscriber(registry)
                .try_init()
        } else {
            fmt_layer.with_subscriber(registry).try_init()
        }
    };

    result.map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

/// Parse a level name as accepted by `HTTP_CONTROL_LOG_LEVEL`
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Logging config from CLI flags, with the `HTTP_CONTROL_LOG_*` environment
/// variables able to switch each flag on and `HTTP_CONTROL_LOG_LEVEL`
/// overriding the resulting level.
pub fn config_from_env(quiet: bool, verbose: bool, json: bool) -> LoggingConfig {
    let enabled = |name: &str| std::env::var(name).as_deref() == Ok("true");

    let mut config = LoggingConfig::from_args(
        quiet || enabled("HTTP_CONTROL_LOG_QUIET"),
        verbose || enabled("HTTP_CONTROL_LOG_VERBOSE"),
        json || enabled("HTTP_CONTROL_LOG_JSON"),
    );
    if let Some(level) = std::env::var("HTTP_CONTROL_LOG_LEVEL")
        .ok()
        .as_deref()
        .and_then(parse_level)
    {
        config.level = level;
    }
    config
}

/// Get log file path for a given application mode
///
/// Returns `None` when the home directory cannot be determined.
pub fn log_file_path(mode: ApplicationMode) -> Option<PathBuf> {
    let log_dir = dirs::home_dir()?.join(".http-control").join("logs");

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_dir).ok();

    Some(log_dir.join(mode.log_file_name()))
}

/// Log macro for registry operations
#[macro_export]
macro_rules! log_registry_operation {
    ($operation:expr, $name:expr) => {
        tracing::debug!(operation = $operation, name = %$name, "Registry operation");
    };
    ($operation:expr, $name:expr, $details:expr) => {
        tracing::debug!(
            operation = $operation,
            name = %$name,
            details = $details,
            "Registry operation"
        );
    };
}

/// Log macro for server lifecycle transitions
#[macro_export]
macro_rules! log_server_operation {
    ($operation:expr, $addr:expr) => {
        tracing::info!(operation = $operation, addr = %$addr, "Server operation");
    };
}
