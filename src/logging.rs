//! Subscriber setup for the container's tracing events
//!
//! Every event the container emits uses the `component_injector` target:
//! creation and early exposure at `debug`, argument matching and deferred
//! injections at `trace`, destruction failures at `warn`.
//!
//! # Features
//!
//! - `logging` - emit events (default)
//! - `logging-json` - install a JSON subscriber
//! - `logging-pretty` - install a human-readable subscriber
//!
//! # Example
//!
//! ```rust,ignore
//! use component_injector::logging;
//!
//! logging::builder()
//!     .trace()
//!     .container_only()
//!     .compact()
//!     .init();
//! ```

#[cfg(feature = "logging")]
use tracing::Level;

/// Target used by every container event
pub const TARGET: &str = "component_injector";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    /// Single line per event
    Compact,
}

/// Builder for the tracing subscriber
#[cfg(feature = "logging")]
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_names: bool,
}

#[cfg(feature = "logging")]
impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_names: false,
        }
    }
}

#[cfg(feature = "logging")]
impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Include argument matching and deferred injection events
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Only destruction failures and other warnings
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Drop events from every other crate
    pub fn container_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Useful when singletons are requested from several threads at once
    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Env-filter directive for the configured level and target
    pub fn directive(&self) -> String {
        match self.target {
            Some(target) => format!("{}={}", target, self.level),
            None => self.level.to_string(),
        }
    }

    /// Install the subscriber as the global default.
    ///
    /// Does nothing when a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::new(self.directive());
        let (file, line_number, thread_names) = (self.with_file, self.with_line_number, self.with_thread_names);

        macro_rules! install {
            ($layer:expr) => {{
                let layer = $layer
                    .with_file(file)
                    .with_line_number(line_number)
                    .with_thread_names(thread_names)
                    .with_target(true);
                let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
            }};
        }

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => install!(fmt::layer().json()),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => install!(fmt::layer()),
            LogFormat::Pretty => install!(fmt::layer().pretty()),
            LogFormat::Compact => install!(fmt::layer().compact()),
        }
    }

    /// No subscriber is available without `logging-json` or `logging-pretty`
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

#[cfg(feature = "logging")]
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// JSON when `logging-json` is enabled, pretty otherwise
#[cfg(feature = "logging")]
pub fn init() {
    #[cfg(feature = "logging-json")]
    init_json();
    #[cfg(not(feature = "logging-json"))]
    init_pretty();
}

#[cfg(feature = "logging")]
pub fn init_json() {
    builder().json().init();
}

#[cfg(feature = "logging")]
pub fn init_pretty() {
    builder().pretty().init();
}

/// Container events only, at `debug`
#[cfg(feature = "logging")]
pub fn init_container_only() {
    builder().container_only().debug().init();
}
