//! Logging setup
//!
//! The container reports bindings, lookups, cache replays, instantiations,
//! cycles and interceptor vetoes through `tracing` under the
//! `contextual_injector` target. This module installs a `tracing-subscriber`
//! for applications that do not bring their own.
//!
//! # Features
//!
//! - `logging` - emit events (default)
//! - `logging-json` - JSON lines output
//! - `logging-pretty` - multi-line human readable output
//!
//! # Example
//!
//! ```rust,ignore
//! use contextual_injector::logging;
//!
//! // Resolution traces from the container, nothing else
//! logging::builder().trace().injector_only().compact().init();
//! ```

#[cfg(feature = "logging")]
use tracing::Level;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    /// One line per event.
    Compact,
}

/// Subscriber configuration.
#[cfg(feature = "logging")]
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    file: bool,
    line_number: bool,
    thread_ids: bool,
}

#[cfg(feature = "logging")]
impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::default(),
            target: None,
            file: false,
            line_number: false,
            thread_ids: false,
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

    /// Every lookup, cache replay and interceptor run.
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Bindings, instantiations and failures.
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only show events from `target`.
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show the container's own events.
    pub fn injector_only(self) -> Self {
        self.with_target_filter("contextual_injector")
    }

    /// Include source file and line of each event.
    pub fn with_location(mut self) -> Self {
        self.file = true;
        self.line_number = true;
        self
    }

    /// Include thread ids, useful when resolving from several threads.
    pub fn with_thread_ids(mut self) -> Self {
        self.thread_ids = true;
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

    /// The `EnvFilter` directive this configuration installs.
    pub fn directive(&self) -> String {
        match self.target {
            Some(target) => format!("{}={}", target, self.level),
            None => self.level.to_string().to_lowercase(),
        }
    }

    /// Install the subscriber globally.
    ///
    /// Returns `false` if a global subscriber was already set. Without
    /// `logging-json` the JSON format falls back to the default line format.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let layer = fmt::layer()
            .with_file(self.file)
            .with_line_number(self.line_number)
            .with_thread_ids(self.thread_ids)
            .with_target(true);
        let registry = tracing_subscriber::registry().with(EnvFilter::new(self.directive()));

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init().is_ok(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer).try_init().is_ok(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init().is_ok(),
            LogFormat::Compact => registry.with(layer.compact()).try_init().is_ok(),
        }
    }

    /// No subscriber support compiled in; never installs anything.
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

#[cfg(feature = "logging")]
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install the default subscriber: JSON with `logging-json`, else pretty.
#[cfg(feature = "logging")]
pub fn init() -> bool {
    let builder = builder();
    if cfg!(feature = "logging-json") {
        builder.json().init()
    } else {
        builder.pretty().init()
    }
}

/// Install a subscriber showing only the container's events.
#[cfg(feature = "logging")]
pub fn init_injector_only() -> bool {
    builder().injector_only().init()
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_injector_only_directive() {
        let builder = builder().trace().pretty().with_location().injector_only();

        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.file && builder.line_number);
        assert_eq!(builder.directive(), "contextual_injector=TRACE");
    }
}
