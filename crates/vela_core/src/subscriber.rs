//! Installs the global `tracing` subscriber.
//!
//! [`TracingSetup`] builds a `tracing_subscriber` registry from an
//! [`EnvFilter`] and one fmt layer. Installation uses `try_init`, so calling
//! [`TracingSetup::init`] a second time leaves the first subscriber in place
//! and returns `false`.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration for an application using Vela.
///
/// # Filter resolution
///
/// 1. An explicit [`with_env_filter`](Self::with_env_filter) directive string,
///    if it parses.
/// 2. `RUST_LOG`, when [`with_default_env`](Self::with_default_env) is enabled
///    and the variable is set and valid.
/// 3. The configured [`Level`] for every target.
///
/// # Example
///
/// ```
/// use vela_core::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// // Development: pretty output, debug level, span enter/exit
/// let dev = TracingSetup::new()
///     .with_level(Level::DEBUG)
///     .with_span_events(true);
///
/// // Production: JSON output, scheduler noise filtered out
/// let prod = TracingSetup::new()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("vela_resource=warn,info");
/// # let _ = (dev, prod);
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Directive string (e.g., "`vela_resource=debug,info`").
    env_filter: Option<String>,
    /// Whether `RUST_LOG` is consulted when no directive string is set.
    default_env: bool,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            default_env: false,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a new `TracingSetup` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom filter directive string.
    ///
    /// Format: `target=level,target=level,...`. An unparsable string falls
    /// back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Consults `RUST_LOG` when no directive string is set.
    #[must_use]
    pub fn with_default_env(mut self, enabled: bool) -> Self {
        self.default_env = enabled;
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Builds the filter this setup would install.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None if self.default_env => {
                EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
            }
            None => fallback(),
        }
    }

    /// Installs the subscriber globally.
    ///
    /// Returns `false` if a global subscriber was already installed, in which
    /// case nothing changes.
    pub fn init(&self) -> bool {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(self.filter());
        let installed = match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::info!(
                level = %self.level,
                format = ?self.format,
                "tracing initialized"
            );
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_setup_default_level_is_info() {
        let setup = TracingSetup::default();
        assert_eq!(setup.level(), Level::INFO);
        assert!(!setup.default_env);
        assert!(!setup.span_events);
    }

    #[test]
    fn tracing_setup_with_level() {
        let setup = TracingSetup::new().with_level(Level::DEBUG);
        assert_eq!(setup.level(), Level::DEBUG);
    }

    #[test]
    fn tracing_setup_with_format() {
        let setup = TracingSetup::new().with_format(TracingFormat::Json);
        assert_eq!(setup.format(), TracingFormat::Json);
    }

    #[test]
    fn tracing_setup_with_env_filter() {
        let setup = TracingSetup::new().with_env_filter("vela_resource=debug");
        assert_eq!(setup.env_filter, Some("vela_resource=debug".to_string()));
    }

    #[test]
    fn filter_uses_level_without_directives() {
        let filter = TracingSetup::new().with_level(Level::WARN).filter();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn filter_uses_valid_directives() {
        let filter = TracingSetup::new()
            .with_level(Level::WARN)
            .with_env_filter("trace")
            .filter();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn filter_falls_back_to_level_on_bad_directives() {
        let filter = TracingSetup::new()
            .with_level(Level::ERROR)
            .with_env_filter("vela_resource=loud")
            .filter();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn second_init_is_a_noop() {
        let setup = TracingSetup::new().with_format(TracingFormat::Compact);
        assert!(setup.init());
        assert!(!setup.init());
    }
}
