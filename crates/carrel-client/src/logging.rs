//! Logging configuration and initialization.
//!
//! Structured logging with presets, per-target overrides, JSON output for
//! log aggregation, and an environment-variable fallback (RUST_LOG).

use std::collections::HashMap;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Production: minimal logging, only important events
    #[default]
    Production,
    /// Verbose: more operational detail
    Verbose,
    /// Debug: detailed info for troubleshooting
    Debug,
    /// Trace: everything including per-frame stream data
    Trace,
    /// Quiet: warnings and errors only
    Quiet,
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Base preset to use
    pub preset: LogPreset,
    /// Per-target level overrides (e.g., "stream" -> DEBUG)
    pub overrides: HashMap<String, Level>,
    /// Output format
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new(preset: LogPreset, format: LogFormat) -> Self {
        Self { preset, overrides: HashMap::new(), format }
    }

    /// Add a per-target level override. Bare targets are scoped under the
    /// `carrel::` namespace ("stream" becomes "carrel::stream").
    pub fn with_override(mut self, target: &str, level: Level) -> Self {
        let full_target = if target.starts_with("carrel::") {
            target.to_string()
        } else {
            format!("carrel::{}", target)
        };
        self.overrides.insert(full_target, level);
        self
    }

    /// Build an EnvFilter from this configuration.
    pub fn build_filter(&self) -> EnvFilter {
        // RUST_LOG takes precedence over presets entirely.
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let mut directives: Vec<String> = match self.preset {
            LogPreset::Production => vec![
                "carrel::session=info".into(),
                "carrel::stream=warn".into(),
                "carrel::http=warn".into(),
                "carrel::podcast=info".into(),
                "carrel::transcript=off".into(),
            ],
            LogPreset::Verbose => vec![
                "carrel=info".into(),
                "carrel::transcript=off".into(),
            ],
            LogPreset::Debug => vec!["carrel=debug".into()],
            LogPreset::Trace => vec!["carrel=trace".into()],
            LogPreset::Quiet => vec!["carrel=warn".into()],
        };

        // Overrides take precedence over the preset.
        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level_to_str(*level)));
        }

        let filter_str = directives.join(",");
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Convert a Level to its filter string representation.
fn level_to_str(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
