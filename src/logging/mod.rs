//! Structured logging.
//!
//! Everything logs through `tracing`. The host (or `dungeon-sim`) installs a
//! subscriber once via [`init_tracing`]; `RUST_LOG` overrides the configured
//! filter when set. Library code never installs a subscriber on its own.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Crate areas that can be filtered independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Generation,
    Ecosystem,
    Monster,
    Loot,
    Combat,
    Engine,
}

impl Subsystem {
    pub const ALL: [Subsystem; 6] = [
        Subsystem::Generation,
        Subsystem::Ecosystem,
        Subsystem::Monster,
        Subsystem::Loot,
        Subsystem::Combat,
        Subsystem::Engine,
    ];

    /// `tracing` target prefix of the subsystem's module
    pub fn target(&self) -> &'static str {
        match self {
            Subsystem::Generation => "dungeon_core::generation",
            Subsystem::Ecosystem => "dungeon_core::ecosystem",
            Subsystem::Monster => "dungeon_core::monster",
            Subsystem::Loot => "dungeon_core::loot",
            Subsystem::Combat => "dungeon_core::combat",
            Subsystem::Engine => "dungeon_core::engine",
        }
    }
}

/// Subscriber settings. Lives in `GameConfig` so RON files can tune it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub overrides: Vec<(Subsystem, LogLevel)>,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            // Per-turn combat chatter is debug; keep it out unless asked for
            overrides: vec![(Subsystem::Combat, LogLevel::Info)],
            show_targets: true,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    pub fn with_level(mut self, subsystem: Subsystem, level: LogLevel) -> Self {
        self.overrides.retain(|(s, _)| *s != subsystem);
        self.overrides.push((subsystem, level));
        self
    }

    /// Filter directive string, e.g. `info,dungeon_core::combat=debug`
    pub fn directives(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        parts.extend(
            self.overrides
                .iter()
                .map(|(subsystem, level)| format!("{}={}", subsystem.target(), level)),
        );
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber. First call wins; later calls are no-ops.
pub fn init_tracing(config: &TracingConfig) {
    let directives = config.directives();
    let show_targets = config.show_targets;
    let show_file_line = config.show_file_line;
    TRACING_INIT.call_once(move || {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_file(show_file_line)
            .with_line_number(show_file_line)
            .compact();
        // The host may already own the global subscriber
        let _ = subscriber.try_init();
    });
}

/// Enters a span for the guarded operation and logs its duration on drop
pub struct TimingSpan {
    name: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            started: Instant::now(),
            _span: tracing::debug_span!("timed", op = name).entered(),
        }
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        debug!(op = self.name, elapsed_us = self.started.elapsed().as_micros() as u64, "finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" warning ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_default_directives() {
        let config = TracingConfig::default();
        assert_eq!(config.directives(), "info,dungeon_core::combat=info");
    }

    #[test]
    fn test_override_replaces_previous_level() {
        let config = TracingConfig::default()
            .with_level(Subsystem::Combat, LogLevel::Trace)
            .with_level(Subsystem::Generation, LogLevel::Warn);
        let directives = config.directives();
        assert!(directives.contains("dungeon_core::combat=trace"));
        assert!(!directives.contains("dungeon_core::combat=info"));
        assert!(directives.ends_with("dungeon_core::generation=warn"));
    }

    #[test]
    fn test_targets_match_modules() {
        for subsystem in Subsystem::ALL {
            assert!(subsystem.target().starts_with("dungeon_core::"));
        }
        assert_eq!(Subsystem::Loot.target(), "dungeon_core::loot");
    }

    #[test]
    fn test_config_from_ron() {
        let config: TracingConfig =
            ron::from_str("(default_level: warn, overrides: [(ecosystem, debug)])").unwrap();
        assert_eq!(config.default_level, LogLevel::Warn);
        assert_eq!(config.directives(), "warn,dungeon_core::ecosystem=debug");
        assert!(config.show_targets);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_tracing(&TracingConfig::default());
        init_tracing(&TracingConfig::default().with_level(Subsystem::Engine, LogLevel::Trace));
        let _timing = TimingSpan::new("test_operation");
        tracing::info!("still alive");
    }
}
