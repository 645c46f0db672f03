//! Configuration schema definitions.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use brass_framework::DispatcherOptions;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrassConfig {
    /// How messages are recognised as commands.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Compiled-in plugin selection and settings.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Commands
// =============================================================================

/// The `[commands]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Literal prefix that starts a command.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Whether a direct mention of the bot also works as a prefix.
    #[serde(default = "default_true")]
    pub mentionable: bool,

    /// Whether messages authored by bot accounts are dropped.
    #[serde(default = "default_true")]
    pub ignore_bots: bool,

    /// Sender ids whose messages are dropped silently.
    #[serde(default)]
    pub blocked_users: Vec<String>,

    /// Whether the built-in `help` command is registered.
    #[serde(default = "default_true")]
    pub default_help: bool,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            mentionable: true,
            ignore_bots: true,
            blocked_users: Vec::new(),
            default_help: true,
        }
    }
}

impl From<&CommandsConfig> for DispatcherOptions {
    fn from(config: &CommandsConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            mentionable: config.mentionable,
            ignore_bots: config.ignore_bots,
            blocked_users: config.blocked_users.iter().cloned().collect::<HashSet<_>>(),
        }
    }
}

fn default_prefix() -> String {
    "?".to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Plugins
// =============================================================================

/// The `[plugins]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Names of compiled-in plugins to skip.
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Per-plugin settings, keyed by plugin name (`[plugins.settings.<name>]`).
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` otherwise.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires `file_path`.
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target levels, e.g. `brass_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in each line.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::new(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
        }
    }
}

impl LoggingConfig {
    /// The configured level as a [`tracing::Level`], `None` if unrecognised.
    pub fn tracing_level(&self) -> Option<tracing::Level> {
        parse_level(&self.level)
    }
}

/// Parses `trace` / `debug` / `info` / `warn` / `error`, case-insensitively.
pub(crate) fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BrassConfig::default();
        assert_eq!(config.commands.prefix, "?");
        assert!(config.commands.mentionable);
        assert!(config.commands.ignore_bots);
        assert!(config.commands.default_help);
        assert_eq!(config.logging.tracing_level(), Some(tracing::Level::INFO));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: BrassConfig = serde_json::from_value(serde_json::json!({
            "commands": { "prefix": "!" },
            "logging": { "format": "pretty" }
        }))
        .unwrap();
        assert_eq!(config.commands.prefix, "!");
        assert!(config.commands.default_help);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.output, LogOutput::Stdout);
    }

    #[test]
    fn test_commands_into_dispatcher_options() {
        let config = CommandsConfig {
            prefix: "!".into(),
            mentionable: false,
            ignore_bots: false,
            blocked_users: vec!["1".into(), "2".into()],
            default_help: true,
        };
        let options = DispatcherOptions::from(&config);
        assert_eq!(options.prefix, "!");
        assert!(!options.mentionable);
        assert!(!options.ignore_bots);
        assert!(options.blocked_users.contains("2"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level("verbose"), None);
    }
}
