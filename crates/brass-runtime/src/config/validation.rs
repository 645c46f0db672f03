//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BrassConfig, CommandsConfig, LogOutput, LoggingConfig, parse_level};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration.
pub fn validate_config(config: &BrassConfig) -> ConfigResult<()> {
    validate_commands_config(&config.commands)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the `[commands]` section.
fn validate_commands_config(commands: &CommandsConfig) -> ConfigResult<()> {
    if commands.prefix.is_empty() {
        return Err(ConfigError::validation("Command prefix cannot be empty"));
    }

    if commands.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Command prefix cannot contain whitespace: {:?}",
            commands.prefix
        )));
    }

    if commands.blocked_users.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::validation("Blocked user ids cannot be blank"));
    }

    Ok(())
}

/// Validates the `[logging]` section.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if parse_level(&logging.level).is_none() {
        return Err(ConfigError::validation(format!(
            "Invalid log level: {}. Valid values are: {:?}",
            logging.level, VALID_LOG_LEVELS
        )));
    }

    for (target, level) in &logging.filters {
        if parse_level(level).is_none() {
            return Err(ConfigError::validation(format!(
                "Invalid log level for filter {target}: {level}"
            )));
        }
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "File log output requires logging.file_path",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(config: &BrassConfig) -> bool {
        matches!(
            validate_config(config),
            Err(ConfigError::ValidationError { .. })
        )
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&BrassConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = BrassConfig::default();
        config.commands.prefix = String::new();
        assert!(invalid(&config));

        config.commands.prefix = "! ".into();
        assert!(invalid(&config));

        config.commands.prefix = "bot,".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_blocked_users() {
        let mut config = BrassConfig::default();
        config.commands.blocked_users = vec!["1".into(), "  ".into()];
        assert!(invalid(&config));
    }

    #[test]
    fn test_validate_log_levels() {
        let mut config = BrassConfig::default();
        config.logging.level = "invalid".into();
        assert!(invalid(&config));

        config.logging.level = "WARN".into();
        config
            .logging
            .filters
            .insert("brass_framework".into(), "loud".into());
        assert!(invalid(&config));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = BrassConfig::default();
        config.logging.output = LogOutput::File;
        assert!(invalid(&config));

        config.logging.file_path = Some("brass.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
