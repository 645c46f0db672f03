//! Configuration for the Brass runtime.
//!
//! [`ConfigLoader`] layers defaults, `brass.toml` files and `BRASS_*`
//! environment variables into a [`BrassConfig`]; [`validate_config`] checks
//! the result before the runtime uses it.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BrassConfig, CommandsConfig, LogFormat, LogOutput, LoggingConfig, PluginsConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
