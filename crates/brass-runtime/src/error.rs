//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use brass_framework::{CommandError, PluginError};

/// Errors that can occur while starting the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A compiled-in plugin failed to install.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// A built-in command could not be registered.
    #[error("Failed to register command: {0}")]
    Command(#[from] CommandError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
