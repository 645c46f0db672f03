//! Brass Runtime - configuration, logging and the message loop for the
//! Brass bot framework.
//!
//! This crate provides:
//! - Layered configuration loading (`BrassConfig`, `ConfigLoader`)
//! - Logging setup on top of `tracing-subscriber` (`LoggingBuilder`)
//! - The message loop (`BrassRuntime`)
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use brass_core::MemoryHost;
//! use brass_runtime::BrassRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BrassRuntime::new(Arc::new(MemoryHost::new()))?;
//!     runtime.run(messages).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    BrassConfig, CommandsConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig,
    PluginsConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{BrassRuntime, RunStats, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
