//! # Brass
//!
//! A typed command front end for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   IncomingMessage   ┌────────────┐  tokens   ┌────────┐  Arguments  ┌─────────┐
//! │  Host   │────────────────────▶│ Dispatcher │──────────▶│ Binder │────────────▶│ Handler │
//! │ (chat)  │◀────────────────────│  (prefix)  │           │        │             │         │
//! └─────────┘   reply / send      └────────────┘           └────────┘             └─────────┘
//! ```
//!
//! - **Host**: the chat service; looks up users, members and channels and
//!   delivers outgoing text
//! - **Dispatcher**: strips the prefix, finds the command, reports failures
//! - **Binder**: turns the tokenized arguments into named, converted values
//!   according to the command's argument map
//! - **Handlers**: async functions taking extractors (Axum-style)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use brass::prelude::*;
//!
//! async fn add(args: Arguments) -> Option<String> {
//!     let sum = args.get::<i64>("a")? + args.get::<i64>("b")?;
//!     Some(sum.to_string())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BrassRuntime::new(Arc::new(MemoryHost::new()))?;
//!     runtime
//!         .dispatcher()
//!         .register("add", "<a:int> <b:int>", add, Some("Adds two numbers."))?;
//!
//!     runtime.run(messages).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read `brass.toml` (default)
//! - `yaml-config`: read `brass.yaml`
//! - `json-log`: JSON log lines

pub use brass_core as core;
pub use brass_framework as framework;
pub use brass_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use brass::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use brass_runtime::{BrassConfig, BrassRuntime, LoggingBuilder};

    // Dispatch
    pub use brass_framework::{
        CommandEntry, DispatchOutcome, Dispatcher, DispatcherOptions, IgnoreReason,
    };

    // Handlers and extractors
    pub use brass_framework::{
        Arguments, CommandContext, CommandError, CommandResult, ErrorKind, FromContext,
        HandleResponse,
    };

    // Argument conversion
    pub use brass_framework::{ConvertContext, Converter, FromValue, Value, converter_fn};

    // Plugins
    pub use brass_framework::{PluginContext, PluginDescriptor, submit_plugin};

    // Host side
    pub use brass_core::{
        BoxedHost, Channel, Directory, Guild, Host, IncomingMessage, MemoryHost, Member,
        Messenger, User,
    };
}
