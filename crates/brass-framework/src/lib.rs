//! # Brass Framework
//!
//! Command handling for chat bots: a small argument-map language, a
//! quote-aware tokenizer, typed argument conversion, and a dispatcher that
//! routes prefixed messages to handlers.
//!
//! ```rust,ignore
//! use brass_framework::{Arguments, Dispatcher, DispatcherOptions};
//!
//! async fn greet(args: Arguments) -> String {
//!     let name = args.text("name").unwrap_or_default();
//!     let times = args.get::<i64>("times").unwrap_or(1).max(1) as usize;
//!     vec![format!("hello {name}"); times].join("\n")
//! }
//!
//! let dispatcher = Dispatcher::new(host, DispatcherOptions::default().with_prefix("!"))
//!     .with_default_help()?;
//! dispatcher.register("greet", "<name> [times:int]", greet, Some("Greets someone."))?;
//!
//! // "!greet Ada 3" replies "hello Ada" three times.
//! dispatcher.dispatch(message).await;
//! ```
//!
//! ## Argument maps
//!
//! | Unit          | Meaning                                   |
//! |---------------|-------------------------------------------|
//! | `<name>`      | required raw string                       |
//! | `[name]`      | optional raw string                       |
//! | `<name:int>`  | required, converted by the `int` converter |
//! | `<name...>`   | every remaining token, joined by spaces   |
//!
//! An empty map means the command takes no arguments and its body is never
//! tokenized.

pub mod argmap;
pub mod binder;
pub mod context;
pub mod converter;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod handler;
pub mod help;
pub mod plugin;
pub mod registry;
pub mod split;

pub use argmap::{ArgSpec, ArgumentDescriptor};
pub use binder::{Arguments, bind};
pub use context::CommandContext;
pub use converter::{
    BoxedConverter, ConvertContext, Converter, ConverterRegistry, FromValue, Value, converter_fn,
    strip_mention,
};
pub use dispatcher::{
    DispatchOutcome, Dispatcher, DispatcherOptions, ErrorObserver, IgnoreReason, WeakDispatcher,
};
pub use error::{BoxError, CommandError, CommandResult, ErrorKind, ParsingError};
pub use extract::FromContext;
pub use handler::{BoxedHandler, HandleResponse, Handler, into_handler};
pub use plugin::{PLUGINS, PluginContext, PluginDescriptor, PluginError};
pub use registry::{CommandEntry, CommandRegistry};
pub use split::{split_command, tokenize};
