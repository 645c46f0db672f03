//! Plugin overlay.
//!
//! A plugin is a static [`PluginDescriptor`] whose `install` function
//! registers a batch of commands (and optionally converters). Installing
//! stages every registration first and merges the batch into the dispatcher
//! only when `install` succeeds, so a failing plugin leaves no partial state.
//! Merged commands replace existing ones of the same name.
//!
//! Plugins compiled into the binary are collected in [`PLUGINS`] with
//! [`submit_plugin!`](crate::submit_plugin):
//!
//! ```rust,ignore
//! use brass_framework::{PluginContext, PluginDescriptor, submit_plugin};
//!
//! fn install(ctx: &mut PluginContext<'_>) -> brass_framework::CommandResult<()> {
//!     ctx.command("dice", "[sides:int]", roll, Some("Rolls a die."))?;
//!     Ok(())
//! }
//!
//! submit_plugin!(DICE = PluginDescriptor::new("dice", "Dice rolling", install));
//! ```
//!
//! Each plugin may carry a settings section (`[plugins.settings.<name>]` in
//! the runtime config) readable through [`PluginContext::get_config`].

use std::sync::Arc;

use linkme::distributed_slice;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::converter::{BoxedConverter, Converter};
use crate::error::{CommandError, CommandResult};
use crate::handler::Handler;
use crate::registry::CommandEntry;

#[doc(hidden)]
pub use linkme as __linkme;

// ============================================================================
// PluginDescriptor
// ============================================================================

/// Installs a plugin's registrations into a [`PluginContext`].
pub type InstallFn = fn(&mut PluginContext<'_>) -> CommandResult<()>;

/// A static handle to a plugin.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Used in logs, for `disabled` lists, and as the settings key.
    pub name: &'static str,
    pub desc: &'static str,
    pub install: InstallFn,
}

impl PluginDescriptor {
    pub const fn new(name: &'static str, desc: &'static str, install: InstallFn) -> Self {
        Self {
            name,
            desc,
            install,
        }
    }
}

/// Every plugin compiled into the binary.
#[distributed_slice]
pub static PLUGINS: [PluginDescriptor];

/// Compiled-in plugins sorted by name, which is the order
/// [`Dispatcher::load_plugins`](crate::Dispatcher::load_plugins) applies them.
pub fn compiled_plugins() -> Vec<&'static PluginDescriptor> {
    let mut plugins: Vec<&'static PluginDescriptor> = PLUGINS.iter().collect();
    plugins.sort_by_key(|p| p.name);
    plugins
}

/// Adds a [`PluginDescriptor`] to [`PLUGINS`].
#[macro_export]
macro_rules! submit_plugin {
    ($ident:ident = $descriptor:expr) => {
        #[$crate::plugin::__linkme::distributed_slice($crate::plugin::PLUGINS)]
        #[linkme(crate = $crate::plugin::__linkme)]
        static $ident: $crate::plugin::PluginDescriptor = $descriptor;
    };
}

// ============================================================================
// PluginContext
// ============================================================================

/// Staging area handed to a plugin's `install` function.
pub struct PluginContext<'a> {
    name: &'a str,
    config: &'a JsonValue,
    commands: Vec<CommandEntry>,
    converters: Vec<(String, BoxedConverter)>,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(name: &'a str, config: &'a JsonValue) -> Self {
        Self {
            name,
            config,
            commands: Vec::new(),
            converters: Vec::new(),
        }
    }

    /// The plugin's name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The plugin's raw settings section, `Null` when absent.
    pub fn config(&self) -> &JsonValue {
        self.config
    }

    /// Deserializes the plugin's settings section.
    ///
    /// An absent section yields `T::default()`. A present but malformed
    /// section is an [`InvalidSettings`](CommandError::InvalidSettings)
    /// error that aborts the install.
    pub fn get_config<T: DeserializeOwned + Default>(&self) -> CommandResult<T> {
        if self.config.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.config.clone()).map_err(|source| {
            CommandError::InvalidSettings {
                plugin: self.name.to_string(),
                source,
            }
        })
    }

    /// Stages a command. The argument map is compiled immediately.
    pub fn command<H, T>(
        &mut self,
        name: &str,
        map: &str,
        handler: H,
        help: Option<&str>,
    ) -> CommandResult<&mut Self>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.commands
            .push(CommandEntry::new(name, Some(map), handler, help)?);
        Ok(self)
    }

    /// Stages a converter.
    pub fn converter<C>(&mut self, name: impl Into<String>, converter: C) -> &mut Self
    where
        C: Converter + 'static,
    {
        self.converters.push((name.into(), Arc::new(converter)));
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<CommandEntry>, Vec<(String, BoxedConverter)>) {
        (self.commands, self.converters)
    }
}

// ============================================================================
// PluginError
// ============================================================================

/// A plugin's `install` function failed.
#[derive(Debug, Error)]
#[error("plugin `{name}` failed to install: {source}")]
pub struct PluginError {
    pub name: String,
    #[source]
    pub source: CommandError,
}

impl PluginError {
    pub fn new(name: impl Into<String>, source: CommandError) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}
