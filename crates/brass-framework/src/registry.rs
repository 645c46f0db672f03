//! The command table.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::argmap::ArgSpec;
use crate::error::CommandResult;
use crate::handler::{BoxedHandler, Handler, into_handler};

/// One registered command.
#[derive(Clone)]
pub struct CommandEntry {
    pub name: String,
    pub spec: ArgSpec,
    pub handler: BoxedHandler,
    pub help: Option<String>,
}

impl CommandEntry {
    /// Compiles `map` and erases `handler` into a new entry.
    ///
    /// The name is stored lowercased; lookups are case-insensitive.
    pub fn new<H, T>(
        name: impl AsRef<str>,
        map: Option<&str>,
        handler: H,
        help: Option<&str>,
    ) -> CommandResult<Self>
    where
        H: Handler<T>,
        T: 'static,
    {
        Ok(Self {
            name: name.as_ref().to_lowercase(),
            spec: ArgSpec::compile_opt(map)?,
            handler: into_handler(handler),
            help: help.map(str::to_owned),
        })
    }

    /// The raw descriptor fragments, space separated, for usage lines.
    pub fn usage(&self) -> String {
        self.spec.usage()
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Name-keyed command table with overwrite-on-collision semantics.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entry`, replacing and returning any entry with the same name.
    pub fn insert(&mut self, entry: CommandEntry) -> Option<CommandEntry> {
        let name = entry.name.clone();
        let previous = self.commands.insert(name.clone(), entry);
        if previous.is_some() {
            warn!(command = %name, "Command registered twice, replacing the earlier entry");
        } else {
            debug!(command = %name, "Registered command");
        }
        previous
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<CommandEntry> {
        self.commands.remove(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Entries sorted by name.
    pub fn entries(&self) -> Vec<&CommandEntry> {
        let mut entries: Vec<&CommandEntry> = self.commands.values().collect();
        entries.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
