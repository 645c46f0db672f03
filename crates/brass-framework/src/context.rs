//! The per-invocation context handed to command handlers.
//!
//! One [`CommandContext`] is built for every message that resolves to a
//! registered command. It carries the message, the matched prefix and command
//! name, the bound arguments, and the host used to talk back to the chat
//! service. Handlers receive it wrapped in an `Arc`.

use std::fmt;

use brass_core::{BoxedHost, Channel, Guild, HostResult, IncomingMessage, Messenger, User};

use crate::binder::Arguments;
use crate::converter::FromValue;

/// Everything a handler knows about the invocation it is serving.
pub struct CommandContext {
    message: IncomingMessage,
    prefix: String,
    command: String,
    raw_args: String,
    args: Option<Arguments>,
    host: BoxedHost,
}

impl CommandContext {
    pub(crate) fn new(
        message: IncomingMessage,
        prefix: impl Into<String>,
        command: impl Into<String>,
        raw_args: impl Into<String>,
        host: BoxedHost,
    ) -> Self {
        Self {
            message,
            prefix: prefix.into(),
            command: command.into(),
            raw_args: raw_args.into(),
            args: None,
            host,
        }
    }

    pub(crate) fn with_args(mut self, args: Option<Arguments>) -> Self {
        self.args = args;
        self
    }

    // ========================================================================
    // Message accessors
    // ========================================================================

    pub fn message(&self) -> &IncomingMessage {
        &self.message
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn channel(&self) -> &Channel {
        &self.message.channel
    }

    /// The guild the message was posted in, if any.
    pub fn guild(&self) -> Option<&Guild> {
        self.message.guild.as_ref()
    }

    /// The prefix text that matched, either the configured prefix or the
    /// bot's own mention.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The command name as typed, lowercased.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Everything after the command name, before tokenization.
    pub fn raw_args(&self) -> &str {
        &self.raw_args
    }

    // ========================================================================
    // Arguments
    // ========================================================================

    /// The bound arguments.
    ///
    /// `None` when the command was registered without an argument map. A
    /// command that takes arguments but received none gets `Some` of an empty
    /// set.
    pub fn args(&self) -> Option<&Arguments> {
        self.args.as_ref()
    }

    /// Shorthand for `args()?.get::<T>(name)`.
    pub fn arg<T: FromValue>(&self, name: &str) -> Option<T> {
        self.args.as_ref().and_then(|args| args.get(name))
    }

    // ========================================================================
    // Replying
    // ========================================================================

    pub fn host(&self) -> &BoxedHost {
        &self.host
    }

    /// Replies to the invoking message, mentioning its author.
    pub async fn reply(&self, content: &str) -> HostResult<()> {
        self.host.reply(&self.message, content).await
    }

    /// Sends `content` to the invoking channel without a mention.
    pub async fn send(&self, content: &str) -> HostResult<()> {
        self.host.send(&self.message.channel, content).await
    }

    /// Sends `content` to an arbitrary channel.
    pub async fn send_to(&self, channel: &Channel, content: &str) -> HostResult<()> {
        self.host.send(channel, content).await
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("message", &self.message.id)
            .field("prefix", &self.prefix)
            .field("command", &self.command)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
