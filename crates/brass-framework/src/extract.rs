//! Handler parameter extraction.
//!
//! Types implementing [`FromContext`] can appear as parameters of a command
//! handler. Extraction runs before the handler body; a failed extraction
//! aborts the invocation and is reported like any other command error.

use std::sync::Arc;

use brass_core::{BoxedHost, Channel, Guild, IncomingMessage, User};

use crate::binder::Arguments;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};

/// A type that can be pulled out of a [`CommandContext`].
pub trait FromContext: Sized {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self>;
}

impl FromContext for Arc<CommandContext> {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(ctx.clone())
    }
}

impl FromContext for IncomingMessage {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(ctx.message().clone())
    }
}

/// The message author.
impl FromContext for User {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(ctx.author().clone())
    }
}

impl FromContext for Channel {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(ctx.channel().clone())
    }
}

/// Fails with "Not in guild." for direct messages. Use `Option<Guild>` to
/// accept both.
impl FromContext for Guild {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        ctx.guild()
            .cloned()
            .ok_or_else(|| CommandError::argument_parsing("Not in guild."))
    }
}

/// The bound arguments, or an empty set for commands without an argument map.
impl FromContext for Arguments {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(ctx.args().cloned().unwrap_or_default())
    }
}

impl FromContext for BoxedHost {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(ctx.host().clone())
    }
}

impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<CommandContext>) -> CommandResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}
