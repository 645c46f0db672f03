//! Capabilities the host platform exposes to the framework.
//!
//! The split mirrors how the framework uses them: [`Directory`] lookups are
//! synchronous reads performed while converting arguments, [`Messenger`]
//! calls are asynchronous side effects performed by handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostResult;
use crate::message::{Channel, IncomingMessage, Member, User};

/// Read access to the host's view of users, members and channels.
///
/// Lookups reflect the host's state at call time; no stronger consistency is
/// promised.
pub trait Directory: Send + Sync {
    /// Finds a user by id.
    fn user(&self, id: &str) -> Option<User>;

    /// Finds a channel by id.
    fn channel(&self, id: &str) -> Option<Channel>;

    /// Finds a guild member by id, falling back to the user's tag.
    fn member(&self, guild_id: &str, query: &str) -> Option<Member>;
}

/// Message delivery.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Posts `content` to `channel`.
    async fn send(&self, channel: &Channel, content: &str) -> HostResult<()>;

    /// Replies to `message`, mentioning its author in the same channel.
    async fn reply(&self, message: &IncomingMessage, content: &str) -> HostResult<()> {
        let content = format!("{}, {}", message.author.mention(), content);
        self.send(&message.channel, &content).await
    }
}

/// A complete host: directory plus messenger.
///
/// Implemented automatically for every type providing both.
pub trait Host: Directory + Messenger {
    /// This host viewed as a plain [`Directory`].
    fn directory(&self) -> &dyn Directory;
}

impl<T: Directory + Messenger> Host for T {
    fn directory(&self) -> &dyn Directory {
        self
    }
}

/// Shared handle to a host.
pub type BoxedHost = Arc<dyn Host>;
