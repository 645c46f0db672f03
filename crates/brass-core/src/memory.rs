//! An in-memory [`Host`](crate::Host).
//!
//! `MemoryHost` keeps its directory in maps and appends every delivered
//! message to an outbox instead of talking to a network. It backs the test
//! suites and the console demo.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::error::{HostError, HostResult};
use crate::host::{Directory, Messenger};
use crate::message::{Channel, Member, User};

/// A message recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub content: String,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    channels: HashMap<String, Channel>,
    /// guild id -> member list
    members: HashMap<String, Vec<Member>>,
    outbox: Vec<SentMessage>,
    offline: bool,
}

/// In-memory host.
#[derive(Default)]
pub struct MemoryHost {
    inner: RwLock<Inner>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn add_user(&self, user: User) {
        self.inner.write().users.insert(user.id.clone(), user);
    }

    /// Adds or replaces a channel.
    pub fn add_channel(&self, channel: Channel) {
        self.inner.write().channels.insert(channel.id.clone(), channel);
    }

    /// Adds a guild member. The member's user is also registered as a user.
    pub fn add_member(&self, member: Member) {
        let mut inner = self.inner.write();
        inner
            .users
            .insert(member.user.id.clone(), member.user.clone());
        let list = inner.members.entry(member.guild_id.clone()).or_default();
        list.retain(|m| m.user.id != member.user.id);
        list.push(member);
    }

    /// Makes every subsequent send fail with [`HostError::NotConnected`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.write().offline = offline;
    }

    /// Returns a copy of every message sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.inner.read().outbox.clone()
    }

    /// Removes and returns every message sent so far.
    pub fn drain(&self) -> Vec<SentMessage> {
        std::mem::take(&mut self.inner.write().outbox)
    }
}

impl Directory for MemoryHost {
    fn user(&self, id: &str) -> Option<User> {
        self.inner.read().users.get(id).cloned()
    }

    fn channel(&self, id: &str) -> Option<Channel> {
        self.inner.read().channels.get(id).cloned()
    }

    fn member(&self, guild_id: &str, query: &str) -> Option<Member> {
        let inner = self.inner.read();
        let members = inner.members.get(guild_id)?;
        members
            .iter()
            .find(|m| m.user.id == query)
            .or_else(|| members.iter().find(|m| m.user.tag() == query))
            .cloned()
    }
}

#[async_trait]
impl Messenger for MemoryHost {
    async fn send(&self, channel: &Channel, content: &str) -> HostResult<()> {
        let mut inner = self.inner.write();
        if inner.offline {
            return Err(HostError::NotConnected);
        }
        trace!(channel = %channel.id, "Recording outgoing message");
        inner.outbox.push(SentMessage {
            channel_id: channel.id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::IncomingMessage;

    fn host() -> MemoryHost {
        let host = MemoryHost::new();
        host.add_channel(Channel::new("10", "general").in_guild("g1"));
        host.add_member(Member::new(
            User::new("1", "ada").with_discriminator("0001"),
            "g1",
        ));
        host
    }

    #[test]
    fn test_member_lookup_by_id_and_tag() {
        let host = host();
        assert_eq!(host.member("g1", "1").unwrap().user.name, "ada");
        assert_eq!(host.member("g1", "ada#0001").unwrap().user.id, "1");
        assert!(host.member("g1", "ada").is_none());
        assert!(host.member("g2", "1").is_none());
    }

    #[test]
    fn test_member_registers_user() {
        let host = host();
        assert!(host.user("1").is_some());
    }

    #[test]
    fn test_send_and_reply() {
        let host = host();
        let channel = host.channel("10").unwrap();
        let message = IncomingMessage::new("m1", "hi", User::new("1", "ada"), channel.clone());

        tokio_test::block_on(async {
            host.send(&channel, "plain").await.unwrap();
            host.reply(&message, "pong").await.unwrap();
        });

        let sent = host.drain();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].content, "plain");
        assert_eq!(sent[1].content, "<@1>, pong");
        assert!(host.sent().is_empty());
    }

    #[test]
    fn test_offline_send_fails() {
        let host = host();
        host.set_offline(true);
        let channel = host.channel("10").unwrap();
        let result = tokio_test::block_on(host.send(&channel, "x"));
        assert!(matches!(result, Err(HostError::NotConnected)));
    }
}
