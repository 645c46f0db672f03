//! Chat entities delivered by the host.
//!
//! These are plain data snapshots. A host builds them from its own gateway
//! model; the framework never mutates them.

use serde::{Deserialize, Serialize};

/// A chat account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform identifier.
    pub id: String,
    /// Account name.
    pub name: String,
    /// Optional discriminator used to build the human-readable tag.
    #[serde(default)]
    pub discriminator: Option<String>,
    /// Whether the account is automated.
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Creates a non-bot user without a discriminator.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            discriminator: None,
            bot: false,
        }
    }

    /// Marks this user as a bot account.
    pub fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }

    /// Sets the discriminator.
    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    /// The human-readable tag, `name#discriminator` or just `name`.
    pub fn tag(&self) -> String {
        match &self.discriminator {
            Some(d) => format!("{}#{}", self.name, d),
            None => self.name.clone(),
        }
    }

    /// The mention markup for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub guild_id: String,
    #[serde(default)]
    pub nick: Option<String>,
}

impl Member {
    pub fn new(user: User, guild_id: impl Into<String>) -> Self {
        Self {
            user,
            guild_id: guild_id.into(),
            nick: None,
        }
    }

    /// The nickname if set, otherwise the account name.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.name)
    }
}

/// A text channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// The owning guild, `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guild_id: None,
        }
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// A server scope grouping channels and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

impl Guild {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A chat message as delivered by the host.
///
/// `guild` is `None` when the message was sent outside any server scope
/// (a direct message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub content: String,
    pub author: User,
    pub channel: Channel,
    #[serde(default)]
    pub guild: Option<Guild>,
}

impl IncomingMessage {
    /// Creates a direct message (no guild scope).
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        author: User,
        channel: Channel,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author,
            channel,
            guild: None,
        }
    }

    /// Attaches a guild scope.
    pub fn in_guild(mut self, guild: Guild) -> Self {
        self.guild = Some(guild);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tag() {
        let plain = User::new("1", "ada");
        assert_eq!(plain.tag(), "ada");

        let tagged = User::new("1", "ada").with_discriminator("0001");
        assert_eq!(tagged.tag(), "ada#0001");
    }

    #[test]
    fn test_mentions() {
        assert_eq!(User::new("42", "x").mention(), "<@42>");
        assert_eq!(Channel::new("7", "general").mention(), "<#7>");
    }

    #[test]
    fn test_member_display_name() {
        let mut member = Member::new(User::new("1", "ada"), "g");
        assert_eq!(member.display_name(), "ada");
        member.nick = Some("countess".into());
        assert_eq!(member.display_name(), "countess");
    }
}
