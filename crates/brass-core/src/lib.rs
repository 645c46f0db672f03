//! # Brass Core
//!
//! The host-facing layer of the Brass command framework.
//!
//! Brass does not talk to a chat gateway itself. A host platform delivers
//! incoming messages and exposes two capabilities, both described here:
//!
//! - **Directory**: synchronous lookups of users, guild members and channels
//!   against the host's current state ([`Directory`]).
//! - **Messenger**: side-effecting message delivery ([`Messenger`]).
//!
//! Anything implementing both is a [`Host`].
//!
//! ```text
//! ┌────────────┐  IncomingMessage  ┌────────────┐  Arc<CommandContext>  ┌─────────┐
//! │    Host    │──────────────────▶│ Dispatcher │──────────────────────▶│ Handler │
//! │ (gateway)  │◀──────────────────│  (brass)   │                       └─────────┘
//! └────────────┘ lookups / replies └────────────┘
//! ```
//!
//! [`MemoryHost`] is a complete in-memory host, used by tests and the console
//! demo.

pub mod error;
pub mod host;
pub mod memory;
pub mod message;

pub use error::{HostError, HostResult};
pub use host::{BoxedHost, Directory, Host, Messenger};
pub use memory::{MemoryHost, SentMessage};
pub use message::{Channel, Guild, IncomingMessage, Member, User};
