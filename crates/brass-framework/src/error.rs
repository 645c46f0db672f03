//! Error types for the Brass framework.
//!
//! Every stage of dispatch (compiling an argument map, tokenizing, binding,
//! converting, running the handler) reports failure through
//! [`CommandError`]. Only the dispatcher turns an error into an observer
//! callback; everything below it returns `Result`.

use std::fmt;

use thiserror::Error;

/// Boxed error type returned by command handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why the tokenizer rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingError {
    /// Input ended inside a quoted span.
    UnterminatedQuote,
    /// A closing quote was followed by something other than a space.
    ExpectedSpaceAfterQuote,
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedQuote => f.write_str("missing terminating quotation mark"),
            Self::ExpectedSpaceAfterQuote => f.write_str("expected space after quotation mark"),
        }
    }
}

/// Errors raised while registering or dispatching a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The argument map is non-empty but holds no `<...>` or `[...]` unit.
    #[error("an invalid argument map was provided: {map:?}")]
    InvalidArgumentMap { map: String },

    /// Malformed quoting in the message body.
    #[error("{0}")]
    Parsing(ParsingError),

    /// Fewer tokens than required arguments.
    #[error("{name} is a required argument that is missing")]
    RequiredArgumentMissing { name: String },

    /// More tokens than arguments and no rest argument to absorb them.
    #[error("there are too many arguments for me to parse")]
    TooManyArguments,

    /// The argument could not be processed at all (unknown converter,
    /// guild-only lookup outside a guild).
    #[error("{0}")]
    ArgumentParsing(String),

    /// A converter ran but the token did not coerce.
    #[error("{0}")]
    BadArgument(String),

    /// A plugin's settings section does not match what the plugin reads.
    #[error("invalid settings for plugin `{plugin}`: {source}")]
    InvalidSettings {
        plugin: String,
        #[source]
        source: serde_json::Error,
    },

    /// The handler itself failed, or its reply could not be delivered.
    #[error("command handler failed: {0}")]
    Handler(#[source] BoxError),
}

/// Fieldless classification of [`CommandError`], convenient for matching in
/// error observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgumentMap,
    Parsing,
    RequiredArgumentMissing,
    TooManyArguments,
    ArgumentParsing,
    BadArgument,
    InvalidSettings,
    Handler,
}

impl CommandError {
    /// Creates an [`ArgumentParsing`](Self::ArgumentParsing) error.
    pub fn argument_parsing(msg: impl Into<String>) -> Self {
        Self::ArgumentParsing(msg.into())
    }

    /// Creates a [`BadArgument`](Self::BadArgument) error.
    pub fn bad_argument(msg: impl Into<String>) -> Self {
        Self::BadArgument(msg.into())
    }

    /// Wraps a handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgumentMap { .. } => ErrorKind::InvalidArgumentMap,
            Self::Parsing(_) => ErrorKind::Parsing,
            Self::RequiredArgumentMissing { .. } => ErrorKind::RequiredArgumentMissing,
            Self::TooManyArguments => ErrorKind::TooManyArguments,
            Self::ArgumentParsing(_) => ErrorKind::ArgumentParsing,
            Self::BadArgument(_) => ErrorKind::BadArgument,
            Self::InvalidSettings { .. } => ErrorKind::InvalidSettings,
            Self::Handler(_) => ErrorKind::Handler,
        }
    }

    /// `true` for errors caused by what the user typed, as opposed to a
    /// misconfigured command or a failing handler.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parsing
                | ErrorKind::RequiredArgumentMissing
                | ErrorKind::TooManyArguments
                | ErrorKind::BadArgument
        )
    }
}

impl From<ParsingError> for CommandError {
    fn from(err: ParsingError) -> Self {
        Self::Parsing(err)
    }
}

/// Result type for command operations.
pub type CommandResult<T> = Result<T, CommandError>;
