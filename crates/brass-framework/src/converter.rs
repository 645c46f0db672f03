//! Typed argument conversion.
//!
//! A [`Converter`] turns one raw token into a [`Value`]. Converters are looked
//! up by the type name written in the argument map (`<n:int>` uses `"int"`)
//! through a [`ConverterRegistry`].
//!
//! Built-in type names:
//!
//! | Name      | Produces          | Accepts                                       |
//! |-----------|-------------------|-----------------------------------------------|
//! | `int`     | [`Value::Int`]    | decimal `i64`                                 |
//! | `float`   | [`Value::Float`]  | finite decimal `f64`                          |
//! | `boolean` | [`Value::Bool`]   | `yes on true y enable` / `no off false n disable` |
//! | `user`    | [`Value::User`]   | user id or mention                            |
//! | `member`  | [`Value::Member`] | member id, mention or tag (guild only)        |
//! | `channel` | [`Value::Channel`]| channel id or mention                         |
//!
//! The name `"Converter"` is reserved and never resolves.
//!
//! # Custom converters
//!
//! Implement [`Converter`] on a type, or wrap a closure with
//! [`converter_fn`]:
//!
//! ```rust,ignore
//! let registry = ConverterRegistry::builtin().with(
//!     "upper",
//!     converter_fn(|token, _ctx| Ok(Value::Text(token.to_uppercase()))),
//! );
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::warn;

use brass_core::{Channel, Directory, IncomingMessage, Member, User};

use crate::error::{CommandError, CommandResult};

/// Type name that is reserved for the abstract converter and never resolves.
pub const RESERVED_CONVERTER: &str = "Converter";

const TRUTHY: [&str; 5] = ["yes", "on", "true", "y", "enable"];
const FALSY: [&str; 5] = ["no", "off", "false", "n", "disable"];

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(?:@[!&]?|#)(\d+)>$").expect("mention pattern is valid"));

/// Strips mention decoration from a token.
///
/// `<@123>`, `<@!123>`, `<@&123>` and `<#123>` all become `123`; any other
/// token is returned unchanged.
pub fn strip_mention(token: &str) -> &str {
    MENTION
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map_or(token, |id| id.as_str())
}

// ============================================================================
// Value
// ============================================================================

/// A bound argument value.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    User(User),
    Member(Member),
    Channel(Channel),
    /// Produced by custom converters.
    Other(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps an arbitrary value produced by a custom converter.
    pub fn other<T: Any + Send + Sync>(value: T) -> Self {
        Self::Other(Arc::new(value))
    }

    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::User(_) => "user",
            Self::Member(_) => "member",
            Self::Channel(_) => "channel",
            Self::Other(_) => "other",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Downcasts a [`Value::Other`] payload.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Other(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::User(a), Self::User(b)) => a == b,
            (Self::Member(a), Self::Member(b)) => a == b,
            (Self::Channel(a), Self::Channel(b)) => a == b,
            (Self::Other(a), Self::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::User(u) => f.write_str(&u.tag()),
            Self::Member(m) => f.write_str(m.display_name()),
            Self::Channel(c) => write!(f, "#{}", c.name),
            Self::Other(_) => f.write_str("<other>"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Extraction of a concrete type from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(String, Text);
impl_from_value!(i64, Int);
impl_from_value!(bool, Bool);
impl_from_value!(Member, Member);
impl_from_value!(Channel, Channel);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromValue for User {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::User(u) => Some(u.clone()),
            Value::Member(m) => Some(m.user.clone()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

// ============================================================================
// Converter trait
// ============================================================================

/// What a converter may consult besides the token.
#[derive(Clone, Copy)]
pub struct ConvertContext<'a> {
    /// The message being dispatched.
    pub message: &'a IncomingMessage,
    /// The host's directory.
    pub directory: &'a dyn Directory,
}

impl<'a> ConvertContext<'a> {
    pub fn new(message: &'a IncomingMessage, directory: &'a dyn Directory) -> Self {
        Self { message, directory }
    }
}

/// Converts a raw token into a [`Value`].
///
/// Implementations either return a value or fail with
/// [`CommandError::BadArgument`] / [`CommandError::ArgumentParsing`]; they
/// never signal failure through a sentinel value.
pub trait Converter: Send + Sync {
    fn convert(&self, token: &str, ctx: &ConvertContext<'_>) -> CommandResult<Value>;
}

/// A [`Converter`] backed by a closure. Created with [`converter_fn`].
#[derive(Clone, Copy)]
pub struct ConverterFn<F>(F);

/// Wraps a closure as a [`Converter`].
///
/// ```rust,ignore
/// let upper = converter_fn(|token, _ctx| Ok(Value::Text(token.to_uppercase())));
/// ```
pub fn converter_fn<F>(f: F) -> ConverterFn<F>
where
    F: Fn(&str, &ConvertContext<'_>) -> CommandResult<Value> + Send + Sync,
{
    ConverterFn(f)
}

impl<F> Converter for ConverterFn<F>
where
    F: Fn(&str, &ConvertContext<'_>) -> CommandResult<Value> + Send + Sync,
{
    fn convert(&self, token: &str, ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        (self.0)(token, ctx)
    }
}

/// Shared handle to a converter.
pub type BoxedConverter = Arc<dyn Converter>;

// ============================================================================
// Built-in converters
// ============================================================================

/// `int`: a decimal `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

impl Converter for IntConverter {
    fn convert(&self, token: &str, _ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CommandError::bad_argument("Invalid integer."))
    }
}

/// `float`: a finite decimal `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn convert(&self, token: &str, _ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Float(n)),
            _ => Err(CommandError::bad_argument("Invalid float.")),
        }
    }
}

/// `boolean`: a fixed, case-sensitive vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl Converter for BooleanConverter {
    fn convert(&self, token: &str, _ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        if TRUTHY.contains(&token) {
            Ok(Value::Bool(true))
        } else if FALSY.contains(&token) {
            Ok(Value::Bool(false))
        } else {
            Err(CommandError::bad_argument("Invalid boolean provided."))
        }
    }
}

/// `user`: a user by id or mention.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserConverter;

impl Converter for UserConverter {
    fn convert(&self, token: &str, ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        ctx.directory
            .user(strip_mention(token))
            .map(Value::User)
            .ok_or_else(|| CommandError::bad_argument("User not found."))
    }
}

/// `member`: a member of the message's guild by id, mention or tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberConverter;

impl Converter for MemberConverter {
    fn convert(&self, token: &str, ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        let guild = ctx
            .message
            .guild
            .as_ref()
            .ok_or_else(|| CommandError::argument_parsing("Not in guild."))?;

        ctx.directory
            .member(&guild.id, strip_mention(token))
            .map(Value::Member)
            .ok_or_else(|| CommandError::bad_argument("Member not found."))
    }
}

/// `channel`: a channel by id or mention.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelConverter;

impl Converter for ChannelConverter {
    fn convert(&self, token: &str, ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        ctx.directory
            .channel(strip_mention(token))
            .map(Value::Channel)
            .ok_or_else(|| CommandError::bad_argument("Channel not found."))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Maps type names to converters.
///
/// Built from the built-ins plus caller-supplied entries; a later entry with
/// the same name replaces the earlier one.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, BoxedConverter>,
}

impl ConverterRegistry {
    /// A registry without any converters.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// A registry holding the built-in converters.
    pub fn builtin() -> Self {
        Self::empty()
            .with("int", IntConverter)
            .with("float", FloatConverter)
            .with("boolean", BooleanConverter)
            .with("user", UserConverter)
            .with("member", MemberConverter)
            .with("channel", ChannelConverter)
    }

    /// Registers `converter` under `name`, returning the converter it replaced.
    ///
    /// Registering under the reserved name is ignored.
    pub fn register<C>(&mut self, name: impl Into<String>, converter: C) -> Option<BoxedConverter>
    where
        C: Converter + 'static,
    {
        self.register_arc(name, Arc::new(converter))
    }

    /// Like [`register`](Self::register) for an already shared converter.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        converter: BoxedConverter,
    ) -> Option<BoxedConverter> {
        let name = name.into();
        if name == RESERVED_CONVERTER {
            warn!(name = %name, "Refusing to register a converter under the reserved name");
            return None;
        }
        self.converters.insert(name, converter)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<C>(mut self, name: impl Into<String>, converter: C) -> Self
    where
        C: Converter + 'static,
    {
        self.register(name, converter);
        self
    }

    /// Adds every entry of `extra`, overriding built-ins on collision.
    pub fn extend<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (S, BoxedConverter)>,
        S: Into<String>,
    {
        for (name, converter) in extra {
            self.register_arc(name, converter);
        }
    }

    /// Looks up a converter. The reserved name never resolves.
    pub fn resolve(&self, name: &str) -> Option<BoxedConverter> {
        if name == RESERVED_CONVERTER {
            return None;
        }
        self.converters.get(name).cloned()
    }

    /// Resolves `ty` and converts `token` with it.
    ///
    /// Unknown or reserved type names fail with
    /// [`CommandError::ArgumentParsing`].
    pub fn convert(&self, ty: &str, token: &str, ctx: &ConvertContext<'_>) -> CommandResult<Value> {
        let converter = self
            .resolve(ty)
            .ok_or_else(|| CommandError::argument_parsing("Unknown converter."))?;
        converter.convert(token, ctx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("names", &self.names())
            .finish()
    }
}
