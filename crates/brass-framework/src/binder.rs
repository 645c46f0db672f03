//! Argument binding.
//!
//! [`bind`] walks a compiled [`ArgSpec`] and a token list in lockstep and
//! produces the named values a handler receives:
//!
//! 1. `NoArguments` binds nothing and returns `None`.
//! 2. Fewer tokens than required descriptors fails with
//!    [`CommandError::RequiredArgumentMissing`], naming the descriptor at
//!    index `tokens.len()`.
//! 3. More tokens than descriptors fails with
//!    [`CommandError::TooManyArguments`] unless a rest descriptor exists.
//! 4. Descriptors consume one token each, in order; a rest descriptor takes
//!    every remaining token joined by single spaces and ends binding; a typed
//!    descriptor converts its (trimmed) token through the registry.
//! 5. Binding stops when the tokens run out. Descriptors left over produce
//!    no entries.

use std::any::Any;

use crate::argmap::ArgSpec;
use crate::converter::{ConvertContext, ConverterRegistry, FromValue, Value};
use crate::error::{CommandError, CommandResult};

/// Bound argument values in descriptor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name`. An existing entry with the same name is
    /// overwritten in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// The raw value bound to `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The value bound to `name`, converted to `T`.
    ///
    /// Returns `None` if nothing is bound or the value has another type.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.value(name).and_then(T::from_value)
    }

    /// Shorthand for a raw string argument.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_text)
    }

    /// Borrows a custom converter's payload.
    pub fn get_other<T: Any>(&self, name: &str) -> Option<&T> {
        self.value(name).and_then(Value::downcast_ref::<T>)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    /// Values in descriptor order, for positional use.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// `(name, value)` pairs in descriptor order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// Binds `tokens` against `spec`.
///
/// Returns `Ok(None)` for [`ArgSpec::NoArguments`].
pub fn bind(
    spec: &ArgSpec,
    tokens: Vec<String>,
    registry: &ConverterRegistry,
    ctx: &ConvertContext<'_>,
) -> CommandResult<Option<Arguments>> {
    let ArgSpec::Arguments(descriptors) = spec else {
        return Ok(None);
    };

    if tokens.len() < spec.min_required() {
        let name = descriptors
            .get(tokens.len())
            .map(|d| d.name.clone())
            .unwrap_or_default();
        return Err(CommandError::RequiredArgumentMissing { name });
    }

    if !spec.has_rest() && tokens.len() > descriptors.len() {
        return Err(CommandError::TooManyArguments);
    }

    let mut args = Arguments::new();
    let mut tokens = tokens.into_iter();

    for descriptor in descriptors {
        if tokens.len() == 0 {
            break;
        }

        if descriptor.rest {
            let rest: Vec<String> = tokens.by_ref().collect();
            args.insert(descriptor.name.clone(), Value::Text(rest.join(" ")));
            break;
        }

        let Some(token) = tokens.next() else {
            break;
        };

        let value = match &descriptor.ty {
            Some(ty) => registry.convert(ty, token.trim(), ctx)?,
            None => Value::Text(token),
        };
        args.insert(descriptor.name.clone(), value);
    }

    Ok(Some(args))
}
