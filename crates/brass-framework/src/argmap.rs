//! Argument-map compiler.
//!
//! An argument map is a compact description of the arguments a command
//! takes:
//!
//! | Unit          | Meaning                                          |
//! |---------------|--------------------------------------------------|
//! | `<name>`      | required, raw string                             |
//! | `[name]`      | optional, raw string                             |
//! | `<name:int>`  | required, converted with the `int` converter     |
//! | `[name:user]` | optional, converted with the `user` converter    |
//! | `<name...>`   | rest argument: every remaining token, joined     |
//!
//! The map is scanned for units left to right; text between units is
//! ignored. Ordering, optionality and name uniqueness are not validated, so
//! `"<a...> <b>"` compiles even though `b` can never be filled.
//!
//! ```rust,ignore
//! let spec = ArgSpec::compile("<name> [times:int]")?;
//! assert_eq!(spec.len(), 2);
//! assert_eq!(spec.usage(), "<name> [times:int]");
//! ```

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{CommandError, CommandResult};

static UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.+?>|\[.+?\]").expect("argument unit pattern is valid"));

const REST_SUFFIX: &str = "...";

/// One compiled argument slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentDescriptor {
    /// Key under which the bound value is stored.
    pub name: String,
    /// `true` for `[...]` units.
    pub optional: bool,
    /// Converter key, `None` for a raw string.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// `true` when the name carried the `...` suffix.
    pub rest: bool,
    /// The unit exactly as written, kept for usage strings.
    pub raw: String,
}

impl ArgumentDescriptor {
    fn from_unit(unit: &str) -> Self {
        let optional = unit.starts_with('[') && unit.ends_with(']');
        let inner: String = unit
            .chars()
            .filter(|c| !matches!(c, '<' | '>' | '[' | ']'))
            .collect();

        let (name, ty) = match inner.split_once(':') {
            Some((name, ty)) => (name.trim(), Some(ty.trim())),
            None => (inner.trim(), None),
        };

        let (name, rest) = match name.strip_suffix(REST_SUFFIX) {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };

        Self {
            name: name.to_string(),
            optional,
            ty: ty.filter(|t| !t.is_empty()).map(str::to_string),
            rest,
            raw: unit.to_string(),
        }
    }
}

/// A compiled argument map.
///
/// `NoArguments` is distinct from an empty descriptor list: a command
/// compiled from an empty map is never tokenized or bound, and its handler
/// sees no argument values at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArgSpec {
    #[default]
    NoArguments,
    Arguments(Vec<ArgumentDescriptor>),
}

impl ArgSpec {
    /// Compiles an argument map.
    ///
    /// An empty map yields [`ArgSpec::NoArguments`]. A non-empty map without
    /// a single `<...>` or `[...]` unit is rejected with
    /// [`CommandError::InvalidArgumentMap`].
    pub fn compile(map: &str) -> CommandResult<Self> {
        if map.is_empty() {
            return Ok(Self::NoArguments);
        }

        let descriptors: Vec<_> = UNIT
            .find_iter(map)
            .map(|m| ArgumentDescriptor::from_unit(m.as_str()))
            .collect();

        if descriptors.is_empty() {
            return Err(CommandError::InvalidArgumentMap {
                map: map.to_string(),
            });
        }

        Ok(Self::Arguments(descriptors))
    }

    /// Compiles an optional map; `None` behaves like the empty string.
    pub fn compile_opt(map: Option<&str>) -> CommandResult<Self> {
        Self::compile(map.unwrap_or_default())
    }

    /// Returns `false` for [`ArgSpec::NoArguments`].
    pub fn takes_arguments(&self) -> bool {
        matches!(self, Self::Arguments(_))
    }

    /// The descriptors in binding order (empty for `NoArguments`).
    pub fn descriptors(&self) -> &[ArgumentDescriptor] {
        match self {
            Self::NoArguments => &[],
            Self::Arguments(descriptors) => descriptors,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors().is_empty()
    }

    /// Number of non-optional descriptors.
    pub fn min_required(&self) -> usize {
        self.descriptors().iter().filter(|d| !d.optional).count()
    }

    /// `true` if any descriptor absorbs the remaining tokens.
    pub fn has_rest(&self) -> bool {
        self.descriptors().iter().any(|d| d.rest)
    }

    /// The raw units joined by single spaces, for help output.
    pub fn usage(&self) -> String {
        self.descriptors()
            .iter()
            .map(|d| d.raw.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for ArgSpec {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, optional: bool, ty: Option<&str>, rest: bool, raw: &str) -> ArgumentDescriptor {
        ArgumentDescriptor {
            name: name.into(),
            optional,
            ty: ty.map(Into::into),
            rest,
            raw: raw.into(),
        }
    }

    #[test]
    fn test_optional_arguments() {
        let spec = ArgSpec::compile("[a] [b]").unwrap();
        assert_eq!(
            spec.descriptors(),
            &[desc("a", true, None, false, "[a]"), desc("b", true, None, false, "[b]")]
        );
        assert_eq!(spec.min_required(), 0);
    }

    #[test]
    fn test_required_arguments() {
        let spec = ArgSpec::compile("<a> <b>").unwrap();
        assert_eq!(
            spec.descriptors(),
            &[desc("a", false, None, false, "<a>"), desc("b", false, None, false, "<b>")]
        );
        assert_eq!(spec.min_required(), 2);
    }

    #[test]
    fn test_argument_types() {
        let spec = ArgSpec::compile("<a:thing> <b:other_thing> [c:optional_thing]").unwrap();
        assert_eq!(
            spec.descriptors(),
            &[
                desc("a", false, Some("thing"), false, "<a:thing>"),
                desc("b", false, Some("other_thing"), false, "<b:other_thing>"),
                desc("c", true, Some("optional_thing"), false, "[c:optional_thing]"),
            ]
        );
    }

    #[test]
    fn test_trims_name_and_type() {
        for map in ["<a   :   lol>", "<a:lol   >"] {
            let spec = ArgSpec::compile(map).unwrap();
            let d = &spec.descriptors()[0];
            assert_eq!(d.name, "a");
            assert_eq!(d.ty.as_deref(), Some("lol"));
            assert_eq!(d.raw, map);
        }
    }

    #[test]
    fn test_names_keep_case() {
        let spec = ArgSpec::compile("<userName:Member>").unwrap();
        let d = &spec.descriptors()[0];
        assert_eq!(d.name, "userName");
        assert_eq!(d.ty.as_deref(), Some("Member"));
    }

    #[test]
    fn test_rest_argument() {
        let spec = ArgSpec::compile("<a> <b...>").unwrap();
        assert_eq!(
            spec.descriptors(),
            &[desc("a", false, None, false, "<a>"), desc("b", false, None, true, "<b...>")]
        );
        assert!(spec.has_rest());
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(ArgSpec::compile("").unwrap(), ArgSpec::NoArguments);
        assert_eq!(ArgSpec::compile_opt(None).unwrap(), ArgSpec::NoArguments);
        assert!(!ArgSpec::NoArguments.takes_arguments());
    }

    #[test]
    fn test_invalid_map() {
        let err = ArgSpec::compile(" .  .  . ").unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgumentMap { .. }));
    }

    #[test]
    fn test_surrounding_text_is_ignored() {
        let spec: ArgSpec = "usage: <target:user> then maybe [reason...]".parse().unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.usage(), "<target:user> [reason...]");
        assert!(spec.descriptors()[1].optional);
        assert!(spec.descriptors()[1].rest);
    }

    #[test]
    fn test_permissive_compile() {
        // rest before a required argument, duplicate names: accepted as-is
        let spec = ArgSpec::compile("<a...> <a>").unwrap();
        assert_eq!(spec.len(), 2);
        assert!(spec.descriptors()[0].rest);
        assert_eq!(spec.descriptors()[1].name, "a");
    }

    #[test]
    fn test_empty_type_is_raw() {
        let spec = ArgSpec::compile("<a:>").unwrap();
        assert_eq!(spec.descriptors()[0].ty, None);
    }

    #[test]
    fn test_descriptor_serializes_type_key() {
        let spec = ArgSpec::compile("[n:int]").unwrap();
        let json = serde_json::to_value(&spec.descriptors()[0]).unwrap();
        assert_eq!(json["type"], "int");
        assert_eq!(json["optional"], true);
    }
}
