//! Option descriptors and the table handed to the parser.
//!
//! A descriptor is declarative: names, value requirements, help text and a
//! destination [`Slot`] borrowed from the caller. The parser reads every
//! field and writes nothing but the slot.

use std::collections::HashSet;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Help-section heading; never matched.
    Group,
    Switch,
    String,
    /// String value resolved against the parser's prefix when relative.
    Filename,
}

/// Destination owned by the caller, written in place by the parser.
#[derive(Debug)]
pub enum Slot<'a> {
    /// Receives the descriptor's "on" value, or `0` when negated.
    Switch(&'a mut i32),
    /// Receives `true`, or `false` when negated.
    Flag(&'a mut bool),
    /// Receives the value; negation resets it to `None`.
    Str(&'a mut Option<String>),
}

// ============================================================================
// Opt: option builder
// ============================================================================

#[derive(Debug)]
pub struct Opt<'a> {
    pub(crate) kind: OptionKind,
    pub(crate) long_name: String,
    pub(crate) short_name: Option<char>,
    pub(crate) slot: Option<Slot<'a>>,
    pub(crate) on_value: i32,
    pub(crate) default_value: Option<String>,
    pub(crate) description: String,
    pub(crate) arg_description: Option<String>,
    pub(crate) flags_negatable: bool,
    pub(crate) flags_noarg: bool,
    pub(crate) flags_optional: bool,
    pub(crate) flags_raw_argh: bool,
}

impl<'a> Opt<'a> {
    fn with_kind(kind: OptionKind, name: &str, slot: Option<Slot<'a>>) -> Self {
        Opt {
            kind,
            long_name: name.to_string(),
            short_name: None,
            slot,
            on_value: 1,
            default_value: None,
            description: String::new(),
            arg_description: None,
            flags_negatable: false,
            flags_noarg: kind == OptionKind::Switch,
            flags_optional: false,
            flags_raw_argh: false,
        }
    }

    /// Integer switch. An empty `name` declares a short-only option.
    pub fn switch(name: &str, slot: &'a mut i32) -> Self {
        Self::with_kind(OptionKind::Switch, name, Some(Slot::Switch(slot)))
    }

    /// Boolean switch.
    pub fn flag(name: &str, slot: &'a mut bool) -> Self {
        Self::with_kind(OptionKind::Switch, name, Some(Slot::Flag(slot)))
    }

    pub fn string(name: &str, slot: &'a mut Option<String>) -> Self {
        Self::with_kind(OptionKind::String, name, Some(Slot::Str(slot)))
    }

    pub fn filename(name: &str, slot: &'a mut Option<String>) -> Self {
        Self::with_kind(OptionKind::Filename, name, Some(Slot::Str(slot)))
    }

    /// Section heading for the help output.
    pub fn group(heading: &str) -> Self {
        let mut opt = Self::with_kind(OptionKind::Group, "", None);
        opt.description = heading.to_string();
        opt
    }

    pub fn short(mut self, c: char) -> Self {
        self.short_name = Some(c);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Placeholder shown after the option name in help output.
    pub fn arg_description(mut self, argh: &str) -> Self {
        self.arg_description = Some(argh.to_string());
        self
    }

    /// Value a switch writes when given (defaults to 1).
    pub fn set_val(mut self, v: i32) -> Self {
        self.on_value = v;
        self
    }

    /// Value an optional-argument option writes when given bare.
    pub fn default_val(mut self, v: &str) -> Self {
        self.default_value = Some(v.to_string());
        self
    }

    /// Accept the `--no-<name>` form.
    pub fn negatable(mut self) -> Self {
        self.flags_negatable = true;
        self
    }

    /// Reject `--name=value`.
    pub fn no_arg(mut self) -> Self {
        self.flags_noarg = true;
        self
    }

    /// Take a value only when attached (`--name=value`, `-cvalue`).
    pub fn optional(mut self) -> Self {
        self.flags_optional = true;
        self
    }

    /// Print the placeholder verbatim, without `<>`.
    pub fn raw_arg_description(mut self) -> Self {
        self.flags_raw_argh = true;
        self
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn long_name(&self) -> Option<&str> {
        if self.long_name.is_empty() {
            None
        } else {
            Some(&self.long_name)
        }
    }

    pub fn short_name(&self) -> Option<char> {
        self.short_name
    }

    pub(crate) fn takes_value(&self) -> bool {
        matches!(self.kind, OptionKind::String | OptionKind::Filename)
    }

    pub(crate) fn is_group(&self) -> bool {
        self.kind == OptionKind::Group
    }

    /// Name as the user spelled it: `name`, or its negated counterpart.
    /// A negatable option declared as `no-x` negates to `x`.
    pub(crate) fn invoked_name(&self, negated: bool) -> String {
        if !negated {
            return self.long_name.clone();
        }
        match self.long_name.strip_prefix("no-") {
            Some(positive) => positive.to_string(),
            None => format!("no-{}", self.long_name),
        }
    }
}

// ============================================================================
// OptionTable
// ============================================================================

#[derive(Debug, Default)]
pub struct OptionTable<'a> {
    entries: Vec<Opt<'a>>,
}

impl<'a> OptionTable<'a> {
    pub fn new() -> Self {
        OptionTable {
            entries: Vec::new(),
        }
    }

    pub fn option(mut self, opt: Opt<'a>) -> Self {
        self.entries.push(opt);
        self
    }

    pub fn group(self, heading: &str) -> Self {
        self.option(Opt::group(heading))
    }

    pub fn entries(&self) -> &[Opt<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry_mut(&mut self, idx: usize) -> &mut Opt<'a> {
        &mut self.entries[idx]
    }

    /// Whether a matchable option is declared under `name`.
    pub(crate) fn has_long(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|o| !o.is_group() && o.long_name == name)
    }

    /// Check the declaration invariants before any token is examined.
    pub fn validate(&self) -> Result<()> {
        let mut shorts = HashSet::new();
        let mut pairs = HashSet::new();

        for (idx, opt) in self.entries.iter().enumerate() {
            if opt.is_group() {
                continue;
            }
            if opt.long_name.is_empty() && opt.short_name.is_none() {
                return Err(Error::BadTable(format!(
                    "option #{} has neither a short nor a long name",
                    idx
                )));
            }
            if opt.long_name.starts_with('-') || opt.long_name.contains('=') {
                return Err(Error::BadTable(format!(
                    "invalid long name '{}'",
                    opt.long_name
                )));
            }
            if let Some(c) = opt.short_name {
                if c == '-' || c.is_whitespace() {
                    return Err(Error::BadTable(format!("invalid switch '{}'", c)));
                }
                if !shorts.insert(c) {
                    return Err(Error::BadTable(format!("switch '{}' declared twice", c)));
                }
            }
            if !pairs.insert((opt.short_name, opt.long_name.as_str())) {
                return Err(Error::BadTable(format!(
                    "option '{}' declared twice",
                    opt.long_name
                )));
            }
        }

        Ok(())
    }
}
