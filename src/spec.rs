//! The compiled argument specification model.
//!
//! Everything here is immutable once built: one [`RecordSpec`] per declared
//! record type, constructed by the record compiler, memoized for the
//! process lifetime and shared by every parse invocation.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::convert::Converter;
use crate::decl::Shape;

/// How many tokens or occurrences an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    OptionalSingle,
    ZeroOrMore,
    OneOrMore,
    /// Repeatable, one value per occurrence, accumulated.
    Append,
}

impl Arity {
    pub(crate) fn is_variable(self) -> bool {
        matches!(self, Arity::ZeroOrMore | Arity::OneOrMore)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Option,
    Flag,
}

/// One compiled argument. Tri-state flags compile into two `ArgSpec`s
/// sharing one `name`, with opposite `polarity`, inside an implicit
/// mutually-exclusive group.
pub struct ArgSpec {
    /// Declared field name; the key in the flat result namespace.
    pub(crate) name: String,
    /// What the argument looks like on the command line: `--jobs`,
    /// `workspace`, or the bare short form for short-only options.
    pub(crate) display: String,
    pub(crate) kind: ArgKind,
    pub(crate) arity: Arity,
    pub(crate) shape: Shape,
    pub(crate) takes_value: bool,
    /// The value a flag stores when present.
    pub(crate) polarity: bool,
    /// Member of a tri-state pair.
    pub(crate) tri: bool,
    /// Whether the converter applies per token rather than once.
    pub(crate) itemwise: bool,
    pub(crate) converter: Option<Converter>,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) required: bool,
    /// Raw default, converted at hydration time.
    pub(crate) default: Option<String>,
    pub(crate) short: Option<String>,
    pub(crate) metavar: Option<String>,
    pub(crate) help: Option<String>,
}

impl fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgSpec")
            .field("name", &self.name)
            .field("display", &self.display)
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("choices", &self.choices)
            .field("short", &self.short)
            .field("polarity", &self.polarity)
            .field("tri", &self.tri)
            .finish_non_exhaustive()
    }
}

/// A set of arguments of which at most one may be supplied.
#[derive(Debug)]
pub struct MutexGroup {
    /// Indices into [`RecordSpec::args`].
    pub(crate) members: Vec<usize>,
}

/// A declared record type's compiled shape.
pub struct RecordSpec {
    pub(crate) doc: Option<String>,
    pub(crate) args: Vec<ArgSpec>,
    pub(crate) groups: Vec<MutexGroup>,
    pub(crate) subcommand: Option<SubcommandSpec>,
}

impl fmt::Debug for RecordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSpec")
            .field("args", &self.args)
            .field("groups", &self.groups)
            .field("subcommand", &self.subcommand)
            .finish()
    }
}

/// The sub-command field of a record: a union of variant records, each
/// bound to a command name.
pub struct SubcommandSpec {
    /// The field name; the selection key in the flat result namespace.
    pub(crate) name: String,
    /// Whether omitting the sub-command is allowed.
    pub(crate) optional: bool,
    pub(crate) variants: Vec<VariantSpec>,
}

impl fmt::Debug for SubcommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubcommandSpec")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("variants", &self.variants)
            .finish()
    }
}

pub struct VariantSpec {
    pub(crate) name: String,
    pub(crate) help: Option<String>,
    pub(crate) spec: Arc<RecordSpec>,
}

impl fmt::Debug for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantSpec")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish()
    }
}

impl RecordSpec {
    /// All result-namespace names of this spec and its sub-command
    /// subtrees. The namespace is flat, which is why ancestor collisions
    /// are a declaration error.
    pub(crate) fn collect_names(&self, names: &mut BTreeSet<String>) {
        for arg in &self.args {
            names.insert(arg.name.clone());
        }
        if let Some(sub) = &self.subcommand {
            names.insert(sub.name.clone());
            for variant in &sub.variants {
                variant.spec.collect_names(names);
            }
        }
    }
}
