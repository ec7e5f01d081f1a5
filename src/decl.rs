//! The declaration surface: what the `record!` macro generates and the
//! record compiler consumes.
//!
//! A record type exposes its field list ahead of time through [`Record`],
//! one [`FieldDecl`] per field carrying the field's [`TypeDesc`] and
//! builder configuration. Sub-command unions expose their variants through
//! [`Commands`]. Both traits can be implemented by hand, but the macro is
//! the expected author.

use std::any::TypeId;

use crate::convert::{self, Converter, FromArg, Mapping};
use crate::hydrate::ValueSet;

/// An argument record: a struct whose fields describe a command line.
pub trait Record: Sized + 'static {
    /// The record's doc comment, used as the help description.
    fn doc() -> Option<&'static str> {
        None
    }

    /// The field list, in declaration order.
    fn declarations() -> Vec<FieldDecl>;

    /// Rebuild a typed instance from hydrated values. All field types must
    /// be `Clone`; values are read, not consumed, so included records can
    /// share fields with the record that includes them.
    fn from_values(values: &ValueSet) -> Self;
}

/// A sub-command union: an enum with one variant per command, each carrying
/// a [`Record`] payload.
pub trait Commands: Sized + 'static {
    fn variants() -> Vec<VariantDecl>;

    /// Construct the variant selected on the command line.
    fn from_selection(choice: &str, values: &ValueSet) -> Self;
}

/// One declared field of a record.
pub struct FieldDecl {
    pub(crate) name: &'static str,
    pub(crate) help: Option<String>,
    pub(crate) node: DeclNode,
}

pub(crate) enum DeclNode {
    Arg(ArgDecl),
    Include(IncludeDecl),
    Commands(CommandsDecl),
}

pub(crate) struct IncludeDecl {
    pub(crate) fields: fn() -> Vec<FieldDecl>,
}

pub(crate) struct CommandsDecl {
    pub(crate) optional: bool,
    pub(crate) variants: fn() -> Vec<VariantDecl>,
}

/// The per-argument builder configuration, before type resolution.
pub(crate) struct ArgDecl {
    pub(crate) ty: TypeDesc,
    pub(crate) kind: Option<DeclKind>,
    pub(crate) default: Option<String>,
    pub(crate) conv: Option<ConvDecl>,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) name_override: Option<String>,
    pub(crate) short: Option<String>,
    pub(crate) short_only: bool,
    pub(crate) append: bool,
    pub(crate) at_least_one: bool,
    pub(crate) group: Option<String>,
}

/// The argument kind selected by a builder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Positional,
    Option,
    Flag,
    NoFlag,
    TriFlag,
}

pub(crate) enum ConvDecl {
    /// `converter = f`: one token, converted whole.
    Whole(Converter),
    /// `converter = itemwise(f)`: applied per token of a multi-value
    /// argument.
    Itemwise(Converter),
    /// `map = [..]`: fixed key-to-value mapping, keys are the choices.
    Map(Mapping),
}

impl FieldDecl {
    /// An argument field.
    pub fn arg(name: &'static str, ty: TypeDesc) -> FieldDecl {
        FieldDecl {
            name,
            help: None,
            node: DeclNode::Arg(ArgDecl {
                ty,
                kind: None,
                default: None,
                conv: None,
                choices: None,
                name_override: None,
                short: None,
                short_only: false,
                append: false,
                at_least_one: false,
                group: None,
            }),
        }
    }

    /// A field splicing another record's arguments into this one.
    pub fn include<R: Record>(name: &'static str) -> FieldDecl {
        FieldDecl {
            name,
            help: None,
            node: DeclNode::Include(IncludeDecl { fields: R::declarations }),
        }
    }

    /// The sub-command field.
    pub fn commands<C: Commands>(name: &'static str, optional: bool) -> FieldDecl {
        FieldDecl {
            name,
            help: None,
            node: DeclNode::Commands(CommandsDecl { optional, variants: C::variants }),
        }
    }

    pub fn help(mut self, text: &str) -> FieldDecl {
        self.help = Some(text.to_string());
        self
    }

    pub fn kind(self, kind: DeclKind) -> FieldDecl {
        self.with_arg(|arg| arg.kind = Some(kind))
    }

    pub fn short(self, short: &str) -> FieldDecl {
        let short = short.to_string();
        self.with_arg(|arg| arg.short = Some(short))
    }

    pub fn short_only(self) -> FieldDecl {
        self.with_arg(|arg| arg.short_only = true)
    }

    pub fn default_value(self, value: &str) -> FieldDecl {
        let value = value.to_string();
        self.with_arg(|arg| arg.default = Some(value))
    }

    pub fn name_override(self, name: &str) -> FieldDecl {
        let name = name.to_string();
        self.with_arg(|arg| arg.name_override = Some(name))
    }

    pub fn append(self) -> FieldDecl {
        self.with_arg(|arg| arg.append = true)
    }

    pub fn at_least_one(self) -> FieldDecl {
        self.with_arg(|arg| arg.at_least_one = true)
    }

    pub fn group(self, name: &str) -> FieldDecl {
        let name = name.to_string();
        self.with_arg(|arg| arg.group = Some(name))
    }

    pub fn choices(self, choices: &[&str]) -> FieldDecl {
        let choices = choices.iter().map(|c| c.to_string()).collect();
        self.with_arg(|arg| arg.choices = Some(choices))
    }

    pub fn converter(self, converter: Converter) -> FieldDecl {
        self.with_arg(|arg| arg.conv = Some(ConvDecl::Whole(converter)))
    }

    pub fn itemwise(self, converter: Converter) -> FieldDecl {
        self.with_arg(|arg| arg.conv = Some(ConvDecl::Itemwise(converter)))
    }

    pub fn map_values(self, mapping: Mapping) -> FieldDecl {
        self.with_arg(|arg| arg.conv = Some(ConvDecl::Map(mapping)))
    }

    fn with_arg(mut self, f: impl FnOnce(&mut ArgDecl)) -> FieldDecl {
        match &mut self.node {
            DeclNode::Arg(arg) => f(arg),
            _ => panic!("argrec: builder option on non-argument field `{}`", self.name),
        }
        self
    }
}

/// One variant of a sub-command union.
pub struct VariantDecl {
    pub(crate) name: &'static str,
    pub(crate) help: Option<String>,
    pub(crate) doc: fn() -> Option<&'static str>,
    pub(crate) fields: fn() -> Vec<FieldDecl>,
}

impl VariantDecl {
    pub fn new<R: Record>(name: &'static str) -> VariantDecl {
        VariantDecl { name, help: None, doc: R::doc, fields: R::declarations }
    }

    pub fn help(mut self, text: &str) -> VariantDecl {
        self.help = Some(text.to_string());
        self
    }
}

/// The declared type of a field, reduced to the shape the resolver works
/// on: an optionality/list wrapper around a scalar, or a flag shape.
pub struct TypeDesc {
    pub(crate) shape: Shape,
    pub(crate) scalar: Option<ScalarTy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `bool`: a flag.
    Bool,
    /// `Option<bool>`: a tri-state flag pair.
    TriBool,
    /// A scalar, exactly one value.
    One,
    /// `Option<T>`: a scalar that may be absent.
    Opt,
    /// `Vec<T>`: multiple values.
    Many,
}

pub(crate) struct ScalarTy {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) convert: Option<Converter>,
    pub(crate) choices: Option<Vec<String>>,
}

impl TypeDesc {
    /// A plain `bool` field.
    pub fn boolean() -> TypeDesc {
        TypeDesc { shape: Shape::Bool, scalar: None }
    }

    /// An `Option<bool>` field.
    pub fn tri_state() -> TypeDesc {
        TypeDesc { shape: Shape::TriBool, scalar: None }
    }

    /// A scalar with a derived converter.
    pub fn scalar<T: FromArg>() -> TypeDesc {
        TypeDesc {
            shape: Shape::One,
            scalar: Some(ScalarTy {
                id: TypeId::of::<T>(),
                name: std::any::type_name::<T>(),
                convert: Some(convert::scalar_converter::<T>()),
                choices: T::choices(),
            }),
        }
    }

    /// A scalar whose conversion comes entirely from `converter =` or
    /// `map = [..]`; the type itself contributes nothing.
    pub fn custom<T: 'static>() -> TypeDesc {
        TypeDesc {
            shape: Shape::One,
            scalar: Some(ScalarTy {
                id: TypeId::of::<T>(),
                name: std::any::type_name::<T>(),
                convert: None,
                choices: None,
            }),
        }
    }

    /// Wrap in `Option<..>`.
    pub fn optional(mut self) -> TypeDesc {
        self.shape = match self.shape {
            Shape::Bool => Shape::TriBool,
            Shape::One => Shape::Opt,
            // The optional wrapper adds nothing over the list shapes.
            other => other,
        };
        self
    }

    /// Wrap in `Vec<..>`.
    pub fn list(mut self) -> TypeDesc {
        self.shape = Shape::Many;
        self
    }

    pub(crate) fn is_string(&self) -> bool {
        self.scalar.as_ref().map_or(false, |s| s.id == TypeId::of::<String>())
    }
}
