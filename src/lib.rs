//! Declarative, record-based command line argument parsing.
//!
//! Declare a record whose fields describe your command line, and parse
//! straight into it:
//!
//! ```
//! argrec::record! {
//!     /// Frobnicate a workspace.
//!     struct Args {
//!         /// Path to the workspace root.
//!         workspace: String = positional(),
//!         /// Number of parallel jobs.
//!         jobs: Option<u32> = option("-j"),
//!         /// Be chatty about it.
//!         verbose: bool = flag("-v"),
//!     }
//! }
//!
//! let args = Args::from_vec(vec![".".into(), "-j".into(), "4".into()]).unwrap();
//! assert_eq!(args.workspace, ".");
//! assert_eq!(args.jobs, Some(4));
//! assert!(!args.verbose);
//! ```
//!
//! Field types drive the argument shape: `bool` fields are flags,
//! `Option<bool>` fields are tri-state `--x`/`--no-x` pairs, `Vec<T>` fields
//! accept multiple values, `Option<T>` fields are optional, and everything
//! else is a required argument converted with [`FromArg`]. Builder calls
//! (`positional()`, `option()`, `flag()`, `no_flag()`, `tri_flag()`,
//! `subcommand()`, `include()`) select the argument kind and carry the
//! remaining configuration; bare annotations default to `--options`.
//!
//! Sub-commands are plain enums declared in the same macro, one variant per
//! command; the selected variant is an ordinary pattern match. Records can
//! embed other records with `include()`, splicing their arguments into one
//! flat command line.

use std::collections::BTreeMap;
use std::ffi::OsString;

pub use argrec_macros::record;

pub mod convert;
pub mod decl;
pub mod spec;

mod adapter;
mod compile;
mod engine;
mod hydrate;
mod resolve;

pub use compile::spec_of;
pub use convert::FromArg;
pub use decl::{Commands, Record};
pub use hydrate::ValueSet;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong, from a bad record declaration to a bad
/// command line.
///
/// [`Declaration`](Error::Declaration) and
/// [`UnsupportedType`](Error::UnsupportedType) are programmer errors: they
/// surface the first time a record type is compiled and never at parse
/// time. The remaining variants are per-invocation user input errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Declaration(String),
    #[error("{0}")]
    UnsupportedType(String),
    #[error("invalid value for `{arg}`: {message}")]
    InvalidValue { arg: String, message: String },
    #[error("invalid choice `{value}` for `{arg}`, expected one of {}", .choices.join(", "))]
    InvalidChoice { arg: String, value: String, choices: Vec<String> },
    #[error("argument `{second}` is not allowed with `{first}`")]
    MutuallyExclusive { first: String, second: String },
    #[error("argument `{arg}` is required")]
    MissingRequired { arg: String },
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Help(String),
}

impl Error {
    pub fn is_help(&self) -> bool {
        matches!(self, Error::Help(_))
    }

    /// Report the error the way a command line tool is expected to: help
    /// goes to stdout with exit code 0, user errors go to stderr with exit
    /// code 2. Declaration errors panic, they are bugs in the declaring
    /// program rather than in the command line.
    pub fn exit(self) -> ! {
        match &self {
            Error::Help(text) => {
                println!("{text}");
                std::process::exit(0)
            }
            Error::Declaration(_) | Error::UnsupportedType(_) => panic!("{self}"),
            _ => {
                eprintln!("error: {self}");
                eprintln!("run with `--help` for full usage");
                std::process::exit(2)
            }
        }
    }
}

/// Caller-supplied defaults, layered over the compiled ones before parsing.
///
/// Values are written as strings and run through the field's converter, so
/// an override behaves exactly like a declared `default =`. An overridden
/// flag is removed from the parser entirely and always resolves to the
/// override; an overridden value argument stops being required but still
/// yields to tokens actually present on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: BTreeMap<String, String>,
}

impl Overrides {
    pub fn new() -> Overrides {
        Overrides::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Overrides {
        self.values.insert(name.into(), value.into());
        self
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Parse the given token sequence into `T`.
pub fn from_vec<T: Record>(args: Vec<OsString>) -> Result<T> {
    from_vec_with(args, &Overrides::default())
}

/// Parse the given token sequence into `T`, with overridden defaults.
pub fn from_vec_with<T: Record>(args: Vec<OsString>, overrides: &Overrides) -> Result<T> {
    let spec = compile::spec_of::<T>()?;
    let out = adapter::invoke(&spec, args, overrides)?;
    hydrate::hydrate::<T>(&spec, &out, overrides)
}

/// Parse the process arguments into `T`.
pub fn from_env<T: Record>() -> Result<T> {
    let mut args = std::env::args_os().collect::<Vec<_>>();
    if !args.is_empty() {
        args.remove(0);
    }
    from_vec(args)
}

/// Parse the process arguments into `T`, reporting failure via
/// [`Error::exit`].
pub fn from_env_or_exit<T: Record>() -> T {
    from_env().unwrap_or_else(|err| err.exit())
}

/// Render the help text for `T`, the same text `--help` prints.
pub fn help_text<T: Record>() -> Result<String> {
    let spec = compile::spec_of::<T>()?;
    adapter::render_help(&spec)
}

/// Declare a closed, string-backed value enumeration usable as an argument
/// type. The generated [`FromArg`] implementation maps command line tokens
/// to variants and reports the variant values as choices, so unknown input
/// fails with an invalid-choice error and `--help` lists the alternatives.
///
/// ```
/// argrec::value_enum! {
///     enum Outcome {
///         Pass = "pass",
///         Fail = "fail",
///     }
/// }
/// ```
#[macro_export]
macro_rules! value_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $crate::FromArg for $name {
            fn from_arg(value: &str) -> ::std::result::Result<Self, ::std::string::String> {
                match value {
                    $($text => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(
                        ::std::format!("expected one of {}", [$($text),+].join(", ")),
                    ),
                }
            }

            fn choices() -> ::std::option::Option<::std::vec::Vec<::std::string::String>> {
                ::std::option::Option::Some(::std::vec![$(::std::string::String::from($text)),+])
            }
        }
    };
}
