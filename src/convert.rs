//! String-to-value conversion for argument types.

use std::any::Any;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// A converted argument value, type-erased until the generated record code
/// reads it back out.
pub type Value = Box<dyn Any>;

/// A type-erased `str -> value` conversion, applied by the hydrator after
/// the engine has matched tokens to arguments.
pub type Converter = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Conversion from a command line token.
///
/// Implemented for the usual scalar suspects below; [`value_enum!`] derives
/// it for string-backed enumerations, populating [`choices`] from the
/// variant values. Custom types can implement it directly or stay on
/// `FromStr` and be wired up with `converter = argrec::convert::from_str`.
///
/// [`value_enum!`]: crate::value_enum
/// [`choices`]: FromArg::choices
pub trait FromArg: Sized + 'static {
    fn from_arg(value: &str) -> Result<Self, String>;

    /// The closed set of accepted tokens, if there is one.
    fn choices() -> Option<Vec<String>> {
        None
    }
}

impl FromArg for String {
    fn from_arg(value: &str) -> Result<String, String> {
        Ok(value.to_string())
    }
}

impl FromArg for PathBuf {
    fn from_arg(value: &str) -> Result<PathBuf, String> {
        Ok(PathBuf::from(value))
    }
}

impl FromArg for OsString {
    fn from_arg(value: &str) -> Result<OsString, String> {
        Ok(OsString::from(value))
    }
}

impl FromArg for regex::Regex {
    fn from_arg(value: &str) -> Result<regex::Regex, String> {
        regex::Regex::new(value).map_err(|err| err.to_string())
    }
}

macro_rules! from_str_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                fn from_arg(value: &str) -> Result<$ty, String> {
                    from_str(value)
                }
            }
        )*
    };
}

from_str_arg![
    char,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
    std::net::IpAddr, std::net::Ipv4Addr, std::net::Ipv6Addr, std::net::SocketAddr,
];

/// Adapt any `FromStr` type for use with `converter =`.
pub fn from_str<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|err| err.to_string())
}

/// Comma-separated values in a single token, e.g. `--ints 1,2,3`.
///
/// A whole-value converter: on a `Vec<T>` field it makes the argument
/// consume one token and produce the entire vector.
pub fn csv<T: FromArg>(value: &str) -> Result<Vec<T>, String> {
    value.split(',').map(T::from_arg).collect()
}

/// Erase a typed conversion function into a [`Converter`]. Used by the
/// generated code for `converter =` declarations.
pub fn erase<T, E, F>(f: F) -> Converter
where
    T: 'static,
    E: fmt::Display,
    F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
{
    Arc::new(move |value| match f(value) {
        Ok(v) => Ok(Box::new(v) as Value),
        Err(err) => Err(err.to_string()),
    })
}

pub(crate) fn scalar_converter<T: FromArg>() -> Converter {
    Arc::new(|value| T::from_arg(value).map(|v| Box::new(v) as Value))
}

/// A fixed key-to-value mapping argument, built by `map = [..]`
/// declarations: the command line supplies a key, the argument yields the
/// mapped value, and the keys double as the choices.
pub struct Mapping {
    pub(crate) convert: Converter,
    pub(crate) keys: Vec<String>,
}

/// Build a [`Mapping`] from literal pairs. Used by the generated code.
pub fn mapping<T: Clone + Send + Sync + 'static>(pairs: Vec<(&'static str, T)>) -> Mapping {
    let keys = pairs.iter().map(|(k, _)| k.to_string()).collect();
    let convert: Converter = Arc::new(move |value| {
        match pairs.iter().find(|(k, _)| *k == value) {
            Some((_, v)) => Ok(Box::new(v.clone()) as Value),
            None => Err(format!("unknown key `{value}`")),
        }
    });
    Mapping { convert, keys }
}
