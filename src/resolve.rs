//! The type resolver: derives an argument's kind, arity, converter and
//! choices from its declared type and builder configuration.

use crate::decl::{ArgDecl, ConvDecl, DeclKind, Shape};
use crate::spec::{ArgKind, ArgSpec, Arity};
use crate::{Error, Result};

#[derive(Debug)]
pub(crate) struct Resolved {
    /// One spec, or two for a tri-state pair.
    pub(crate) specs: Vec<ArgSpec>,
    pub(crate) group: Option<String>,
}

pub(crate) fn resolve(name: &str, help: Option<String>, decl: ArgDecl) -> Result<Resolved> {
    let kind = decl.kind.unwrap_or(match decl.ty.shape {
        Shape::Bool => DeclKind::Flag,
        Shape::TriBool => DeclKind::TriFlag,
        _ => DeclKind::Option,
    });

    match kind {
        DeclKind::Flag | DeclKind::NoFlag | DeclKind::TriFlag => resolve_flag(name, help, decl, kind),
        DeclKind::Positional | DeclKind::Option => resolve_value(name, help, decl, kind),
    }
}

fn resolve_flag(name: &str, help: Option<String>, decl: ArgDecl, kind: DeclKind) -> Result<Resolved> {
    if decl.default.is_some() {
        return Err(Error::Declaration(format!("defaults don't make sense for flag `{name}`")));
    }
    if decl.conv.is_some() || decl.choices.is_some() {
        return Err(Error::Declaration(format!(
            "flag `{name}` takes no converter or choices"
        )));
    }
    if decl.append || decl.at_least_one || decl.name_override.is_some() {
        return Err(Error::Declaration(format!("unsupported builder option for flag `{name}`")));
    }

    let hyphenated = hyphenate(name);
    let specs = match kind {
        DeclKind::Flag | DeclKind::NoFlag => {
            if decl.ty.shape != Shape::Bool {
                return Err(Error::Declaration(format!("flag `{name}` must be typed `bool`")));
            }
            let short = check_short(name, decl.short.as_deref(), decl.short_only)?;
            let long = match kind {
                DeclKind::NoFlag => format!("--no-{hyphenated}"),
                _ => format!("--{hyphenated}"),
            };
            let display = if decl.short_only {
                short.clone().unwrap_or(long.clone())
            } else {
                long
            };
            vec![flag_spec(name, display, short, kind == DeclKind::Flag, false, help)]
        }
        DeclKind::TriFlag => {
            if decl.ty.shape != Shape::TriBool {
                return Err(Error::Declaration(format!(
                    "tri-state flag `{name}` must be typed `Option<bool>`"
                )));
            }
            if decl.short.is_some() || decl.short_only {
                return Err(Error::Declaration(format!(
                    "tri-state flag `{name}` can't have a short form"
                )));
            }
            vec![
                flag_spec(name, format!("--{hyphenated}"), None, true, true, help.clone()),
                flag_spec(name, format!("--no-{hyphenated}"), None, false, true, help),
            ]
        }
        _ => unreachable!(),
    };

    Ok(Resolved { specs, group: decl.group })
}

fn flag_spec(
    name: &str,
    display: String,
    short: Option<String>,
    polarity: bool,
    tri: bool,
    help: Option<String>,
) -> ArgSpec {
    ArgSpec {
        name: name.to_string(),
        display,
        kind: ArgKind::Flag,
        arity: Arity::Single,
        shape: if tri { Shape::TriBool } else { Shape::Bool },
        takes_value: false,
        polarity,
        tri,
        itemwise: false,
        converter: None,
        choices: None,
        required: false,
        default: None,
        short,
        metavar: None,
        help,
    }
}

fn resolve_value(name: &str, help: Option<String>, decl: ArgDecl, kind: DeclKind) -> Result<Resolved> {
    // A bool can only yield a value through an explicit converter.
    let shape = match decl.ty.shape {
        Shape::Bool | Shape::TriBool if decl.conv.is_none() => {
            return Err(Error::UnsupportedType(format!(
                "argument `{name}` yielding a value can't be typed as `bool`"
            )));
        }
        Shape::Bool => Shape::One,
        Shape::TriBool => Shape::Opt,
        other => other,
    };

    if decl.append && decl.at_least_one {
        return Err(Error::Declaration(format!(
            "`append` is incompatible with `at_least_one` for `{name}`"
        )));
    }
    if (decl.append || decl.at_least_one) && shape != Shape::Many {
        return Err(Error::Declaration(format!(
            "`append` and `at_least_one` require a `Vec` field for `{name}`"
        )));
    }

    // Choices come from exactly one place: the value type, an explicit
    // list on a String field, or the keys of a map.
    let scalar_choices = decl.ty.scalar.as_ref().and_then(|s| s.choices.clone());
    let mut choices = match (&decl.choices, &scalar_choices) {
        (Some(_), Some(_)) => {
            return Err(Error::Declaration(format!(
                "choices for `{name}` are derived from its value type"
            )));
        }
        (Some(explicit), None) => {
            if !decl.ty.is_string() {
                return Err(Error::Declaration(format!(
                    "explicit choices require a `String` field for `{name}`"
                )));
            }
            Some(explicit.clone())
        }
        (None, derived) => derived.clone(),
    };

    let (converter, itemwise, whole) = match decl.conv {
        None => {
            let derived = decl.ty.scalar.as_ref().and_then(|s| s.convert.clone());
            match derived {
                Some(c) => (Some(c), shape == Shape::Many, false),
                None => {
                    let ty = decl.ty.scalar.as_ref().map_or("?", |s| s.name);
                    return Err(Error::UnsupportedType(format!(
                        "no conversion for type `{ty}` of `{name}`; provide `converter =`"
                    )));
                }
            }
        }
        Some(ConvDecl::Whole(c)) => {
            if decl.append || decl.at_least_one {
                return Err(Error::Declaration(format!(
                    "a whole-value `converter` is incompatible with `append` and `at_least_one` for `{name}`"
                )));
            }
            (Some(c), false, true)
        }
        Some(ConvDecl::Itemwise(c)) => {
            if shape != Shape::Many {
                return Err(Error::Declaration(format!(
                    "`itemwise` converter requires a `Vec` field for `{name}`"
                )));
            }
            (Some(c), true, false)
        }
        Some(ConvDecl::Map(m)) => {
            if choices.is_some() {
                return Err(Error::Declaration(format!(
                    "`map` and explicit choices conflict for `{name}`"
                )));
            }
            choices = Some(m.keys);
            (Some(m.convert), shape == Shape::Many, false)
        }
    };

    let arity = match shape {
        Shape::One => {
            if kind == DeclKind::Positional && decl.default.is_some() {
                Arity::OptionalSingle
            } else {
                Arity::Single
            }
        }
        Shape::Opt => Arity::OptionalSingle,
        Shape::Many => {
            if whole {
                Arity::Single
            } else if decl.append {
                Arity::Append
            } else if decl.at_least_one {
                Arity::OneOrMore
            } else {
                Arity::ZeroOrMore
            }
        }
        Shape::Bool | Shape::TriBool => unreachable!(),
    };

    let required = match arity {
        Arity::Single | Arity::OneOrMore | Arity::Append => decl.default.is_none(),
        Arity::OptionalSingle | Arity::ZeroOrMore => false,
    };

    if let (Some(default), Some(choices)) = (&decl.default, &choices) {
        if !choices.iter().any(|c| c == default) {
            return Err(Error::Declaration(format!(
                "default `{default}` for `{name}` is not one of the choices"
            )));
        }
    }

    if decl.group.is_some() && required {
        return Err(Error::Declaration(format!(
            "argument `{name}` in mutually exclusive group has to have a default"
        )));
    }

    let hyphenated = hyphenate(name);
    let (display, short, metavar) = match kind {
        DeclKind::Positional => {
            if decl.short.is_some() || decl.short_only {
                return Err(Error::Declaration(format!(
                    "positional `{name}` can't have a short form"
                )));
            }
            let display = decl.name_override.clone().unwrap_or(hyphenated);
            (display, None, None)
        }
        DeclKind::Option => {
            let short = check_short(name, decl.short.as_deref(), decl.short_only)?;
            let long = format!("--{}", decl.name_override.clone().unwrap_or(hyphenated));
            let display = if decl.short_only { short.clone().unwrap_or(long.clone()) } else { long };
            let metavar = decl
                .name_override
                .as_deref()
                .unwrap_or(name)
                .replace('-', "_")
                .to_uppercase();
            (display, short, Some(metavar))
        }
        _ => unreachable!(),
    };

    let spec = ArgSpec {
        name: name.to_string(),
        display,
        kind: match kind {
            DeclKind::Positional => ArgKind::Positional,
            _ => ArgKind::Option,
        },
        arity,
        shape,
        takes_value: true,
        polarity: false,
        tri: false,
        itemwise,
        converter,
        choices,
        required,
        default: decl.default,
        short,
        metavar,
        help,
    };

    Ok(Resolved { specs: vec![spec], group: decl.group })
}

fn check_short(name: &str, short: Option<&str>, short_only: bool) -> Result<Option<String>> {
    if short_only && short.is_none() {
        return Err(Error::Declaration(format!(
            "`short_only` requires a short form for `{name}`"
        )));
    }
    match short {
        None => Ok(None),
        Some(short) => {
            let mut chars = short.chars();
            let dash = chars.next();
            let letter = chars.next();
            let ok = dash == Some('-')
                && letter.map_or(false, |c| c.is_ascii_alphanumeric())
                && chars.next().is_none();
            if !ok {
                return Err(Error::Declaration(format!(
                    "invalid short form `{short}` for `{name}`, expected `-x`"
                )));
            }
            Ok(Some(short.to_string()))
        }
    }
}

fn hyphenate(name: &str) -> String {
    name.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{FieldDecl, TypeDesc};

    fn arg_of(field: FieldDecl) -> ArgDecl {
        match field.node {
            crate::decl::DeclNode::Arg(arg) => arg,
            _ => unreachable!(),
        }
    }

    #[test]
    fn bare_scalar_is_required_option() {
        let field = FieldDecl::arg("arg_one", TypeDesc::scalar::<String>());
        let resolved = resolve("arg_one", None, arg_of(field)).unwrap();
        let spec = &resolved.specs[0];
        assert_eq!(spec.kind, ArgKind::Option);
        assert_eq!(spec.display, "--arg-one");
        assert_eq!(spec.arity, Arity::Single);
        assert!(spec.required);
    }

    #[test]
    fn optional_scalar_is_not_required() {
        let field = FieldDecl::arg("jobs", TypeDesc::scalar::<u32>().optional());
        let resolved = resolve("jobs", None, arg_of(field)).unwrap();
        let spec = &resolved.specs[0];
        assert_eq!(spec.arity, Arity::OptionalSingle);
        assert!(!spec.required);
    }

    #[test]
    fn defaulted_option_is_not_required() {
        let field = FieldDecl::arg("fmt", TypeDesc::scalar::<String>()).default_value("text");
        let resolved = resolve("fmt", None, arg_of(field)).unwrap();
        assert!(!resolved.specs[0].required);
        assert_eq!(resolved.specs[0].default.as_deref(), Some("text"));
    }

    #[test]
    fn tri_state_expands_to_a_pair() {
        let field = FieldDecl::arg("clone", TypeDesc::tri_state());
        let resolved = resolve("clone", None, arg_of(field)).unwrap();
        assert_eq!(resolved.specs.len(), 2);
        assert_eq!(resolved.specs[0].display, "--clone");
        assert!(resolved.specs[0].polarity);
        assert_eq!(resolved.specs[1].display, "--no-clone");
        assert!(!resolved.specs[1].polarity);
    }

    #[test]
    fn list_arities() {
        let field = FieldDecl::arg("tags", TypeDesc::scalar::<String>().list());
        let resolved = resolve("tags", None, arg_of(field)).unwrap();
        assert_eq!(resolved.specs[0].arity, Arity::ZeroOrMore);
        assert!(resolved.specs[0].itemwise);
        assert!(!resolved.specs[0].required);

        let field = FieldDecl::arg("tags", TypeDesc::scalar::<String>().list()).at_least_one();
        let resolved = resolve("tags", None, arg_of(field)).unwrap();
        assert_eq!(resolved.specs[0].arity, Arity::OneOrMore);
        assert!(resolved.specs[0].required);
    }

    #[test]
    fn whole_converter_takes_one_token() {
        let field = FieldDecl::arg("ints", TypeDesc::scalar::<u32>().list())
            .converter(crate::convert::erase::<Vec<u32>, _, _>(crate::convert::csv::<u32>));
        let resolved = resolve("ints", None, arg_of(field)).unwrap();
        assert_eq!(resolved.specs[0].arity, Arity::Single);
        assert!(!resolved.specs[0].itemwise);
    }

    #[test]
    fn value_typed_bool_is_rejected() {
        let field = FieldDecl::arg("x", TypeDesc::boolean()).kind(DeclKind::Option);
        let err = resolve("x", None, arg_of(field)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn required_mutex_member_is_rejected() {
        let field = FieldDecl::arg("x", TypeDesc::scalar::<String>()).group("g");
        let err = resolve("x", None, arg_of(field)).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
