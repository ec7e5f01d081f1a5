//! The result hydrator: turns the engine's flat raw-value mapping into
//! typed values and rebuilds the declared record from them.
//!
//! Conversion happens here, not in the engine, so itemwise and map
//! semantics behave identically for options and positionals. The hydrated
//! [`ValueSet`] is read, never consumed: a record included by another reads
//! the same values as its host, which is what makes superseded fields work.

use std::collections::HashMap;

use crate::convert::Value;
use crate::decl::{Commands, Record, Shape};
use crate::engine::{EngineOut, RawField};
use crate::spec::{ArgSpec, RecordSpec};
use crate::{Error, Overrides, Result};

/// Converted values under their declared field names, plus the selected
/// sub-command per sub-command field. Generated `from_values` code reads
/// typed values back out of this.
pub struct ValueSet {
    fields: HashMap<String, Slot>,
    chosen: HashMap<String, Option<String>>,
}

#[derive(Debug)]
enum Slot {
    Flag(bool),
    Tri(Option<bool>),
    One(Value),
    Opt(Option<Value>),
    Many(Vec<Value>),
}

pub(crate) fn hydrate<T: Record>(
    spec: &RecordSpec,
    out: &EngineOut,
    overrides: &Overrides,
) -> Result<T> {
    let mut values = ValueSet { fields: HashMap::new(), chosen: HashMap::new() };
    build(spec, out, overrides, &mut values)?;
    Ok(T::from_values(&values))
}

fn build(
    spec: &RecordSpec,
    out: &EngineOut,
    overrides: &Overrides,
    values: &mut ValueSet,
) -> Result<()> {
    for arg in &spec.args {
        if values.fields.contains_key(&arg.name) {
            // second member of a tri-state pair
            continue;
        }
        let slot = build_slot(arg, out.raw.get(&arg.name), overrides.get(&arg.name))?;
        values.fields.insert(arg.name.clone(), slot);
    }

    if let Some(sub) = &spec.subcommand {
        match out.chosen.get(&sub.name) {
            Some(chosen) => {
                values.chosen.insert(sub.name.clone(), Some(chosen.clone()));
                let variant = sub
                    .variants
                    .iter()
                    .find(|v| v.name == *chosen)
                    .unwrap_or_else(|| unreachable!("engine selected unknown command `{chosen}`"));
                build(&variant.spec, out, overrides, values)?;
            }
            None => {
                values.chosen.insert(sub.name.clone(), None);
            }
        }
    }
    Ok(())
}

fn build_slot(arg: &ArgSpec, raw: Option<&RawField>, over: Option<&str>) -> Result<Slot> {
    match arg.shape {
        Shape::Bool => {
            let flags = raw.map(|r| r.flags.as_slice()).unwrap_or(&[]);
            let value = match flags.last() {
                Some(&present) => present,
                None => match over {
                    Some(text) => parse_bool(arg, text)?,
                    None => !arg.polarity,
                },
            };
            Ok(Slot::Flag(value))
        }
        Shape::TriBool => {
            let flags = raw.map(|r| r.flags.as_slice()).unwrap_or(&[]);
            let value = match flags.last() {
                Some(&present) => Some(present),
                None => match over {
                    Some(text) => Some(parse_bool(arg, text)?),
                    None => None,
                },
            };
            Ok(Slot::Tri(value))
        }
        Shape::One | Shape::Opt | Shape::Many => build_value_slot(arg, raw, over),
    }
}

fn build_value_slot(arg: &ArgSpec, raw: Option<&RawField>, over: Option<&str>) -> Result<Slot> {
    let tokens = raw.map(|r| r.tokens.as_slice()).unwrap_or(&[]);
    if let Some(choices) = &arg.choices {
        for token in tokens {
            if !choices.iter().any(|c| c == token) {
                return Err(Error::InvalidChoice {
                    arg: arg.display.clone(),
                    value: token.clone(),
                    choices: choices.clone(),
                });
            }
        }
    }

    match arg.shape {
        Shape::Many if arg.itemwise => {
            if !tokens.is_empty() {
                let items = tokens.iter().map(|t| convert(arg, t)).collect::<Result<_>>()?;
                return Ok(Slot::Many(items));
            }
            match fallback(arg, over)? {
                Some(text) => Ok(Slot::Many(vec![convert(arg, &text)?])),
                None => Ok(Slot::Many(Vec::new())),
            }
        }
        Shape::Many => {
            // whole-value converter: one token yields the entire list
            match tokens.last().cloned().map(Ok).or_else(|| fallback(arg, over).transpose()) {
                Some(text) => Ok(Slot::One(convert(arg, &text?)?)),
                None => Ok(Slot::Many(Vec::new())),
            }
        }
        Shape::One => match tokens.last().cloned().map(Ok).or_else(|| fallback(arg, over).transpose()) {
            Some(text) => Ok(Slot::One(convert(arg, &text?)?)),
            // The engine enforces required arguments; this is a backstop.
            None => Err(Error::MissingRequired { arg: arg.display.clone() }),
        },
        Shape::Opt => match tokens.last().cloned().map(Ok).or_else(|| fallback(arg, over).transpose()) {
            Some(text) => Ok(Slot::Opt(Some(convert(arg, &text?)?))),
            None => Ok(Slot::Opt(None)),
        },
        Shape::Bool | Shape::TriBool => unreachable!(),
    }
}

/// The layered absent-value sources: the override first, then the compiled
/// default. Overrides are user input and still get their choices checked.
fn fallback(arg: &ArgSpec, over: Option<&str>) -> Result<Option<String>> {
    match over {
        Some(text) => {
            if let Some(choices) = &arg.choices {
                if !choices.iter().any(|c| c == text) {
                    return Err(Error::InvalidChoice {
                        arg: arg.display.clone(),
                        value: text.to_string(),
                        choices: choices.clone(),
                    });
                }
            }
            Ok(Some(text.to_string()))
        }
        None => Ok(arg.default.clone()),
    }
}

fn convert(arg: &ArgSpec, token: &str) -> Result<Value> {
    match &arg.converter {
        Some(converter) => converter(token).map_err(|message| Error::InvalidValue {
            arg: arg.display.clone(),
            message,
        }),
        None => Ok(Box::new(token.to_string())),
    }
}

fn parse_bool(arg: &ArgSpec, text: &str) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidValue {
            arg: arg.display.clone(),
            message: format!("could not parse bool from \"{text}\""),
        }),
    }
}

impl ValueSet {
    fn slot(&self, name: &str) -> &Slot {
        self.fields
            .get(name)
            .unwrap_or_else(|| panic!("argrec: no value for field `{name}` (out-of-sync Record impl)"))
    }

    pub fn flag(&self, name: &str) -> bool {
        match self.slot(name) {
            Slot::Flag(value) => *value,
            _ => panic!("argrec: field `{name}` is not a flag"),
        }
    }

    pub fn tri(&self, name: &str) -> Option<bool> {
        match self.slot(name) {
            Slot::Tri(value) => *value,
            _ => panic!("argrec: field `{name}` is not a tri-state flag"),
        }
    }

    pub fn one<T: Clone + 'static>(&self, name: &str) -> T {
        match self.slot(name) {
            Slot::One(value) => cast(value, name),
            _ => panic!("argrec: field `{name}` has no single value"),
        }
    }

    pub fn opt<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        match self.slot(name) {
            Slot::Opt(value) => value.as_ref().map(|v| cast(v, name)),
            _ => panic!("argrec: field `{name}` is not optional"),
        }
    }

    pub fn many<T: Clone + 'static>(&self, name: &str) -> Vec<T> {
        match self.slot(name) {
            Slot::Many(items) => items.iter().map(|v| cast(v, name)).collect(),
            // A whole-value converter produced the entire vector at once.
            Slot::One(value) => cast::<Vec<T>>(value, name),
            _ => panic!("argrec: field `{name}` has no list value"),
        }
    }

    pub fn command<C: Commands>(&self, name: &str) -> C {
        match self.chosen.get(name) {
            Some(Some(choice)) => C::from_selection(choice, self),
            _ => panic!("argrec: no command selected for `{name}`"),
        }
    }

    pub fn command_opt<C: Commands>(&self, name: &str) -> Option<C> {
        match self.chosen.get(name) {
            Some(Some(choice)) => Some(C::from_selection(choice, self)),
            Some(None) => None,
            None => panic!("argrec: no command selection recorded for `{name}`"),
        }
    }

    pub fn record<R: Record>(&self) -> R {
        R::from_values(self)
    }
}

fn cast<T: Clone + 'static>(value: &Value, name: &str) -> T {
    value
        .downcast_ref::<T>()
        .cloned()
        .unwrap_or_else(|| panic!("argrec: type mismatch reading field `{name}`"))
}
