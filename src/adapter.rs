//! The engine adapter: lowers a compiled [`RecordSpec`] into the engine's
//! native configuration and invokes a parse.
//!
//! Lowering happens per invocation because the override mapping reshapes
//! the engine view: an overridden value argument stops being required, and
//! an overridden flag is dropped from the engine entirely and resolves to
//! the override during hydration. The compiled spec itself never changes.

use std::collections::BTreeSet;
use std::ffi::OsString;

use crate::engine::{self, EngineCmd, EngineGroup, EngineOpt, EngineOut, EnginePos, EngineSubs, Member};
use crate::spec::{ArgKind, RecordSpec};
use crate::{Error, Overrides, Result};

pub(crate) fn invoke(
    spec: &RecordSpec,
    args: Vec<OsString>,
    overrides: &Overrides,
) -> Result<EngineOut> {
    let args = utf8_args(args)?;
    validate_overrides(spec, overrides)?;
    let cmd = lower(spec, overrides, String::new(), None);
    engine::parse(&cmd, args)
}

pub(crate) fn render_help(spec: &RecordSpec) -> Result<String> {
    let cmd = lower(spec, &Overrides::default(), String::new(), None);
    Ok(engine::render_help(&cmd))
}

fn utf8_args(args: Vec<OsString>) -> Result<Vec<String>> {
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|arg| Error::Parse(format!("invalid utf8 in argument: {arg:?}")))
        })
        .collect()
}

fn validate_overrides(spec: &RecordSpec, overrides: &Overrides) -> Result<()> {
    let mut names = BTreeSet::new();
    spec.collect_names(&mut names);
    for name in overrides.names() {
        if !names.contains(name) {
            return Err(Error::Parse(format!("unknown override `{name}`")));
        }
    }
    Ok(())
}

fn lower(
    spec: &RecordSpec,
    overrides: &Overrides,
    name: String,
    help: Option<&str>,
) -> EngineCmd {
    let mut opts = Vec::new();
    let mut pos = Vec::new();
    // Engine node index per spec argument, for group lowering.
    let mut lowered: Vec<Option<Member>> = Vec::with_capacity(spec.args.len());

    for arg in &spec.args {
        match arg.kind {
            ArgKind::Positional => {
                pos.push(EnginePos {
                    dest: arg.name.clone(),
                    display: arg.display.clone(),
                    arity: arg.arity,
                    required: arg.required && overrides.get(&arg.name).is_none(),
                    choices: arg.choices.clone(),
                    help: arg.help.clone(),
                });
                lowered.push(Some(Member::Pos(pos.len() - 1)));
            }
            ArgKind::Flag if overrides.get(&arg.name).is_some() => {
                lowered.push(None);
            }
            ArgKind::Option | ArgKind::Flag => {
                // Short-only arguments have their short form as the display
                // name and no long form at all.
                let long = match &arg.short {
                    Some(short) if arg.display == *short => None,
                    _ => Some(arg.display.clone()),
                };
                opts.push(EngineOpt {
                    dest: arg.name.clone(),
                    long,
                    short: arg.short.clone(),
                    takes_value: arg.takes_value,
                    arity: arg.arity,
                    polarity: arg.polarity,
                    required: arg.required && overrides.get(&arg.name).is_none(),
                    metavar: arg.metavar.clone(),
                    choices: arg.choices.clone(),
                    help: arg.help.clone(),
                });
                lowered.push(Some(Member::Opt(opts.len() - 1)));
            }
        }
    }

    let groups = spec
        .groups
        .iter()
        .filter_map(|group| {
            let members: Vec<Member> =
                group.members.iter().filter_map(|&idx| lowered[idx]).collect();
            (members.len() > 1).then_some(EngineGroup { members })
        })
        .collect();

    let subs = spec.subcommand.as_ref().map(|sub| EngineSubs {
        dest: sub.name.clone(),
        required: !sub.optional,
        cmds: sub
            .variants
            .iter()
            .map(|variant| {
                lower(
                    &variant.spec,
                    overrides,
                    variant.name.clone(),
                    variant.help.as_deref(),
                )
            })
            .collect(),
    });

    EngineCmd {
        name,
        doc: spec.doc.clone().or_else(|| help.map(str::to_string)),
        opts,
        pos,
        groups,
        subs,
    }
}
