//! The record compiler: walks a record type's field declarations, resolves
//! each into compiled argument specs, validates the whole, and memoizes the
//! result per declared type.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::decl::{DeclNode, FieldDecl, Record};
use crate::resolve;
use crate::spec::{ArgKind, ArgSpec, Arity, MutexGroup, RecordSpec, SubcommandSpec, VariantSpec};
use crate::{Error, Result};

static REGISTRY: OnceLock<Mutex<HashMap<TypeId, Arc<RecordSpec>>>> = OnceLock::new();

fn registry() -> MutexGuard<'static, HashMap<TypeId, Arc<RecordSpec>>> {
    REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|err| err.into_inner())
}

/// Compile `T`'s declarations into a [`RecordSpec`], memoized per type.
///
/// Compilation is a pure function of the declared type, so concurrent
/// callers may compute the spec redundantly; the first to publish wins and
/// every caller gets the same `Arc` from then on.
pub fn spec_of<T: Record>() -> Result<Arc<RecordSpec>> {
    if let Some(spec) = registry().get(&TypeId::of::<T>()) {
        return Ok(Arc::clone(spec));
    }
    let spec = Arc::new(compile_decls(T::declarations(), T::doc(), &Ancestors::default())?);
    Ok(Arc::clone(registry().entry(TypeId::of::<T>()).or_insert(spec)))
}

/// Names visible at enclosing command levels, threaded through sub-command
/// compilation for the flat-namespace collision checks.
#[derive(Default, Clone)]
pub(crate) struct Ancestors {
    names: BTreeSet<String>,
    commands: BTreeSet<String>,
}

struct Expanded {
    own: bool,
    group_scope: String,
    decl: FieldDecl,
}

pub(crate) fn compile_decls(
    decls: Vec<FieldDecl>,
    doc: Option<&str>,
    ancestors: &Ancestors,
) -> Result<RecordSpec> {
    let mut fields = Vec::new();
    expand(decls, true, "", &mut fields)?;

    // Merge by name: a field declared by the record itself supersedes an
    // included field of the same name, at the included field's position.
    let mut by_name: BTreeMap<String, usize> = BTreeMap::new();
    let mut merged: Vec<Expanded> = Vec::new();
    for field in fields {
        match by_name.get(field.decl.name) {
            None => {
                by_name.insert(field.decl.name.to_string(), merged.len());
                merged.push(field);
            }
            Some(&idx) => {
                if field.own && !merged[idx].own {
                    merged[idx] = field;
                } else if !field.own && merged[idx].own {
                    // already superseded
                } else {
                    return Err(Error::Declaration(format!(
                        "duplicate argument `{}`",
                        field.decl.name
                    )));
                }
            }
        }
    }

    let mut args: Vec<ArgSpec> = Vec::new();
    let mut arg_groups: Vec<Option<String>> = Vec::new();
    let mut tri_pairs: Vec<(usize, usize)> = Vec::new();
    let mut commands = None;
    for field in merged {
        let name = field.decl.name;
        match field.decl.node {
            DeclNode::Commands(cdecl) => {
                if commands.is_some() {
                    return Err(Error::Declaration(
                        "multiple sub-command fields declared".to_string(),
                    ));
                }
                commands = Some((name, cdecl));
            }
            DeclNode::Arg(arg) => {
                let resolved = resolve::resolve(name, field.decl.help, arg)?;
                let group = resolved
                    .group
                    .map(|g| format!("{}{g}", field.group_scope));
                let start = args.len();
                if resolved.specs.len() == 2 {
                    tri_pairs.push((start, start + 1));
                }
                for spec in resolved.specs {
                    args.push(spec);
                    arg_groups.push(group.clone());
                }
            }
            DeclNode::Include(_) => unreachable!("includes are expanded"),
        }
    }

    validate(&args, ancestors)?;

    let mut groups: Vec<MutexGroup> = tri_pairs
        .into_iter()
        .map(|(a, b)| MutexGroup { members: vec![a, b] })
        .collect();
    let mut named: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, group) in arg_groups.iter().enumerate() {
        if let Some(name) = group {
            let slot = *named.entry(name.clone()).or_insert_with(|| {
                groups.push(MutexGroup { members: Vec::new() });
                groups.len() - 1
            });
            groups[slot].members.push(idx);
        }
    }

    let subcommand = match commands {
        None => None,
        Some((name, cdecl)) => {
            if ancestors.names.contains(name) {
                return Err(Error::Declaration(format!(
                    "argument `{name}` collides with an argument of an enclosing command"
                )));
            }
            if args.iter().any(|a| a.kind == ArgKind::Positional && a.arity.is_variable()) {
                return Err(Error::Declaration(
                    "variable-arity positionals can't be combined with sub-commands".to_string(),
                ));
            }

            let variants = (cdecl.variants)();
            if variants.is_empty() {
                return Err(Error::Declaration(format!(
                    "sub-command field `{name}` has no variants"
                )));
            }

            let mut child_ancestors = ancestors.clone();
            child_ancestors.names.extend(args.iter().map(|a| a.name.clone()));
            child_ancestors.names.insert(name.to_string());
            child_ancestors
                .commands
                .extend(variants.iter().map(|v| v.name.to_string()));

            let mut seen = BTreeSet::new();
            let mut compiled = Vec::new();
            for variant in variants {
                if !seen.insert(variant.name) {
                    return Err(Error::Declaration(format!(
                        "duplicate command `{}`",
                        variant.name
                    )));
                }
                if ancestors.commands.contains(variant.name) {
                    return Err(Error::Declaration(format!(
                        "command `{}` shadows a command of an enclosing level",
                        variant.name
                    )));
                }
                let child_doc = (variant.doc)();
                let spec = compile_decls((variant.fields)(), child_doc, &child_ancestors)?;
                compiled.push(VariantSpec {
                    name: variant.name.to_string(),
                    help: variant.help.or_else(|| child_doc.map(str::to_string)),
                    spec: Arc::new(spec),
                });
            }
            Some(SubcommandSpec {
                name: name.to_string(),
                optional: cdecl.optional,
                variants: compiled,
            })
        }
    };

    Ok(RecordSpec {
        doc: doc.map(str::to_string),
        args,
        groups,
        subcommand,
    })
}

fn expand(
    decls: Vec<FieldDecl>,
    own: bool,
    scope: &str,
    out: &mut Vec<Expanded>,
) -> Result<()> {
    for decl in decls {
        match decl.node {
            DeclNode::Include(ref include) => {
                let fields = (include.fields)();
                let child_scope = format!("{scope}{}.", decl.name);
                expand(fields, false, &child_scope, out)?;
            }
            DeclNode::Commands(_) if !own => {
                return Err(Error::Declaration(format!(
                    "included field `{}` declares sub-commands",
                    decl.name
                )));
            }
            _ => out.push(Expanded { own, group_scope: scope.to_string(), decl }),
        }
    }
    Ok(())
}

fn validate(args: &[ArgSpec], ancestors: &Ancestors) -> Result<()> {
    let mut displays = BTreeSet::new();
    let mut shorts = BTreeSet::new();
    for arg in args {
        if arg.kind != ArgKind::Positional {
            if !displays.insert(arg.display.clone()) {
                return Err(Error::Declaration(format!("duplicate option `{}`", arg.display)));
            }
            if let Some(short) = &arg.short {
                if !shorts.insert(short.clone()) {
                    return Err(Error::Declaration(format!("duplicate short form `{short}`")));
                }
            }
        }
        if ancestors.names.contains(&arg.name) {
            return Err(Error::Declaration(format!(
                "argument `{}` collides with an argument of an enclosing command",
                arg.name
            )));
        }
    }

    let mut seen_optional: Option<&str> = None;
    let mut seen_variable: Option<&str> = None;
    for arg in args.iter().filter(|a| a.kind == ArgKind::Positional) {
        if let Some(prev) = seen_variable {
            return Err(Error::Declaration(format!(
                "positional `{}` follows variable-arity positional `{prev}`",
                arg.display
            )));
        }
        if let (Some(prev), true) = (seen_optional, arg.required) {
            return Err(Error::Declaration(format!(
                "required positional `{}` after optional positional `{prev}`",
                arg.display
            )));
        }
        if arg.arity.is_variable() {
            seen_variable = Some(&arg.display);
        }
        if arg.arity == Arity::OptionalSingle {
            seen_optional = Some(&arg.display);
        }
    }

    Ok(())
}
