//! The parser engine: a token-by-token command line parser driven entirely
//! by the configuration the adapter hands it.
//!
//! The engine knows nothing about records or converters. It matches raw
//! tokens to the configured nodes, enforces mutual exclusion and required
//! arguments, dispatches sub-commands, and returns a flat name-to-raw-value
//! mapping. Prefix abbreviation and short-option clustering are not
//! supported.

use std::collections::HashMap;

use crate::spec::Arity;
use crate::{Error, Result};

pub(crate) struct EngineCmd {
    /// Command name; empty for the root level.
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) opts: Vec<EngineOpt>,
    pub(crate) pos: Vec<EnginePos>,
    pub(crate) groups: Vec<EngineGroup>,
    pub(crate) subs: Option<EngineSubs>,
}

pub(crate) struct EngineOpt {
    pub(crate) dest: String,
    pub(crate) long: Option<String>,
    pub(crate) short: Option<String>,
    pub(crate) takes_value: bool,
    pub(crate) arity: Arity,
    /// The value recorded when a no-value flag is present.
    pub(crate) polarity: bool,
    pub(crate) required: bool,
    pub(crate) metavar: Option<String>,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) help: Option<String>,
}

impl EngineOpt {
    fn display(&self) -> &str {
        self.long.as_deref().or(self.short.as_deref()).unwrap_or(&self.dest)
    }

    fn matches(&self, token: &str) -> bool {
        self.long.as_deref() == Some(token) || self.short.as_deref() == Some(token)
    }
}

pub(crate) struct EnginePos {
    pub(crate) dest: String,
    pub(crate) display: String,
    pub(crate) arity: Arity,
    pub(crate) required: bool,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) help: Option<String>,
}

pub(crate) struct EngineGroup {
    pub(crate) members: Vec<Member>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Member {
    Opt(usize),
    Pos(usize),
}

pub(crate) struct EngineSubs {
    pub(crate) dest: String,
    pub(crate) required: bool,
    pub(crate) cmds: Vec<EngineCmd>,
}

/// Raw tokens matched to one result name. Flags record their polarity per
/// occurrence; value arguments record tokens.
#[derive(Debug, Default)]
pub(crate) struct RawField {
    pub(crate) tokens: Vec<String>,
    pub(crate) flags: Vec<bool>,
}

#[derive(Debug, Default)]
pub(crate) struct EngineOut {
    pub(crate) raw: HashMap<String, RawField>,
    /// Sub-command field name to selected command name.
    pub(crate) chosen: HashMap<String, String>,
}

pub(crate) fn parse(cmd: &EngineCmd, args: Vec<String>) -> Result<EngineOut> {
    let mut tokens = Tokens::new(args);
    let mut out = EngineOut::default();
    run(cmd, &mut tokens, &mut out)?;
    Ok(out)
}

enum Tok {
    Flag(String),
    Value(String),
}

struct Tokens {
    after_double_dash: bool,
    rargs: Vec<String>,
}

impl Tokens {
    fn new(mut args: Vec<String>) -> Tokens {
        args.reverse();
        Tokens { after_double_dash: false, rargs: args }
    }

    fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }

    fn next_token(&mut self) -> Option<Tok> {
        let token = self.next()?;
        if self.after_double_dash {
            return Some(Tok::Value(token));
        }
        if token == "--" {
            self.after_double_dash = true;
            return self.next_token();
        }
        if is_flag_token(&token) {
            Some(Tok::Flag(token))
        } else {
            Some(Tok::Value(token))
        }
    }

    /// Whether the next token should be consumed by a greedy multi-value
    /// option.
    fn at_value(&self) -> bool {
        match self.rargs.last() {
            Some(token) => self.after_double_dash || !is_flag_token(token),
            None => false,
        }
    }
}

/// `-` alone is a value by convention; anything else starting with `-` is
/// an option token.
fn is_flag_token(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn run(cmd: &EngineCmd, tokens: &mut Tokens, out: &mut EngineOut) -> Result<()> {
    let mut seen_opts = vec![0u32; cmd.opts.len()];
    let mut filled_pos = vec![0u32; cmd.pos.len()];
    let mut descended = false;

    while let Some(token) = tokens.next_token() {
        match token {
            Tok::Flag(flag) => {
                let (name, inline) = split_inline(&flag);
                let Some(idx) = cmd.opts.iter().position(|o| o.matches(name)) else {
                    if name == "--help" || name == "-h" {
                        return Err(Error::Help(render_help(cmd)));
                    }
                    return Err(Error::Parse(format!("unknown option: `{name}`")));
                };
                let opt = &cmd.opts[idx];
                seen_opts[idx] += 1;
                if !opt.takes_value {
                    if inline.is_some() {
                        return Err(Error::Parse(format!(
                            "option `{name}` does not take a value"
                        )));
                    }
                    out.raw.entry(opt.dest.clone()).or_default().flags.push(opt.polarity);
                    continue;
                }
                let field = out.raw.entry(opt.dest.clone()).or_default();
                match inline {
                    Some(value) => field.tokens.push(value.to_string()),
                    None => match opt.arity {
                        Arity::ZeroOrMore | Arity::OneOrMore => {
                            if opt.arity == Arity::OneOrMore && !tokens.at_value() {
                                return Err(Error::Parse(format!(
                                    "expected a value for `{name}`"
                                )));
                            }
                            while tokens.at_value() {
                                if let Some(value) = tokens.next() {
                                    field.tokens.push(value);
                                }
                            }
                        }
                        _ => {
                            // A single value is taken unconditionally, even
                            // when it looks like an option.
                            let value = tokens.next().ok_or_else(|| {
                                Error::Parse(format!("expected a value for `{name}`"))
                            })?;
                            field.tokens.push(value);
                        }
                    },
                }
            }
            Tok::Value(value) => {
                if let Some(idx) = open_positional(cmd, &filled_pos) {
                    filled_pos[idx] += 1;
                    out.raw
                        .entry(cmd.pos[idx].dest.clone())
                        .or_default()
                        .tokens
                        .push(value);
                    continue;
                }
                let Some(subs) = &cmd.subs else {
                    return Err(Error::Parse(format!("unexpected argument: `{value}`")));
                };
                let Some(subcmd) = subs.cmds.iter().find(|c| c.name == value) else {
                    return Err(Error::InvalidChoice {
                        arg: subs.dest.clone(),
                        value,
                        choices: subs.cmds.iter().map(|c| c.name.clone()).collect(),
                    });
                };
                out.chosen.insert(subs.dest.clone(), value);
                run(subcmd, tokens, out)?;
                descended = true;
            }
        }
    }

    check_groups(cmd, &seen_opts, &filled_pos)?;

    for (idx, opt) in cmd.opts.iter().enumerate() {
        if opt.required && seen_opts[idx] == 0 {
            return Err(Error::MissingRequired { arg: opt.display().to_string() });
        }
    }
    for (idx, pos) in cmd.pos.iter().enumerate() {
        if pos.required && filled_pos[idx] == 0 {
            return Err(Error::MissingRequired { arg: pos.display.clone() });
        }
    }
    if let Some(subs) = &cmd.subs {
        if subs.required && !descended {
            return Err(Error::Parse("a subcommand is required".to_string()));
        }
    }
    Ok(())
}

/// `--name=value` splits at the first `=`; short options take no inline
/// values.
fn split_inline(token: &str) -> (&str, Option<&str>) {
    if token.starts_with("--") {
        if let Some((name, value)) = token.split_once('=') {
            return (name, Some(value));
        }
    }
    (token, None)
}

/// The first positional that can still accept a token, in declaration
/// order. Variable-arity positionals never fill up.
fn open_positional(cmd: &EngineCmd, filled: &[u32]) -> Option<usize> {
    cmd.pos.iter().enumerate().find_map(|(idx, pos)| match pos.arity {
        Arity::Single | Arity::OptionalSingle if filled[idx] == 0 => Some(idx),
        Arity::ZeroOrMore | Arity::OneOrMore => Some(idx),
        _ => None,
    })
}

fn check_groups(cmd: &EngineCmd, seen_opts: &[u32], filled_pos: &[u32]) -> Result<()> {
    for group in &cmd.groups {
        let present: Vec<&str> = group
            .members
            .iter()
            .filter_map(|member| match *member {
                Member::Opt(idx) if seen_opts[idx] > 0 => Some(cmd.opts[idx].display()),
                Member::Pos(idx) if filled_pos[idx] > 0 => Some(cmd.pos[idx].display.as_str()),
                _ => None,
            })
            .collect();
        if present.len() > 1 {
            return Err(Error::MutuallyExclusive {
                first: present[0].to_string(),
                second: present[1].to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn render_help(cmd: &EngineCmd) -> String {
    let mut buf = String::new();
    let mut empty = true;

    if !cmd.name.is_empty() {
        buf.push_str(&cmd.name);
        buf.push('\n');
        empty = false;
    }
    if let Some(doc) = &cmd.doc {
        let indent = if cmd.name.is_empty() { 0 } else { 2 };
        push_lines(&mut buf, doc, indent);
        empty = false;
    }

    if !cmd.pos.is_empty() {
        if !empty {
            buf.push('\n');
        }
        empty = false;
        buf.push_str("ARGS:\n");
        let mut blank = "";
        for pos in &cmd.pos {
            buf.push_str(blank);
            blank = "\n";
            let inner = match &pos.choices {
                Some(choices) => format!("{{{}}}", choices.join("|")),
                None => pos.display.clone(),
            };
            let rendered = match pos.arity {
                Arity::OptionalSingle => format!("[{inner}]"),
                Arity::ZeroOrMore => format!("[{inner}]..."),
                Arity::OneOrMore => format!("<{inner}>..."),
                _ => format!("<{inner}>"),
            };
            buf.push_str("    ");
            buf.push_str(&rendered);
            buf.push('\n');
            if let Some(help) = &pos.help {
                push_lines(&mut buf, help, 6);
            }
        }
    }

    if !empty {
        buf.push('\n');
    }
    buf.push_str("OPTIONS:\n");
    let mut blank = "";
    for opt in &cmd.opts {
        buf.push_str(blank);
        blank = "\n";
        let mut line = String::from("    ");
        match (&opt.short, &opt.long) {
            (Some(short), Some(long)) => {
                line.push_str(short);
                line.push_str(", ");
                line.push_str(long);
            }
            (Some(short), None) => line.push_str(short),
            (None, Some(long)) => line.push_str(long),
            (None, None) => line.push_str(&opt.dest),
        }
        if opt.takes_value {
            match &opt.choices {
                Some(choices) => line.push_str(&format!(" {{{}}}", choices.join("|"))),
                None => {
                    let metavar = opt.metavar.as_deref().unwrap_or("VALUE");
                    line.push_str(&format!(" <{metavar}>"));
                }
            }
        }
        buf.push_str(&line);
        buf.push('\n');
        if let Some(help) = &opt.help {
            push_lines(&mut buf, help, 6);
        }
    }
    buf.push_str(blank);
    buf.push_str("    -h, --help\n");
    push_lines(&mut buf, "Prints help information.", 6);

    if let Some(subs) = &cmd.subs {
        buf.push('\n');
        buf.push_str("SUBCOMMANDS:\n");
        let mut blank = "";
        for sub in &subs.cmds {
            buf.push_str(blank);
            blank = "\n";
            buf.push_str("    ");
            buf.push_str(&sub.name);
            buf.push('\n');
            if let Some(doc) = &sub.doc {
                push_lines(&mut buf, doc, 6);
            }
        }
    }

    buf
}

fn push_lines(buf: &mut String, text: &str, indent: usize) {
    for line in text.split('\n').map(str::trim_end) {
        if line.is_empty() {
            buf.push('\n');
        } else {
            buf.push_str(&format!("{blank:indent$}{line}\n", blank = ""));
        }
    }
}
