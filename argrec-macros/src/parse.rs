use std::mem;

#[cfg(not(test))]
use proc_macro::{Delimiter, TokenStream, TokenTree};
#[cfg(test)]
use proc_macro2::{Delimiter, TokenStream, TokenTree};

use crate::ast;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub(crate) struct Error {
    pub(crate) msg: String,
}

macro_rules! format_err {
    ($($tt:tt)*) => {
        Error { msg: format!($($tt)*) }
    };
}

macro_rules! bail {
    ($($tt:tt)*) => {
        return Err(format_err!($($tt)*))
    };
}

pub(crate) fn parse(ts: TokenStream) -> Result<ast::Input> {
    let mut p = Parser::new(ts);
    let mut items = Vec::new();
    while !p.end() {
        items.push(item(&mut p)?);
    }
    if items.is_empty() {
        bail!("expected `struct` or `enum` declarations");
    }
    Ok(ast::Input { items })
}

fn item(p: &mut Parser) -> Result<ast::Item> {
    let doc = opt_doc(p)?;
    if p.eat_keyword("struct") {
        let name = p.expect_ident()?;
        p.enter_delim(Delimiter::Brace)?;
        let mut fields = Vec::new();
        while !p.end() {
            fields.push(field(p)?);
        }
        p.exit_delim()?;
        Ok(ast::Item::Record(ast::RecordItem { doc, name, fields }))
    } else if p.eat_keyword("enum") {
        let name = p.expect_ident()?;
        p.enter_delim(Delimiter::Brace)?;
        let mut variants = Vec::new();
        while !p.end() {
            variants.push(variant(p)?);
        }
        p.exit_delim()?;
        if variants.is_empty() {
            bail!("command enum `{}` has no variants", name);
        }
        Ok(ast::Item::Union(ast::UnionItem { doc, name, variants }))
    } else {
        bail!("expected `struct` or `enum`")
    }
}

fn field(p: &mut Parser) -> Result<ast::Field> {
    let doc = opt_doc(p)?;
    let name = p.expect_ident()?;
    p.expect_punct(':')?;
    let ty = ty(p, &name)?;
    let builder = if p.eat_punct('=') { Some(builder(p, &ty, &name)?) } else { None };
    if !p.eat_punct(',') && !p.end() {
        bail!("expected `,` after field `{}`", name);
    }
    Ok(ast::Field { doc, name, ty, builder })
}

fn variant(p: &mut Parser) -> Result<ast::UnionVariant> {
    let doc = opt_doc(p)?;
    let cmd = p.expect_string()?;
    if cmd.is_empty() || cmd.starts_with('-') {
        bail!("invalid command name `{}`", cmd);
    }
    p.expect_punct('=')?;
    p.expect_punct('>')?;
    let ident = p.expect_ident()?;
    p.enter_delim(Delimiter::Parenthesis)?;
    let ty = p.collect_rest_text()?;
    p.exit_delim()?;
    if !p.eat_punct(',') && !p.end() {
        bail!("expected `,` after command `{}`", cmd);
    }
    Ok(ast::UnionVariant { doc, cmd, ident, ty })
}

fn ty(p: &mut Parser, field: &str) -> Result<ast::Ty> {
    let tokens = p.collect_type()?;
    classify(&tokens, field)
}

fn classify(tokens: &[TokenTree], field: &str) -> Result<ast::Ty> {
    let text = tokens_text(tokens);
    if let [TokenTree::Ident(ident)] = tokens {
        if ident.to_string() == "bool" {
            return Ok(ast::Ty { shape: ast::TyShape::Bool, text, scalar: None });
        }
        return Ok(ast::Ty { shape: ast::TyShape::Scalar, scalar: Some(text.clone()), text });
    }

    if let Some(inner) = unwrap_generic(tokens, "Option") {
        if let [TokenTree::Ident(ident)] = inner {
            if ident.to_string() == "bool" {
                return Ok(ast::Ty { shape: ast::TyShape::TriBool, text, scalar: None });
            }
        }
        if unwrap_generic(inner, "Vec").is_some() {
            bail!(
                "optional list types are not supported for `{}`; declare `Vec<T>` instead",
                field
            );
        }
        let scalar = tokens_text(inner);
        return Ok(ast::Ty { shape: ast::TyShape::Optional, text, scalar: Some(scalar) });
    }

    if let Some(inner) = unwrap_generic(tokens, "Vec") {
        let scalar = tokens_text(inner);
        return Ok(ast::Ty { shape: ast::TyShape::List, text, scalar: Some(scalar) });
    }

    Ok(ast::Ty { shape: ast::TyShape::Scalar, scalar: Some(text.clone()), text })
}

fn unwrap_generic<'t>(tokens: &'t [TokenTree], wrapper: &str) -> Option<&'t [TokenTree]> {
    match tokens {
        [TokenTree::Ident(ident), TokenTree::Punct(open), inner @ .., TokenTree::Punct(close)]
            if ident.to_string() == wrapper
                && open.as_char() == '<'
                && close.as_char() == '>'
                && !inner.is_empty() =>
        {
            Some(inner)
        }
        _ => None,
    }
}

fn tokens_text(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

fn builder(p: &mut Parser, ty: &ast::Ty, field: &str) -> Result<ast::Builder> {
    let kind_name = p.expect_ident()?;
    let kind = match kind_name.as_str() {
        "positional" => ast::BuilderKind::Positional,
        "option" => ast::BuilderKind::Option,
        "flag" => ast::BuilderKind::Flag,
        "no_flag" => ast::BuilderKind::NoFlag,
        "tri_flag" => ast::BuilderKind::TriFlag,
        "subcommand" => ast::BuilderKind::Subcommand,
        "include" => ast::BuilderKind::Include,
        _ => bail!("unknown builder `{}` for field `{}`", kind_name, field),
    };
    let mut builder = ast::Builder::new(kind);
    p.enter_delim(Delimiter::Parenthesis)?;
    while !p.end() {
        builder_arg(p, &mut builder)?;
        if !p.eat_punct(',') && !p.end() {
            bail!("expected `,` between builder options for `{}`", field);
        }
    }
    p.exit_delim()?;
    validate_builder(&builder, ty, field)?;
    Ok(builder)
}

fn builder_arg(p: &mut Parser, builder: &mut ast::Builder) -> Result<()> {
    if let Some(short) = p.eat_string() {
        if builder.short.is_some() {
            bail!("duplicate short form `{}`", short);
        }
        if !short.starts_with('-') {
            bail!("short form `{}` must begin with `-`", short);
        }
        builder.short = Some(short);
        return Ok(());
    }
    let key = p.expect_ident()?;
    match key.as_str() {
        "short_only" => builder.short_only = true,
        "append" => builder.append = true,
        "at_least_one" => builder.at_least_one = true,
        "default" => {
            p.expect_punct('=')?;
            builder.default = Some(p.expect_string()?);
        }
        "name" => {
            p.expect_punct('=')?;
            builder.name_override = Some(p.expect_string()?);
        }
        "group" => {
            p.expect_punct('=')?;
            builder.group = Some(p.expect_ident()?);
        }
        "choices" => {
            p.expect_punct('=')?;
            builder.choices = Some(string_list(p)?);
        }
        "map" => {
            p.expect_punct('=')?;
            builder.map = Some(map_entries(p)?);
        }
        "converter" => {
            p.expect_punct('=')?;
            if p.at_keyword("itemwise") && p.lookahead_group(Delimiter::Parenthesis, 1) {
                p.expect_ident()?;
                p.enter_delim(Delimiter::Parenthesis)?;
                let expr = p.collect_rest_text()?;
                p.exit_delim()?;
                builder.converter = Some(ast::Conv::Itemwise(expr));
            } else {
                builder.converter = Some(ast::Conv::Whole(p.collect_expr_text()?));
            }
        }
        _ => bail!("unknown builder option `{}`", key),
    }
    Ok(())
}

fn string_list(p: &mut Parser) -> Result<Vec<String>> {
    p.enter_delim(Delimiter::Bracket)?;
    let mut out = Vec::new();
    while !p.end() {
        out.push(p.expect_string()?);
        if !p.eat_punct(',') && !p.end() {
            bail!("expected `,` in string list");
        }
    }
    p.exit_delim()?;
    if out.is_empty() {
        bail!("expected at least one entry");
    }
    Ok(out)
}

fn map_entries(p: &mut Parser) -> Result<Vec<(String, String)>> {
    p.enter_delim(Delimiter::Bracket)?;
    let mut out = Vec::new();
    while !p.end() {
        p.enter_delim(Delimiter::Parenthesis)?;
        let key = p.expect_string()?;
        p.expect_punct(',')?;
        let value = p.collect_rest_text()?;
        p.exit_delim()?;
        out.push((key, value));
        if !p.eat_punct(',') && !p.end() {
            bail!("expected `,` between map entries");
        }
    }
    p.exit_delim()?;
    if out.is_empty() {
        bail!("expected at least one map entry");
    }
    Ok(out)
}

fn validate_builder(builder: &ast::Builder, ty: &ast::Ty, field: &str) -> Result<()> {
    use ast::BuilderKind::*;

    let allowed: &[&str] = match builder.kind {
        Positional => &["default", "name", "converter", "choices", "map", "at_least_one", "group"],
        Option => &[
            "short", "short_only", "default", "name", "converter", "choices", "map", "append",
            "at_least_one", "group",
        ],
        Flag | NoFlag => &["short", "short_only", "group"],
        TriFlag => &["group"],
        Subcommand | Include => &[],
    };
    let used = [
        ("short", builder.short.is_some()),
        ("short_only", builder.short_only),
        ("default", builder.default.is_some()),
        ("name", builder.name_override.is_some()),
        ("converter", builder.converter.is_some()),
        ("choices", builder.choices.is_some()),
        ("map", builder.map.is_some()),
        ("append", builder.append),
        ("at_least_one", builder.at_least_one),
        ("group", builder.group.is_some()),
    ];
    for (option, is_used) in used {
        if is_used && !allowed.contains(&option) {
            bail!("`{}` is not a valid option for this builder on `{}`", option, field);
        }
    }

    if builder.short_only && builder.short.is_none() {
        bail!("`short_only` requires a short form for `{}`", field);
    }
    if builder.append && builder.at_least_one {
        bail!("`append` is incompatible with `at_least_one` for `{}`", field);
    }
    if builder.converter.is_some() && builder.map.is_some() {
        bail!("`converter` and `map` conflict for `{}`", field);
    }
    if builder.choices.is_some() && builder.map.is_some() {
        bail!("`choices` and `map` conflict for `{}`", field);
    }

    match builder.kind {
        Flag | NoFlag => {
            if ty.shape != ast::TyShape::Bool {
                bail!("flag `{}` must be typed `bool`", field);
            }
        }
        TriFlag => {
            if ty.shape != ast::TyShape::TriBool {
                bail!("tri-state flag `{}` must be typed `Option<bool>`", field);
            }
        }
        Subcommand => {
            if !matches!(ty.shape, ast::TyShape::Scalar | ast::TyShape::Optional) {
                bail!("subcommand field `{}` must be typed as a command enum", field);
            }
        }
        Include => {
            if ty.shape != ast::TyShape::Scalar {
                bail!("include field `{}` must be typed as a record", field);
            }
        }
        Positional | Option => {
            let converts = builder.converter.is_some() || builder.map.is_some();
            if matches!(ty.shape, ast::TyShape::Bool | ast::TyShape::TriBool) && !converts {
                bail!(
                    "argument `{}` yielding a value can't be typed as `bool` without a converter",
                    field
                );
            }
        }
    }
    Ok(())
}

fn opt_doc(p: &mut Parser) -> Result<Option<String>> {
    let mut lines = Vec::new();
    while p.eat_punct('#') {
        p.enter_delim(Delimiter::Bracket)?;
        p.expect_keyword("doc")?;
        p.expect_punct('=')?;
        let mut line = p.expect_string()?;
        if let Some(stripped) = line.strip_prefix(' ') {
            line = stripped.to_string();
        }
        p.exit_delim()?;
        lines.push(line);
    }
    if lines.is_empty() {
        Ok(None)
    } else {
        Ok(Some(lines.join("\n")))
    }
}

struct Parser {
    stack: Vec<Vec<TokenTree>>,
    ts: Vec<TokenTree>,
}

impl Parser {
    fn new(ts: TokenStream) -> Parser {
        let mut ts = ts.into_iter().collect::<Vec<_>>();
        ts.reverse();
        Parser { stack: Vec::new(), ts }
    }

    fn enter_delim(&mut self, delimiter: Delimiter) -> Result<()> {
        match self.ts.pop() {
            Some(TokenTree::Group(group)) if group.delimiter() == delimiter => {
                let mut ts = group.stream().into_iter().collect::<Vec<_>>();
                ts.reverse();
                let ts = mem::replace(&mut self.ts, ts);
                self.stack.push(ts);
            }
            _ => bail!("expected a `{:?}` group", delimiter),
        }
        Ok(())
    }

    fn exit_delim(&mut self) -> Result<()> {
        if !self.end() {
            bail!("unexpected trailing tokens");
        }
        self.ts = self.stack.pop().unwrap();
        Ok(())
    }

    fn end(&mut self) -> bool {
        self.ts.last().is_none()
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if !self.eat_keyword(kw) {
            bail!("expected `{}`", kw)
        }
        Ok(())
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.ts.pop();
            true
        } else {
            false
        }
    }

    fn at_keyword(&mut self, kw: &str) -> bool {
        match self.ts.last() {
            Some(TokenTree::Ident(ident)) => ident.to_string() == kw,
            _ => false,
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.ts.pop() {
            Some(TokenTree::Ident(ident)) => Ok(ident.to_string()),
            next => {
                let next = next.map(|it| it.to_string()).unwrap_or_default();
                bail!("expected an identifier, got `{}`", next)
            }
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<()> {
        if !self.eat_punct(punct) {
            bail!("expected `{}`", punct)
        }
        Ok(())
    }

    fn eat_punct(&mut self, punct: char) -> bool {
        match self.ts.last() {
            Some(TokenTree::Punct(p)) if p.as_char() == punct => {
                self.ts.pop();
                true
            }
            _ => false,
        }
    }

    fn lookahead_group(&mut self, delimiter: Delimiter, n: usize) -> bool {
        match self.ts.iter().rev().nth(n) {
            Some(TokenTree::Group(group)) => group.delimiter() == delimiter,
            _ => false,
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.eat_string() {
            Some(text) => Ok(text),
            None => bail!("expected a string literal"),
        }
    }

    fn eat_string(&mut self) -> Option<String> {
        match self.ts.last() {
            Some(TokenTree::Literal(lit)) if lit.to_string().starts_with('"') => {
                let text = lit.to_string();
                self.ts.pop();
                Some(text.trim_matches('"').to_string())
            }
            _ => None,
        }
    }

    /// Tokens of a type, up to a top-level `,` or `=`. `<`/`>` nesting is
    /// tracked so generic parameters stay inside.
    fn collect_type(&mut self) -> Result<Vec<TokenTree>> {
        let mut out = Vec::new();
        let mut depth = 0i32;
        loop {
            match self.ts.last() {
                None => break,
                Some(TokenTree::Punct(punct)) => {
                    let c = punct.as_char();
                    if depth == 0 && (c == ',' || c == '=') {
                        break;
                    }
                    if c == '<' {
                        depth += 1;
                    } else if c == '>' {
                        depth -= 1;
                    }
                    out.push(self.ts.pop().unwrap());
                }
                Some(_) => out.push(self.ts.pop().unwrap()),
            }
        }
        if out.is_empty() {
            bail!("expected a type");
        }
        Ok(out)
    }

    /// Expression text up to a top-level `,` or the end of the current
    /// group.
    fn collect_expr_text(&mut self) -> Result<String> {
        let mut out = Vec::new();
        let mut depth = 0i32;
        loop {
            match self.ts.last() {
                None => break,
                Some(TokenTree::Punct(punct)) => {
                    let c = punct.as_char();
                    if depth == 0 && c == ',' {
                        break;
                    }
                    if c == '<' {
                        depth += 1;
                    } else if c == '>' {
                        depth -= 1;
                    }
                    out.push(self.ts.pop().unwrap());
                }
                Some(_) => out.push(self.ts.pop().unwrap()),
            }
        }
        if out.is_empty() {
            bail!("expected an expression");
        }
        Ok(tokens_text(&out))
    }

    /// Everything left in the current group, as text.
    fn collect_rest_text(&mut self) -> Result<String> {
        let mut out = Vec::new();
        while let Some(token) = self.ts.pop() {
            out.push(token);
        }
        if out.is_empty() {
            bail!("expected tokens");
        }
        Ok(tokens_text(&out))
    }
}
