use std::fmt::Write;

use crate::ast;

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

pub(crate) fn emit(input: &ast::Input) -> String {
    let mut buf = String::new();
    for item in &input.items {
        match item {
            ast::Item::Record(record) => emit_record(&mut buf, record),
            ast::Item::Union(union) => emit_union(&mut buf, union),
        }
        blank_line(&mut buf);
    }
    buf
}

fn emit_record(buf: &mut String, record: &ast::RecordItem) {
    emit_doc(buf, record.doc.as_deref(), "");
    w!(buf, "#[derive(Debug)]\n");
    if record.fields.is_empty() {
        w!(buf, "pub struct {};\n", record.name);
    } else {
        w!(buf, "pub struct {} {{\n", record.name);
        for field in &record.fields {
            emit_doc(buf, field.doc.as_deref(), "    ");
            w!(buf, "    pub {}: {},\n", field.name, field.ty.text);
        }
        w!(buf, "}}\n");
    }
    blank_line(buf);

    w!(buf, "impl ::argrec::Record for {} {{\n", record.name);
    if let Some(doc) = &record.doc {
        w!(buf, "fn doc() -> ::std::option::Option<&'static str> {{\n");
        w!(buf, "::std::option::Option::Some({:?})\n", doc);
        w!(buf, "}}\n");
    }

    w!(buf, "fn declarations() -> ::std::vec::Vec<::argrec::decl::FieldDecl> {{\n");
    if record.fields.is_empty() {
        w!(buf, "::std::vec::Vec::new()\n");
    } else {
        w!(buf, "vec![\n");
        for field in &record.fields {
            emit_field_decl(buf, field);
        }
        w!(buf, "]\n");
    }
    w!(buf, "}}\n");

    w!(buf, "fn from_values(values_: &::argrec::ValueSet) -> Self {{\n");
    if record.fields.is_empty() {
        w!(buf, "Self\n");
    } else {
        w!(buf, "Self {{\n");
        for field in &record.fields {
            w!(buf, "{}: ", field.name);
            emit_accessor(buf, field);
            w!(buf, ",\n");
        }
        w!(buf, "}}\n");
    }
    w!(buf, "}}\n");
    w!(buf, "}}\n");
    blank_line(buf);
    emit_api(buf, record);
}

/// The shape the resolver will see: a `bool` field handed to a value
/// builder with a converter behaves like any custom scalar.
fn effective_shape(field: &ast::Field) -> ast::TyShape {
    let value_kind = matches!(
        field.builder.as_ref().map(|b| b.kind),
        Some(ast::BuilderKind::Positional) | Some(ast::BuilderKind::Option)
    );
    match field.ty.shape {
        ast::TyShape::Bool if value_kind => ast::TyShape::Scalar,
        ast::TyShape::TriBool if value_kind => ast::TyShape::Optional,
        shape => shape,
    }
}

fn scalar_text(field: &ast::Field) -> String {
    field.ty.scalar.clone().unwrap_or_else(|| "bool".to_string())
}

fn emit_field_decl(buf: &mut String, field: &ast::Field) {
    if let Some(builder) = &field.builder {
        match builder.kind {
            ast::BuilderKind::Include => {
                w!(
                    buf,
                    "::argrec::decl::FieldDecl::include::<{}>({:?})",
                    field.ty.text,
                    field.name
                );
                emit_help_call(buf, field);
                w!(buf, ",\n");
                return;
            }
            ast::BuilderKind::Subcommand => {
                w!(
                    buf,
                    "::argrec::decl::FieldDecl::commands::<{}>({:?}, {})",
                    scalar_text(field),
                    field.name,
                    field.ty.shape == ast::TyShape::Optional
                );
                emit_help_call(buf, field);
                w!(buf, ",\n");
                return;
            }
            _ => {}
        }
    }

    w!(buf, "::argrec::decl::FieldDecl::arg({:?}, ", field.name);
    emit_type_desc(buf, field);
    w!(buf, ")");
    emit_help_call(buf, field);

    if let Some(builder) = &field.builder {
        let kind = match builder.kind {
            ast::BuilderKind::Positional => "Positional",
            ast::BuilderKind::Option => "Option",
            ast::BuilderKind::Flag => "Flag",
            ast::BuilderKind::NoFlag => "NoFlag",
            ast::BuilderKind::TriFlag => "TriFlag",
            ast::BuilderKind::Subcommand | ast::BuilderKind::Include => unreachable!(),
        };
        w!(buf, ".kind(::argrec::decl::DeclKind::{})", kind);

        if let Some(short) = &builder.short {
            w!(buf, ".short({:?})", short);
        }
        if builder.short_only {
            w!(buf, ".short_only()");
        }
        if let Some(default) = &builder.default {
            w!(buf, ".default_value({:?})", default);
        }
        if let Some(name) = &builder.name_override {
            w!(buf, ".name_override({:?})", name);
        }
        if builder.append {
            w!(buf, ".append()");
        }
        if builder.at_least_one {
            w!(buf, ".at_least_one()");
        }
        if let Some(group) = &builder.group {
            w!(buf, ".group({:?})", group);
        }
        if let Some(choices) = &builder.choices {
            w!(buf, ".choices(&[");
            for choice in choices {
                w!(buf, "{:?}, ", choice);
            }
            w!(buf, "])");
        }
        if let Some(conv) = &builder.converter {
            match conv {
                ast::Conv::Whole(expr) => {
                    let target = match effective_shape(field) {
                        ast::TyShape::List => field.ty.text.clone(),
                        _ => scalar_text(field),
                    };
                    w!(buf, ".converter(::argrec::convert::erase::<{}, _, _>({}))", target, expr);
                }
                ast::Conv::Itemwise(expr) => {
                    w!(
                        buf,
                        ".itemwise(::argrec::convert::erase::<{}, _, _>({}))",
                        scalar_text(field),
                        expr
                    );
                }
            }
        }
        if let Some(map) = &builder.map {
            w!(buf, ".map_values(::argrec::convert::mapping::<{}>(vec![", scalar_text(field));
            for (key, value) in map {
                w!(buf, "({:?}, {}), ", key, value);
            }
            w!(buf, "]))");
        }
    }
    w!(buf, ",\n");
}

fn emit_help_call(buf: &mut String, field: &ast::Field) {
    if let Some(doc) = &field.doc {
        w!(buf, ".help({:?})", doc);
    }
}

fn emit_type_desc(buf: &mut String, field: &ast::Field) {
    let custom = field
        .builder
        .as_ref()
        .map_or(false, |b| b.converter.is_some() || b.map.is_some());
    let base = if custom { "custom" } else { "scalar" };
    match effective_shape(field) {
        ast::TyShape::Bool => w!(buf, "::argrec::decl::TypeDesc::boolean()"),
        ast::TyShape::TriBool => w!(buf, "::argrec::decl::TypeDesc::tri_state()"),
        ast::TyShape::Scalar => {
            w!(buf, "::argrec::decl::TypeDesc::{}::<{}>()", base, scalar_text(field))
        }
        ast::TyShape::Optional => {
            w!(buf, "::argrec::decl::TypeDesc::{}::<{}>().optional()", base, scalar_text(field))
        }
        ast::TyShape::List => {
            w!(buf, "::argrec::decl::TypeDesc::{}::<{}>().list()", base, scalar_text(field))
        }
    }
}

fn emit_accessor(buf: &mut String, field: &ast::Field) {
    if let Some(builder) = &field.builder {
        match builder.kind {
            ast::BuilderKind::Include => {
                w!(buf, "values_.record::<{}>()", field.ty.text);
                return;
            }
            ast::BuilderKind::Subcommand => {
                let method = match field.ty.shape {
                    ast::TyShape::Optional => "command_opt",
                    _ => "command",
                };
                w!(buf, "values_.{}::<{}>({:?})", method, scalar_text(field), field.name);
                return;
            }
            _ => {}
        }
    }
    match effective_shape(field) {
        ast::TyShape::Bool => w!(buf, "values_.flag({:?})", field.name),
        ast::TyShape::TriBool => w!(buf, "values_.tri({:?})", field.name),
        ast::TyShape::Scalar => {
            w!(buf, "values_.one::<{}>({:?})", scalar_text(field), field.name)
        }
        ast::TyShape::Optional => {
            w!(buf, "values_.opt::<{}>({:?})", scalar_text(field), field.name)
        }
        ast::TyShape::List => {
            w!(buf, "values_.many::<{}>({:?})", scalar_text(field), field.name)
        }
    }
}

fn emit_api(buf: &mut String, record: &ast::RecordItem) {
    w!(buf, "impl {} {{\n", record.name);

    w!(buf, "    #[allow(dead_code)]\n");
    w!(buf, "    pub fn from_env_or_exit() -> Self {{\n");
    w!(buf, "        ::argrec::from_env_or_exit::<Self>()\n");
    w!(buf, "    }}\n");
    blank_line(buf);

    w!(buf, "    #[allow(dead_code)]\n");
    w!(buf, "    pub fn from_env() -> ::argrec::Result<Self> {{\n");
    w!(buf, "        ::argrec::from_env::<Self>()\n");
    w!(buf, "    }}\n");
    blank_line(buf);

    w!(buf, "    #[allow(dead_code)]\n");
    w!(buf, "    pub fn from_vec(args: ::std::vec::Vec<::std::ffi::OsString>) -> ::argrec::Result<Self> {{\n");
    w!(buf, "        ::argrec::from_vec::<Self>(args)\n");
    w!(buf, "    }}\n");
    blank_line(buf);

    w!(buf, "    #[allow(dead_code)]\n");
    w!(buf, "    pub fn from_vec_with(args: ::std::vec::Vec<::std::ffi::OsString>, overrides: &::argrec::Overrides) -> ::argrec::Result<Self> {{\n");
    w!(buf, "        ::argrec::from_vec_with::<Self>(args, overrides)\n");
    w!(buf, "    }}\n");
    blank_line(buf);

    w!(buf, "    #[allow(dead_code)]\n");
    w!(buf, "    pub fn help_text() -> ::argrec::Result<::std::string::String> {{\n");
    w!(buf, "        ::argrec::help_text::<Self>()\n");
    w!(buf, "    }}\n");
    w!(buf, "}}\n");
}

fn emit_union(buf: &mut String, union: &ast::UnionItem) {
    emit_doc(buf, union.doc.as_deref(), "");
    w!(buf, "#[derive(Debug)]\n");
    w!(buf, "pub enum {} {{\n", union.name);
    for variant in &union.variants {
        emit_doc(buf, variant.doc.as_deref(), "    ");
        w!(buf, "    {}({}),\n", variant.ident, variant.ty);
    }
    w!(buf, "}}\n");
    blank_line(buf);

    w!(buf, "impl ::argrec::Commands for {} {{\n", union.name);
    w!(buf, "fn variants() -> ::std::vec::Vec<::argrec::decl::VariantDecl> {{\n");
    w!(buf, "vec![\n");
    for variant in &union.variants {
        w!(
            buf,
            "::argrec::decl::VariantDecl::new::<{}>({:?})",
            variant.ty,
            variant.cmd
        );
        if let Some(doc) = &variant.doc {
            w!(buf, ".help({:?})", doc);
        }
        w!(buf, ",\n");
    }
    w!(buf, "]\n");
    w!(buf, "}}\n");

    w!(buf, "fn from_selection(choice_: &str, values_: &::argrec::ValueSet) -> Self {{\n");
    w!(buf, "match choice_ {{\n");
    for variant in &union.variants {
        w!(
            buf,
            "{:?} => Self::{}(<{} as ::argrec::Record>::from_values(values_)),\n",
            variant.cmd,
            variant.ident,
            variant.ty
        );
    }
    w!(buf, "other_ => ::std::panic!(\"argrec: unknown command `{{other_}}`\"),\n");
    w!(buf, "}}\n");
    w!(buf, "}}\n");
    w!(buf, "}}\n");
}

fn emit_doc(buf: &mut String, doc: Option<&str>, indent: &str) {
    if let Some(doc) = doc {
        for line in doc.split('\n') {
            w!(buf, "{}#[doc = {:?}]\n", indent, format!(" {line}"));
        }
    }
}

fn blank_line(buf: &mut String) {
    w!(buf, "\n");
}
