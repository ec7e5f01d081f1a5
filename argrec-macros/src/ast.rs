#[derive(Debug)]
pub(crate) struct Input {
    pub(crate) items: Vec<Item>,
}

#[derive(Debug)]
pub(crate) enum Item {
    Record(RecordItem),
    Union(UnionItem),
}

#[derive(Debug)]
pub(crate) struct RecordItem {
    pub(crate) doc: Option<String>,
    pub(crate) name: String,
    pub(crate) fields: Vec<Field>,
}

#[derive(Debug)]
pub(crate) struct Field {
    pub(crate) doc: Option<String>,
    pub(crate) name: String,
    pub(crate) ty: Ty,
    pub(crate) builder: Option<Builder>,
}

#[derive(Debug)]
pub(crate) struct Ty {
    pub(crate) shape: TyShape,
    /// The declared type, verbatim.
    pub(crate) text: String,
    /// The scalar type inside `Option<..>`/`Vec<..>` wrappers, verbatim.
    pub(crate) scalar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TyShape {
    /// `bool`
    Bool,
    /// `Option<bool>`
    TriBool,
    /// Any other unwrapped type.
    Scalar,
    /// `Option<T>`
    Optional,
    /// `Vec<T>`
    List,
}

#[derive(Debug)]
pub(crate) struct Builder {
    pub(crate) kind: BuilderKind,
    pub(crate) short: Option<String>,
    pub(crate) short_only: bool,
    pub(crate) default: Option<String>,
    pub(crate) name_override: Option<String>,
    pub(crate) converter: Option<Conv>,
    pub(crate) choices: Option<Vec<String>>,
    /// `map = [..]` entries: key literal and value expression text.
    pub(crate) map: Option<Vec<(String, String)>>,
    pub(crate) append: bool,
    pub(crate) at_least_one: bool,
    pub(crate) group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuilderKind {
    Positional,
    Option,
    Flag,
    NoFlag,
    TriFlag,
    Subcommand,
    Include,
}

#[derive(Debug)]
pub(crate) enum Conv {
    /// `converter = expr`
    Whole(String),
    /// `converter = itemwise(expr)`
    Itemwise(String),
}

#[derive(Debug)]
pub(crate) struct UnionItem {
    pub(crate) doc: Option<String>,
    pub(crate) name: String,
    pub(crate) variants: Vec<UnionVariant>,
}

#[derive(Debug)]
pub(crate) struct UnionVariant {
    pub(crate) doc: Option<String>,
    pub(crate) cmd: String,
    pub(crate) ident: String,
    pub(crate) ty: String,
}

impl Builder {
    pub(crate) fn new(kind: BuilderKind) -> Builder {
        Builder {
            kind,
            short: None,
            short_only: false,
            default: None,
            name_override: None,
            converter: None,
            choices: None,
            map: None,
            append: false,
            at_least_one: false,
            group: None,
        }
    }
}
