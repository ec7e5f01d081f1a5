mod ast;
mod emit;
mod parse;

/// Declare argument records and sub-command unions. See the `argrec` crate
/// documentation for the grammar.
#[cfg(not(test))]
#[proc_macro]
pub fn record(ts: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse::parse(ts).unwrap_or_else(|err| panic!("argrec: {}", err.msg));
    let text = emit::emit(&input);
    text.parse().unwrap()
}

#[cfg(test)]
pub fn compile(src: &str) -> String {
    use proc_macro2::TokenStream;

    let ts = src.parse::<TokenStream>().unwrap();
    let input = parse::parse(ts).unwrap_or_else(|err| panic!("argrec: {}", err.msg));
    emit::emit(&input)
}
