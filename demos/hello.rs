mod args {
    argrec::record! {
        /// Say hello.
        struct Hello {
            /// Who to greet.
            name: String = positional(),
            /// Use an emoji instead of punctuation.
            emoji: bool = flag("-e"),
        }
    }
}

fn main() {
    let hello = args::Hello::from_env_or_exit();
    let bang = if hello.emoji { "❣️" } else { "!" };
    println!("Hello {}{}", hello.name, bang);
}
