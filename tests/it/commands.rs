argrec::record! {
    /// Drive the pipeline.
    struct Pipeline {
        /// Be chatty about it.
        verbose: bool = flag("-v"),
        action: Action = subcommand(),
    }

    struct Maybe {
        action: Option<Action> = subcommand(),
    }

    /// Run the foo pass.
    struct FooArgs {
        arg1: String,
    }

    struct BarArgs {
        arg2: i64 = positional(),
        detail: Option<Detail> = subcommand(),
    }

    enum Action {
        /// Run the foo pass.
        "foo" => Foo(FooArgs),
        "bar" => Bar(BarArgs),
    }

    enum Detail {
        "explain" => Explain(ExplainArgs),
    }

    struct ExplainArgs {
        deep: bool,
    }
}
