argrec::record! {
    struct Common {
        /// Enable debug output.
        debug: bool,
    }

    struct Merged {
        common: Common = include(),
        foo: bool,
    }

    struct Shadowing {
        common: Common = include(),
        debug: bool = flag("-d"),
    }

    struct WithCmds {
        action: Act = subcommand(),
    }

    struct FooCmd {
        common: Common = include(),
        foo: bool,
    }

    struct BarCmd {
        common: Common = include(),
        bar: bool,
    }

    enum Act {
        "foo" => Foo(FooCmd),
        "bar" => Bar(BarCmd),
    }
}
