argrec::record! {
    struct DupShort {
        alpha: Option<String> = option("-a"),
        all: bool = flag("-a"),
    }

    struct DupLong {
        out: Option<String> = option(),
        output: Option<String> = option(name = "out"),
    }

    struct BadOrder {
        first: Option<String> = positional(),
        second: String = positional(),
    }

    struct VarThenMore {
        rest: Vec<String> = positional(),
        last: Option<String> = positional(),
    }

    struct MutexNoDefault {
        foo: String = option(group = g),
        bar: Option<String> = option(group = g),
    }

    struct BadDefault {
        level: String = option(default = "silly", choices = ["info", "debug"]),
    }

    struct BadMapDefault {
        verdict: u32 = option(default = "nope", map = [("accept", 1)]),
    }

    struct RunArgs {
        quiet: bool,
    }

    enum Act {
        "run" => Run(RunArgs),
    }

    struct VarWithCmds {
        rest: Vec<String> = positional(),
        action: Act = subcommand(),
    }

    struct OuterRun {
        inner: InnerAct = subcommand(),
    }

    enum OuterAct {
        "run" => Run(OuterRun),
    }

    enum InnerAct {
        "run" => Run(RunArgs),
    }

    struct Shadowed {
        action: OuterAct = subcommand(),
    }

    struct GoArgs {
        verbose: bool,
    }

    enum GoAct {
        "go" => Go(GoArgs),
    }

    struct Colliding {
        verbose: bool,
        action: GoAct = subcommand(),
    }
}
