argrec::value_enum! {
    enum Outcome {
        Pass = "pass",
        Fail = "fail",
    }
}

argrec::record! {
    struct Judge {
        /// The recorded outcome.
        result: Outcome = option(),
        level: String = option(default = "info", choices = ["info", "debug"]),
        verdict: u32 = option(map = [("accept", 1), ("reject", 0)]),
    }

    struct Pick {
        slot: u32 = positional(map = [("first", 0), ("second", 1)]),
    }
}
