argrec::record! {
    struct Tunable {
        mode: String = option(default = "fast"),
        retries: u32 = option(),
        cache: bool,
        clone: Option<bool>,
    }
}
