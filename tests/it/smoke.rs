argrec::record! {
    /// Collect statistics about a workspace.
    struct Stats {
        /// Path to the workspace root.
        workspace: String = positional(),
        /// Output format.
        format: String = option(default = "text"),
        /// Number of parallel jobs.
        jobs: Option<u32> = option("-j"),
        /// Be chatty about it.
        verbose: bool = flag("-v"),
    }

    struct Round {
        positional: String = positional(),
        option: String = option(default = "foo"),
    }
}
