argrec::record! {
    /// Inspect a repository.
    struct Inspect {
        /// Path to the repository.
        repo: String = positional(),
        /// Output format.
        format: String = option(default = "text", choices = ["text", "json"]),
        /// Number of parallel jobs.
        jobs: Option<u32> = option("-j"),
        /// Be chatty about it.
        verbose: bool = flag("-v"),
        action: HelpAction = subcommand(),
    }

    struct CheckArgs {
        strict: bool,
    }

    struct FixArgs {}

    enum HelpAction {
        /// Verify the repository.
        "check" => Check(CheckArgs),
        "fix" => Fix(FixArgs),
    }
}
