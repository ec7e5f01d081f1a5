argrec::record! {
    struct Gather {
        tags: Vec<String> = positional(),
    }

    struct GatherSome {
        tags: Vec<String> = positional(at_least_one),
    }

    struct Accumulate {
        /// Data points, one per occurrence.
        data: Vec<String> = option(append),
        ints: Vec<u32> = option(converter = argrec::convert::csv, default = "1,2"),
    }

    struct Bits {
        bits: Vec<bool> = option(converter = itemwise(parse_bit)),
    }
}

fn parse_bit(value: &str) -> Result<bool, String> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(format!("expected 0 or 1, got {value}")),
    }
}
