argrec::record! {
    struct Exclusive {
        foo: Option<String> = option(group = source),
        bar: Option<String> = option(group = source),
        flag1: bool = flag(group = toggles),
        flag2: bool = flag(group = toggles),
    }
}
