argrec::record! {
    struct Toggles {
        foo: bool,
        bar: bool = no_flag(),
        barr: bool = no_flag("-B"),
        barrr: bool = no_flag("-R", short_only),
        baz: bool = flag("-z"),
        boo: bool = flag("-o", short_only),
    }

    struct Tri {
        clone: Option<bool>,
        push: Option<bool> = tri_flag(),
    }
}
