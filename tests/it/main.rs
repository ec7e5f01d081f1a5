mod choices;
mod commands;
mod declerr;
mod flags;
mod help;
mod inherit;
mod lists;
mod mutex;
mod overrides;
mod smoke;

use std::{ffi::OsString, fmt};

use expect_test::{expect, Expect};

fn check<F, A>(f: F, args: &str, expect: Expect)
where
    F: FnOnce(Vec<OsString>) -> argrec::Result<A>,
    A: fmt::Debug,
{
    let args = args.split_ascii_whitespace().map(OsString::from).collect::<Vec<_>>();
    match f(args) {
        Ok(args) => expect.assert_debug_eq(&args),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}

#[test]
fn smoke() {
    check(
        smoke::Stats::from_vec,
        ".",
        expect![[r#"
            Stats {
                workspace: ".",
                format: "text",
                jobs: None,
                verbose: false,
            }
        "#]],
    );
    check(
        smoke::Stats::from_vec,
        ". --format json -j 4 -v",
        expect![[r#"
            Stats {
                workspace: ".",
                format: "json",
                jobs: Some(
                    4,
                ),
                verbose: true,
            }
        "#]],
    );
    check(
        smoke::Stats::from_vec,
        "--format=json .",
        expect![[r#"
            Stats {
                workspace: ".",
                format: "json",
                jobs: None,
                verbose: false,
            }
        "#]],
    );

    check(smoke::Stats::from_vec, "", expect!["argument `workspace` is required"]);
    check(smoke::Stats::from_vec, ". --werbose", expect!["unknown option: `--werbose`"]);
    check(
        smoke::Stats::from_vec,
        ". -j lol",
        expect!["invalid value for `--jobs`: invalid digit found in string"],
    );
    check(smoke::Stats::from_vec, ". -j", expect!["expected a value for `-j`"]);
    check(smoke::Stats::from_vec, ". extra", expect!["unexpected argument: `extra`"]);
}

#[test]
fn defaults_round_trip() {
    check(
        smoke::Round::from_vec,
        "value",
        expect![[r#"
            Round {
                positional: "value",
                option: "foo",
            }
        "#]],
    );
    check(
        smoke::Round::from_vec,
        "value --option bar",
        expect![[r#"
            Round {
                positional: "value",
                option: "bar",
            }
        "#]],
    );
}

#[test]
fn repeated_single_options_take_the_last_value() {
    check(
        smoke::Round::from_vec,
        "value --option a --option b",
        expect![[r#"
            Round {
                positional: "value",
                option: "b",
            }
        "#]],
    );
}

#[test]
fn compiling_twice_is_idempotent() {
    let first = argrec::spec_of::<smoke::Stats>().unwrap();
    let second = argrec::spec_of::<smoke::Stats>().unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(format!("{first:?}"), format!("{second:?}"));
}

#[test]
fn flags() {
    check(
        flags::Toggles::from_vec,
        "",
        expect![[r#"
            Toggles {
                foo: false,
                bar: true,
                barr: true,
                barrr: true,
                baz: false,
                boo: false,
            }
        "#]],
    );
    check(
        flags::Toggles::from_vec,
        "--foo -B -R -z -o",
        expect![[r#"
            Toggles {
                foo: true,
                bar: true,
                barr: false,
                barrr: false,
                baz: true,
                boo: true,
            }
        "#]],
    );
    check(
        flags::Toggles::from_vec,
        "--no-bar",
        expect![[r#"
            Toggles {
                foo: false,
                bar: false,
                barr: true,
                barrr: true,
                baz: false,
                boo: false,
            }
        "#]],
    );

    // `no_flag` and `short_only` arguments have no positive long form.
    check(flags::Toggles::from_vec, "--bar", expect!["unknown option: `--bar`"]);
    check(flags::Toggles::from_vec, "--boo", expect!["unknown option: `--boo`"]);
    check(flags::Toggles::from_vec, "--no-foo", expect!["unknown option: `--no-foo`"]);
}

#[test]
fn tri_state_flags() {
    check(
        flags::Tri::from_vec,
        "",
        expect![[r#"
            Tri {
                clone: None,
                push: None,
            }
        "#]],
    );
    check(
        flags::Tri::from_vec,
        "--clone",
        expect![[r#"
            Tri {
                clone: Some(
                    true,
                ),
                push: None,
            }
        "#]],
    );
    check(
        flags::Tri::from_vec,
        "--no-clone --push",
        expect![[r#"
            Tri {
                clone: Some(
                    false,
                ),
                push: Some(
                    true,
                ),
            }
        "#]],
    );
    check(
        flags::Tri::from_vec,
        "--clone --no-clone",
        expect!["argument `--no-clone` is not allowed with `--clone`"],
    );
}

#[test]
fn list_positionals() {
    check(
        lists::Gather::from_vec,
        "a b c",
        expect![[r#"
            Gather {
                tags: [
                    "a",
                    "b",
                    "c",
                ],
            }
        "#]],
    );
    check(
        lists::Gather::from_vec,
        "",
        expect![[r#"
            Gather {
                tags: [],
            }
        "#]],
    );
    check(lists::GatherSome::from_vec, "", expect!["argument `tags` is required"]);
    check(
        lists::GatherSome::from_vec,
        "a",
        expect![[r#"
            GatherSome {
                tags: [
                    "a",
                ],
            }
        "#]],
    );
}

#[test]
fn append_and_whole_value_converters() {
    check(
        lists::Accumulate::from_vec,
        "--data a --data b",
        expect![[r#"
            Accumulate {
                data: [
                    "a",
                    "b",
                ],
                ints: [
                    1,
                    2,
                ],
            }
        "#]],
    );
    check(
        lists::Accumulate::from_vec,
        "--data a --ints 3,4",
        expect![[r#"
            Accumulate {
                data: [
                    "a",
                ],
                ints: [
                    3,
                    4,
                ],
            }
        "#]],
    );
    check(lists::Accumulate::from_vec, "", expect!["argument `--data` is required"]);
    check(
        lists::Accumulate::from_vec,
        "--data a --ints 3,lol",
        expect!["invalid value for `--ints`: invalid digit found in string"],
    );
}

#[test]
fn itemwise_converters() {
    check(
        lists::Bits::from_vec,
        "--bits 1 0 1",
        expect![[r#"
            Bits {
                bits: [
                    true,
                    false,
                    true,
                ],
            }
        "#]],
    );
    check(
        lists::Bits::from_vec,
        "",
        expect![[r#"
            Bits {
                bits: [],
            }
        "#]],
    );
    check(
        lists::Bits::from_vec,
        "--bits 1 2",
        expect!["invalid value for `--bits`: expected 0 or 1, got 2"],
    );
}

#[test]
fn subcommands() {
    check(
        commands::Pipeline::from_vec,
        "foo --arg1 x",
        expect![[r#"
            Pipeline {
                verbose: false,
                action: Foo(
                    FooArgs {
                        arg1: "x",
                    },
                ),
            }
        "#]],
    );
    check(
        commands::Pipeline::from_vec,
        "-v bar 5",
        expect![[r#"
            Pipeline {
                verbose: true,
                action: Bar(
                    BarArgs {
                        arg2: 5,
                        detail: None,
                    },
                ),
            }
        "#]],
    );
    check(
        commands::Pipeline::from_vec,
        "bar 5 explain --deep",
        expect![[r#"
            Pipeline {
                verbose: false,
                action: Bar(
                    BarArgs {
                        arg2: 5,
                        detail: Some(
                            Explain(
                                ExplainArgs {
                                    deep: true,
                                },
                            ),
                        ),
                    },
                ),
            }
        "#]],
    );

    check(commands::Pipeline::from_vec, "", expect!["a subcommand is required"]);
    check(
        commands::Pipeline::from_vec,
        "bogus",
        expect!["invalid choice `bogus` for `action`, expected one of foo, bar"],
    );
    // Arguments are scoped to their own command level.
    check(commands::Pipeline::from_vec, "foo -v --arg1 x", expect!["unknown option: `-v`"]);
    check(commands::Pipeline::from_vec, "--arg1 x foo", expect!["unknown option: `--arg1`"]);
    check(commands::Pipeline::from_vec, "foo", expect!["argument `--arg1` is required"]);
}

#[test]
fn optional_subcommands() {
    check(
        commands::Maybe::from_vec,
        "",
        expect![[r#"
            Maybe {
                action: None,
            }
        "#]],
    );
    check(
        commands::Maybe::from_vec,
        "bar 9",
        expect![[r#"
            Maybe {
                action: Some(
                    Bar(
                        BarArgs {
                            arg2: 9,
                            detail: None,
                        },
                    ),
                ),
            }
        "#]],
    );
}

#[test]
fn subcommand_identity_is_a_pattern_match() {
    let args = commands::Pipeline::from_vec(to_vec("foo --arg1 x")).unwrap();
    assert!(matches!(args.action, commands::Action::Foo(_)));
    assert!(!matches!(args.action, commands::Action::Bar(_)));

    let args = commands::Pipeline::from_vec(to_vec("bar 5")).unwrap();
    assert!(matches!(args.action, commands::Action::Bar(_)));
    match &args.action {
        commands::Action::Bar(bar) => assert_eq!(bar.arg2, 5),
        other => panic!("expected `bar`, got {other:?}"),
    }
}

#[test]
fn mutual_exclusion() {
    check(
        mutex::Exclusive::from_vec,
        "--foo x --flag2",
        expect![[r#"
            Exclusive {
                foo: Some(
                    "x",
                ),
                bar: None,
                flag1: false,
                flag2: true,
            }
        "#]],
    );
    check(
        mutex::Exclusive::from_vec,
        "--foo x --bar y",
        expect!["argument `--bar` is not allowed with `--foo`"],
    );
    check(
        mutex::Exclusive::from_vec,
        "--flag1 --flag2",
        expect!["argument `--flag2` is not allowed with `--flag1`"],
    );
}

#[test]
fn enumeration_choices() {
    check(
        choices::Judge::from_vec,
        "--result pass --verdict accept",
        expect![[r#"
            Judge {
                result: Pass,
                level: "info",
                verdict: 1,
            }
        "#]],
    );
    check(
        choices::Judge::from_vec,
        "--result fail --verdict reject --level debug",
        expect![[r#"
            Judge {
                result: Fail,
                level: "debug",
                verdict: 0,
            }
        "#]],
    );
    check(
        choices::Judge::from_vec,
        "--result bogus --verdict accept",
        expect!["invalid choice `bogus` for `--result`, expected one of pass, fail"],
    );
    check(
        choices::Judge::from_vec,
        "--result pass --verdict nope",
        expect!["invalid choice `nope` for `--verdict`, expected one of accept, reject"],
    );
    check(
        choices::Judge::from_vec,
        "--result pass --verdict accept --level silly",
        expect!["invalid choice `silly` for `--level`, expected one of info, debug"],
    );
}

#[test]
fn dict_positionals() {
    check(
        choices::Pick::from_vec,
        "second",
        expect![[r#"
            Pick {
                slot: 1,
            }
        "#]],
    );
    check(
        choices::Pick::from_vec,
        "third",
        expect!["invalid choice `third` for `slot`, expected one of first, second"],
    );
}

#[test]
fn included_records_share_the_command_line() {
    check(
        inherit::Merged::from_vec,
        "--debug --foo",
        expect![[r#"
            Merged {
                common: Common {
                    debug: true,
                },
                foo: true,
            }
        "#]],
    );
    check(
        inherit::Merged::from_vec,
        "",
        expect![[r#"
            Merged {
                common: Common {
                    debug: false,
                },
                foo: false,
            }
        "#]],
    );
}

#[test]
fn own_fields_supersede_included_ones() {
    check(
        inherit::Shadowing::from_vec,
        "-d",
        expect![[r#"
            Shadowing {
                common: Common {
                    debug: true,
                },
                debug: true,
            }
        "#]],
    );
    check(
        inherit::Shadowing::from_vec,
        "--debug",
        expect![[r#"
            Shadowing {
                common: Common {
                    debug: true,
                },
                debug: true,
            }
        "#]],
    );
}

#[test]
fn variants_inherit_included_fields() {
    check(
        inherit::WithCmds::from_vec,
        "foo --debug --foo",
        expect![[r#"
            WithCmds {
                action: Foo(
                    FooCmd {
                        common: Common {
                            debug: true,
                        },
                        foo: true,
                    },
                ),
            }
        "#]],
    );
    check(
        inherit::WithCmds::from_vec,
        "bar --bar",
        expect![[r#"
            WithCmds {
                action: Bar(
                    BarCmd {
                        common: Common {
                            debug: false,
                        },
                        bar: true,
                    },
                ),
            }
        "#]],
    );
}

#[test]
fn overrides_layer_under_the_command_line() {
    let overrides = argrec::Overrides::new().set("mode", "slow").set("retries", "3");
    check(
        |args| argrec::from_vec_with::<overrides::Tunable>(args, &overrides),
        "",
        expect![[r#"
            Tunable {
                mode: "slow",
                retries: 3,
                cache: false,
                clone: None,
            }
        "#]],
    );
    check(
        |args| argrec::from_vec_with::<overrides::Tunable>(args, &overrides),
        "--mode turbo",
        expect![[r#"
            Tunable {
                mode: "turbo",
                retries: 3,
                cache: false,
                clone: None,
            }
        "#]],
    );
}

#[test]
fn overridden_flags_leave_the_parser() {
    let overrides = argrec::Overrides::new().set("cache", "true").set("retries", "0");
    check(
        |args| argrec::from_vec_with::<overrides::Tunable>(args, &overrides),
        "",
        expect![[r#"
            Tunable {
                mode: "fast",
                retries: 0,
                cache: true,
                clone: None,
            }
        "#]],
    );
    check(
        |args| argrec::from_vec_with::<overrides::Tunable>(args, &overrides),
        "--cache",
        expect!["unknown option: `--cache`"],
    );
}

#[test]
fn tri_state_overrides() {
    let overrides = argrec::Overrides::new().set("clone", "true").set("retries", "1");
    check(
        |args| argrec::from_vec_with::<overrides::Tunable>(args, &overrides),
        "",
        expect![[r#"
            Tunable {
                mode: "fast",
                retries: 1,
                cache: false,
                clone: Some(
                    true,
                ),
            }
        "#]],
    );
}

#[test]
fn unknown_override_names_are_reported() {
    let overrides = argrec::Overrides::new().set("bogus", "x");
    check(
        |args| argrec::from_vec_with::<overrides::Tunable>(args, &overrides),
        "",
        expect!["unknown override `bogus`"],
    );
}

#[test]
fn declaration_errors() {
    check(declerr::DupShort::from_vec, "", expect!["duplicate short form `-a`"]);
    check(declerr::DupLong::from_vec, "", expect!["duplicate option `--out`"]);
    check(
        declerr::BadOrder::from_vec,
        "",
        expect!["required positional `second` after optional positional `first`"],
    );
    check(
        declerr::VarThenMore::from_vec,
        "",
        expect!["positional `last` follows variable-arity positional `rest`"],
    );
    check(
        declerr::MutexNoDefault::from_vec,
        "",
        expect!["argument `foo` in mutually exclusive group has to have a default"],
    );
    check(
        declerr::BadDefault::from_vec,
        "",
        expect!["default `silly` for `level` is not one of the choices"],
    );
    check(
        declerr::BadMapDefault::from_vec,
        "",
        expect!["default `nope` for `verdict` is not one of the choices"],
    );
    check(
        declerr::VarWithCmds::from_vec,
        "",
        expect!["variable-arity positionals can't be combined with sub-commands"],
    );
    check(
        declerr::Shadowed::from_vec,
        "",
        expect!["command `run` shadows a command of an enclosing level"],
    );
    check(
        declerr::Colliding::from_vec,
        "",
        expect!["argument `verbose` collides with an argument of an enclosing command"],
    );
}

#[test]
fn help_is_rendered_from_the_compiled_spec() {
    let text = help::Inspect::help_text().unwrap();
    expect![[r#"
        Inspect a repository.

        ARGS:
            <repo>
              Path to the repository.

        OPTIONS:
            --format {text|json}
              Output format.

            -j, --jobs <JOBS>
              Number of parallel jobs.

            -v, --verbose
              Be chatty about it.

            -h, --help
              Prints help information.

        SUBCOMMANDS:
            check
              Verify the repository.

            fix
    "#]]
    .assert_eq(&text);
}

#[test]
fn help_flag_reports_help() {
    let err = help::Inspect::from_vec(to_vec("--help")).unwrap_err();
    assert!(err.is_help());
    assert_eq!(err.to_string(), help::Inspect::help_text().unwrap());

    // Each command level renders its own help.
    let err = help::Inspect::from_vec(to_vec(". check --help")).unwrap_err();
    assert!(err.is_help());
    assert!(err.to_string().contains("check"));
}

fn to_vec(args: &str) -> Vec<OsString> {
    args.split_ascii_whitespace().map(OsString::from).collect()
}
