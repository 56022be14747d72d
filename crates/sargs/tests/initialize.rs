use sargs::{Args, Error, FlagSpec, ParseOutcome, Settings};

fn embedded() -> Args {
    Args::with_settings(Settings {
        exit_on_failure: false,
        print_usage_on_failure: false,
        ..Settings::default()
    })
}

#[test]
fn required_flags_with_inline_values() {
    let mut args = embedded();
    args.add_required_flag_value("-c", "", "The dash c flag")
        .add_required_flag("--goof", "", "The goof flag")
        .add_required_flag_value(
            "--super",
            "-s",
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Cras id nulla dapibus, \
             rutrum odio id, posuere libero.",
        );

    args.initialize(&["prog", "-c=12", "--goof", "--super=mfile.dat"])
        .unwrap();

    assert!(args.has("--goof"));
    assert_eq!(args.get_as_string("-c").unwrap(), "12");
    assert_eq!(args.get_as_i64("-c").unwrap(), 12);
    assert_eq!(args.get_as_string("--super").unwrap(), "mfile.dat");
    assert_eq!(args.get_as_string("-s").unwrap(), "mfile.dat");
    assert_eq!(args.binary(), "prog");

    let usage = args.usage();
    assert!(usage.starts_with("Usage: prog [--help|-h] -c=value --goof --super=value\n\n"));
    assert!(usage.contains("  Required flags:\n"));
    assert!(usage.contains("  Optional flags:\n"));
    // The long description wraps under the description column.
    assert!(usage.contains(&format!("\n{}", " ".repeat(30))));
}

#[test]
fn unknown_flags_count_as_nonflags() {
    let mut args = embedded();
    args.add_optional_flag_value_default("--display", "-d", "Displays", "1024x2048")
        .add_optional_flag_value_default("--convert", "-c", "Converts", "standard")
        .require_nonflags(1);

    let err = args
        .initialize(&["prog", "-c=12", "--garbage", "--", "file1"])
        .unwrap_err();
    let Error::Validation { message, usage } = err else {
        panic!("expected Validation, got {err:?}");
    };
    assert_eq!(message, "Must specify exactly 1 non-flags, 2 given");
    assert!(usage.contains("--display=value/-d=value"));
    assert_eq!(args.get_nonflags(), ["--garbage", "file1"]);

    args.initialize(&["prog", "-c=12", "--", "file1"]).unwrap();
    assert_eq!(args.get_as_string("--convert").unwrap(), "12");
    assert_eq!(args.get_as_string("--display").unwrap(), "1024x2048");
    assert_eq!(args.get_nonflag(0).unwrap(), "file1");
}

#[test]
fn separator_collects_nonflags_after_flags() {
    let mut args = embedded();
    args.add_required_flag("-a", "", "A")
        .add_optional_flag_value("--bee", "", "Bee")
        .require_nonflags(2);

    args.initialize(&["prog", "-a", "--bee=12", "--", "file1", "file2"])
        .unwrap();
    assert_eq!(args.get_nonflags(), ["file1", "file2"]);

    assert!(args.initialize(&["prog", "-a", "--", "file1"]).is_err());
}

#[test]
fn value_flag_consumes_next_token() {
    let mut args = embedded();
    args.add_optional_flag_value("--out", "-o", "Output")
        .add_optional_flag("--verbose", "-v", "Verbose");

    args.initialize(&["prog", "-o", "-", "-v"]).unwrap();
    assert_eq!(args.get_as_string("--out").unwrap(), "-");
    assert!(args.has("--verbose"));

    let err = args.initialize(&["prog", "-v", "-o"]).unwrap_err();
    assert!(!err.is_usage());
    assert_eq!(err.to_string(), "no value specified for -o");
}

#[test]
fn help_request_is_distinguishable() {
    let mut args = embedded();
    args.add_required_flag_value("--foo", "-f", "The description of foo")
        .add_optional_flag("--bar", "", "The bar flag to help")
        .set_epilogue("See the manual for more.\n");

    let err = args.initialize(&["prog", "--help"]).unwrap_err();
    assert!(err.is_usage());
    let usage = err.usage().unwrap();
    assert!(usage.starts_with("Usage: prog [--bar|--help|-h] --foo=value\n\n"));
    assert!(usage.ends_with("See the manual for more.\n"));
    assert_eq!(usage, args.usage());
}

#[test]
fn parse_never_prints_or_exits() {
    // Default settings would print and exit from `initialize`.
    let mut args = Args::new();
    args.add_required_flag("--must", "", "Must");
    let outcome = args.parse(&["prog"]);
    assert!(matches!(outcome, ParseOutcome::ValidationFailed { .. }));
    assert!(!outcome.is_ready());
    assert_eq!(args.outcome(), Some(&outcome));
}

#[test]
fn builder_declarations() {
    let mut args = embedded();
    args.add_flag(
        FlagSpec::new("--level")
            .alias("-l")
            .description("Level")
            .required(true)
            .takes_value(true),
    )
    .add_flag(FlagSpec::new("--ratio").default_value("0.5"));

    args.initialize(&["prog", "-l", "0x10"]).unwrap();
    assert_eq!(args.get_as_u16("--level").unwrap(), 16);
    assert_eq!(args.get_as_f32("--ratio").unwrap(), 0.5);
    assert_eq!(args.required_flags().len(), 1);
    assert!(args.is_explicit("--level"));
    assert!(!args.is_explicit("--ratio"));
}

#[test]
fn global_instance_is_shared() {
    {
        let mut args = Args::global();
        args.disable_exit().disable_usage_print();
        args.add_optional_flag_value("--what", "-w", "The thing to say");
        args.initialize(&["prog", "-w", "hello"]).unwrap();
    }
    assert_eq!(Args::global().get_as_string("--what").unwrap(), "hello");
}

#[test]
fn parsed_arguments_serialize() {
    let mut args = embedded();
    args.add_optional_flag_value("--what", "-w", "The thing to say");
    args.initialize(&["prog", "-w=hi", "rest"]).unwrap();

    let json = serde_json::to_value(args.parsed()).unwrap();
    assert_eq!(json["binary"], "prog");
    assert_eq!(json["flags"]["-w"], "hi");
    assert_eq!(json["nonflags"][0], "rest");
}
