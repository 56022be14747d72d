use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use sargs::{Args, Error, UsageStream};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

const EPILOGUE: &str = "\nSet RUST_LOG=debug to trace argument handling.\n";

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Report<'a> {
    display: String,
    convert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<i64>,
    nonflags: &'a [String],
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn declare(args: &mut Args) {
    args.add_optional_flag_value_default("--display", "-d", "Display resolution", "1024x2048")
        .add_optional_flag_value_default("--convert", "-c", "Conversion mode", "standard")
        .add_optional_flag_value(
            "--count",
            "-n",
            "How many times to repeat the report. Accepts decimal, 0x-prefixed hexadecimal \
             and 0-prefixed octal values.",
        )
        .add_optional_flag("--dump", "", "Print the result as JSON")
        .add_optional_flag(
            "--strict",
            "",
            "Exit with status 1 on invalid arguments instead of 0",
        )
        .add_optional_flag("--stderr", "", "Print usage to stderr instead of stdout")
        .set_epilogue(EPILOGUE);
}

fn run() -> Result<ExitCode> {
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    // Needed before initialization, so read from raw argv.
    let raw_flag = |flag: &str| {
        argv.iter()
            .skip(1)
            .take_while(|arg| *arg != "--")
            .any(|arg| arg == flag)
    };
    let strict = raw_flag("--strict");
    let to_stderr = raw_flag("--stderr");

    let mut args = Args::global();
    declare(&mut args);
    if strict {
        args.disable_exit().disable_usage_print();
    }
    if to_stderr {
        args.set_usage_stream(UsageStream::Stderr);
    }

    tracing::debug!(strict, to_stderr, "initializing arguments");
    match args.initialize(argv.as_slice()) {
        Ok(()) => {}
        Err(Error::UsageRequested(usage)) => {
            print!("{usage}");
            return Ok(ExitCode::SUCCESS);
        }
        Err(Error::Validation { message, usage }) => {
            eprintln!("{message}\n");
            eprint!("{usage}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    }

    let count = if args.has("--count") {
        Some(args.get_as_i64("--count").context("invalid --count")?)
    } else {
        None
    };
    let report = Report {
        display: args.get_as_string("--display")?,
        convert: args.get_as_string("--convert")?,
        count,
        nonflags: args.get_nonflags(),
    };

    let mut out = io::stdout().lock();
    if args.has("--dump") {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(ExitCode::SUCCESS);
    }

    for _ in 0..report.count.unwrap_or(1).max(1) {
        writeln!(out, "Display is {}", report.display)?;
        writeln!(out, "Convert is {}", report.convert)?;
    }
    for (i, nonflag) in report.nonflags.iter().enumerate() {
        writeln!(out, "Nonflag {i} is {nonflag}")?;
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
