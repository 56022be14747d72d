//! Small flag parser with required/optional declarations and usage rendering.
//!
//! Flags are declared up front on an [`Args`] instance, then one call to
//! [`Args::initialize`] recognizes argv, validates it, applies defaults and
//! leaves the values queryable:
//!
//! ```
//! use sargs::Args;
//!
//! let mut args = Args::new();
//! args.disable_exit().disable_usage_print();
//! args.add_required_flag_value("-c", "--count", "How many")
//!     .add_optional_flag_value_default("--display", "-d", "Display size", "1024x2048");
//!
//! args.initialize(&["prog", "-c=12", "--", "file1"]).unwrap();
//! assert_eq!(args.get_as_i64("--count").unwrap(), 12);
//! assert_eq!(args.get_as_string("-d").unwrap(), "1024x2048");
//! assert_eq!(args.get_nonflags(), ["file1"]);
//! ```
//!
//! Tokens that do not name a declared flag are not rejected; they are
//! collected as non-flags. Use [`Args::require_nonflags`] to bound them.
//!
//! With default [`Settings`] a failed initialization prints usage to stdout
//! and exits with status 0. Embedders turn that off with
//! [`Args::disable_exit`] and [`Args::disable_usage_print`] and handle the
//! returned [`Error`] instead, or call [`Args::parse`] for a
//! [`ParseOutcome`] that never prints or exits.

mod args;
mod error;
mod flag;
mod flag_parser;
mod usage;
mod value;

pub use args::{
    AliasPolicy, Args, DEFAULT_NAME_COLUMN_WIDTH, DEFAULT_WRAP_WIDTH, NonFlagRule, ParseOutcome,
    Settings, UsageStream,
};
pub use error::{Error, Result};
pub use flag::FlagSpec;
pub use flag_parser::{FlagParser, ParsedArguments};
pub use usage::wrap_description;
