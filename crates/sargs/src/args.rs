//! Flag declarations, validation and typed lookups.

use std::io::{self, Write};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::flag::{FlagSpec, non_empty};
use crate::flag_parser::{FlagParser, ParsedArguments, bare};
use crate::usage;
use crate::value::{FloatValue, parse_float, parse_integer};

pub const DEFAULT_NAME_COLUMN_WIDTH: usize = 30;
pub const DEFAULT_WRAP_WIDTH: usize = 50;

const HELP_NAME: &str = "--help";
const HELP_ALIAS: &str = "-h";
const HELP_DESCRIPTION: &str = "Print usage and options information";

static GLOBAL: LazyLock<Mutex<Args>> = LazyLock::new(|| Mutex::new(Args::new()));

/// How many non-flag arguments the command line must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonFlagRule {
    Exactly(usize),
    AtLeast(usize),
}

impl NonFlagRule {
    pub fn count(self) -> usize {
        match self {
            Self::Exactly(n) | Self::AtLeast(n) => n,
        }
    }

    fn check(self, given: usize) -> std::result::Result<(), String> {
        match self {
            Self::Exactly(n) if given != n => Err(format!(
                "Must specify exactly {n} non-flags, {given} given"
            )),
            Self::AtLeast(n) if given < n => Err(format!(
                "Must specify at least {n} non-flags, {given} given"
            )),
            _ => Ok(()),
        }
    }
}

/// What happens when a flag and its alias are both on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasPolicy {
    /// The later occurrence wins.
    #[default]
    Permit,
    /// Validation fails.
    Reject,
}

/// Where usage text goes when it is printed automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageStream {
    #[default]
    Stdout,
    Stderr,
}

/// Behaviour and layout knobs of an [`Args`] instance.
///
/// The defaults reproduce a standalone CLI frontend: `--help`/`-h` is
/// available, and a failed initialization prints usage to stdout and exits
/// the process with status 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub help_enabled: bool,
    /// Return structured errors from `initialize` and the typed getters.
    /// When off, getters return a zero value instead of failing.
    pub errors_enabled: bool,
    pub exit_on_failure: bool,
    pub print_usage_on_failure: bool,
    pub alias_policy: AliasPolicy,
    pub usage_stream: UsageStream,
    pub name_column_width: usize,
    pub wrap_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            help_enabled: true,
            errors_enabled: true,
            exit_on_failure: true,
            print_usage_on_failure: true,
            alias_policy: AliasPolicy::default(),
            usage_stream: UsageStream::default(),
            name_column_width: DEFAULT_NAME_COLUMN_WIDTH,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

/// Result of [`Args::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Validation passed; values are queryable.
    Ready,
    /// `--help`/`-h` was given.
    UsageRequested(String),
    ValidationFailed { message: String, usage: String },
}

impl ParseOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    fn into_error(self) -> Option<Error> {
        match self {
            Self::Ready => None,
            Self::UsageRequested(usage) => Some(Error::UsageRequested(usage)),
            Self::ValidationFailed { message, usage } => Some(Error::Validation { message, usage }),
        }
    }
}

/// Declared flags plus the state of one initialization.
#[derive(Debug, Default)]
pub struct Args {
    settings: Settings,
    parser: FlagParser,
    required: Vec<FlagSpec>,
    optional: Vec<FlagSpec>,
    nonflags: Option<NonFlagRule>,
    help_registered: bool,
    // Help names the builtin slot actually owns.
    help_names: Vec<&'static str>,
    preamble: Option<String>,
    flag_description: Option<String>,
    epilogue: String,
    binary: String,
    parsed: ParsedArguments,
    values: IndexMap<String, String>,
    outcome: Option<ParseOutcome>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// The process-wide instance, created on first use.
    ///
    /// Independent instances from [`Args::new`] are unaffected by it.
    pub fn global() -> MutexGuard<'static, Args> {
        GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Declare a flag. Its names become known to the recognizer immediately.
    pub fn add_flag(&mut self, spec: FlagSpec) -> &mut Self {
        tracing::debug!(
            flag = spec.name.as_str(),
            alias = spec.alias.as_deref(),
            required = spec.required,
            takes_value = spec.takes_value,
            "declared flag"
        );
        self.parser
            .register(&spec.name, spec.alias.as_deref(), spec.takes_value);
        if spec.required {
            self.required.push(spec);
        } else {
            self.optional.push(spec);
        }
        self
    }

    /// Declare a required value-less flag. An empty `alias` means none.
    pub fn add_required_flag(&mut self, name: &str, alias: &str, description: &str) -> &mut Self {
        self.add_flag(flag_spec(name, alias, description).required(true))
    }

    pub fn add_required_flag_value(
        &mut self,
        name: &str,
        alias: &str,
        description: &str,
    ) -> &mut Self {
        self.add_flag(flag_spec(name, alias, description).required(true).takes_value(true))
    }

    pub fn add_required_flag_value_default(
        &mut self,
        name: &str,
        alias: &str,
        description: &str,
        default_value: &str,
    ) -> &mut Self {
        self.add_flag(
            flag_spec(name, alias, description)
                .required(true)
                .default_value(default_value),
        )
    }

    pub fn add_optional_flag(&mut self, name: &str, alias: &str, description: &str) -> &mut Self {
        self.add_flag(flag_spec(name, alias, description))
    }

    pub fn add_optional_flag_value(
        &mut self,
        name: &str,
        alias: &str,
        description: &str,
    ) -> &mut Self {
        self.add_flag(flag_spec(name, alias, description).takes_value(true))
    }

    /// Declare an optional value flag that falls back to `default_value`.
    pub fn add_optional_flag_value_default(
        &mut self,
        name: &str,
        alias: &str,
        description: &str,
        default_value: &str,
    ) -> &mut Self {
        self.add_flag(flag_spec(name, alias, description).default_value(default_value))
    }

    /// Require exactly `count` non-flag arguments.
    pub fn require_nonflags(&mut self, count: usize) -> &mut Self {
        self.nonflags = Some(NonFlagRule::Exactly(count));
        self
    }

    pub fn require_at_least_nonflags(&mut self, count: usize) -> &mut Self {
        self.nonflags = Some(NonFlagRule::AtLeast(count));
        self
    }

    /// Replace the generated `Usage:` line.
    pub fn set_preamble(&mut self, preamble: impl Into<String>) -> &mut Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn set_epilogue(&mut self, epilogue: impl Into<String>) -> &mut Self {
        self.epilogue = epilogue.into();
        self
    }

    /// Replace the generated flag table.
    pub fn set_flag_description(&mut self, flag_description: impl Into<String>) -> &mut Self {
        self.flag_description = Some(flag_description.into());
        self
    }

    pub fn set_name_column_width(&mut self, width: usize) -> &mut Self {
        self.settings.name_column_width = width;
        self
    }

    pub fn set_wrap_width(&mut self, width: usize) -> &mut Self {
        self.settings.wrap_width = width;
        self
    }

    pub fn set_alias_policy(&mut self, policy: AliasPolicy) -> &mut Self {
        self.settings.alias_policy = policy;
        self
    }

    pub fn set_usage_stream(&mut self, stream: UsageStream) -> &mut Self {
        self.settings.usage_stream = stream;
        self
    }

    /// No automatic `--help`/`-h`. Must be called before initialization.
    pub fn disable_help(&mut self) -> &mut Self {
        self.settings.help_enabled = false;
        self
    }

    pub fn disable_exit(&mut self) -> &mut Self {
        self.settings.exit_on_failure = false;
        self
    }

    pub fn disable_errors(&mut self) -> &mut Self {
        self.settings.errors_enabled = false;
        self
    }

    pub fn disable_usage_print(&mut self) -> &mut Self {
        self.settings.print_usage_on_failure = false;
        self
    }

    fn register_help(&mut self) {
        if !self.settings.help_enabled || self.help_registered {
            return;
        }
        self.help_registered = true;
        let taken = |name: &str| {
            self.required
                .iter()
                .chain(&self.optional)
                .any(|spec| spec.matches(name))
        };
        let free: Vec<&'static str> = [HELP_NAME, HELP_ALIAS]
            .into_iter()
            .filter(|name| !taken(*name))
            .collect();
        let Some((&name, alias)) = free.split_first() else {
            return;
        };
        let alias = alias.first().copied();
        tracing::debug!(flag = name, alias, "registered builtin help");
        self.parser.register_builtin(name, alias, false);
        self.optional.push(
            FlagSpec::new(name)
                .alias(alias.unwrap_or_default())
                .description(HELP_DESCRIPTION),
        );
        self.help_names = free;
    }

    fn help_given(&self) -> bool {
        self.settings.help_enabled && self.help_names.iter().any(|name| self.parsed.has(name))
    }

    /// Look for a help flag in raw argv, for when the recognizer bailed out early.
    fn help_in_argv<S: AsRef<str>>(&self, argv: &[S]) -> bool {
        self.settings.help_enabled
            && argv
                .iter()
                .skip(1)
                .map(|arg| bare(arg.as_ref()))
                .take_while(|arg| *arg != "--")
                .any(|arg| self.help_names.iter().any(|name| *name == arg))
    }

    /// Recognize and validate `argv` without printing or exiting.
    pub fn parse<S: AsRef<str>>(&mut self, argv: &[S]) -> ParseOutcome {
        self.register_help();
        self.binary = argv
            .first()
            .map(|binary| binary.as_ref().to_string())
            .unwrap_or_default();
        self.values.clear();

        let (validated, help) = match self.parser.parse(argv) {
            Ok(parsed) => {
                self.parsed = parsed;
                (self.validate(), self.help_given())
            }
            Err(err) => {
                self.parsed = ParsedArguments::default();
                (Err(err.to_string()), self.help_in_argv(argv))
            }
        };

        let outcome = if help {
            ParseOutcome::UsageRequested(self.usage())
        } else {
            match validated {
                Ok(values) => {
                    self.values = values;
                    self.backfill_defaults();
                    ParseOutcome::Ready
                }
                Err(message) => ParseOutcome::ValidationFailed {
                    message,
                    usage: self.usage(),
                },
            }
        };

        match &outcome {
            ParseOutcome::Ready => tracing::debug!("arguments validated"),
            ParseOutcome::UsageRequested(_) => tracing::debug!("usage requested"),
            ParseOutcome::ValidationFailed { message, .. } => {
                tracing::debug!(message = message.as_str(), "argument validation failed")
            }
        }
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Parse `argv` and act on the outcome according to [`Settings`]:
    /// print usage, then exit with status 0, then return the error.
    pub fn initialize<S: AsRef<str>>(&mut self, argv: &[S]) -> Result<()> {
        let outcome = self.parse(argv);
        let Some(error) = outcome.into_error() else {
            return Ok(());
        };

        if self.settings.print_usage_on_failure {
            let printed = match self.settings.usage_stream {
                UsageStream::Stdout => self.report(&error, &mut io::stdout().lock()),
                UsageStream::Stderr => self.report(&error, &mut io::stderr().lock()),
            };
            if let Err(err) = printed {
                tracing::warn!(error = %err, "failed to print usage");
            }
        }

        if self.settings.exit_on_failure {
            std::process::exit(0);
        }

        if self.settings.errors_enabled {
            Err(error)
        } else {
            Ok(())
        }
    }

    /// [`Args::initialize`] with the arguments of the running process.
    pub fn initialize_from_os_args(&mut self) -> Result<()> {
        let argv: Vec<String> = std::env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.initialize(argv.as_slice())
    }

    fn report(&self, error: &Error, out: &mut dyn Write) -> io::Result<()> {
        if let Error::Validation { message, .. } = error {
            writeln!(out, "{message}\n")?;
        }
        out.write_all(error.usage().unwrap_or_default().as_bytes())?;
        out.flush()
    }

    /// Check presence rules and return the value map with aliases mirrored.
    fn validate(&self) -> std::result::Result<IndexMap<String, String>, String> {
        let mut values = self.parsed.flags().clone();

        for spec in &self.required {
            match self.resolve(spec)? {
                Some(value) => mirror(&mut values, spec, value),
                // Filled in by `backfill_defaults`.
                None if spec.default_value.is_some() => {}
                None => {
                    return Err(format!(
                        "{} required, but not specified",
                        spec.display_names()
                    ));
                }
            }
        }

        for spec in &self.optional {
            if let Some(value) = self.resolve(spec)? {
                mirror(&mut values, spec, value);
            }
        }

        if let Some(rule) = self.nonflags {
            rule.check(self.parsed.nonflags().len())?;
        }

        Ok(values)
    }

    /// The value given for `spec` under either name, if any.
    fn resolve(&self, spec: &FlagSpec) -> std::result::Result<Option<String>, String> {
        let given: Vec<&str> = spec.names().filter(|n| self.parsed.has(n)).collect();
        if given.len() > 1 && self.settings.alias_policy == AliasPolicy::Reject {
            return Err(format!(
                "Cannot specify {} and {}, they mean the same thing",
                given[0], given[1]
            ));
        }

        let Some(name) = given
            .into_iter()
            .max_by_key(|n| self.parsed.position(n))
        else {
            return Ok(None);
        };
        let value = self.parsed.get(name).unwrap_or_default();
        if spec.takes_value && value.is_empty() {
            return Err(Error::MissingValue(name.to_string()).to_string());
        }
        Ok(Some(value.to_string()))
    }

    fn backfill_defaults(&mut self) {
        for spec in self.required.iter().chain(&self.optional) {
            let Some(default_value) = &spec.default_value else {
                continue;
            };
            if spec.names().any(|n| self.values.contains_key(n)) {
                continue;
            }
            tracing::trace!(
                flag = spec.name.as_str(),
                default_value = default_value.as_str(),
                "default applied"
            );
            mirror(&mut self.values, spec, default_value.clone());
        }
    }

    /// Outcome of the last [`Args::parse`]/[`Args::initialize`], if any.
    pub fn outcome(&self) -> Option<&ParseOutcome> {
        self.outcome.as_ref()
    }

    /// Recognizer output of the last initialization, before aliasing and defaults.
    pub fn parsed(&self) -> &ParsedArguments {
        &self.parsed
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn required_flags(&self) -> &[FlagSpec] {
        &self.required
    }

    pub fn optional_flags(&self) -> &[FlagSpec] {
        &self.optional
    }

    /// Whether `flag` has a value after validation (given, aliased or defaulted).
    pub fn has(&self, flag: &str) -> bool {
        !flag.is_empty() && self.values.contains_key(flag)
    }

    /// Whether `flag`, or the other name of the same declared flag, was
    /// given on the command line. Defaults do not count.
    pub fn is_explicit(&self, flag: &str) -> bool {
        match self
            .required
            .iter()
            .chain(&self.optional)
            .find(|spec| spec.matches(flag))
        {
            Some(spec) => spec.names().any(|n| self.parsed.has(n)),
            None => self.parsed.has(flag),
        }
    }

    /// Raw value after validation.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(String::as_str)
    }

    /// All flag values after validation.
    pub fn flags(&self) -> &IndexMap<String, String> {
        &self.values
    }

    fn query<T: Default>(&self, flag: &str, convert: impl FnOnce(&str) -> Result<T>) -> Result<T> {
        let result = if flag.is_empty() {
            Err(Error::EmptyFlagName)
        } else {
            self.get(flag)
                .ok_or_else(|| Error::NotSpecified(flag.to_string()))
                .and_then(convert)
        };
        match result {
            Err(err) if !self.settings.errors_enabled => {
                tracing::debug!(flag, error = %err, "query failed, returning zero value");
                Ok(T::default())
            }
            other => other,
        }
    }

    pub fn get_as_string(&self, flag: &str) -> Result<String> {
        self.query(flag, |raw| Ok(raw.to_string()))
    }

    fn get_as_integer<T>(&self, flag: &str, target: &'static str) -> Result<T>
    where
        T: TryFrom<i128> + Default,
    {
        self.query(flag, |raw| parse_integer(raw, target))
    }

    fn get_as_float<T: FloatValue + Default>(&self, flag: &str, target: &'static str) -> Result<T> {
        self.query(flag, |raw| parse_float(raw, target))
    }

    pub fn get_as_i64(&self, flag: &str) -> Result<i64> {
        self.get_as_integer(flag, "i64")
    }

    pub fn get_as_i32(&self, flag: &str) -> Result<i32> {
        self.get_as_integer(flag, "i32")
    }

    pub fn get_as_i16(&self, flag: &str) -> Result<i16> {
        self.get_as_integer(flag, "i16")
    }

    pub fn get_as_i8(&self, flag: &str) -> Result<i8> {
        self.get_as_integer(flag, "i8")
    }

    pub fn get_as_u64(&self, flag: &str) -> Result<u64> {
        self.get_as_integer(flag, "u64")
    }

    pub fn get_as_u32(&self, flag: &str) -> Result<u32> {
        self.get_as_integer(flag, "u32")
    }

    pub fn get_as_u16(&self, flag: &str) -> Result<u16> {
        self.get_as_integer(flag, "u16")
    }

    pub fn get_as_u8(&self, flag: &str) -> Result<u8> {
        self.get_as_integer(flag, "u8")
    }

    pub fn get_as_f32(&self, flag: &str) -> Result<f32> {
        self.get_as_float(flag, "f32")
    }

    pub fn get_as_f64(&self, flag: &str) -> Result<f64> {
        self.get_as_float(flag, "f64")
    }

    /// Non-flag argument by position.
    pub fn get_nonflag(&self, index: usize) -> Result<&str> {
        match self.parsed.nonflag(index) {
            Some(value) => Ok(value),
            None if !self.settings.errors_enabled => Ok(""),
            None => Err(Error::NonFlagIndex {
                index,
                count: self.parsed.nonflags().len(),
            }),
        }
    }

    pub fn get_nonflags(&self) -> &[String] {
        self.parsed.nonflags()
    }

    /// Full usage text: preamble, flag table, epilogue.
    pub fn usage(&self) -> String {
        let preamble = match &self.preamble {
            Some(preamble) => preamble.clone(),
            None => usage::preamble(&self.binary, &self.required, &self.optional, self.nonflags),
        };
        let flag_description = match &self.flag_description {
            Some(flag_description) => flag_description.clone(),
            None => usage::flag_description(
                &self.required,
                &self.optional,
                self.nonflags,
                self.settings.name_column_width,
                self.settings.wrap_width,
            ),
        };
        format!("{preamble}{flag_description}{}", self.epilogue)
    }

    pub fn print_usage(&self, out: &mut impl Write) -> io::Result<()> {
        out.write_all(self.usage().as_bytes())
    }
}

fn flag_spec(name: &str, alias: &str, description: &str) -> FlagSpec {
    FlagSpec {
        name: name.to_string(),
        alias: non_empty(alias.to_string()),
        description: description.to_string(),
        ..Default::default()
    }
}

/// Make both names of `spec` resolve to `value`.
fn mirror(values: &mut IndexMap<String, String>, spec: &FlagSpec, value: String) {
    for name in spec.names() {
        values.insert(name.to_string(), value.clone());
    }
}
