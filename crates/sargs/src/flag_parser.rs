//! Single-pass recognizer turning argv into flags and non-flags.
//!
//! The recognizer only knows which names exist and whether they take a value.
//! Presence rules, aliases and defaults are handled by [`crate::Args`].

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, Result};

const SEPARATOR: &str = "--";

/// Result of recognizing one argv.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParsedArguments {
    binary: String,
    flags: IndexMap<String, String>,
    nonflags: Vec<String>,
}

impl ParsedArguments {
    /// argv[0], as given.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Value of a flag exactly as it was spelled on the command line.
    ///
    /// Value-less flags map to an empty string.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.flags.get(flag).map(String::as_str)
    }

    pub fn has(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }

    /// Recognized flags, ordered by their last occurrence.
    pub fn flags(&self) -> &IndexMap<String, String> {
        &self.flags
    }

    pub fn nonflags(&self) -> &[String] {
        &self.nonflags
    }

    pub fn nonflag(&self, index: usize) -> Option<&str> {
        self.nonflags.get(index).map(String::as_str)
    }

    /// Position of `flag` in [`Self::flags`], i.e. how late it was last seen.
    pub(crate) fn position(&self, flag: &str) -> Option<usize> {
        self.flags.get_index_of(flag)
    }

    fn set_flag(&mut self, flag: &str, value: &str) {
        // Re-inserting moves the flag to the end so order tracks the last occurrence.
        self.flags.shift_remove(flag);
        self.flags.insert(flag.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, Copy)]
struct Known {
    slot: usize,
    takes_value: bool,
}

/// Registry of known flag names plus the tokenizer itself.
///
/// Every registration is a *slot*: one logical flag with one or two names.
/// Once every counted slot has been seen, remaining tokens are treated as
/// non-flags, so a value such as `-weird-file.txt` passes through untouched.
/// Builtin slots (help) neither count toward that latch nor are hidden by it.
#[derive(Debug, Clone, Default)]
pub struct FlagParser {
    known: HashMap<String, Known>,
    // `true` when the slot counts toward the all-flags-seen latch.
    slots: Vec<bool>,
}

impl FlagParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declared flag and its optional alias.
    pub fn register(&mut self, name: &str, alias: Option<&str>, takes_value: bool) {
        self.register_slot(name, alias, takes_value, true);
    }

    /// Register a flag that never triggers the all-flags-seen latch (`--help`).
    pub fn register_builtin(&mut self, name: &str, alias: Option<&str>, takes_value: bool) {
        self.register_slot(name, alias, takes_value, false);
    }

    fn register_slot(&mut self, name: &str, alias: Option<&str>, takes_value: bool, counted: bool) {
        let slot = self.slots.len();
        self.slots.push(counted);
        for n in std::iter::once(name).chain(alias) {
            tracing::trace!(flag = n, slot, takes_value, "registered flag");
            self.known.insert(n.to_string(), Known { slot, takes_value });
        }
    }

    /// Known flag called `name`, unless the latch hides it.
    fn lookup(&self, name: &str, latched: bool) -> Option<Known> {
        self.known
            .get(name)
            .copied()
            .filter(|known| !latched || !self.slots[known.slot])
    }

    /// Number of slots that must be seen before the latch closes.
    fn expected(&self) -> usize {
        self.slots.iter().filter(|counted| **counted).count()
    }

    /// Recognize `argv`. `argv[0]` is the binary and is never scanned.
    ///
    /// Fails only when a value-bearing flag has no value to consume.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<ParsedArguments> {
        let mut parsed = ParsedArguments::default();
        let Some((binary, tokens)) = argv.split_first() else {
            return Ok(parsed);
        };
        parsed.binary = binary.as_ref().to_string();

        let expected = self.expected();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut after_separator = false;

        let mut i = 0usize;
        while i < tokens.len() {
            let arg = tokens[i].as_ref();

            if after_separator {
                parsed.nonflags.push(arg.to_string());
                i += 1;
                continue;
            }

            // The separator is honoured even after the latch below has closed.
            if arg == SEPARATOR {
                after_separator = true;
                i += 1;
                continue;
            }

            // After the latch only builtin flags are still recognized.
            let latched = expected > 0 && seen.len() >= expected;
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg, None),
            };
            let Some(known) = self.lookup(name, latched) else {
                tracing::trace!(token = arg, "demoted to nonflag");
                parsed.nonflags.push(arg.to_string());
                i += 1;
                continue;
            };
            if self.slots[known.slot] {
                seen.insert(known.slot);
            }

            if !known.takes_value {
                parsed.set_flag(name, "");
                i += 1;
                continue;
            }

            let value = match inline {
                Some(value) => {
                    i += 1;
                    value
                }
                None => {
                    // A flag the latch would demote is an ordinary value here.
                    let latched = expected > 0 && seen.len() >= expected;
                    let next: &str = tokens
                        .get(i + 1)
                        .map(|next| next.as_ref())
                        .filter(|next| {
                            *next != SEPARATOR && self.lookup(bare(next), latched).is_none()
                        })
                        .ok_or_else(|| Error::MissingValue(name.to_string()))?;
                    i += 2;
                    next
                }
            };
            tracing::trace!(flag = name, value, "recognized flag");
            parsed.set_flag(name, value);
        }

        tracing::debug!(
            binary = parsed.binary.as_str(),
            flags = parsed.flags.len(),
            nonflags = parsed.nonflags.len(),
            "parsed arguments"
        );
        Ok(parsed)
    }
}

pub(crate) fn bare(token: &str) -> &str {
    token.split_once('=').map_or(token, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::FlagParser;
    use crate::Error;

    fn parser() -> FlagParser {
        let mut p = FlagParser::new();
        p.register("-a", None, false);
        p.register("--bee", Some("-b"), true);
        p
    }

    #[test]
    fn parses_flags_and_separated_nonflags() {
        let p = parser();
        let parsed = p
            .parse(&["program", "-a", "--bee=12", "--", "nonflag1", "nonflag2"])
            .unwrap();
        assert_eq!(parsed.binary(), "program");
        assert!(parsed.has("-a"));
        assert_eq!(parsed.get("-a"), Some(""));
        assert_eq!(parsed.get("--bee"), Some("12"));
        assert_eq!(parsed.nonflags(), ["nonflag1", "nonflag2"]);
    }

    #[test]
    fn inline_value_may_be_empty_or_contain_equals() {
        let p = parser();
        let parsed = p.parse(&["p", "--bee="]).unwrap();
        assert_eq!(parsed.get("--bee"), Some(""));

        let parsed = p.parse(&["p", "-b=k=v"]).unwrap();
        assert_eq!(parsed.get("-b"), Some("k=v"));
    }

    #[test]
    fn value_taken_from_next_token() {
        let p = parser();
        let parsed = p.parse(&["p", "--bee", "mfile.dat", "rest"]).unwrap();
        assert_eq!(parsed.get("--bee"), Some("mfile.dat"));
        assert_eq!(parsed.nonflags(), ["rest"]);
    }

    #[test]
    fn trailing_value_flag_is_an_error() {
        let p = parser();
        let err = p.parse(&["p", "-a", "--bee"]).unwrap_err();
        assert_eq!(err, Error::MissingValue("--bee".to_string()));
    }

    #[test]
    fn value_flag_followed_by_flag_or_separator_is_an_error() {
        let p = parser();
        assert!(matches!(
            p.parse(&["p", "--bee", "-a"]),
            Err(Error::MissingValue(_))
        ));
        assert!(matches!(
            p.parse(&["p", "--bee", "--", "x"]),
            Err(Error::MissingValue(_))
        ));
    }

    #[test]
    fn unknown_tokens_become_nonflags() {
        let p = parser();
        let parsed = p.parse(&["p", "--garbage=1", "file", "-a"]).unwrap();
        assert_eq!(parsed.nonflags(), ["--garbage=1", "file"]);
        assert!(parsed.has("-a"));
        assert!(!parsed.has("--garbage"));
    }

    #[test]
    fn value_less_flag_ignores_inline_value() {
        let p = parser();
        let parsed = p.parse(&["p", "-a=yes"]).unwrap();
        assert_eq!(parsed.get("-a"), Some(""));
    }

    #[test]
    fn last_occurrence_wins() {
        let mut p = FlagParser::new();
        p.register("--bee", None, true);
        p.register("--other", None, false);
        let parsed = p.parse(&["p", "--bee=1", "--bee=2"]).unwrap();
        assert_eq!(parsed.get("--bee"), Some("2"));
    }

    #[test]
    fn latch_closes_once_every_flag_is_seen() {
        let p = parser();
        let parsed = p
            .parse(&["p", "-a", "--bee", "x", "-a", "-weird.txt"])
            .unwrap();
        assert_eq!(parsed.nonflags(), ["-a", "-weird.txt"]);
    }

    #[test]
    fn value_after_latch_closing_flag_may_look_like_a_flag() {
        let p = parser();
        let parsed = p.parse(&["p", "-a", "--bee", "-a"]).unwrap();
        assert_eq!(parsed.get("--bee"), Some("-a"));
        assert!(parsed.nonflags().is_empty());

        // Still a missing value while the latch is open.
        assert!(matches!(
            p.parse(&["p", "--bee", "-a"]),
            Err(Error::MissingValue(_))
        ));
    }

    #[test]
    fn separator_is_swallowed_after_latch() {
        let p = parser();
        let parsed = p
            .parse(&["p", "-a", "-b=1", "--", "file1", "--", "file2"])
            .unwrap();
        assert_eq!(parsed.nonflags(), ["file1", "--", "file2"]);
    }

    #[test]
    fn builtin_slot_does_not_hold_latch_open() {
        let mut p = FlagParser::new();
        p.register("-a", None, false);
        p.register_builtin("--help", Some("-h"), false);
        let parsed = p.parse(&["p", "-a", "-a", "-h"]).unwrap();
        assert_eq!(parsed.nonflags(), ["-a"]);
        assert!(parsed.has("-h"));
    }

    #[test]
    fn no_declared_flags_means_no_latch() {
        let p = FlagParser::new();
        let parsed = p.parse(&["p", "a", "-b"]).unwrap();
        assert_eq!(parsed.nonflags(), ["a", "-b"]);
        assert!(p.parse::<&str>(&[]).unwrap().nonflags().is_empty());
    }

    #[test]
    fn flags_keep_last_occurrence_order() {
        let mut p = parser();
        p.register("--unused", None, false);
        let parsed = p.parse(&["p", "-b=1", "--bee=2", "-a", "-b=3"]).unwrap();
        let bee = parsed.position("--bee").unwrap();
        let b = parsed.position("-b").unwrap();
        assert!(bee < b);
        assert_eq!(parsed.get("-b"), Some("3"));
    }
}
