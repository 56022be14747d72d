//! Usage text rendering: the synthesized `Usage:` line and the flag table.

use crate::args::NonFlagRule;
use crate::flag::FlagSpec;

const VALUE_MARKER: &str = "=value";
const NAME_INDENT: &str = "    ";

fn format_name(name: &str, takes_value: bool) -> String {
    if takes_value {
        format!("{name}{VALUE_MARKER}")
    } else {
        name.to_string()
    }
}

/// `--super=value/-s=value`, as shown in the left column of the flag table.
fn format_flag_left(spec: &FlagSpec) -> String {
    let mut out = format!("{NAME_INDENT}{}", format_name(&spec.name, spec.takes_value));
    if let Some(alias) = &spec.alias {
        out.push('/');
        out.push_str(&format_name(alias, spec.takes_value));
    }
    out
}

fn format_flag_help(spec: &FlagSpec) -> String {
    let mut out = spec.description.trim().to_string();
    if let Some(default_value) = &spec.default_value {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("[default: {default_value}]"));
    }
    out
}

/// Render the `Usage:` line, followed by a blank line.
pub(crate) fn preamble(
    binary: &str,
    required: &[FlagSpec],
    optional: &[FlagSpec],
    nonflags: Option<NonFlagRule>,
) -> String {
    let mut parts: Vec<String> = vec![format!("Usage: {binary}")];

    if !optional.is_empty() {
        let names: Vec<String> = optional
            .iter()
            .flat_map(|spec| spec.names().map(move |n| format_name(n, spec.takes_value)))
            .collect();
        parts.push(format!("[{}]", names.join("|")));
    }

    parts.extend(
        required
            .iter()
            .map(|spec| format_name(&spec.name, spec.takes_value)),
    );

    if let Some(rule) = nonflags.filter(|rule| rule.count() > 0) {
        parts.push("--".to_string());
        parts.extend((1..=rule.count()).map(|i| format!("nonflag{i}")));
        if let NonFlagRule::AtLeast(_) = rule {
            parts.push("...".to_string());
        }
    }

    format!("{}\n\n", parts.join(" "))
}

/// Render the per-flag description block.
pub(crate) fn flag_description(
    required: &[FlagSpec],
    optional: &[FlagSpec],
    nonflags: Option<NonFlagRule>,
    name_column_width: usize,
    wrap_width: usize,
) -> String {
    let mut out = String::new();

    for (title, specs) in [("Required flags", required), ("Optional flags", optional)] {
        if specs.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("  {title}:\n"));
        for spec in specs {
            out.push_str(&flag_line(spec, name_column_width, wrap_width));
            out.push('\n');
        }
    }

    match nonflags {
        Some(NonFlagRule::Exactly(n)) if n > 0 => {
            out.push_str(&format!("\n  {n} non-flags are required\n"));
        }
        Some(NonFlagRule::AtLeast(n)) if n > 0 => {
            out.push_str(&format!("\n  at least {n} non-flags are required\n"));
        }
        _ => {}
    }

    out
}

fn flag_line(spec: &FlagSpec, name_column_width: usize, wrap_width: usize) -> String {
    let left = format_flag_left(spec);
    let help = format_flag_help(spec);
    if help.is_empty() {
        return left;
    }

    let help = wrap_description(&help, wrap_width, name_column_width);
    if left.chars().count() < name_column_width {
        format!("{left:<name_column_width$}{help}")
    } else {
        format!("{left} {help}")
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Wrap `text` into lines of at most `width` characters.
///
/// A line ends after the last non-alphabetic character inside the width
/// window so words stay whole; a window without one is split at `width`.
/// Continuation lines start with `indent` spaces and skip leading blanks.
pub fn wrap_description(text: &str, width: usize, indent: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if width == 0 || chars.len() <= width {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut start = 0usize;
    loop {
        while start < chars.len() && is_blank(chars[start]) {
            start += 1;
        }
        let remaining = chars.len() - start;
        if remaining == 0 {
            break;
        }
        if remaining <= width {
            lines.push(chars[start..].iter().collect());
            break;
        }

        let window = &chars[start..start + width];
        let take = match window.iter().rposition(|c| !c.is_alphabetic()) {
            Some(0) | None => width,
            Some(pos) => pos + 1,
        };
        let line: String = chars[start..start + take].iter().collect();
        lines.push(line.trim_end().to_string());
        start += take;
    }

    lines.join(&format!("\n{}", " ".repeat(indent)))
}
