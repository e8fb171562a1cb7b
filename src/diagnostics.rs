//! Fatal errors rendered as markdown on stderr.

use crate::config::CONFIG_FILE;
use crate::error::Error;

/// ANSI bold, used for markdown headings.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::MissingBaseUrl => render_missing_base_url(),
        Error::CorpusUnreadable { path, source } => render_corpus_unreadable(path, source),
        Error::InvalidPattern { pattern, reason } => render_invalid_pattern(pattern, reason),
        _ => render_generic(e),
    };
}

/// Unreadable corpus root, with a hint about `--root`.
fn render_corpus_unreadable(path: &std::path::Path, source: &std::io::Error) -> String {
    return format!("\
# Error: Corpus Root Unreadable

`{}` could not be listed: {source}

## Fix

Check the `--root` argument and the directory permissions.
", path.display());
}

/// Errors without a dedicated fix section.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::TomlDe(e) => format!("\
# Error: Invalid Config

`{CONFIG_FILE}` is not valid:

{e}
"),
        Error::TomlEdit(e) => format!("\
# Error: Invalid Config

`{CONFIG_FILE}` could not be parsed for editing:

{e}
"),
        Error::Watch { reason } => format!("\
# Error: Watch Failed

{reason}
"),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        _ => format!("\
# Error

{e}
"),
    };
}

/// Bad `skip_patterns` entry.
fn render_invalid_pattern(pattern: &str, reason: &str) -> String {
    return format!("\
# Error: Invalid Skip Pattern

`{pattern}` in `skip_patterns` is not a valid regular expression:

{reason}

## Fix

Correct the pattern in `{CONFIG_FILE}`, or move it to `skip_substrings`
to match it literally.
");
}

/// No base URL from the flag or the config file.
fn render_missing_base_url() -> String {
    return format!("\
# Error: No Base URL

Annotations need a base URL to build canonical links.

## Fix

Set it once for the corpus:

    ctxlink init https://github.com/<owner>/<repo>/blob/main/

Or pass it for a single run:

    ctxlink --base-url https://github.com/<owner>/<repo>/blob/main/ annotate

The value is stored as `base_url` in `{CONFIG_FILE}`.
");
}

#[cfg(test)]
#[allow(clippy::missing_assert_message, reason = "each test checks one rendered block")]
mod tests {
    use super::*;

    #[test]
    fn missing_base_url_suggests_init() {
        let md = render_error(&Error::MissingBaseUrl);
        assert!(md.starts_with("# Error: No Base URL"));
        assert!(md.contains("ctxlink init"));
    }

    #[test]
    fn invalid_pattern_names_the_pattern() {
        let md = render_error(&Error::InvalidPattern {
            pattern: "(oops".to_owned(),
            reason: "unclosed group".to_owned(),
        });
        assert!(md.contains("`(oops`"));
        assert!(md.contains("unclosed group"));
    }

    #[test]
    fn per_reference_errors_render_generically() {
        let md = render_error(&Error::TargetNotFound {
            document: "a.md".into(),
            line: 2,
            target: "b.md".to_owned(),
        });
        assert!(md.contains("linked file not found: b.md in a.md:2"));
    }
}
