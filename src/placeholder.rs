//! Placeholder filtering: reference-shaped text that is illustration, not a link.

use regex::Regex;

use crate::error::Error;

/// Regexes that mark a target as illustrative. The first catches the literal
/// example filename; the second catches regex and glob metacharacters, which
/// real paths in a documentation corpus never contain.
const DEFAULT_PATTERNS: &[&str] = &[r"(?:^|/)example\.md$", r"[\\*?{}|^$]"];

/// Literal substrings that mark a target as illustrative.
const DEFAULT_SUBSTRINGS: &[&str] = &[
    "path/to/",
    "path/file",
    "../../path/",
    "http://",
    "https://",
];

/// A single matcher consulted before any filesystem I/O.
#[derive(Debug, Clone)]
pub enum PlaceholderPattern {
    /// Matches when the target contains this substring.
    Literal(String),
    /// Matches when the regex finds a match anywhere in the target.
    Pattern(Regex),
}

impl PlaceholderPattern {
    /// Whether this matcher fires for `target`.
    fn matches(&self, target: &str) -> bool {
        return match self {
            Self::Literal(s) => target.contains(s.as_str()),
            Self::Pattern(re) => re.is_match(target),
        };
    }
}

/// The full exclusion policy for reference targets.
#[derive(Debug, Clone)]
pub struct PlaceholderSet {
    /// Matchers in the order they are tried. Any hit excludes the target.
    patterns: Vec<PlaceholderPattern>,
}

impl PlaceholderSet {
    /// The built-in placeholder shapes only.
    pub fn defaults() -> Self {
        let mut patterns: Vec<PlaceholderPattern> = DEFAULT_SUBSTRINGS
            .iter()
            .map(|s| return PlaceholderPattern::Literal((*s).to_owned()))
            .collect();
        for raw in DEFAULT_PATTERNS {
            if let Ok(re) = Regex::new(raw) {
                patterns.push(PlaceholderPattern::Pattern(re));
            }
        }
        return Self { patterns };
    }

    /// Whether `target` is a placeholder and must never be annotated.
    pub fn is_placeholder(&self, target: &str) -> bool {
        return self.patterns.iter().any(|p| return p.matches(target));
    }

    /// Built-in placeholders plus the extra literals and regexes from config.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if any extra regex fails to compile.
    pub fn with_extras(substrings: &[String], patterns: &[String]) -> Result<Self, Error> {
        let mut set = Self::defaults();
        set.patterns
            .extend(substrings.iter().map(|s| return PlaceholderPattern::Literal(s.clone())));
        for raw in patterns {
            set.patterns.push(PlaceholderPattern::Pattern(compile(raw)?));
        }
        return Ok(set);
    }
}

impl Default for PlaceholderSet {
    fn default() -> Self {
        return Self::defaults();
    }
}

/// Compile a user-supplied skip pattern.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` with the compile failure as the reason.
fn compile(raw: &str) -> Result<Regex, Error> {
    return Regex::new(raw).map_err(|e| {
        return Error::InvalidPattern {
            pattern: raw.to_owned(),
            reason: e.to_string(),
        };
    });
}

#[cfg(test)]
#[allow(clippy::missing_assert_message, reason = "assertions name the target inline where it matters")]
mod tests {
    use super::*;

    #[test]
    fn default_shapes_are_placeholders() {
        let set = PlaceholderSet::defaults();
        for target in [
            "path/to/file.md",
            "docs/path/file.md",
            "../../path/guide.md",
            "https://example.com/readme.md",
            "http://example.com/readme.md",
            "example.md",
            "docs/example.md",
            r"notes/.*\.md",
            "chapters/*.md",
            "{name}.md",
        ] {
            assert!(set.is_placeholder(target), "{target} should be a placeholder");
        }
    }

    #[test]
    fn real_paths_pass() {
        let set = PlaceholderSet::defaults();
        for target in ["b.md", "../sibling.md", "/docs/guide.md", "examples.md", "my-examples/intro.md"] {
            assert!(!set.is_placeholder(target), "{target} should not be a placeholder");
        }
    }

    #[test]
    fn extras_extend_defaults() {
        let set = PlaceholderSet::with_extras(&["drafts/".to_owned()], &["^tmp-".to_owned()]).unwrap();
        assert!(set.is_placeholder("drafts/a.md"));
        assert!(set.is_placeholder("tmp-notes.md"));
        assert!(set.is_placeholder("path/to/x.md"));
        assert!(!set.is_placeholder("notes.md"));
    }

    #[test]
    fn invalid_extra_pattern_is_reported() {
        let err = PlaceholderSet::with_extras(&[], &["(unclosed".to_owned()]).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { pattern, .. } if pattern == "(unclosed"));
    }
}
