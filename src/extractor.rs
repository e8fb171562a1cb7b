//! Reference extraction: find `[label](target.ext)` links that still need an annotation.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::placeholder::PlaceholderSet;
use crate::types::Reference;

/// Matches an annotation starting right after a reference. Anchored at the
/// start of the remaining text; the title may hold anything but `>` and the
/// URL holds no `>` or whitespace.
#[allow(clippy::expect_used, reason = "constant pattern")]
static ANNOTATION_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\A[ \t]*\([^>\n]*\bat\s*<[^>\s]+>\)").expect("valid regex");
});

/// Compiled link matcher for one document extension.
pub struct Extractor {
    /// `[label](target.ext)` with the label in group 1 and the target in group 2.
    link: Regex,
}

impl Extractor {
    /// Extract candidate references in source order. Never touches the filesystem;
    /// text without a `](` is rejected before the regex runs.
    ///
    /// Scanning resumes after an existing annotation, so link syntax quoted
    /// inside an annotation's title is never treated as a reference.
    pub fn extract(&self, content: &str, placeholders: &PlaceholderSet) -> Vec<Reference> {
        if !content.contains("](") {
            return Vec::new();
        }

        let mut references = Vec::new();
        let mut line = 1_u32;
        let mut counted_to = 0_usize;
        let mut pos = 0_usize;

        while let Some(cap) = self.link.captures_at(content, pos) {
            let Some(whole) = cap.get(0) else { break };

            let rest = content.get(whole.end()..).unwrap_or_default();
            if let Some(guard) = ANNOTATION_GUARD.find(rest) {
                pos = whole.end().saturating_add(guard.end());
                continue;
            }
            pos = whole.end();

            line = advance_line(content, counted_to, whole.start(), line);
            counted_to = whole.start();

            if let Some(reference) = parse_link_capture(&cap, line, placeholders) {
                references.push(reference);
            }
        }

        return references;
    }

    /// Build a matcher for links whose target ends in `.{extension}`.
    ///
    /// # Panics
    ///
    /// Panics if the link regex is invalid, which the escaped extension rules out.
    #[allow(clippy::expect_used, reason = "the only variable part is regex-escaped")]
    pub fn new(extension: &str) -> Self {
        let ext = regex::escape(extension);
        let link = Regex::new(&format!(r"\[([^\]]+)\]\(([^)]+\.{ext})\)")).expect("valid regex");
        return Self { link };
    }
}

/// Count newlines between two offsets to keep the line number current.
fn advance_line(content: &str, from: usize, to: usize, line: u32) -> u32 {
    let newlines = content
        .get(from..to)
        .unwrap_or_default()
        .bytes()
        .filter(|b| return *b == b'\n')
        .count();
    return line.saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX));
}

/// Whether the text immediately following a link is a well-formed annotation.
pub fn is_annotated(rest: &str) -> bool {
    return ANNOTATION_GUARD.is_match(rest);
}

/// Turn a link capture into a reference, or `None` for placeholder targets.
fn parse_link_capture(cap: &Captures<'_>, line: u32, placeholders: &PlaceholderSet) -> Option<Reference> {
    let whole = cap.get(0)?;
    let target = cap.get(2)?.as_str();

    if placeholders.is_placeholder(target) {
        tracing::debug!("skipping placeholder target {target} on line {line}");
        return None;
    }

    return Some(Reference {
        label: cap.get(1)?.as_str().to_owned(),
        line,
        matched: whole.as_str().to_owned(),
        span: whole.range(),
        target: target.to_owned(),
    });
}

#[cfg(test)]
#[allow(
    clippy::implicit_return,
    clippy::indexing_slicing,
    clippy::missing_assert_message,
    clippy::missing_docs_in_private_items,
    reason = "tests index known results and use terse helpers"
)]
mod tests {
    use super::*;

    fn extract(content: &str) -> Vec<Reference> {
        Extractor::new("md").extract(content, &PlaceholderSet::defaults())
    }

    #[test]
    fn finds_plain_reference() {
        let refs = extract("See [overview](b.md) for details.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].label, "overview");
        assert_eq!(refs[0].target, "b.md");
        assert_eq!(refs[0].matched, "[overview](b.md)");
        assert_eq!(refs[0].span, 4..20);
        assert_eq!(refs[0].line, 1);
    }

    #[test]
    fn skips_annotated_reference() {
        let text = "See [overview](b.md) (\"Project Overview\" at <https://x/b.md>) here.";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn guard_tolerates_parens_in_title() {
        let text = "[a](b.md) (\"Setup (Linux) guide\" at <https://x/b.md>)";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn link_syntax_inside_annotation_title_is_not_a_reference() {
        let text = "[x](b.md) (\"Guide to [C](c.md)\" at <https://h/b.md>)";
        assert!(extract(text).is_empty(), "{:?}", extract(text));
    }

    #[test]
    fn reference_after_annotation_is_still_found() {
        let refs = extract("[x](b.md) (\"B\" at <https://h/b.md>) and [y](c.md)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, "c.md");
        assert_eq!(refs[0].line, 1);
    }

    #[test]
    fn parenthetical_without_annotation_is_not_a_guard() {
        let refs = extract("[a](b.md) (see also the appendix)");
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn annotation_on_next_line_does_not_count() {
        let refs = extract("[a](b.md)\n(\"B\" at <https://x/b.md>)");
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn ignores_other_extensions_and_fragments() {
        assert!(extract("[a](b.txt) and [c](d.md#section) and [e](mdfile)").is_empty());
    }

    #[test]
    fn placeholders_are_never_surfaced() {
        let text = "[x](path/to/file.md) [y](example.md) [z](https://site/readme.md) [w](notes/*.md)";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn preserves_source_order_and_lines() {
        let text = "intro\n[one](a.md)\n\nsee [two](b.md) and [three](a.md)\n";
        let refs = extract(text);
        let labels: Vec<_> = refs.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["one", "two", "three"]);
        let lines: Vec<_> = refs.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4, 4]);
    }

    #[test]
    fn repeated_identical_references_get_distinct_spans() {
        let refs = extract("[a](b.md) then [a](b.md)");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].matched, refs[1].matched);
        assert_ne!(refs[0].span, refs[1].span);
    }

    #[test]
    fn custom_extension() {
        let refs = Extractor::new("markdown").extract("[a](b.markdown) [c](d.md)", &PlaceholderSet::defaults());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, "b.markdown");
    }
}
