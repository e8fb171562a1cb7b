//! Annotation: resolve each extracted reference, read its title, and splice the
//! annotation into the document by byte offset.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Error;
use crate::extractor::Extractor;
use crate::placeholder::PlaceholderSet;
use crate::resolver;
use crate::title;
use crate::types::{Annotation, DocumentOutcome, Mode, Reference, ResolvedTarget};

/// A reference that resolved, paired with the annotation to insert after it.
struct Splice {
    /// Fragment to insert after the reference.
    annotation: Annotation,
    /// The reference as extracted, with its span.
    reference: Reference,
    /// Where the reference points inside the corpus.
    target: ResolvedTarget,
}

/// Everything needed to annotate documents in one corpus.
pub struct Annotator {
    /// Normalized base URL, ending in `/`.
    base_url: String,
    /// Link matcher for the configured extension.
    extractor: Extractor,
    /// Targets that are never resolved.
    placeholders: PlaceholderSet,
    /// Absolute corpus root.
    root: PathBuf,
}

impl Annotator {
    /// Build an annotator for the corpus at `root`, which must be absolute.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingBaseUrl` if the config has no base URL.
    pub fn new(root: &Path, config: &Config) -> Result<Self, Error> {
        return Ok(Self {
            base_url: config.base_url()?.to_owned(),
            extractor: Extractor::new(&config.extension),
            placeholders: config.placeholders.clone(),
            root: root.to_path_buf(),
        });
    }

    /// Read, annotate, and (in write mode) rewrite one document.
    /// A document with no resolvable references is left untouched on disk.
    /// Reporting is left to the caller, which decides what goes on stdout.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the document cannot be read or written. Missing
    /// or out-of-corpus targets are warned about and skipped, never returned.
    pub fn process_document(&self, document: &Path, mode: Mode) -> Result<DocumentOutcome, Error> {
        let content = std::fs::read_to_string(document)?;
        let splices = self.plan(document, &content);
        if splices.is_empty() {
            return Ok(DocumentOutcome::default());
        }

        let relative = self.relative(document);
        let outcome = DocumentOutcome {
            annotated: splices.len(),
            document: relative.clone(),
            pending: splices
                .iter()
                .map(|s| return format!("{}:{} {}", relative.display(), s.reference.line, s.reference.matched))
                .collect(),
            title_sources: splices.iter().map(|s| return s.target.corpus_relative.clone()).collect(),
            updates: splices
                .iter()
                .map(|s| return (s.reference.label.clone(), s.annotation.title.clone()))
                .collect(),
        };

        if mode == Mode::Write {
            std::fs::write(document, apply_splices(&content, &splices))?;
        }

        return Ok(outcome);
    }

    /// Resolve every candidate reference. Unresolvable ones are warned about and dropped.
    /// All title reads happen here, before any write.
    fn plan(&self, document: &Path, content: &str) -> Vec<Splice> {
        let references = self.extractor.extract(content, &self.placeholders);
        let mut splices = Vec::with_capacity(references.len());

        for reference in references {
            let target = match resolver::resolve(&self.root, document, &reference) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("{e}");
                    continue;
                },
            };
            let title = title::read_title(&target.absolute);
            let annotation = Annotation::new(&title, &self.base_url, &target);
            splices.push(Splice { annotation, reference, target });
        }

        return splices;
    }

    /// `document` relative to the corpus root, for messages.
    fn relative(&self, document: &Path) -> PathBuf {
        return document.strip_prefix(&self.root).unwrap_or(document).to_path_buf();
    }
}

/// Insert each annotation right after its reference's span, in one left-to-right pass.
/// Spans come from a single extraction, so they are ascending and disjoint.
fn apply_splices(content: &str, splices: &[Splice]) -> String {
    let rendered: Vec<String> = splices.iter().map(|s| return s.annotation.render()).collect();
    let extra = rendered.iter().map(String::len).fold(0_usize, usize::saturating_add);
    let mut out = String::with_capacity(content.len().saturating_add(extra));
    let mut cursor = 0;

    for (splice, fragment) in splices.iter().zip(&rendered) {
        let end = splice.reference.span.end;
        debug_assert!(end >= cursor, "splices must be ascending");
        out.push_str(content.get(cursor..end).unwrap_or_default());
        out.push_str(fragment);
        cursor = end;
    }
    out.push_str(content.get(cursor..).unwrap_or_default());

    return out;
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::implicit_return,
    clippy::indexing_slicing,
    clippy::missing_assert_message,
    clippy::missing_docs_in_private_items,
    reason = "tests index known results and use terse helpers"
)]
mod tests {
    use super::*;

    const BASE: &str = "https://github.com/org/repo/blob/main/";

    fn corpus(files: &[(&str, &str)]) -> (tempfile::TempDir, Annotator) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let config = Config::default().with_base_url(Some(BASE));
        let annotator = Annotator::new(dir.path(), &config).unwrap();
        (dir, annotator)
    }

    fn read(dir: &tempfile::TempDir, rel: &str) -> String {
        std::fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    #[test]
    fn annotates_overview_scenario() {
        let (dir, annotator) = corpus(&[
            ("a.md", "See [overview](b.md) for details."),
            ("b.md", "# Project Overview\n\nBody.\n"),
        ]);

        let outcome = annotator.process_document(&dir.path().join("a.md"), Mode::Write).unwrap();

        assert_eq!(
            read(&dir, "a.md"),
            "See [overview](b.md) (\"Project Overview\" at <https://github.com/org/repo/blob/main/b.md>) for details."
        );
        assert_eq!(outcome.annotated, 1);
        assert_eq!(outcome.title_sources.len(), 1);
        assert_eq!(outcome.document, PathBuf::from("a.md"));
        assert_eq!(outcome.updates, vec![("overview".to_owned(), "Project Overview".to_owned())]);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let (dir, annotator) = corpus(&[
            ("docs/a/page.md", "[up](../sibling.md) and [root](/README.md)\n"),
            ("docs/sibling.md", "---\ntitle: Sibling (draft)\n---\n# Ignored\n"),
            ("README.md", "# Readme Title\n"),
        ]);
        let page = dir.path().join("docs/a/page.md");

        let first = annotator.process_document(&page, Mode::Write).unwrap();
        let after_first = read(&dir, "docs/a/page.md");
        let second = annotator.process_document(&page, Mode::Write).unwrap();

        assert_eq!(first.annotated, 2);
        assert_eq!(second.annotated, 0);
        assert_eq!(read(&dir, "docs/a/page.md"), after_first);
        assert!(after_first.contains("(\"Sibling (draft)\" at <https://github.com/org/repo/blob/main/docs/sibling.md>)"));
    }

    #[test]
    fn repeated_identical_references_each_annotated_once() {
        let (dir, annotator) = corpus(&[("a.md", "[b](b.md) then [b](b.md)\n"), ("b.md", "# B\n")]);
        annotator.process_document(&dir.path().join("a.md"), Mode::Write).unwrap();

        let annotation = " (\"B\" at <https://github.com/org/repo/blob/main/b.md>)";
        assert_eq!(read(&dir, "a.md"), format!("[b](b.md){annotation} then [b](b.md){annotation}\n"));
    }

    #[test]
    fn unresolved_reference_does_not_block_others() {
        let (dir, annotator) = corpus(&[
            ("a.md", "[gone](missing.md) [here](b.md)\n"),
            ("b.md", "# Here\n"),
        ]);
        let outcome = annotator.process_document(&dir.path().join("a.md"), Mode::Write).unwrap();

        assert_eq!(outcome.annotated, 1);
        let text = read(&dir, "a.md");
        assert!(text.starts_with("[gone](missing.md) [here](b.md) (\"Here\""));
    }

    #[test]
    fn placeholder_only_document_is_untouched() {
        let original = "[x](path/to/file.md) and [y](example.md)\n";
        let (dir, annotator) = corpus(&[("a.md", original), ("example.md", "# Example\n")]);
        let outcome = annotator.process_document(&dir.path().join("a.md"), Mode::Write).unwrap();

        assert_eq!(outcome.annotated, 0);
        assert_eq!(read(&dir, "a.md"), original);
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let original = "[b](b.md)\n";
        let (dir, annotator) = corpus(&[("a.md", original), ("b.md", "# B\n")]);
        let outcome = annotator.process_document(&dir.path().join("a.md"), Mode::DryRun).unwrap();

        assert_eq!(outcome.annotated, 1);
        assert_eq!(outcome.pending, vec!["a.md:1 [b](b.md)".to_owned()]);
        assert_eq!(read(&dir, "a.md"), original);
    }

    #[test]
    fn original_references_are_conserved() {
        let original = "# Doc\n[one](b.md), [two](c.md) and [one](b.md).\n";
        let (dir, annotator) = corpus(&[("a.md", original), ("b.md", "# B\n"), ("c.md", "plain\n")]);
        annotator.process_document(&dir.path().join("a.md"), Mode::Write).unwrap();
        let rewritten = read(&dir, "a.md");

        let mut search_from = 0;
        for reference in ["[one](b.md)", "[two](c.md)", "[one](b.md)"] {
            let found = rewritten[search_from..].find(reference).unwrap();
            search_from += found + reference.len();
        }
        assert!(rewritten.contains("[two](c.md) (\"C\" at <https://github.com/org/repo/blob/main/c.md>)"));
        assert_eq!(rewritten.matches("(\"B\" at <").count(), 2);
    }

    #[test]
    fn missing_document_is_an_error() {
        let (dir, annotator) = corpus(&[]);
        let err = annotator.process_document(&dir.path().join("nope.md"), Mode::Write).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
