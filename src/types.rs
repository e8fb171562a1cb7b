//! Core domain types for ctxlink references, annotations, and run totals.

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::PathBuf;

/// The fragment appended after a reference: ` ("Title" at <URL>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Title shown in quotes.
    pub title: String,
    /// Canonical URL shown in angle brackets.
    pub url: String,
}

/// What processing one document produced.
#[derive(Debug, Default)]
pub struct DocumentOutcome {
    /// Number of references that received an annotation.
    pub annotated: usize,
    /// Corpus-relative path of the document.
    pub document: PathBuf,
    /// `doc:line [label](target)` for each annotated reference.
    pub pending: Vec<String>,
    /// Corpus-relative paths of targets whose titles were read.
    pub title_sources: BTreeSet<String>,
    /// `(label, title)` for each annotated reference, in source order.
    pub updates: Vec<(String, String)>,
}

/// Whether a pass is allowed to touch the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Resolve and read titles but never write.
    DryRun,
    /// Rewrite documents that gained at least one annotation.
    Write,
}

/// How the run is reported on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Only the summary, as JSON.
    Json,
    /// Progress lines and the framed text summary.
    Text,
}

/// One `[label](target)` occurrence found by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The label text between the brackets.
    pub label: String,
    /// One-based line number of the reference in the document.
    pub line: u32,
    /// Exact matched substring, `[label](target)`.
    pub matched: String,
    /// Byte range of `matched` in the document text. Ranges from one
    /// extraction pass never overlap.
    pub span: Range<usize>,
    /// Raw target path as the author wrote it.
    pub target: String,
}

/// A reference resolved to a file inside the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Absolute, normalized path on disk.
    pub absolute: PathBuf,
    /// Path relative to the corpus root, `/`-separated, no `..` segments.
    pub corpus_relative: String,
}

/// Totals for one corpus pass, reported at the end.
#[derive(Debug, Default, serde::Serialize)]
pub struct RunSummary {
    /// Distinct target documents whose titles were read.
    pub files_read_for_titles: usize,
    /// Documents that received at least one annotation.
    pub files_with_updates: usize,
    /// References annotated across the corpus.
    pub links_updated: usize,
    /// References that would be annotated, with their location. Populated in every mode.
    #[serde(skip)]
    pub pending: Vec<String>,
    /// Every title source seen so far, for the distinct count.
    #[serde(skip)]
    title_sources: BTreeSet<String>,
}

impl Annotation {
    /// Build the annotation for a resolved target under `base_url`.
    /// A `>` in the title would end the URL guard early, so it is written as `&gt;`.
    pub fn new(title: &str, base_url: &str, target: &ResolvedTarget) -> Self {
        return Self {
            title: title.replace('>', "&gt;"),
            url: format!("{base_url}{}", target.corpus_relative),
        };
    }

    /// Render the fragment, including its leading space.
    pub fn render(&self) -> String {
        return format!(" (\"{}\" at <{}>)", self.title, self.url);
    }
}

impl RunSummary {
    /// Fold one document's outcome into the totals.
    /// Documents with no annotations contribute nothing.
    pub fn record(&mut self, outcome: DocumentOutcome) {
        if outcome.annotated == 0 {
            return;
        }
        self.files_with_updates = self.files_with_updates.saturating_add(1);
        self.links_updated = self.links_updated.saturating_add(outcome.annotated);
        self.pending.extend(outcome.pending);
        self.title_sources.extend(outcome.title_sources);
        self.files_read_for_titles = self.title_sources.len();
    }
}

#[cfg(test)]
#[allow(
    clippy::implicit_return,
    clippy::missing_docs_in_private_items,
    reason = "terse test helpers"
)]
mod tests {
    use super::*;

    fn target(rel: &str) -> ResolvedTarget {
        ResolvedTarget {
            absolute: PathBuf::from("/repo").join(rel),
            corpus_relative: rel.to_owned(),
        }
    }

    #[test]
    fn renders_fixed_grammar() {
        let a = Annotation::new("Project Overview", "https://github.com/org/repo/blob/main/", &target("b.md"));
        assert_eq!(
            a.render(),
            " (\"Project Overview\" at <https://github.com/org/repo/blob/main/b.md>)"
        );
    }

    #[test]
    fn escapes_angle_bracket_in_title() {
        let a = Annotation::new("A -> B", "https://x/", &target("a.md"));
        assert_eq!(a.title, "A -&gt; B");
    }

    #[test]
    fn summary_counts_distinct_title_sources() {
        let mut summary = RunSummary::default();
        let mut first = DocumentOutcome { annotated: 2, ..DocumentOutcome::default() };
        first.title_sources.insert("b.md".to_owned());
        let mut second = DocumentOutcome { annotated: 1, ..DocumentOutcome::default() };
        second.title_sources.insert("b.md".to_owned());
        second.title_sources.insert("c.md".to_owned());

        summary.record(first);
        summary.record(second);
        summary.record(DocumentOutcome::default());

        assert_eq!(summary.files_with_updates, 2);
        assert_eq!(summary.links_updated, 3);
        assert_eq!(summary.files_read_for_titles, 2);
    }
}
