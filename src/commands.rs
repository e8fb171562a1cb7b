//! Core CLI commands for ctxlink: annotate, check, init.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::annotator::Annotator;
use crate::config::{self, CONFIG_FILE, Config};
use crate::error;
use crate::scanner;
use crate::types::{DocumentOutcome, Mode, Output, RunSummary};

/// Width of the rule framing the text summary.
const RULE_WIDTH: usize = 60;

/// Annotate every document in the corpus, or just report in dry-run mode.
/// Per-reference and per-document problems are warnings; the run always
/// finishes with a summary.
///
/// # Errors
///
/// Returns errors from root canonicalization, config loading, or the corpus scan.
pub fn annotate(root: &Path, base_url: Option<&str>, mode: Mode, output: Output) -> Result<(), error::Error> {
    let root = canonical_root(root)?;
    let config = Config::load(&root)?.with_base_url(base_url);
    let summary = annotate_corpus(&root, &config, mode, output)?;
    print_summary(&summary, output)?;
    return Ok(());
}

/// Run the whole pipeline over the corpus at `root` (absolute, canonical).
/// Documents are processed one at a time in scan order. With text output the
/// document count and each written document's updates go to stdout; JSON
/// output keeps stdout for the summary alone.
///
/// # Errors
///
/// Returns `Error::MissingBaseUrl` or `Error::CorpusUnreadable`. Nothing that
/// happens inside a single document is returned.
pub fn annotate_corpus(root: &Path, config: &Config, mode: Mode, output: Output) -> Result<RunSummary, error::Error> {
    let annotator = Annotator::new(root, config)?;
    let documents = scanner::scan(root, config)?;
    if output == Output::Text {
        println!("Found {} {} files", documents.len(), config.extension);
    }

    let mut summary = RunSummary::default();
    for document in &documents {
        match annotator.process_document(document, mode) {
            Ok(outcome) => {
                if mode == Mode::Write && output == Output::Text {
                    print_updates(&outcome);
                }
                summary.record(outcome);
            },
            Err(e) => tracing::warn!("skipping {}: {e}", document.display()),
        }
    }

    return Ok(summary);
}

/// Resolve the corpus root to an absolute, symlink-free path.
///
/// # Errors
///
/// Returns `Error::CorpusUnreadable` if the root does not exist or cannot be accessed.
pub fn canonical_root(root: &Path) -> Result<PathBuf, error::Error> {
    return std::fs::canonicalize(root).map_err(|source| {
        return error::Error::CorpusUnreadable {
            path: root.to_path_buf(),
            source,
        };
    });
}

/// Dry-run the corpus and list every reference still missing an annotation.
/// Exits 1 when anything is pending so CI can fail the build.
///
/// # Errors
///
/// Returns errors from root canonicalization, config loading, or the corpus scan.
pub fn check(root: &Path, base_url: Option<&str>) -> Result<ExitCode, error::Error> {
    let root = canonical_root(root)?;
    let config = Config::load(&root)?.with_base_url(base_url);
    let summary = annotate_corpus(&root, &config, Mode::DryRun, Output::Text)?;

    for pending in &summary.pending {
        println!("PENDING {pending}");
    }

    if summary.links_updated == 0 {
        println!("All references annotated");
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!(
        "{} links pending in {} files",
        summary.links_updated, summary.files_with_updates
    );
    eprintln!();
    eprintln!("hint: run `ctxlink annotate` to add them");
    return Ok(ExitCode::from(1));
}

/// Create `.ctxlink.toml` or set its `base_url`, keeping existing comments and layout.
///
/// # Errors
///
/// Returns `Error::Io` on read/write failure or `Error::TomlEdit` if the
/// existing file is not valid TOML.
pub fn init(root: &Path, base_url: &str) -> Result<(), error::Error> {
    let path = root.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(error::Error::Io(e)),
        Ok(c) => c,
    };

    let mut doc: toml_edit::DocumentMut = content.parse()?;
    let normalized = config::normalize_base_url(base_url);
    doc["base_url"] = toml_edit::value(normalized.as_str());
    std::fs::write(&path, doc.to_string())?;

    eprintln!("Set base_url = \"{normalized}\" in {CONFIG_FILE}");
    return Ok(());
}

/// Print the run totals as a framed text block or as JSON.
///
/// # Errors
///
/// Returns `Error::Json` if the summary cannot be serialized.
pub fn print_summary(summary: &RunSummary, output: Output) -> Result<(), error::Error> {
    if output == Output::Json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    let rule = "=".repeat(RULE_WIDTH);
    println!();
    println!("{rule}");
    println!("Summary:");
    println!("  Files with updates: {}", summary.files_with_updates);
    println!("  Files read for titles: {}", summary.files_read_for_titles);
    println!("  Links updated: {}", summary.links_updated);
    println!("{rule}");
    return Ok(());
}

/// One line per annotated reference, then the document line.
fn print_updates(outcome: &DocumentOutcome) {
    if outcome.annotated == 0 {
        return;
    }
    for (label, title) in &outcome.updates {
        println!("  Updated: {label} -> {title}");
    }
    println!("✓ Updated {} ({} links)", outcome.document.display(), outcome.annotated);
}

#[cfg(test)]
#[allow(
    clippy::missing_assert_message,
    clippy::missing_docs_in_private_items,
    reason = "terse test helpers"
)]
mod tests {
    use super::*;

    const BASE: &str = "https://github.com/org/repo/blob/main/";

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> Vec<u8> {
        return std::fs::read(root.join(rel)).unwrap();
    }

    #[test]
    fn corpus_pass_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = canonical_root(dir.path()).unwrap();
        write(&root, "a.md", b"See [overview](b.md) for details.");
        write(&root, "b.md", b"# Project Overview\n");
        write(&root, "docs/c.md", b"[a](../a.md) [b](/b.md) [x](path/to/x.md)\n");
        write(&root, "node_modules/pkg/readme.md", b"[a](../../a.md)\n");
        let config = Config::default().with_base_url(Some(BASE));

        let first = annotate_corpus(&root, &config, Mode::Write, Output::Json).unwrap();
        let snapshot = read(&root, "docs/c.md");
        let second = annotate_corpus(&root, &config, Mode::Write, Output::Json).unwrap();

        assert_eq!(first.files_with_updates, 2);
        assert_eq!(first.links_updated, 3);
        assert_eq!(first.files_read_for_titles, 2);
        assert_eq!(second.links_updated, 0);
        assert_eq!(read(&root, "docs/c.md"), snapshot);
        assert_eq!(read(&root, "node_modules/pkg/readme.md"), b"[a](../../a.md)\n");
    }

    #[test]
    fn link_syntax_in_a_title_stays_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = canonical_root(dir.path()).unwrap();
        write(&root, "a.md", b"[x](b.md)\n");
        write(&root, "b.md", b"# Guide to [C](c.md)\n");
        write(&root, "c.md", b"# C\n");
        let config = Config::default().with_base_url(Some(BASE));

        annotate_corpus(&root, &config, Mode::Write, Output::Json).unwrap();
        let a_after_first = read(&root, "a.md");
        let b_after_first = read(&root, "b.md");
        let second = annotate_corpus(&root, &config, Mode::Write, Output::Json).unwrap();

        assert_eq!(
            String::from_utf8(a_after_first.clone()).unwrap(),
            "[x](b.md) (\"Guide to [C](c.md)\" at <https://github.com/org/repo/blob/main/b.md>)\n"
        );
        assert_eq!(second.links_updated, 0, "second pass must find nothing to annotate");
        assert_eq!(read(&root, "a.md"), a_after_first);
        assert_eq!(read(&root, "b.md"), b_after_first);
    }

    #[test]
    fn unreadable_document_is_skipped_and_others_still_annotated() {
        let dir = tempfile::tempdir().unwrap();
        let root = canonical_root(dir.path()).unwrap();
        write(&root, "a.md", b"[b](b.md)\n");
        write(&root, "b.md", b"# B\n");
        write(&root, "broken.md", &[0xff, 0xfe, b'[', b'b', b']']);
        let config = Config::default().with_base_url(Some(BASE));

        let summary = annotate_corpus(&root, &config, Mode::Write, Output::Json).unwrap();

        assert_eq!(summary.files_with_updates, 1);
        assert_eq!(summary.links_updated, 1);
        assert_eq!(
            String::from_utf8(read(&root, "a.md")).unwrap(),
            "[b](b.md) (\"B\" at <https://github.com/org/repo/blob/main/b.md>)\n"
        );
        assert_eq!(read(&root, "broken.md"), [0xff, 0xfe, b'[', b'b', b']']);
    }

    #[test]
    fn missing_base_url_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = annotate_corpus(dir.path(), &Config::default(), Mode::DryRun, Output::Text).unwrap_err();
        assert!(matches!(err, error::Error::MissingBaseUrl));
    }

    #[test]
    fn init_preserves_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "# corpus settings\nexclude_dirs = [\"target\"]\nbase_url = \"https://old/\"\n",
        )
        .unwrap();

        init(dir.path(), "https://github.com/org/repo/blob/main").unwrap();

        let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(written.starts_with("# corpus settings\n"));
        assert!(written.contains("exclude_dirs = [\"target\"]"));
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://github.com/org/repo/blob/main/");
    }

    #[test]
    fn init_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), "https://example.org/docs").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://example.org/docs/");
    }
}
