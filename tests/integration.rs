#![allow(
    clippy::implicit_return,
    clippy::missing_assert_message,
    clippy::missing_docs_in_private_items,
    clippy::tests_outside_test_module,
    reason = "integration tests drive the binary with terse helpers"
)]

use std::path::Path;
use std::process::{Command, Output};

const BASE: &str = "https://github.com/org/repo/blob/main/";

fn ctxlink(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ctxlink"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .unwrap()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn annotates_overview_and_reports_summary() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.md", "See [overview](b.md) for details.");
    write(dir.path(), "b.md", "# Project Overview\n");

    let out = ctxlink(dir.path(), &["--base-url", BASE, "annotate"]);
    assert!(out.status.success(), "annotate failed: {}", stderr(&out));

    assert_eq!(
        read(dir.path(), "a.md"),
        "See [overview](b.md) (\"Project Overview\" at <https://github.com/org/repo/blob/main/b.md>) for details."
    );
    let report = stdout(&out);
    assert!(report.contains("Files with updates: 1"), "{report}");
    assert!(report.contains("Files read for titles: 1"), "{report}");
    assert!(report.contains("Links updated: 1"), "{report}");
    assert!(report.contains("Found 2 md files"), "{report}");
    assert!(report.contains("  Updated: overview -> Project Overview"), "{report}");
    assert!(report.contains("✓ Updated a.md (1 links)"), "{report}");
}

#[test]
fn second_run_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "docs/a/page.md", "[x](../sibling.md)\n[y](/README.md) [x](../sibling.md)\n");
    write(dir.path(), "docs/sibling.md", "# Sibling\n");
    write(dir.path(), "README.md", "---\ntitle: \"Read Me (first)\"\n---\n# Other\n");

    let first = ctxlink(dir.path(), &["--base-url", BASE, "annotate"]);
    assert!(first.status.success());
    let after_first = read(dir.path(), "docs/a/page.md");
    assert!(after_first.contains("<https://github.com/org/repo/blob/main/docs/sibling.md>"));

    let second = ctxlink(dir.path(), &["--base-url", BASE, "annotate"]);
    assert!(second.status.success());
    assert!(stdout(&second).contains("Links updated: 0"));
    assert_eq!(read(dir.path(), "docs/a/page.md"), after_first);
}

#[test]
fn title_priority_through_the_binary() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.md", "[a](both.md) [b](heading.md) [c](release-notes_v2.md)\n");
    write(dir.path(), "both.md", "---\ntitle: A\n---\n# B\n");
    write(dir.path(), "heading.md", "Intro line\n# B\n");
    write(dir.path(), "release-notes_v2.md", "no headings here\n");

    let out = ctxlink(dir.path(), &["--base-url", BASE, "annotate"]);
    assert!(out.status.success());

    let index = read(dir.path(), "index.md");
    assert!(index.contains("[a](both.md) (\"A\" at <"), "{index}");
    assert!(index.contains("[b](heading.md) (\"B\" at <"), "{index}");
    assert!(index.contains("[c](release-notes_v2.md) (\"Release Notes V2\" at <"), "{index}");
}

#[test]
fn placeholders_and_outside_targets_leave_files_untouched() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("corpus");
    write(outer.path(), "outside.md", "# Outside\n");
    let original = "[x](path/to/file.md) [y](example.md) [z](../outside.md) [w](missing.md)\n";
    write(&root, "a.md", original);
    write(&root, "example.md", "# Example\n");

    let out = ctxlink(&root, &["--base-url", BASE, "annotate"]);
    assert!(out.status.success(), "warnings must not fail the run");
    assert_eq!(read(&root, "a.md"), original);

    let warnings = stderr(&out);
    assert!(warnings.contains("linked file outside corpus: ../outside.md in a.md:1"), "{warnings}");
    assert!(warnings.contains("linked file not found: missing.md in a.md:1"), "{warnings}");
    assert!(stdout(&out).contains("Links updated: 0"));
}

#[test]
fn dry_run_and_check_do_not_write() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.md", "[b](b.md)\n");
    write(dir.path(), "b.md", "# B\n");

    let dry = ctxlink(dir.path(), &["--base-url", BASE, "annotate", "--dry-run"]);
    assert!(dry.status.success());
    assert!(stdout(&dry).contains("Links updated: 1"));
    assert!(!stdout(&dry).contains("✓ Updated"));
    assert_eq!(read(dir.path(), "a.md"), "[b](b.md)\n");

    let check = ctxlink(dir.path(), &["--base-url", BASE, "check"]);
    assert_eq!(check.status.code(), Some(1));
    assert!(stdout(&check).contains("PENDING a.md:1 [b](b.md)"));

    assert!(ctxlink(dir.path(), &["--base-url", BASE, "annotate"]).status.success());
    let clean = ctxlink(dir.path(), &["--base-url", BASE, "check"]);
    assert_eq!(clean.status.code(), Some(0));
    assert!(stdout(&clean).contains("All references annotated"));
}

#[test]
fn json_summary() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.md", "[b](b.md) [c](c.md)\n");
    write(dir.path(), "b.md", "# B\n");
    write(dir.path(), "c.md", "# C\n");

    let out = ctxlink(dir.path(), &["--base-url", BASE, "annotate", "--json"]);
    assert!(out.status.success());

    let report = stdout(&out);
    assert!(!report.contains("Found"), "{report}");
    assert!(!report.contains("✓ Updated"), "{report}");
    let summary: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(summary["files_with_updates"], 1);
    assert_eq!(summary["files_read_for_titles"], 2);
    assert_eq!(summary["links_updated"], 2);
}

#[test]
fn init_stores_base_url_for_later_runs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.md", "[b](b.md)\n");
    write(dir.path(), "b.md", "# B\n");

    let missing = ctxlink(dir.path(), &["annotate"]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("No Base URL"));

    assert!(ctxlink(dir.path(), &["init", "https://example.org/docs"]).status.success());
    let out = ctxlink(dir.path(), &["annotate"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(read(dir.path(), "a.md"), "[b](b.md) (\"B\" at <https://example.org/docs/b.md>)\n");
}

#[test]
fn unreadable_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = ctxlink(&dir.path().join("missing"), &["--base-url", BASE, "annotate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Corpus Root Unreadable"));
}
