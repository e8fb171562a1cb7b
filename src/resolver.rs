//! Path resolution: turn a raw link target into a corpus-relative path.

use std::path::{Component, Path, PathBuf};

use crate::error::Error;
use crate::types::{Reference, ResolvedTarget};

/// Result of trying a single strategy.
#[derive(Debug, PartialEq, Eq)]
enum Attempt {
    /// The candidate escapes the root. The filesystem is not consulted.
    Escapes,
    /// The candidate is a file inside the corpus.
    Found(ResolvedTarget),
    /// The candidate stays inside the corpus but no file exists there.
    Missing,
}

/// One way of interpreting a raw target. Tried in order; first `Found` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// `docs/a.md` written without the leading `/`.
    CorpusRoot,
    /// `../a.md`: next to the referencing document.
    DocumentRelative,
    /// `/docs/a.md`: directly under the corpus root.
    RootAnchored,
}

/// Build and check the candidate path for one strategy.
fn attempt(strategy: Strategy, root: &Path, document_dir: &Path, target: &str) -> Attempt {
    let base = match strategy {
        Strategy::RootAnchored | Strategy::CorpusRoot => root,
        Strategy::DocumentRelative => document_dir,
    };
    let candidate = normalize_path(&base.join(target.trim_start_matches('/')));

    let Some(corpus_relative) = corpus_relative(root, &candidate) else {
        return Attempt::Escapes;
    };
    if !candidate.is_file() {
        return Attempt::Missing;
    }

    return Attempt::Found(ResolvedTarget { absolute: candidate, corpus_relative });
}

/// Express `path` relative to `root` with `/` separators.
/// Returns `None` when the path is not inside the root.
fn corpus_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    return Some(segments.join("/"));
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
/// `..` pops a normal component, is dropped at the filesystem root,
/// and is kept when only other `..` precede it.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => match components.last() {
            Some(Component::Normal(_)) => {
                components.pop();
            },
            Some(Component::RootDir | Component::Prefix(_)) => {},
            _ => components.push(component),
        },
        other => components.push(other),
    }
}

/// Resolve a reference found in `document` against the corpus `root`.
/// Both paths are expected to be absolute, with `document` under `root`.
///
/// # Errors
///
/// Returns `Error::OutsideCorpus` if no strategy found a file and the first
/// strategy's candidate left the root, or `Error::TargetNotFound` otherwise.
/// A fallback candidate that escapes never turns a plain miss into an
/// out-of-corpus report.
pub fn resolve(root: &Path, document: &Path, reference: &Reference) -> Result<ResolvedTarget, Error> {
    let document_dir = document.parent().unwrap_or(root);
    let mut primary_escaped = false;

    for (index, strategy) in strategies_for(&reference.target).iter().enumerate() {
        match attempt(*strategy, root, document_dir, &reference.target) {
            Attempt::Found(resolved) => {
                tracing::debug!("{} resolved via {strategy:?} to {}", reference.target, resolved.corpus_relative);
                return Ok(resolved);
            },
            Attempt::Escapes if index == 0 => primary_escaped = true,
            Attempt::Escapes | Attempt::Missing => {},
        }
    }

    let document = document.strip_prefix(root).unwrap_or(document).to_path_buf();
    let target = reference.target.clone();
    let line = reference.line;
    if primary_escaped {
        return Err(Error::OutsideCorpus { document, line, target });
    }
    return Err(Error::TargetNotFound { document, line, target });
}

/// Strategies for a raw target, in the order they are tried.
fn strategies_for(target: &str) -> &'static [Strategy] {
    if target.starts_with('/') {
        return &[Strategy::RootAnchored];
    }
    return &[Strategy::DocumentRelative, Strategy::CorpusRoot];
}

#[cfg(test)]
#[allow(
    clippy::implicit_return,
    clippy::missing_assert_message,
    clippy::missing_docs_in_private_items,
    reason = "terse test helpers"
)]
mod tests {
    use super::*;

    fn reference(target: &str) -> Reference {
        Reference {
            label: "x".to_owned(),
            line: 3,
            matched: format!("[x]({target})"),
            span: 0..0,
            target: target.to_owned(),
        }
    }

    fn corpus(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for rel in files {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "# t\n").unwrap();
        }
        dir
    }

    #[test]
    fn normalizes_parent_segments() {
        assert_eq!(normalize_path(Path::new("/repo/docs/a/../b.md")), PathBuf::from("/repo/docs/b.md"));
        assert_eq!(normalize_path(Path::new("docs/./x/../../y.md")), PathBuf::from("y.md"));
        assert_eq!(normalize_path(Path::new("../a.md")), PathBuf::from("../a.md"));
        assert_eq!(normalize_path(Path::new("/../a.md")), PathBuf::from("/a.md"));
    }

    #[test]
    fn sibling_relative_to_document() {
        let dir = corpus(&["docs/a/page.md", "docs/sibling.md"]);
        let root = dir.path();
        let resolved = resolve(root, &root.join("docs/a/page.md"), &reference("../sibling.md")).unwrap();
        assert_eq!(resolved.corpus_relative, "docs/sibling.md");
        assert_eq!(resolved.absolute, root.join("docs/sibling.md"));
    }

    #[test]
    fn falls_back_to_corpus_root() {
        let dir = corpus(&["docs/a/page.md", "guides/setup.md"]);
        let root = dir.path();
        let resolved = resolve(root, &root.join("docs/a/page.md"), &reference("guides/setup.md")).unwrap();
        assert_eq!(resolved.corpus_relative, "guides/setup.md");
    }

    #[test]
    fn document_relative_wins_over_root() {
        let dir = corpus(&["docs/page.md", "docs/intro.md", "intro.md"]);
        let root = dir.path();
        let resolved = resolve(root, &root.join("docs/page.md"), &reference("intro.md")).unwrap();
        assert_eq!(resolved.corpus_relative, "docs/intro.md");
    }

    #[test]
    fn root_anchored_target() {
        let dir = corpus(&["docs/a/page.md", "docs/intro.md"]);
        let root = dir.path();
        let resolved = resolve(root, &root.join("docs/a/page.md"), &reference("/docs/intro.md")).unwrap();
        assert_eq!(resolved.corpus_relative, "docs/intro.md");
    }

    #[test]
    fn missing_target_is_not_found() {
        let dir = corpus(&["a.md"]);
        let root = dir.path();
        let err = resolve(root, &root.join("a.md"), &reference("nope.md")).unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { line: 3, .. }));
    }

    #[test]
    fn missing_parent_relative_target_is_not_found() {
        let dir = corpus(&["docs/page.md"]);
        let root = dir.path();
        let err = resolve(root, &root.join("docs/page.md"), &reference("../gone.md")).unwrap_err();
        assert!(
            matches!(err, Error::TargetNotFound { ref target, .. } if target == "../gone.md"),
            "an in-corpus miss must not be reported as outside the corpus: {err}"
        );
    }

    #[test]
    fn escaping_target_is_outside_corpus() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("corpus");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.md"), "# A\n").unwrap();
        std::fs::write(outer.path().join("outside.md"), "# Outside\n").unwrap();

        let err = resolve(&root, &root.join("a.md"), &reference("../outside.md")).unwrap_err();
        assert!(matches!(err, Error::OutsideCorpus { ref target, .. } if target == "../outside.md"));
    }
}
