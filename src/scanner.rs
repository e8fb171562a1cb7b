//! Corpus walk: every document under the root, in a stable order.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Error;

/// Compare the file extension without allocating.
fn has_extension(path: &Path, extension: &str) -> bool {
    return path.extension().is_some_and(|ext| return ext == extension);
}

/// True for directories below the root whose name is in the excluded set.
fn is_excluded_dir(entry: &DirEntry, config: &Config) -> bool {
    return entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| return config.excluded_dirs.contains(name));
}

/// Enumerate every document under `root` with the configured extension.
/// Excluded directory names are pruned before descent, so their subtrees are
/// never visited. Unreadable entries are skipped with a warning.
/// Applies the config's include/exclude filters to corpus-relative paths.
/// Returns absolute paths sorted lexicographically.
///
/// # Errors
///
/// Returns `Error::CorpusUnreadable` if the root itself cannot be listed.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<PathBuf>, Error> {
    std::fs::read_dir(root).map_err(|source| {
        return Error::CorpusUnreadable {
            path: root.to_path_buf(),
            source,
        };
    })?;

    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return !is_excluded_dir(e, config));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let location = e.path().map_or_else(String::new, |p| return p.display().to_string());
                tracing::warn!("skipping unreadable entry {location}: {e}");
                continue;
            },
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), &config.extension) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !config.should_scan(&relative.to_string_lossy()) {
            tracing::debug!("filtered by include/exclude: {}", relative.display());
            continue;
        }

        documents.push(entry.into_path());
    }

    documents.sort();
    return Ok(documents);
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::implicit_return,
    clippy::missing_assert_message,
    clippy::missing_docs_in_private_items,
    reason = "terse test helpers"
)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "# x\n").unwrap();
    }

    #[test]
    fn finds_documents_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "z.md");
        touch(dir.path(), "docs/b.md");
        touch(dir.path(), "a.md");
        touch(dir.path(), "docs/notes.txt");

        let found = scan(dir.path(), &Config::default()).unwrap();
        let relative: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("a.md"), PathBuf::from("docs/b.md"), PathBuf::from("z.md")]
        );
    }

    #[test]
    fn prunes_excluded_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "node_modules/pkg/readme.md");
        touch(dir.path(), ".git/notes.md");
        touch(dir.path(), "docs/.vscode/x.md");
        touch(dir.path(), "keep.md");

        let found = scan(dir.path(), &Config::default()).unwrap();
        assert_eq!(found, vec![dir.path().join("keep.md")]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan(&missing, &Config::default()),
            Err(Error::CorpusUnreadable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subtree_is_skipped() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.md");
        touch(dir.path(), "locked/hidden.md");
        touch(dir.path(), "z.md");
        let locked = dir.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory; nothing to observe then.
        let listable = std::fs::read_dir(&locked).is_ok();
        let found = scan(dir.path(), &Config::default());

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        if listable {
            return;
        }

        let found = found.expect("an unreadable subdirectory must not fail the scan");
        assert_eq!(found, vec![dir.path().join("a.md"), dir.path().join("z.md")]);
    }
}
