//! File watcher: annotates on startup, then re-annotates when documents change.

use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::Config;
use crate::diagnostics;
use crate::error;
use crate::types::{Mode, Output};

/// Debounce delay between filesystem events and the next pass.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that sends an event for each relevant change.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    root: PathBuf,
    config: Config,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return is_relevant(p, &root, &config))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Whether a changed path is a document the annotator would scan.
fn is_relevant(path: &Path, root: &Path, config: &Config) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    if !path.extension().is_some_and(|ext| return ext == config.extension.as_str()) {
        return false;
    }
    return !relative.components().any(|c| {
        return match c {
            Component::Normal(name) => name.to_str().is_some_and(|n| return config.excluded_dirs.contains(n)),
            _ => false,
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial pass, then watches the corpus and re-annotates on changes.
/// The pass triggered by its own writes finds nothing left to annotate, so the
/// loop settles.
///
/// # Errors
///
/// Returns errors from root canonicalization, config loading, or watcher setup.
pub fn run(root: &Path, base_url: Option<&str>) -> Result<ExitCode, error::Error> {
    let root = commands::canonical_root(root)?;
    let config = Config::load(&root)?.with_base_url(base_url);
    config.base_url()?;

    eprintln!("watch: initial pass");
    run_pass(&root, &config);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, root.clone(), config.clone())?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| return error::Error::Watch { reason: e.to_string() })?;

    eprintln!("watch: monitoring {}, press Ctrl+C to stop", root.display());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-annotating...");
        run_pass(&root, &config);
    }

    return Ok(ExitCode::SUCCESS);
}

/// Run one annotate pass and print its summary. Errors are reported, not fatal.
fn run_pass(root: &Path, config: &Config) {
    let result = commands::annotate_corpus(root, config, Mode::Write, Output::Text)
        .and_then(|summary| return commands::print_summary(&summary, Output::Text));
    if let Err(e) = result {
        diagnostics::print_error(&e);
    }
}

#[cfg(test)]
#[allow(clippy::missing_assert_message, reason = "paths are spelled out in each assertion")]
mod tests {
    use super::*;

    #[test]
    fn only_documents_outside_excluded_dirs_are_relevant() {
        let root = Path::new("/repo");
        let config = Config::default();
        assert!(is_relevant(Path::new("/repo/docs/a.md"), root, &config));
        assert!(!is_relevant(Path::new("/repo/docs/a.txt"), root, &config));
        assert!(!is_relevant(Path::new("/repo/node_modules/x/a.md"), root, &config));
        assert!(!is_relevant(Path::new("/repo/.git/a.md"), root, &config));
        assert!(!is_relevant(Path::new("/elsewhere/a.md"), root, &config));
    }
}
