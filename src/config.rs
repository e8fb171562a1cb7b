//! `.ctxlink.toml` loading and the scan filter it drives.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Error;
use crate::placeholder::PlaceholderSet;

/// Name of the project config file at the corpus root.
pub const CONFIG_FILE: &str = ".ctxlink.toml";

/// Directory names that are never descended into.
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", ".vscode"];

/// Project configuration loaded from `.ctxlink.toml`.
/// Include/exclude patterns are path prefixes applied to corpus-relative document paths.
#[derive(Debug, Clone)]
pub struct Config {
    /// Normalized base URL, ending in one `/`.
    base_url: Option<String>,
    /// Path prefixes removed from the scan.
    exclude: Vec<String>,
    /// Directory names pruned during the corpus walk.
    pub excluded_dirs: BTreeSet<String>,
    /// Document extension without the leading dot.
    pub extension: String,
    /// Path prefixes the scan is limited to. Empty means everything.
    include: Vec<String>,
    /// Exclusion policy for reference targets.
    pub placeholders: PlaceholderSet,
}

/// Raw TOML structure for `.ctxlink.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CtxlinkTomlConfig {
    /// Base URL as written.
    base_url: Option<String>,
    /// Excluded path prefixes.
    #[serde(default)]
    exclude: Vec<String>,
    /// Extra directory names to prune.
    #[serde(default)]
    exclude_dirs: Vec<String>,
    /// Document extension, with or without the dot.
    extension: Option<String>,
    /// Included path prefixes.
    #[serde(default)]
    include: Vec<String>,
    /// Extra placeholder regexes.
    #[serde(default)]
    skip_patterns: Vec<String>,
    /// Extra placeholder substrings.
    #[serde(default)]
    skip_substrings: Vec<String>,
}

impl Config {
    /// The base URL that corpus-relative paths are appended to.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingBaseUrl` if neither the file nor the CLI set one.
    pub fn base_url(&self) -> Result<&str, Error> {
        return self.base_url.as_deref().ok_or(Error::MissingBaseUrl);
    }

    /// Load config from `.ctxlink.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed. A config file the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidPattern` if a `skip_patterns` entry is not a valid regex.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: CtxlinkTomlConfig = toml::from_str(&content)?;
        let placeholders = PlaceholderSet::with_extras(&raw.skip_substrings, &raw.skip_patterns)?;

        let mut excluded_dirs = default_excluded_dirs();
        excluded_dirs.extend(raw.exclude_dirs);

        let extension = raw
            .extension
            .map_or_else(|| return "md".to_owned(), |e| return e.trim_start_matches('.').to_owned());

        return Ok(Self {
            base_url: raw.base_url.as_deref().map(normalize_base_url),
            exclude: raw.exclude,
            excluded_dirs,
            extension,
            include: raw.include,
            placeholders,
        });
    }

    /// Check whether a document path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }

    /// Replace the configured base URL when one is given on the command line.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = Some(normalize_base_url(url));
        }
        return self;
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            base_url: None,
            exclude: Vec::new(),
            excluded_dirs: default_excluded_dirs(),
            extension: "md".to_owned(),
            include: Vec::new(),
            placeholders: PlaceholderSet::defaults(),
        };
    }
}

/// The built-in pruned directory names as an owned set.
fn default_excluded_dirs() -> BTreeSet<String> {
    return DEFAULT_EXCLUDED_DIRS.iter().map(|d| return (*d).to_owned()).collect();
}

/// Ensure the base URL ends in exactly one `/`.
pub fn normalize_base_url(url: &str) -> String {
    return format!("{}/", url.trim().trim_end_matches('/'));
}

#[cfg(test)]
#[allow(clippy::missing_assert_message, reason = "one behavior per test")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.extension, "md");
        assert!(config.excluded_dirs.contains(".git"));
        assert!(matches!(config.base_url(), Err(Error::MissingBaseUrl)));
    }

    #[test]
    fn loads_and_extends_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "base_url = \"https://github.com/org/repo/blob/main\"\n\
             extension = \".markdown\"\n\
             exclude_dirs = [\"target\"]\n\
             exclude = [\"drafts/\"]\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://github.com/org/repo/blob/main/");
        assert_eq!(config.extension, "markdown");
        assert!(config.excluded_dirs.contains("target"));
        assert!(config.excluded_dirs.contains("node_modules"));
        assert!(!config.should_scan("drafts/a.md"));
        assert!(config.should_scan("docs/a.md"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "base_url = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn cli_base_url_overrides_file() {
        let config = Config::default().with_base_url(Some("https://example.org/x//"));
        assert_eq!(config.base_url().unwrap(), "https://example.org/x/");
    }

    #[test]
    fn include_limits_scan() {
        let mut config = Config::default();
        config.include = vec!["docs/".to_owned()];
        assert!(config.should_scan("docs/guide.md"));
        assert!(!config.should_scan("README.md"));
    }
}
