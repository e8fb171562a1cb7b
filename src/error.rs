//! Crate-level error types for ctxlink diagnostics.

use std::path::PathBuf;

/// All errors in ctxlink carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, pattern, or reason for failure.
///
/// Only a handful of variants are fatal. `TargetNotFound` and `OutsideCorpus`
/// are per-reference outcomes that the annotator turns into warnings.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The corpus root cannot be canonicalized or enumerated at all.
    #[error("corpus root unreadable: {}: {source}", path.display())]
    CorpusUnreadable {
        /// Root directory that was requested.
        path: PathBuf,
        /// The underlying filesystem error.
        source: std::io::Error,
    },

    /// A placeholder pattern from the config is not a valid regex.
    #[error("invalid skip pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The pattern text as written in the config.
        pattern: String,
        /// Description of the regex compile failure.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of the run summary failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// Neither `.ctxlink.toml` nor the command line supplied a base URL.
    #[error("no base URL configured")]
    MissingBaseUrl,

    /// A reference resolved to a path that leaves the corpus root.
    #[error("linked file outside corpus: {target} in {}:{line}", document.display())]
    OutsideCorpus {
        /// Corpus-relative path of the referencing document.
        document: PathBuf,
        /// One-based line of the reference.
        line: u32,
        /// Raw target as written by the author.
        target: String,
    },

    /// No resolution strategy found the referenced file.
    #[error("linked file not found: {target} in {}:{line}", document.display())]
    TargetNotFound {
        /// Corpus-relative path of the referencing document.
        document: PathBuf,
        /// One-based line of the reference.
        line: u32,
        /// Raw target as written by the author.
        target: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The existing config could not be parsed for format-preserving editing.
    #[error("toml edit: {0}")]
    TomlEdit(
        /// The wrapped toml_edit parse error.
        #[from]
        toml_edit::TomlError,
    ),

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
