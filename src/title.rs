//! Title extraction for link targets: metadata block, then first H1, then filename.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// A `---`-framed block at the very start of the file.
#[allow(clippy::expect_used, reason = "constant pattern")]
static METADATA_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---").expect("valid regex"));

/// A `title:` line inside the metadata block, optionally quoted.
#[allow(clippy::expect_used, reason = "constant pattern")]
static TITLE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r#"(?m)^title:[ \t]*["']?(.*?)["']?[ \t]*\r?$"#).expect("valid regex");
});

/// First `# ` heading outside fenced code blocks, with any closing `#`s removed.
fn first_heading(body: &str) -> Option<String> {
    let mut in_fence = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let Some(rest) = line.strip_prefix('#') else { continue };
        if !rest.starts_with([' ', '\t']) {
            continue;
        }
        let text = strip_closing_sequence(rest.trim());
        if !text.is_empty() {
            return Some(text.to_owned());
        }
    }
    return None;
}

/// The `title` value of a metadata block, if present and non-empty.
fn metadata_title(metadata: &str) -> Option<String> {
    let cap = TITLE_KEY.captures(metadata)?;
    let title = cap.get(1)?.as_str().trim();
    return (!title.is_empty()).then(|| return title.to_owned());
}

/// Title for the document at `path`. Read failures are logged and fall back
/// to the filename so a bad target never aborts the run.
pub fn read_title(path: &Path) -> String {
    return match std::fs::read_to_string(path) {
        Ok(content) => title_from_content(&content).unwrap_or_else(|| return title_from_stem(path)),
        Err(e) => {
            tracing::warn!("could not extract title from {}: {e}", path.display());
            title_from_stem(path)
        },
    };
}

/// Split off a leading metadata block, returning it and the text after it.
fn split_metadata(content: &str) -> (Option<&str>, &str) {
    let Some(cap) = METADATA_BLOCK.captures(content) else {
        return (None, content);
    };
    let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
        return (None, content);
    };
    return (Some(inner.as_str()), content.get(whole.end()..).unwrap_or_default());
}

/// `Title ##` becomes `Title`; a `#` glued to a word is content and stays.
fn strip_closing_sequence(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.len() == text.len() || without.ends_with([' ', '\t']) {
        return without.trim_end();
    }
    return text;
}

/// Uppercase the first cased character of every run of cased characters and
/// lowercase the rest. Digits and punctuation start a new run, so `v2beta`
/// becomes `V2Beta` and `foo.bar` becomes `Foo.Bar`.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_cased = false;
    for c in text.chars() {
        let cased = c.is_lowercase() || c.is_uppercase();
        if cased && !previous_cased {
            out.extend(c.to_uppercase());
        } else if cased {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        previous_cased = cased;
    }
    return out;
}

/// Metadata title or first level-1 heading, whichever comes first in priority.
pub fn title_from_content(content: &str) -> Option<String> {
    let (metadata, body) = split_metadata(content);
    return metadata
        .and_then(metadata_title)
        .or_else(|| return first_heading(body));
}

/// `getting-started_guide.md` becomes `Getting Started Guide`.
pub fn title_from_stem(path: &Path) -> String {
    let stem = path.file_stem().map(|s| return s.to_string_lossy()).unwrap_or_default();
    return title_case(&stem.replace(['-', '_'], " "));
}

#[cfg(test)]
#[allow(clippy::missing_assert_message, reason = "one title per assertion")]
mod tests {
    use super::*;

    #[test]
    fn metadata_title_beats_heading() {
        let content = "---\ntitle: \"A\"\nauthor: me\n---\n\n# B\n";
        assert_eq!(title_from_content(content).as_deref(), Some("A"));
    }

    #[test]
    fn unquoted_and_single_quoted_metadata() {
        assert_eq!(title_from_content("---\ntitle: Plain Title  \n---\n").as_deref(), Some("Plain Title"));
        assert_eq!(title_from_content("---\ntitle: 'Single'\n---\n").as_deref(), Some("Single"));
    }

    #[test]
    fn heading_when_no_metadata() {
        assert_eq!(title_from_content("intro\n\n# B\n\n# C\n").as_deref(), Some("B"));
    }

    #[test]
    fn heading_when_metadata_has_no_title() {
        let content = "---\nauthor: me\n# not a heading\n---\n# Real\n";
        assert_eq!(title_from_content(content).as_deref(), Some("Real"));
    }

    #[test]
    fn metadata_must_start_the_file() {
        let content = "# Heading\n---\ntitle: Late\n---\n";
        assert_eq!(title_from_content(content).as_deref(), Some("Heading"));
    }

    #[test]
    fn ignores_level_two_and_fenced_comments() {
        let content = "## Sub\n```bash\n# install deps\n```\n#hashtag\n# Top #\n";
        assert_eq!(title_from_content(content).as_deref(), Some("Top"));
    }

    #[test]
    fn keeps_hash_glued_to_word() {
        assert_eq!(title_from_content("# Using C#\n").as_deref(), Some("Using C#"));
    }

    #[test]
    fn stem_fallback_capitalizes_words() {
        assert_eq!(title_from_stem(Path::new("docs/getting-started_guide.md")), "Getting Started Guide");
        assert_eq!(title_from_stem(Path::new("README.md")), "Readme");
        assert_eq!(title_from_stem(Path::new("release-notes_v2.md")), "Release Notes V2");
        assert_eq!(title_from_content("plain text only\n"), None);
    }

    #[test]
    fn stem_fallback_starts_words_after_digits_and_dots() {
        assert_eq!(title_from_stem(Path::new("foo.bar.md")), "Foo.Bar");
        assert_eq!(title_from_stem(Path::new("v2beta.md")), "V2Beta");
        assert_eq!(title_from_stem(Path::new("api_V2_CHANGES.md")), "Api V2 Changes");
    }

    #[test]
    fn unreadable_file_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary-notes.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x23]).unwrap();
        assert_eq!(read_title(&path), "Binary Notes");
    }

    #[test]
    fn reads_title_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.md");
        std::fs::write(&path, "# Project Overview\n").unwrap();
        assert_eq!(read_title(&path), "Project Overview");
    }
}
