//! Parsing of free-text CLI output.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static SESSION_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Session\s+(?:ID|created):\s*(\w+)",
        r"(?i)session[_\s]+id:\s*(\w+)",
        r"(?i)\b([0-9a-f]{6,})\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static REPORTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(?:[AMDR?]{1,2}\s+|(?:modified|new file|created|updated|applied|patched):\s*)([\w.@+-]+(?:/[\w.@+-]+)*\.\w+)\s*$",
    )
    .expect("valid regex")
});

/// Session id from `new` output.
///
/// Tries the labelled forms first, then any hex run, then the last word.
pub fn parse_session_id(output: &str) -> Option<String> {
    SESSION_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(output).map(|c| c[1].to_string()))
        .or_else(|| output.split_whitespace().last().map(str::to_string))
}

/// File paths listed by `remote pull --apply`.
pub fn parse_reported_paths(output: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = REPORTED_PATH
        .captures_iter(output)
        .map(|c| PathBuf::from(&c[1]))
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_forms() {
        assert_eq!(
            parse_session_id("Session created: 8812345\nOpen the web UI").as_deref(),
            Some("8812345")
        );
        assert_eq!(parse_session_id("session_id: job42").as_deref(), Some("job42"));
        assert_eq!(
            parse_session_id("Started task deadbeef01 in the cloud").as_deref(),
            Some("deadbeef01")
        );
        assert_eq!(parse_session_id("queued as xyz").as_deref(), Some("xyz"));
        assert_eq!(parse_session_id("   "), None);
    }

    #[test]
    fn test_reported_paths() {
        let output = "Pulling session 123...\nM src/lib.rs\nA  docs/guide.md\nmodified: README.md\nApplied 3 changes\n";
        assert_eq!(
            parse_reported_paths(output),
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("docs/guide.md"),
                PathBuf::from("src/lib.rs"),
            ]
        );
        assert!(parse_reported_paths("Nothing to apply").is_empty());
    }
}
