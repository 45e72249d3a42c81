//! Shared helper functions for CLI commands

use miette::{miette, Result};
use serde_json::Value;
use std::io::{self, IsTerminal};
use std::path::Path;

/// Format an entry id string for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id_str(id: &str) -> String {
    if id.len() > 16 {
        format!("{}...", &id[..13])
    } else {
        id.to_string()
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One-line rendering of a snapshot for tables
pub fn compact_state(state: &Value) -> String {
    match state {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a state argument: inline JSON, or `@path` to read JSON from a file
///
/// A missing argument is `null`.
pub fn parse_state_arg(arg: Option<&str>) -> Result<Value> {
    let Some(arg) = arg else {
        return Ok(Value::Null);
    };
    let (content, source) = match arg.strip_prefix('@') {
        Some(path) => {
            let content = std::fs::read_to_string(Path::new(path))
                .map_err(|e| miette!("Cannot read {}: {}", path, e))?;
            (content, path.to_string())
        }
        None => (arg.to_string(), "argument".to_string()),
    };
    serde_json::from_str(&content).map_err(|e| miette!("Invalid JSON in {}: {}", source, e))
}

/// Whether stdin is attached to a terminal (interactive prompts allowed)
pub fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_format_short_id_str() {
        assert_eq!(format_short_id_str("SHORT"), "SHORT");
        assert_eq!(
            format_short_id_str("CHG-01J123456789ABCDEF123456"),
            "CHG-01J123456..."
        );
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("crème brûlée", 6), "crè...");
    }

    #[test]
    fn test_compact_state() {
        assert_eq!(compact_state(&Value::Null), "-");
        assert_eq!(compact_state(&json!("whole")), "whole");
        assert_eq!(compact_state(&json!({"price": 2})), "{\"price\":2}");
    }

    #[test]
    fn test_parse_state_arg_inline() {
        assert_eq!(parse_state_arg(None).unwrap(), Value::Null);
        assert_eq!(parse_state_arg(Some("{\"a\":1}")).unwrap(), json!({"a": 1}));
        assert_eq!(parse_state_arg(Some("12.5")).unwrap(), json!(12.5));
        assert!(parse_state_arg(Some("{oops")).is_err());
    }

    #[test]
    fn test_parse_state_arg_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("before.json");
        std::fs::write(&path, "{\"price\": 10}").unwrap();

        let arg = format!("@{}", path.display());
        assert_eq!(parse_state_arg(Some(&arg)).unwrap(), json!({"price": 10}));
        assert!(parse_state_arg(Some("@/definitely/not/here.json")).is_err());
    }
}
