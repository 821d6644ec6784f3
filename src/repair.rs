//! JSON recovery for an unreliable generator output channel.
//!
//! The cascade is an ordered list of pure `text -> text` transforms tried in
//! sequence. Each stage's input is the previous stage's output, a stage is
//! only consulted after cheaper stages have failed to yield parseable JSON,
//! and a re-parse is only attempted when a stage actually changed something.
//! The final, most aggressive stage truncates at the parser-reported error
//! offset and rebalances the braces.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// One repair stage: a named, pure text transform.
pub struct RepairStage {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// The ordered cascade, cheapest first.
pub const REPAIR_STAGES: &[RepairStage] = &[
    RepairStage {
        name: "strip-trailing-commas",
        apply: strip_trailing_commas,
    },
    RepairStage {
        name: "strip-line-comments",
        apply: strip_line_comments,
    },
    RepairStage {
        name: "replace-control-chars",
        apply: replace_control_chars,
    },
    RepairStage {
        name: "normalize-smart-quotes",
        apply: normalize_smart_quotes,
    },
];

/// Pull the JSON candidate out of a model response: a fenced code block if
/// present, otherwise the substring from the first `{` to the last `}`.
pub fn extract_candidate(text: &str) -> Option<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid fence pattern")
    });

    if let Some(captures) = fence.captures(text) {
        let inner = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if inner.starts_with('{') {
            return Some(inner.to_string());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        Some(text[start..=end].to_string())
    } else {
        None
    }
}

/// Strip a trailing comma immediately before a closing `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    static TRAILING: OnceLock<Regex> = OnceLock::new();
    let trailing = TRAILING
        .get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid trailing-comma pattern"));
    trailing.replace_all(text, "$1").into_owned()
}

/// Remove `// ...` line comments outside of string literals.
pub fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Drop everything to the end of the line, keep the newline.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Replace control characters (except newline and tab) with a space.
pub fn replace_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Normalize typographic double quotes to escaped straight quotes.
pub fn normalize_smart_quotes(text: &str) -> String {
    text.replace(['\u{201C}', '\u{201D}'], "\\\"")
}

/// Run the cascade over an extracted candidate. Already-valid input returns
/// after the first parse attempt without touching any stage.
pub fn repair_and_parse(candidate: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Some(value);
    }

    let mut text = candidate.to_string();
    for stage in REPAIR_STAGES {
        let repaired = (stage.apply)(&text);
        let changed = repaired != text;
        text = repaired;
        if changed {
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                tracing::debug!("JSON recovered after stage '{}'", stage.name);
                return Some(value);
            }
        }
    }

    // Last resort: cut back to the last complete top-level member before
    // the parser-reported offset and rebalance.
    let offset = match serde_json::from_str::<Value>(&text) {
        Ok(value) => return Some(value),
        Err(e) => error_offset(&text, e.line(), e.column()),
    };
    let rebalanced = truncate_and_rebalance(&text, offset)?;
    match serde_json::from_str::<Value>(&rebalanced) {
        Ok(value) => {
            tracing::debug!("JSON recovered by truncate-and-rebalance at offset {}", offset);
            Some(value)
        }
        Err(_) => None,
    }
}

/// Translate serde_json's 1-based line/column into a byte offset.
fn error_offset(text: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let mut offset = 0;
    for (i, l) in text.split('\n').enumerate() {
        if i + 1 == line {
            return (offset + column.saturating_sub(1)).min(text.len());
        }
        offset += l.len() + 1;
    }
    text.len()
}

/// Cut the candidate back to the last comma at object depth 1 before
/// `offset` (outside string literals), then close the root object. Returns
/// `None` when no complete top-level member precedes the offset.
pub fn truncate_and_rebalance(text: &str, offset: usize) -> Option<String> {
    let limit = offset.min(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut depth: i32 = 0;
    let mut last_member_end: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if i >= limit {
            break;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ',' if depth == 1 => last_member_end = Some(i),
            _ => {}
        }
    }

    let cut = last_member_end?;
    let mut repaired = text[..cut].to_string();
    repaired.push('}');
    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_input_is_returned_unchanged_by_the_first_parse() {
        let input = r#"{"key": "value"}"#;
        let value = repair_and_parse(input).unwrap();
        assert_eq!(value["key"], "value");
    }

    #[test]
    fn trailing_comma_is_stripped() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1,}"#), r#"{"a": 1}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3,\n]"), "[1, 2, 3\n]");
    }

    #[test]
    fn line_comments_survive_inside_strings() {
        let input = "{\"url\": \"https://example.com\"} // note";
        let stripped = strip_line_comments(input);
        assert!(stripped.contains("https://example.com"));
        assert!(!stripped.contains("note"));
    }

    #[test]
    fn truncated_response_is_rebalanced() {
        let input = r#"{"a": "one", "b": "two", "c": "tru"#;
        let value = repair_and_parse(input).unwrap();
        assert_eq!(value["a"], "one");
        assert_eq!(value["b"], "two");
        assert!(value.get("c").is_none());
    }

    #[test]
    fn garbage_fails_in_bounded_steps() {
        assert!(repair_and_parse("not json at all").is_none());
    }
}
