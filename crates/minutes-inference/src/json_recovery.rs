//! Best-effort JSON extraction from free-form model replies.
//!
//! Models asked for strict JSON still wrap it in markdown fences or surround it
//! with prose. [`recover_json`] narrows a reply down to the first balanced JSON
//! value; [`parse_summary`] then reads it leniently into a [`MeetingSummary`].
//!
//! Grammar:
//! 1. drop a leading fence marker (```` ``` ```` plus optional language tag) and
//!    a trailing ```` ``` ````, then trim;
//! 2. locate the first `{` or `[`;
//! 3. scan forward counting `{`/`[` against `}`/`]`, ignoring anything inside
//!    string literals (with `\` escapes), until depth returns to zero.
//!
//! Input that is already valid JSON skips all of this. No opener, or no
//! balanced close, yields the fence-stripped text unchanged.

use serde_json::Value;

use minutes_core::{Error, MeetingSummary, Result};

const FENCE: &str = "```";

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut stripped = text.trim();

    if let Some(rest) = stripped.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        stripped = &rest[tag_len..];
    }
    if let Some(rest) = stripped.trim_end().strip_suffix(FENCE) {
        stripped = rest;
    }

    stripped.trim()
}

/// Narrow `raw` to its first balanced JSON object or array.
///
/// Text that already parses as JSON is returned as is.
pub fn recover_json(raw: &str) -> &str {
    if serde_json::from_str::<Value>(raw).is_ok() {
        return raw;
    }

    let text = strip_code_fences(raw);

    let Some(start) = text.find(|c: char| c == '{' || c == '[') else {
        return text;
    };

    match balanced_len(&text[start..]) {
        Some(len) => &text[start..start + len],
        None => text,
    }
}

/// Byte length of the balanced span opening at the first character of `text`.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
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
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Recover and parse a model reply into a summary.
///
/// Lenient about shape: a missing `summary` becomes empty, non-string list
/// members are stringified, `key_points` is kept when present. Anything that is
/// not a JSON object is an error.
pub fn parse_summary(raw: &str) -> Result<MeetingSummary> {
    let candidate = recover_json(raw);
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| Error::Serialization(format!("reply is not valid JSON: {}", e)))?;

    let Value::Object(map) = value else {
        return Err(Error::Serialization(
            "reply is not a JSON object".to_string(),
        ));
    };

    let summary = match map.get("summary") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(MeetingSummary {
        summary,
        action_items: string_list(map.get("action_items")).unwrap_or_default(),
        key_points: string_list(map.get("key_points")),
    })
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) if s.trim().is_empty() => Some(Vec::new()),
        Value::String(s) => Some(vec![s.clone()]),
        other => Some(vec![other.to_string()]),
    }
}
