//! Recursive HTML sanitization over JSON payloads.
//!
//! Markup is stripped with an empty allow-list (no tag or attribute
//! survives), then any stray angle brackets and quotes are entity-escaped.
//! `&` is deliberately left alone so the transform is idempotent:
//! `sanitize(sanitize(x)) == sanitize(x)`.

use serde_json::Value;

/// Returns a sanitized copy of `value`. The input is never mutated, so a
/// caller that keeps the original payload around (e.g. for logging) is
/// unaffected.
///
/// Strings are sanitized, objects and arrays are walked recursively, and all
/// other leaf types (numbers, booleans, null) pass through unchanged.
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Sanitizes a single string: strip `<...>` spans, then escape what's left.
pub fn sanitize_str(input: &str) -> String {
    let stripped = strip_tags(input);
    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Removes every complete `<...>` span. An unmatched `<` is kept (and later
/// escaped by the caller), as is any unmatched `>`.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        match rest.find('<') {
            None => {
                out.push_str(rest);
                break;
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                match rest[start..].find('>') {
                    Some(offset) => rest = &rest[start + offset + 1..],
                    None => {
                        out.push_str(&rest[start..]);
                        break;
                    }
                }
            }
        }
    }
    out
}
