//! Best-effort extraction of a JSON object from free-form model text.
//!
//! Models wrap their JSON in prose, code fences or trailing commentary. Every
//! call site that expects structured output goes through [`parse_json_object`]
//! and picks its own fallback when it returns `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// First `{` to last `}`, across newlines.
static GREEDY_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Return the greedy brace span of `text`: everything from the first `{` to
/// the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    GREEDY_OBJECT.find(text).map(|m| m.as_str())
}

/// Decode the first JSON object embedded in `text`.
///
/// The greedy span is tried first. When it does not decode (two objects in one
/// reply, stray braces in trailing prose) the first `{` that starts a complete
/// object wins, with anything after that object ignored.
pub fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    extract_json_object(text)
        .and_then(decode_object)
        .or_else(|| {
            text.match_indices('{')
                .find_map(|(start, _)| decode_leading_object(&text[start..]))
        })
}

fn decode_object(span: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Decode the object at the start of `text`, ignoring what follows it.
fn decode_leading_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(Value::Object(map))) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_object_wrapped_in_prose() {
        let text = "Sure! Here you go:\n```json\n{\"action\": \"sales_agent\", \"queries\": []}\n```\nLet me know.";
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["action"], json!("sales_agent"));
        assert_eq!(map["queries"], json!([]));
    }

    #[test]
    fn test_greedy_span_keeps_nested_objects() {
        let text = "{\"a\": {\"b\": 1}, \"c\": 2}";
        assert_eq!(extract_json_object(text), Some(text));
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["a"]["b"], json!(1));
    }

    #[test]
    fn test_falls_back_to_first_balanced_object() {
        // Greedy span covers both objects and the text between them.
        let text = "{\"action\": \"search_agent\"} or maybe {\"action\": \"sales_agent\"}";
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["action"], json!("search_agent"));
    }

    #[test]
    fn test_braces_inside_strings_do_not_unbalance() {
        let text = "note: {\"reason\": \"user said }{ twice\", \"ok\": true} trailing }";
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["ok"], json!(true));
    }

    #[test]
    fn test_unmatched_braces_before_object() {
        let text = "{{{ oops {\"action\": \"emi_calculator\"} and { more";
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["action"], json!("emi_calculator"));
    }

    #[test]
    fn test_no_object_yields_none() {
        assert!(parse_json_object("no json here").is_none());
        assert!(parse_json_object("{not json}").is_none());
        assert!(parse_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("plain").is_none());
    }
}
