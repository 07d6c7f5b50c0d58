use serde_json::Value;

/// Best-effort: extract the first JSON object substring from a model response.
///
/// Greedy span from the first `{` to the last `}`, not balanced-brace
/// matching. Two sibling objects in one response merge into a single span
/// that fails to parse; the caller's retry loop handles that case.
pub fn extract_first_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    // Both delimiters are ASCII, so slicing at their byte offsets is safe.
    Some(&text[start..=end])
}

/// Parse model output into a JSON value, tolerating common escape damage.
///
/// Attempt 1 is a strict parse. Attempt 2 rewrites literal `\n`/`\t`
/// two-character sequences into real newline/tab characters and parses
/// again. Returns `None` on empty input or when both attempts fail.
pub fn parse_lenient(text: &str) -> Option<Value> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(s) {
        return Some(value);
    }

    let cleaned = s.replace("\\n", "\n").replace("\\t", "\t");
    serde_json::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_first_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_strips_surrounding_prose() {
        let text = "Here is the JSON:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        assert_eq!(extract_first_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_greedy_span_covers_siblings() {
        // Two sibling objects merge into one (unparsable) span on purpose.
        let text = r#"{"a": 1} and {"b": 2}"#;
        assert_eq!(extract_first_json(text), Some(r#"{"a": 1} and {"b": 2}"#));
    }

    #[test]
    fn test_extract_none_without_braces() {
        assert_eq!(extract_first_json(""), None);
        assert_eq!(extract_first_json("no json here"), None);
        assert_eq!(extract_first_json("only open {"), None);
        // The only `}` sits before the first `{`.
        assert_eq!(extract_first_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_strict_first() {
        let value = parse_lenient(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_parse_recovers_literal_escapes() {
        // Literal backslash-n between tokens breaks the strict parse but
        // becomes a real newline on the second attempt.
        let text = "{\"a\": 1,\\n\"b\": 2}";
        assert!(serde_json::from_str::<Value>(text).is_err());
        let value = parse_lenient(text).unwrap();
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn test_parse_none_on_garbage() {
        assert_eq!(parse_lenient(""), None);
        assert_eq!(parse_lenient("   "), None);
        assert_eq!(parse_lenient("{\"a\": "), None);
        assert_eq!(parse_lenient("not json"), None);
    }

    #[test]
    fn test_parse_merged_siblings_fails() {
        assert_eq!(parse_lenient(r#"{"a": 1} and {"b": 2}"#), None);
    }
}
