pub mod generate;
pub mod json;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One actionable critique point within a feedback record.
///
/// All fields are trimmed strings defaulting to empty. `confidence` is
/// whatever the model said; the prompts ask for high/medium/low but
/// normalization does not reject other values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub category: String,
    pub issue: String,
    pub suggestion: String,
    pub evidence: String,
    pub confidence: String,
}

/// Normalized structured output of one prompt variant for one essay.
///
/// Always well-typed after [`normalize`], no matter how mangled the model
/// output was.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub overall_summary: String,
    pub positives: Vec<String>,
    pub feedback_items: Vec<FeedbackItem>,
}

impl FeedbackRecord {
    /// The canonical all-empty record that exhausted retries degrade to.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compact JSON form for one CSV cell.
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Compact JSON text for one CSV cell.
pub fn compact_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// String-coerce a JSON value the way the review table expects: strings as
/// themselves, numbers and bools in display form, null as empty, containers
/// as compact JSON text.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn coerced_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .map(|v| coerce_string(v).trim().to_string())
        .unwrap_or_default()
}

/// Map an arbitrary parsed JSON value onto the fixed feedback schema.
///
/// Total: wrong-typed fields coerce or degrade to empty, non-object entries
/// in `feedback_items` are dropped, and no input shape can make it fail.
/// An empty `overall_summary` falls through to the `summary` key.
pub fn normalize(value: &Value) -> FeedbackRecord {
    let Some(obj) = value.as_object() else {
        return FeedbackRecord::empty();
    };

    let mut overall_summary = coerced_field(obj, "overall_summary");
    if overall_summary.is_empty() {
        overall_summary = coerced_field(obj, "summary");
    }

    let positives = match obj.get("positives") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| coerce_string(v).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    let feedback_items = match obj.get("feedback_items") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_object())
            .map(|item| FeedbackItem {
                category: coerced_field(item, "category"),
                issue: coerced_field(item, "issue"),
                suggestion: coerced_field(item, "suggestion"),
                evidence: coerced_field(item, "evidence"),
                confidence: coerced_field(item, "confidence"),
            })
            .collect(),
        _ => Vec::new(),
    };

    FeedbackRecord {
        overall_summary,
        positives,
        feedback_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_record() {
        let value = json!({
            "overall_summary": "  Solid draft.  ",
            "positives": ["Clear thesis", "  ", "Good pacing"],
            "feedback_items": [
                {
                    "category": "grammar",
                    "issue": "run-on sentence",
                    "suggestion": "split it",
                    "evidence": "and then and then",
                    "confidence": "high"
                }
            ]
        });
        let record = normalize(&value);
        assert_eq!(record.overall_summary, "Solid draft.");
        assert_eq!(record.positives, vec!["Clear thesis", "Good pacing"]);
        assert_eq!(record.feedback_items.len(), 1);
        assert_eq!(record.feedback_items[0].category, "grammar");
        assert_eq!(record.feedback_items[0].confidence, "high");
    }

    #[test]
    fn test_normalize_is_total() {
        // No input shape may panic or error, only degrade.
        assert_eq!(normalize(&Value::Null), FeedbackRecord::empty());
        assert_eq!(normalize(&json!([1, 2, 3])), FeedbackRecord::empty());
        assert_eq!(normalize(&json!("just a string")), FeedbackRecord::empty());
        assert_eq!(normalize(&json!(42)), FeedbackRecord::empty());
        assert_eq!(normalize(&json!({})), FeedbackRecord::empty());
    }

    #[test]
    fn test_normalize_wrong_typed_fields() {
        let value = json!({
            "overall_summary": 7,
            "positives": "not a list",
            "feedback_items": {"also": "not a list"}
        });
        let record = normalize(&value);
        assert_eq!(record.overall_summary, "7");
        assert!(record.positives.is_empty());
        assert!(record.feedback_items.is_empty());
    }

    #[test]
    fn test_normalize_summary_fallback() {
        let record = normalize(&json!({"summary": "fallback"}));
        assert_eq!(record.overall_summary, "fallback");

        // An empty overall_summary also falls through.
        let record = normalize(&json!({"overall_summary": "", "summary": "used"}));
        assert_eq!(record.overall_summary, "used");

        let record = normalize(&json!({"overall_summary": "kept", "summary": "ignored"}));
        assert_eq!(record.overall_summary, "kept");
    }

    #[test]
    fn test_normalize_drops_non_mapping_items() {
        let value = json!({
            "feedback_items": [
                "a bare string",
                17,
                ["nested", "list"],
                {"issue": "only real item"}
            ]
        });
        let record = normalize(&value);
        assert_eq!(record.feedback_items.len(), 1);
        assert_eq!(record.feedback_items[0].issue, "only real item");
        assert_eq!(record.feedback_items[0].category, "");
    }

    #[test]
    fn test_normalize_coerces_positive_elements() {
        let value = json!({"positives": [1, true, "text", null, {"k": "v"}]});
        let record = normalize(&value);
        assert_eq!(record.positives, vec!["1", "true", "text", "{\"k\":\"v\"}"]);
    }

    #[test]
    fn test_normalize_idempotent() {
        let value = json!({
            "overall_summary": "ok",
            "positives": ["x", 3],
            "feedback_items": [{"category": "clarity"}, "dropped"]
        });
        let once = normalize(&value);
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_compact_json_cells() {
        let record = FeedbackRecord {
            overall_summary: "ok".to_string(),
            positives: vec!["x".to_string()],
            feedback_items: vec![],
        };
        assert_eq!(
            record.to_compact_json(),
            r#"{"overall_summary":"ok","positives":["x"],"feedback_items":[]}"#
        );
        assert_eq!(compact_json(&record.positives), r#"["x"]"#);
    }
}
