//! Best-effort recovery of the grader's JSON reply from free-form text.
//!
//! Models tend to wrap the requested object in prose or code fences. The
//! recovery takes everything from the first `{` to the last `}` and parses
//! that. Braces inside string values or multiple top-level objects defeat it;
//! such replies degrade to raw-text feedback.

use serde_json::{Map, Value};

use super::{Completion, Feedback, GradeResult, MISSING_FEEDBACK};

/// Parse the span from the first `{` to the last `}` as a JSON object.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Coerce a JSON value to a score in `[0.0, 100.0]`.
///
/// Numbers and numeric strings are accepted, booleans count as 1/0, anything
/// else (including NaN) is 0.0.
pub fn clamp_score(raw: &Value) -> f64 {
    let score = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

fn field_feedback(value: Option<&Value>) -> Option<Feedback> {
    value.filter(|v| !v.is_null()).map(Feedback::from_value)
}

/// Turn a completion into a result. Never fails: unparseable replies score
/// 0.0 with the reply text as feedback.
pub fn interpret(completion: Completion) -> GradeResult {
    let Completion { text, body } = completion;
    let parsed = extract_json_object(&text);

    let mut raw = Map::new();
    raw.insert("response_text".to_owned(), Value::from(text.as_str()));
    raw.insert("api_response".to_owned(), body);

    let Some(parsed) = parsed else {
        tracing::debug!("no JSON object in grader reply, using raw text");
        return GradeResult {
            score: 0.0,
            feedback: Feedback::Text(text),
            examples: None,
            raw,
        };
    };

    GradeResult {
        score: parsed.get("score").map_or(0.0, clamp_score),
        feedback: field_feedback(parsed.get("feedback"))
            .unwrap_or_else(|| Feedback::from(MISSING_FEEDBACK)),
        examples: field_feedback(parsed.get("examples")),
        raw,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn completion(text: &str) -> Completion {
        Completion {
            text: text.to_owned(),
            body: json!({"choices": [{"message": {"content": text}}]}),
        }
    }

    // --- extract_json_object ---

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = "Sure! Here is my rating:\n{\"score\": 72.5, \"feedback\": \"Add constraints.\"}\nHope it helps.";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["score"], json!(72.5));
        assert_eq!(map["feedback"], json!("Add constraints."));
    }

    #[test]
    fn extracts_object_inside_code_fence() {
        let text = "```json\n{\"score\": 10, \"feedback\": \"x\"}\n```";
        assert!(extract_json_object(text).is_some());
    }

    #[test]
    fn one_level_of_nesting_parses() {
        let text = r#"{"score": 50, "feedback": {"clarity": "ok", "scope": "narrow"}}"#;
        let map = extract_json_object(text).unwrap();
        assert!(map["feedback"].is_object());
    }

    #[test]
    fn no_braces_is_none() {
        assert!(extract_json_object("score: 80").is_none());
    }

    #[test]
    fn closing_before_opening_is_none() {
        assert!(extract_json_object("} then {").is_none());
    }

    #[test]
    fn two_objects_do_not_parse() {
        assert!(extract_json_object(r#"{"score": 1} and {"score": 2}"#).is_none());
    }

    #[test]
    fn malformed_object_is_none() {
        assert!(extract_json_object("{score: 80, feedback: 'good'}").is_none());
    }

    // --- clamp_score ---

    #[test]
    fn clamp_keeps_in_range_values() {
        assert!((clamp_score(&json!(42.5)) - 42.5).abs() < f64::EPSILON);
        assert!((clamp_score(&json!(0)) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!(100)) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_bounds_out_of_range_values() {
        assert!((clamp_score(&json!(-5)) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!(250.0)) - 100.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!("1e9")) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_accepts_numeric_strings() {
        assert!((clamp_score(&json!(" 85 ")) - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_non_numeric_is_zero() {
        assert!((clamp_score(&json!("excellent")) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!(null)) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!([90])) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!("NaN")) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_booleans() {
        assert!((clamp_score(&json!(true)) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_score(&json!(false)) - 0.0).abs() < f64::EPSILON);
    }

    // --- interpret ---

    #[test]
    fn interpret_recovers_score_and_feedback() {
        let result = interpret(completion(
            r#"{"score": 88, "feedback": "Clear goal; add an output format."}"#,
        ));
        assert!((result.score - 88.0).abs() < f64::EPSILON);
        assert_eq!(
            result.feedback,
            Feedback::Text("Clear goal; add an output format.".to_owned())
        );
        assert!(result.raw.contains_key("response_text"));
        assert!(result.raw.contains_key("api_response"));
        assert!(!result.is_mock());
    }

    #[test]
    fn interpret_unparseable_uses_raw_text() {
        let result = interpret(completion("I would rate this an 8/10."));
        assert!((result.score - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.feedback, Feedback::Text("I would rate this an 8/10.".to_owned()));
    }

    #[test]
    fn interpret_missing_feedback_uses_placeholder() {
        let result = interpret(completion(r#"{"score": 30}"#));
        assert_eq!(result.feedback, Feedback::from(MISSING_FEEDBACK));
    }

    #[test]
    fn interpret_null_feedback_uses_placeholder() {
        let result = interpret(completion(r#"{"score": 30, "feedback": null}"#));
        assert_eq!(result.feedback, Feedback::from(MISSING_FEEDBACK));
    }

    #[test]
    fn interpret_list_feedback_and_examples() {
        let result = interpret(completion(
            r#"{"score": 61, "feedback": ["state the audience", "limit length"], "examples": {"before": "write", "after": "write 3 bullets"}}"#,
        ));
        assert_eq!(
            result.feedback,
            Feedback::EnumeratedList(vec!["state the audience".to_owned(), "limit length".to_owned()])
        );
        assert_eq!(
            result.examples,
            Some(Feedback::KeyedList(vec![
                ("before".to_owned(), "write".to_owned()),
                ("after".to_owned(), "write 3 bullets".to_owned()),
            ]))
        );
    }

    #[test]
    fn interpret_clamps_extracted_score() {
        let result = interpret(completion(r#"{"score": 140, "feedback": "great"}"#));
        assert!((result.score - 100.0).abs() < f64::EPSILON);
    }
}
