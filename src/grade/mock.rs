use serde_json::{Map, Value};

use super::{Feedback, GradeResult};

pub const EMPTY_PROMPT_MESSAGE: &str = "The prompt is empty. Enter concrete instructions.";
pub const GOOD_START_MESSAGE: &str = "Good start.";
pub const BE_MORE_SPECIFIC_MESSAGE: &str =
    "Be more specific: state the goal and constraints explicitly.";

/// Scores at or above this get [`GOOD_START_MESSAGE`].
pub const GOOD_START_THRESHOLD: f64 = 60.0;

/// Two points per character of the trimmed prompt, capped at 100.
#[allow(clippy::cast_precision_loss)]
pub fn mock_score(prompt: &str) -> f64 {
    let length = prompt.trim().chars().count();
    (length as f64 * 2.0).min(100.0)
}

/// Deterministic local grade used when the external grader is skipped.
pub fn mock_grade(prompt: &str) -> GradeResult {
    let length = prompt.trim().chars().count();
    if length == 0 {
        return GradeResult {
            score: 0.0,
            feedback: Feedback::from(EMPTY_PROMPT_MESSAGE),
            examples: None,
            raw: Map::new(),
        };
    }
    let score = mock_score(prompt);
    let feedback = if score >= GOOD_START_THRESHOLD {
        GOOD_START_MESSAGE
    } else {
        BE_MORE_SPECIFIC_MESSAGE
    };
    let mut raw = Map::new();
    raw.insert("length".to_owned(), Value::from(length));
    raw.insert("mock".to_owned(), Value::Bool(true));
    GradeResult {
        score,
        feedback: Feedback::from(feedback),
        examples: None,
        raw,
    }
}

/// Mock grade standing in for a call that was never made; the diagnostics
/// carry only the reason.
pub fn substitute(prompt: &str, reason: &str) -> GradeResult {
    tracing::debug!("using mock score: {reason}");
    let mut raw = Map::new();
    raw.insert("error".to_owned(), Value::from(reason));
    raw.insert("mock".to_owned(), Value::Bool(true));
    GradeResult {
        raw,
        ..mock_grade(prompt)
    }
}
