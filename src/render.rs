//! Plain-text rendering of grading results for the terminal.

use std::fmt::Write as _;

use crate::grade::{Feedback, GradeResult};
use crate::history::HistoryEntry;

pub const HINT: &str = "Hint: if the score seems off, spell out the goal, constraints, and expected output of your prompt.";

/// Render feedback as prose, or as a numbered list for list-shaped feedback.
pub fn format_feedback(feedback: &Feedback) -> String {
    match feedback {
        Feedback::Text(text) => text.clone(),
        Feedback::KeyedList(pairs) => pairs
            .iter()
            .enumerate()
            .map(|(i, (key, text))| format!("{}. {key}: {text}", i + 1))
            .collect::<Vec<_>>()
            .join("\n"),
        Feedback::EnumeratedList(items) => items
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {text}", i + 1))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Full result block: score, feedback, optional examples and diagnostics.
pub fn format_result(result: &GradeResult, show_raw: bool) -> String {
    let mut out = String::new();
    let source = if result.is_mock() { " (mock)" } else { "" };
    let _ = writeln!(out, "Score: {:.1}{source}", result.score);
    let _ = writeln!(out, "\nFeedback:\n{}", format_feedback(&result.feedback));
    if let Some(examples) = &result.examples {
        let _ = writeln!(out, "\nExamples:\n{}", format_feedback(examples));
    }
    if let Some(error) = result.error() {
        let _ = writeln!(out, "\nNote: {error}");
    }
    if show_raw {
        let raw = serde_json::to_string_pretty(&result.raw).unwrap_or_default();
        let _ = writeln!(out, "\nRaw:\n{raw}");
    }
    out
}

/// First line of a prompt, cut to `max` characters.
pub fn preview(prompt: &str, max: usize) -> String {
    let line = prompt.trim().lines().next().unwrap_or_default();
    if line.chars().count() <= max {
        return line.to_owned();
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}\u{2026}")
}

/// One-line summary used by `history list`.
pub fn format_entry_line(entry: &HistoryEntry) -> String {
    format!(
        "{} {} {:>5.1} [{}] {}",
        entry.id,
        entry.timestamp,
        entry.result.score,
        entry.model,
        preview(&entry.prompt, 60)
    )
}

/// Detailed view used by `history show`.
pub fn format_entry(entry: &HistoryEntry, show_raw: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID: {}", entry.id);
    let _ = writeln!(out, "Timestamp: {}", entry.timestamp);
    let _ = writeln!(out, "Model: {}", entry.model);
    let _ = writeln!(out, "Temperature: {}", entry.temperature);
    let _ = writeln!(out, "\n--- Prompt ---\n{}", entry.prompt);
    let _ = write!(out, "\n--- Result ---\n{}", format_result(&entry.result, show_raw));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::mock::{BE_MORE_SPECIFIC_MESSAGE, mock_grade};

    #[test]
    fn text_feedback_is_verbatim() {
        assert_eq!(format_feedback(&Feedback::from("Be concise.")), "Be concise.");
    }

    #[test]
    fn list_feedback_is_numbered() {
        let feedback = Feedback::EnumeratedList(vec!["Add context".to_owned(), "Set a length".to_owned()]);
        assert_eq!(format_feedback(&feedback), "1. Add context\n2. Set a length");
    }

    #[test]
    fn keyed_feedback_is_numbered_with_keys() {
        let feedback = Feedback::KeyedList(vec![
            ("clarity".to_owned(), "good".to_owned()),
            ("scope".to_owned(), "too broad".to_owned()),
        ]);
        assert_eq!(format_feedback(&feedback), "1. clarity: good\n2. scope: too broad");
    }

    #[test]
    fn result_block_shows_score_and_mock_marker() {
        let out = format_result(&mock_grade("Hi"), false);
        assert!(out.starts_with("Score: 4.0 (mock)\n"), "{out}");
        assert!(out.contains(BE_MORE_SPECIFIC_MESSAGE));
        assert!(!out.contains("Raw:"));
    }

    #[test]
    fn raw_is_shown_on_request() {
        let out = format_result(&mock_grade("Hi"), true);
        assert!(out.contains("Raw:"));
        assert!(out.contains("\"length\": 2"));
    }

    #[test]
    fn preview_truncates_long_first_line() {
        assert_eq!(preview("short\nsecond line", 10), "short");
        assert_eq!(preview("abcdefghijkl", 5), "abcd\u{2026}");
    }
}
