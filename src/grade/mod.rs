pub mod completer;
pub mod extract;
pub mod mock;
pub mod retry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use completer::{Completer, Completion, CompletionRequest, OpenAiCompleter};
pub use retry::RetryPolicy;

use crate::config::GraderSettings;

/// Instruction sent ahead of every prompt. The reply is expected to be a bare
/// JSON object, but models often wrap it in prose, hence [`extract`].
pub const SYSTEM_INSTRUCTION: &str = "You are a prompt evaluation assistant. \
Rate the given prompt with a score from 0.0 to 100.0 and briefly explain how to improve it. \
Respond only with JSON in the form {\"score\": number, \"feedback\": string}.";

/// Used when the model's JSON carries no `feedback` field.
pub const MISSING_FEEDBACK: &str = "(no feedback)";

/// Feedback text in whichever shape the grader returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Text(String),
    /// A JSON object: `(key, text)` pairs in the order the model wrote them.
    KeyedList(Vec<(String, String)>),
    /// A JSON array.
    EnumeratedList(Vec<String>),
}

impl Default for Feedback {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Feedback {
    /// Classify a JSON value. Scalars other than strings become their JSON text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s.clone()),
            Value::Object(map) => Self::KeyedList(
                map.iter()
                    .map(|(k, v)| (k.clone(), value_text(v)))
                    .collect(),
            ),
            Value::Array(items) => Self::EnumeratedList(items.iter().map(value_text).collect()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for Feedback {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl Serialize for Feedback {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap as _;
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::KeyedList(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, text) in pairs {
                    map.serialize_entry(key, text)?;
                }
                map.end()
            }
            Self::EnumeratedList(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Feedback {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Self::from_value(&v))
    }
}

/// Outcome of one grading call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    /// Always within `[0.0, 100.0]`.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub feedback: Feedback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Feedback>,
    /// Diagnostics: response text, API body, fallback reasons.
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl GradeResult {
    /// True when the score came from the local heuristic.
    pub fn is_mock(&self) -> bool {
        self.raw.get("mock").and_then(Value::as_bool).unwrap_or(false)
    }

    /// The fallback reason recorded when the external grader was skipped or failed.
    pub fn error(&self) -> Option<&str> {
        self.raw.get("error").and_then(Value::as_str)
    }
}

/// When to use the local heuristic instead of the external grader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockPolicy {
    /// Mock only when no credential is available.
    #[default]
    Auto,
    /// Never call out.
    Always,
    /// Always call out, even without a credential.
    Never,
}

/// Inputs for one grading call.
#[derive(Debug, Clone)]
pub struct GradeRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub temperature: f64,
    pub mock: MockPolicy,
    /// Caller-supplied credential; overrides the grader's configured key.
    pub api_key: Option<&'a str>,
}

/// Scores prompts with an injected [`Completer`], falling back to
/// [`mock::mock_grade`] whenever the external path is unavailable or fails.
pub struct Grader {
    completer: Option<Box<dyn Completer>>,
    api_key: Option<String>,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl Grader {
    /// `completer = None` means no external grading capability; every call mocks.
    pub fn new(completer: Option<Box<dyn Completer>>) -> Self {
        Self {
            completer,
            api_key: None,
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
            retry: RetryPolicy::default(),
        }
    }

    /// Build a grader backed by [`OpenAiCompleter`] from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_settings(settings: &GraderSettings) -> anyhow::Result<Self> {
        let completer = OpenAiCompleter::new(&settings.api_base, settings.timeout_secs)?;
        Ok(Self::new(Some(Box::new(completer)))
            .with_api_key(settings.api_key.clone())
            .with_max_tokens(settings.max_tokens))
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub const fn has_completer(&self) -> bool {
        self.completer.is_some()
    }

    fn resolve_key<'a>(&'a self, request: &GradeRequest<'a>) -> Option<&'a str> {
        request
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or(self.api_key.as_deref())
    }

    /// Grade a prompt. Never fails: every error path degrades to a mock
    /// result with the reason recorded under `raw["error"]`.
    pub fn grade(&self, request: &GradeRequest<'_>) -> GradeResult {
        if request.mock == MockPolicy::Always {
            return mock::mock_grade(request.prompt);
        }

        let api_key = self.resolve_key(request);

        let Some(completer) = self.completer.as_deref() else {
            return mock::substitute(request.prompt, "completion capability unavailable");
        };
        if api_key.is_none() && request.mock != MockPolicy::Never {
            return mock::substitute(request.prompt, "no api key provided");
        }

        let user = format!(
            "Evaluate the following prompt for quality and clarity:\n\n{}",
            request.prompt
        );
        let completion_request = CompletionRequest {
            system: SYSTEM_INSTRUCTION,
            user: &user,
            model: request.model,
            temperature: request.temperature,
            max_tokens: self.max_tokens,
            api_key,
        };

        match retry::with_retry(self.retry, "grade", || {
            completer.complete(&completion_request)
        }) {
            Ok(completion) => extract::interpret(completion),
            Err(e) => {
                tracing::warn!("grading failed, using mock score: {e:#}");
                let mut result = mock::mock_grade(request.prompt);
                result.raw.insert("error".to_owned(), Value::from(format!("{e:#}")));
                result
                    .raw
                    .insert("attempts".to_owned(), Value::from(self.retry.attempts()));
                result
            }
        }
    }
}
