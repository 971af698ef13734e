use anyhow::Context as _;
use serde::Serialize;
use serde_json::Value;

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// One chat-style completion request: a system instruction plus a user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Bearer credential; sent only when present.
    pub api_key: Option<&'a str>,
}

/// What a completer hands back: the reply text and the full response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub body: Value,
}

/// External text-completion capability used by [`super::Grader`].
pub trait Completer {
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// unreadable response body.
    fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<Completion>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Completer for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompleter {
    client: reqwest::blocking::Client,
    endpoint: String,
}

/// Build a blocking HTTP client with the given per-request timeout.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed (e.g., invalid TLS config).
pub fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|e| anyhow::anyhow!("could not build HTTP client: {e}"))
}

impl OpenAiCompleter {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_base: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Consume a response and return it if the status is successful.
///
/// On 401 Unauthorized, returns an error hinting at the credential.
/// On other non-2xx statuses, includes the response body in the error message.
fn require_success(
    resp: reqwest::blocking::Response,
) -> anyhow::Result<reqwest::blocking::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        anyhow::bail!(
            "server returned HTTP 401 Unauthorized — check OPENAI_API_KEY or pass --api-key"
        );
    }
    if !status.is_success() {
        let text = resp
            .text()
            .map_err(|e| anyhow::anyhow!("could not read response body: {e}"))?;
        anyhow::bail!("server returned HTTP {status}: {text}");
    }
    Ok(resp)
}

/// Pull `choices[0].message.content`, or fall back to the whole body as text.
pub fn response_text(body: &Value) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map_or_else(|| body.to_string(), ToOwned::to_owned)
}

impl Completer for OpenAiCompleter {
    fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<Completion> {
        let payload = ChatRequest {
            model: request.model,
            messages: [
                Message {
                    role: "system",
                    content: request.system,
                },
                Message {
                    role: "user",
                    content: request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = request.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder
            .send()
            .map_err(|e| anyhow::anyhow!("request to {} failed: {e}", self.endpoint))?;
        let body: Value = require_success(resp)?
            .json()
            .context("completion response is not valid JSON")?;
        Ok(Completion {
            text: response_text(&body),
            body,
        })
    }
}
