//! Completion client for OpenAI-compatible and Azure OpenAI chat endpoints.
//!
//! The [`CompletionClient`] trait decouples the pipelines from the HTTP
//! backend. Tests use scripted clients that return predetermined results
//! without touching the network.
//!
//! One call is one request-response cycle. Retries belong to the caller (see
//! [`crate::io::retry`]).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::schema::SchemaError;
use crate::error::PreconditionError;
use crate::io::config::LlmConfig;

/// Host suffixes served by Azure OpenAI.
const AZURE_HOST_SUFFIXES: [&str; 2] = [".openai.azure.com", ".cognitiveservices.azure.com"];
/// Error bodies are cut to this many characters before they reach logs or outcome records.
const ERROR_BODY_LIMIT: usize = 500;

/// Typed failure of a single completion call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The endpoint answered with a non-success status.
    #[error("LLM API error {status}: {body}")]
    Status { status: u16, body: String },
    /// The request never produced a response (connect failure, timeout).
    #[error("LLM API request failed: {message}")]
    Transport { message: String },
    #[error("LLM returned an empty response")]
    EmptyResponse,
    #[error("LLM returned malformed JSON: {detail}")]
    MalformedJson { detail: String },
}

impl CompletionError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Malformed and empty responses are excluded: they cost a full generation
    /// and are often deterministic for a given prompt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::EmptyResponse | Self::MalformedJson { .. } => false,
        }
    }
}

impl From<SchemaError> for CompletionError {
    fn from(err: SchemaError) -> Self {
        Self::MalformedJson {
            detail: format!("unexpected shape: {err}"),
        }
    }
}

/// Abstraction over completion backends.
pub trait CompletionClient {
    /// Send `prompt` as the single user message and return the parsed JSON object.
    fn complete(&self, prompt: &str) -> Result<Value, CompletionError>;
}

/// Protocol variant, selected once from the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointKind {
    /// `Authorization: Bearer <key>`.
    Standard,
    /// `api-key: <key>`, optional `api-version` query parameter.
    Azure { api_version: Option<String> },
}

/// Fully resolved chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: EndpointKind,
    pub url: Url,
}

impl Endpoint {
    pub fn resolve(base_url: &str, api_version: Option<&str>) -> Result<Self, PreconditionError> {
        let invalid = |message: String| PreconditionError::BaseUrl {
            url: base_url.to_string(),
            message,
        };
        let base = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        let host = base
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_ascii_lowercase();

        let kind = if AZURE_HOST_SUFFIXES
            .iter()
            .any(|suffix| host.ends_with(suffix))
        {
            EndpointKind::Azure {
                api_version: api_version.map(str::to_string),
            }
        } else {
            EndpointKind::Standard
        };

        let joined = format!("{}/chat/completions", base.as_str().trim_end_matches('/'));
        let mut url = Url::parse(&joined).map_err(|err| invalid(err.to_string()))?;
        if let EndpointKind::Azure {
            api_version: Some(version),
        } = &kind
        {
            url.query_pairs_mut().append_pair("api-version", version);
        }
        Ok(Self { kind, url })
    }

    fn authorize(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        match self.kind {
            EndpointKind::Standard => request.bearer_auth(api_key),
            EndpointKind::Azure { .. } => request.header("api-key", api_key),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    response_format: ResponseFormat,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Completion client speaking the chat-completions wire protocol over HTTP.
pub struct HttpCompletionClient {
    http: Client,
    endpoint: Endpoint,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl HttpCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let endpoint = Endpoint::resolve(&config.base_url, config.api_version.as_deref())?;
        let http = http_client(config.timeout, &endpoint.url)?;
        debug!(url = %endpoint.url, kind = ?endpoint.kind, "resolved completion endpoint");
        Ok(Self {
            http,
            endpoint,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl CompletionClient for HttpCompletionClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<Value, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_tokens: self.max_tokens,
        };

        info!(url = %self.endpoint.url, "sending completion request");
        let request = self.http.post(self.endpoint.url.clone()).json(&body);
        let response = self
            .endpoint
            .authorize(request, &self.api_key)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().map_err(transport_error)?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "completion endpoint returned an error status");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let value = parse_completion_body(&text)?;
        debug!("completion parsed");
        Ok(value)
    }
}

/// Extract and parse the assistant message from a successful response body.
pub fn parse_completion_body(text: &str) -> Result<Value, CompletionError> {
    if text.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    let envelope: ChatResponse =
        serde_json::from_str(text).map_err(|err| CompletionError::MalformedJson {
            detail: format!("decode response envelope: {err}"),
        })?;
    let content = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::EmptyResponse)?;

    let value: Value =
        serde_json::from_str(&content).map_err(|err| CompletionError::MalformedJson {
            detail: err.to_string(),
        })?;
    if !value.is_object() {
        return Err(CompletionError::MalformedJson {
            detail: "expected a JSON object".to_string(),
        });
    }
    Ok(value)
}

/// Loopback endpoints (local gateways, test stubs) bypass any configured proxy.
fn http_client(timeout: Duration, url: &Url) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout);
    if is_loopback(url) {
        builder = builder.no_proxy();
    }
    builder.build().context("build completion HTTP client")
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .is_ok_and(|addr| addr.is_loopback())
}

fn transport_error(err: reqwest::Error) -> CompletionError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    CompletionError::Transport { message }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
