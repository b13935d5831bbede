//! Gemini `generateContent` client
//!
//! Thin reqwest client for the Gemini REST API in structured-output mode:
//! the response schema is passed through `generationConfig.responseSchema`
//! and the model is asked for `application/json`. The API key travels in
//! the `x-goog-api-key` header, never in the URL.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use crate::{GenerateError, Generator, Result};

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// Gemini REST API client.
///
/// Holds no credential state: the key for each call is supplied by the
/// caller, which is what makes per-call key rotation possible upstream.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for the production endpoint.
    pub fn new(http: reqwest::Client, model: impl Into<String>) -> Self {
        Self::with_base_url(http, model, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (tests, proxies).
    pub fn with_base_url(
        http: reqwest::Client,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    async fn call(
        &self,
        api_key: &str,
        schema: &serde_json::Value,
        prompt: &str,
    ) -> Result<Option<String>> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown"),
                message: error_message(&raw),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            debug!(model = %self.model, "model returned no text");
            return Ok(None);
        }
        Ok(Some(text))
    }
}

/// Pull `error.message` out of a JSON error body, falling back to the raw
/// body for non-JSON responses (HTML error pages, truncated bodies).
fn error_message(raw: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw)
        && let Some(message) = value["error"]["message"].as_str()
    {
        return message.to_string();
    }
    raw.trim().to_string()
}

impl Generator for GeminiClient {
    fn id(&self) -> &str {
        "gemini"
    }

    fn generate<'a>(
        &'a self,
        api_key: &'a str,
        schema: &'a serde_json::Value,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>> {
        Box::pin(self.call(api_key, schema, prompt))
    }
}
