//! Generation capability boundary
//!
//! Defines the `Generator` trait that decouples the retry driver from the
//! model provider. `GeminiClient` implements it over the Gemini
//! `generateContent` REST API; tests and alternate providers implement the
//! same trait with scripted or different backends.

pub mod client;

pub use client::{DEFAULT_MODEL, GeminiClient};

use std::future::Future;
use std::pin::Pin;

/// Failures from a generation call.
///
/// The `Api` variant's Display renders the canonical HTTP status line
/// (`429 Too Many Requests: ...`, `503 Service Unavailable: ...`), which is
/// the textual signature downstream classification keys on.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Upstream returned a non-success status
    #[error("{status} {reason}: {message}")]
    Api {
        status: u16,
        reason: &'static str,
        message: String,
    },

    /// Connection, TLS, or timeout failure before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body could not be decoded
    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    /// A failure signal that did not come from a structured error path.
    /// `GeminiClient` never constructs this; it exists for implementations
    /// of the seam that surface raw values instead of errors.
    #[error("unexpected failure signal: {0}")]
    Unexpected(String),
}

/// Result alias for generation calls.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Abstraction over structured-output text generation.
///
/// `generate` returns the model's text payload (a JSON document matching
/// `schema`) or `Ok(None)` when the model produced no usable text, the
/// explicit empty-response signal. The schema and prompt are opaque to
/// callers above this seam.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Generator>`).
pub trait Generator: Send + Sync {
    /// Identifier for logging (e.g. "gemini")
    fn id(&self) -> &str;

    /// Run one generation call with the given credential.
    fn generate<'a>(
        &'a self,
        api_key: &'a str,
        schema: &'a serde_json::Value,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;
}
