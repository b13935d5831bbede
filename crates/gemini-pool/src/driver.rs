//! Bounded retry loop over the key pool
//!
//! One `run` makes at most one attempt per pool slot: a single bounded
//! pass, not a budget per key. The cursor starts at 0 for every run and
//! moves only the way the classifier's directives say. Skipping a
//! placeholder slot consumes an iteration like a real attempt does.

use std::sync::Arc;

use gemini_client::{GenerateError, Generator};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::classify::{Directive, FailureSignal, UNAVAILABLE_MARKER, classify};
use crate::pool::KeyPool;

/// Terminal outcome of a driver run.
///
/// Failures are ordinary values carrying a human-readable explanation; the
/// driver never propagates an error to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Parsed structured output from the model
    Success(Value),
    /// Terminal failure message for the operator
    Failure(String),
}

/// Drives generation calls across the key pool.
pub struct RetryDriver {
    pool: KeyPool,
    generator: Arc<dyn Generator>,
}

impl RetryDriver {
    pub fn new(pool: KeyPool, generator: Arc<dyn Generator>) -> Self {
        Self { pool, generator }
    }

    /// Run the generation call with rotation and retry.
    ///
    /// `schema` and `prompt` are passed through to the generator unexamined.
    /// An empty model response is treated like a temporary-unavailability
    /// failure: the synthesized signal goes through the same classification
    /// as a real one and still consumes an iteration.
    pub async fn run(&self, schema: &Value, prompt: &str) -> CallResult {
        let mut cursor = 0usize;
        let budget = self.pool.len();

        for attempt in 0..budget {
            if self.pool.is_placeholder(cursor) {
                warn!(key_index = cursor, "skipping placeholder key slot");
                cursor = self.pool.next_index(cursor);
                continue;
            }

            info!(
                key_index = cursor,
                attempt,
                provider = self.generator.id(),
                "attempting generation call"
            );

            let signal = match self
                .generator
                .generate(self.pool.key(cursor), schema, prompt)
                .await
            {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    match serde_json::from_str::<Value>(&text) {
                        Ok(payload) => {
                            info!(key_index = cursor, "generation call succeeded");
                            return CallResult::Success(payload);
                        }
                        Err(e) => FailureSignal::Recognized(format!("invalid JSON payload: {e}")),
                    }
                }
                Ok(_) => {
                    warn!(
                        key_index = cursor,
                        "empty response from model, treating as temporary unavailability"
                    );
                    FailureSignal::Recognized(format!(
                        "{UNAVAILABLE_MARKER}: empty response from model"
                    ))
                }
                Err(GenerateError::Unexpected(value)) => FailureSignal::Unrecognized(value),
                Err(err) => FailureSignal::Recognized(err.to_string()),
            };

            match classify(&signal, cursor, budget) {
                Directive::SwitchTo(next) => {
                    info!(from = cursor, to = next, "switching API key");
                    cursor = next;
                }
                Directive::RetrySameAfterDelay(delay) => {
                    info!(
                        key_index = cursor,
                        delay_secs = delay.as_secs(),
                        "retrying same key after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                Directive::Fatal(message) => {
                    error!(key_index = cursor, "stopping after fatal generation error");
                    return CallResult::Failure(format!("An error occurred: {message}"));
                }
                Directive::Unknown(_) => {
                    error!(key_index = cursor, "stopping after unknown failure signal");
                    return CallResult::Failure("An unknown error occurred.".to_string());
                }
            }
        }

        error!(attempts = budget, "all API keys exhausted or failed");
        CallResult::Failure("Failed to generate response after trying all API keys.".to_string())
    }
}
