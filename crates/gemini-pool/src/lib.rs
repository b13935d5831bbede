//! API-key rotation for Gemini generation calls
//!
//! Drives a bounded retry loop over an ordered pool of API keys. Each
//! failed call is classified by its textual signature and the classifier's
//! directive decides what happens next: rotate to the next key, retry the
//! same key after a fixed delay, or stop.
//!
//! Call lifecycle:
//! 1. The driver starts at key 0 with a budget of one iteration per key.
//! 2. Placeholder keys (unset config slots) are skipped, consuming budget.
//! 3. A 429 rotates to the next key circularly; a 503 (or an empty model
//!    response) sleeps five seconds and retries the same key.
//! 4. Any other failure ends the run with a failure message.
//! 5. A parseable JSON payload ends the run with the parsed value.
//!
//! The driver's result is always a value (`CallResult`), never an error;
//! callers branch on success/failure, nothing propagates abnormally.

pub mod classify;
pub mod driver;
pub mod error;
pub mod pool;

pub use classify::{Directive, FailureSignal, classify};
pub use driver::{CallResult, RetryDriver};
pub use error::{Error, Result};
pub use pool::KeyPool;
