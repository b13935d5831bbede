//! Failure classification for generation calls
//!
//! Maps a failed call's textual signature to a recovery directive. The
//! matching is a fixed table of marker substrings: supporting another
//! provider means adding markers, not logic. Classification is pure; the
//! one directive that involves waiting carries its delay instead of
//! sleeping here, and the caller performs the suspension.

use std::time::Duration;

use tracing::error;

/// Substring a rate-limited call's message carries.
pub const RATE_LIMIT_MARKER: &str = "429 Too Many Requests";

/// Substring a temporarily-unavailable call's message carries.
pub const UNAVAILABLE_MARKER: &str = "503 Service Unavailable";

/// Fixed wait before retrying the same key after an unavailability signal.
pub const UNAVAILABLE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How a marker recovers. First matching table row wins.
enum Recovery {
    SwitchKey,
    RetryAfterDelay,
}

const MARKERS: &[(&str, Recovery)] = &[
    (RATE_LIMIT_MARKER, Recovery::SwitchKey),
    (UNAVAILABLE_MARKER, Recovery::RetryAfterDelay),
];

/// A failed call, resolved by the caller into one of two shapes before
/// classification; no runtime type inspection happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// A structured error from the generation capability, rendered to text
    Recognized(String),
    /// A failure that did not arrive as a structured error
    Unrecognized(String),
}

/// The classifier's decision on how the driver should proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Rotate to this key index (always one step, wrapping circularly)
    SwitchTo(usize),
    /// Sleep for the carried duration, then retry the same key
    RetrySameAfterDelay(Duration),
    /// Stop retrying; surface the message
    Fatal(String),
    /// Stop retrying; the signal was not a recognized error
    Unknown(String),
}

/// Classify a failure against the marker table.
///
/// `cursor` is the key index the failed call used; `pool_len` is the pool
/// size for circular arithmetic. Emits exactly one log line identifying
/// the branch taken.
pub fn classify(signal: &FailureSignal, cursor: usize, pool_len: usize) -> Directive {
    match signal {
        FailureSignal::Recognized(message) => {
            for (marker, recovery) in MARKERS {
                if !message.contains(marker) {
                    continue;
                }
                return match recovery {
                    Recovery::SwitchKey => {
                        error!(
                            key_index = cursor,
                            "rate limit exhausted on current key, switching to the next"
                        );
                        Directive::SwitchTo((cursor + 1) % pool_len)
                    }
                    Recovery::RetryAfterDelay => {
                        error!(
                            key_index = cursor,
                            delay_secs = UNAVAILABLE_RETRY_DELAY.as_secs(),
                            "service temporarily unavailable, retrying same key after delay"
                        );
                        Directive::RetrySameAfterDelay(UNAVAILABLE_RETRY_DELAY)
                    }
                };
            }
            error!(error = %message, "unhandled generation error, stopping retries");
            Directive::Fatal(message.clone())
        }
        FailureSignal::Unrecognized(value) => {
            error!(signal = %value, "unknown failure signal, stopping retries");
            Directive::Unknown(value.clone())
        }
    }
}
