//! Ordered, immutable API-key pool
//!
//! The pool is fixed for the process lifetime: configuration builds it once
//! and the driver only reads from it. Slots whose env var was never set
//! carry a placeholder value; the pool knows how to recognize those so the
//! driver can skip them without ever sending one upstream.

use crate::error::{Error, Result};

/// Prefix of the configuration layer's fallback value for an unset key
/// slot (`API_KEY_1`, `API_KEY_2`, ...).
pub const PLACEHOLDER_PREFIX: &str = "API_KEY_";

/// Ordered pool of Gemini API keys, read-only after construction.
#[derive(Debug, Clone)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    /// Build a pool from the configured key slots.
    ///
    /// The pool may contain placeholders but never nothing at all.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::EmptyPool);
        }
        Ok(Self { keys })
    }

    /// Number of slots in the pool, placeholders included.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key at `index`. Panics on out-of-range, which the driver's loop
    /// invariant (cursor < len) rules out.
    pub fn key(&self, index: usize) -> &str {
        &self.keys[index]
    }

    /// Whether the slot at `index` holds a placeholder instead of a real
    /// key: empty, or carrying the documented fallback prefix.
    pub fn is_placeholder(&self, index: usize) -> bool {
        let key = self.key(index);
        key.is_empty() || key.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Circular advance by exactly one slot.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.keys.len()
    }
}
