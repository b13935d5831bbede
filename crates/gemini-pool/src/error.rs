//! Error types for pool construction

/// Errors from building a key pool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("key pool must contain at least one entry")]
    EmptyPool,
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
