//! Service-specific error types

use thiserror::Error;

use crate::actions::ActionError;

/// Feed session lifecycle errors.
///
/// Per-post interaction failures are absorbed inside the feed walk (logged,
/// screenshot taken, walk continues); only errors that make the whole
/// session pointless propagate here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("verification code required; log in interactively once so cookies can be captured")]
    TwoFactorRequired,

    #[error("browser action failed: {0}")]
    Action(#[from] ActionError),

    #[error("storage error: {0}")]
    Storage(#[from] common::Error),
}

/// Result alias using the service Error
pub type Result<T> = std::result::Result<T, Error>;
