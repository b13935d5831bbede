//! Cookie persistence for the browser session
//!
//! A JSON file of the cookies captured after a successful login. All writes
//! use atomic temp-file + rename so a crash never leaves a half-written
//! file behind. A missing or unreadable file just means "no session"; the
//! bot falls back to credential login.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::Result;

/// Name of the cookie whose presence and expiry define a valid session.
const SESSION_COOKIE: &str = "sessionid";

/// One stored browser cookie.
///
/// `expires` is a unix timestamp in seconds, fractional as some drivers
/// report it. Cookies without an expiry are session-scoped and do not
/// count as a persisted login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

/// File-backed cookie store.
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load stored cookies. Missing or corrupt files yield an empty list;
    /// the session treats that as "log in again", not a hard failure.
    pub async fn load(&self) -> Vec<StoredCookie> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&contents) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cookie file unreadable, ignoring");
                Vec::new()
            }
        }
    }

    /// Persist the given cookies, replacing the file contents.
    pub async fn save(&self, cookies: &[StoredCookie]) -> Result<()> {
        let contents = serde_json::to_string_pretty(cookies)
            .map_err(|e| common::Error::Json(e.to_string()))?;
        write_atomic(&self.path, &contents).await?;
        info!(path = %self.path.display(), count = cookies.len(), "cookies saved");
        Ok(())
    }

    /// Whether the store holds a session cookie that expires after `now`
    /// (unix seconds).
    pub async fn has_valid_session(&self, now_secs: u64) -> bool {
        self.load()
            .await
            .iter()
            .find(|cookie| cookie.name == SESSION_COOKIE)
            .and_then(|cookie| cookie.expires)
            .is_some_and(|expires| expires > now_secs as f64)
    }
}

/// Atomic write: temp file in the same directory, then rename over the
/// target. Creates parent directories as needed.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
