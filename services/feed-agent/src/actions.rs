//! Browser action boundary
//!
//! The session scripts the page through this trait and never sees the
//! underlying driver. `WebDriverActions` implements it over a chromedriver;
//! tests implement it with scripted fakes. Selectors are plain strings:
//! ones starting with `//` or `(` are treated as XPath by implementations,
//! everything else as CSS.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Actions>`).

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use crate::cookies::StoredCookie;

/// Errors from browser interactions.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The selector matched nothing
    #[error("element not found: {0}")]
    NotFound(String),

    /// The condition did not hold within its deadline
    #[error("timed out waiting for: {0}")]
    Timeout(String),

    /// The driver itself failed (protocol, transport, session)
    #[error("driver error: {0}")]
    Driver(String),
}

/// Result alias for browser actions.
pub type Result<T> = std::result::Result<T, ActionError>;

/// Boxed future alias for the trait's methods.
pub type ActionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// What the feed session needs from a browser.
pub trait Actions: Send + Sync {
    /// Load a URL and wait for the navigation to settle.
    fn navigate<'a>(&'a self, url: &'a str) -> ActionFuture<'a, ()>;

    /// Number of elements currently matching the selector.
    fn count<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, usize>;

    /// Visible text of the first matching element.
    fn text<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, String>;

    /// Attribute value of the first matching element, None when unset.
    fn attribute<'a>(&'a self, selector: &'a str, name: &'a str) -> ActionFuture<'a, Option<String>>;

    fn click<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, ()>;

    /// Clear the element and type the text into it.
    fn type_text<'a>(&'a self, selector: &'a str, text: &'a str) -> ActionFuture<'a, ()>;

    /// Poll until the selector matches or the timeout elapses.
    fn wait_for<'a>(&'a self, selector: &'a str, timeout: Duration) -> ActionFuture<'a, ()>;

    fn scroll_into_view<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, ()>;

    fn scroll_by(&self, x: i64, y: i64) -> ActionFuture<'_, ()>;

    /// Capture the viewport as a PNG at the given path.
    fn screenshot<'a>(&'a self, path: &'a Path) -> ActionFuture<'a, ()>;

    fn cookies(&self) -> ActionFuture<'_, Vec<StoredCookie>>;

    fn add_cookies<'a>(&'a self, cookies: &'a [StoredCookie]) -> ActionFuture<'a, ()>;
}
