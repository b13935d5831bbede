//! WebDriver-backed browser actions
//!
//! Talks the W3C WebDriver wire protocol (JSON over HTTP) to an external
//! driver daemon (chromedriver or geckodriver), the same protocol Selenium
//! speaks. The daemon owns the browser; this client owns one session and
//! maps protocol errors onto `ActionError`.
//!
//! Selector strings starting with `//` or `(` are sent as XPath, everything
//! else as CSS.

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::actions::{ActionError, ActionFuture, Actions, Result};
use crate::cookies::StoredCookie;

/// W3C element identifier key in element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Poll interval for wait_for.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One WebDriver session against a running driver daemon.
pub struct WebDriverActions {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverActions {
    /// Start a new session on the daemon at `base_url`.
    pub async fn connect(http: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let body = json!({
            "capabilities": {
                "alwaysMatch": {}
            }
        });

        let response = http
            .post(format!("{base_url}/session"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ActionError::Driver(format!(
                    "cannot reach WebDriver at {base_url}: {e} (is chromedriver running?)"
                ))
            })?;

        let payload = decode_response(response).await?;
        let session_id = payload["sessionId"]
            .as_str()
            .ok_or_else(|| ActionError::Driver("session response carried no sessionId".into()))?
            .to_string();

        info!(session_id = %session_id, "WebDriver session created");
        Ok(Self {
            http,
            base_url,
            session_id,
        })
    }

    /// End the session. Best-effort: the daemon reaps orphans anyway.
    pub async fn close(&self) -> Result<()> {
        self.request(reqwest::Method::DELETE, "", None).await?;
        info!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }

    /// Issue one protocol request under this session and return its value.
    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ActionError::Driver(e.to_string()))?;
        decode_response(response).await
    }

    async fn find(&self, selector: &str) -> Result<String> {
        let value = self
            .request(reqwest::Method::POST, "/element", Some(locator(selector)))
            .await
            .map_err(|e| match e {
                ActionError::NotFound(_) => ActionError::NotFound(selector.to_string()),
                other => other,
            })?;
        element_id(&value)
            .ok_or_else(|| ActionError::Driver(format!("malformed element reference: {value}")))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<String>> {
        let value = self
            .request(reqwest::Method::POST, "/elements", Some(locator(selector)))
            .await?;
        let ids = value
            .as_array()
            .map(|refs| refs.iter().filter_map(element_id).collect())
            .unwrap_or_default();
        Ok(ids)
    }

    async fn execute_script(&self, script: &str, args: Value) -> Result<Value> {
        self.request(
            reqwest::Method::POST,
            "/execute/sync",
            Some(json!({"script": script, "args": args})),
        )
        .await
    }
}

/// Build the locator body, picking the strategy from the selector's shape.
fn locator(selector: &str) -> Value {
    json!({"using": strategy(selector), "value": selector})
}

fn strategy(selector: &str) -> &'static str {
    if selector.starts_with("//") || selector.starts_with('(') {
        "xpath"
    } else {
        "css selector"
    }
}

/// Extract the element id from a W3C element reference object.
fn element_id(value: &Value) -> Option<String> {
    value.get(ELEMENT_KEY)?.as_str().map(Into::into)
}

/// Unwrap the protocol envelope, mapping protocol errors to ActionError.
async fn decode_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let mut payload: Value = response
        .json()
        .await
        .map_err(|e| ActionError::Driver(format!("malformed driver response: {e}")))?;

    if !status.is_success() {
        let code = payload["value"]["error"].as_str().unwrap_or("unknown error");
        let message = payload["value"]["message"].as_str().unwrap_or("").to_string();
        return Err(match code {
            "no such element" | "stale element reference" => ActionError::NotFound(message),
            c if c.contains("timeout") => ActionError::Timeout(message),
            c => ActionError::Driver(format!("{c}: {message}")),
        });
    }

    Ok(payload["value"].take())
}

impl Actions for WebDriverActions {
    fn navigate<'a>(&'a self, url: &'a str) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            debug!(url, "navigating");
            self.request(reqwest::Method::POST, "/url", Some(json!({"url": url})))
                .await?;
            Ok(())
        })
    }

    fn count<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, usize> {
        Box::pin(async move { Ok(self.find_all(selector).await?.len()) })
    }

    fn text<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, String> {
        Box::pin(async move {
            let id = self.find(selector).await?;
            let value = self
                .request(reqwest::Method::GET, &format!("/element/{id}/text"), None)
                .await?;
            Ok(value.as_str().unwrap_or_default().to_string())
        })
    }

    fn attribute<'a>(
        &'a self,
        selector: &'a str,
        name: &'a str,
    ) -> ActionFuture<'a, Option<String>> {
        Box::pin(async move {
            let id = self.find(selector).await?;
            let value = self
                .request(
                    reqwest::Method::GET,
                    &format!("/element/{id}/attribute/{name}"),
                    None,
                )
                .await?;
            Ok(value.as_str().map(Into::into))
        })
    }

    fn click<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            let id = self.find(selector).await?;
            self.request(
                reqwest::Method::POST,
                &format!("/element/{id}/click"),
                Some(json!({})),
            )
            .await?;
            Ok(())
        })
    }

    fn type_text<'a>(&'a self, selector: &'a str, text: &'a str) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            let id = self.find(selector).await?;
            self.request(
                reqwest::Method::POST,
                &format!("/element/{id}/clear"),
                Some(json!({})),
            )
            .await?;
            self.request(
                reqwest::Method::POST,
                &format!("/element/{id}/value"),
                Some(json!({"text": text})),
            )
            .await?;
            Ok(())
        })
    }

    fn wait_for<'a>(&'a self, selector: &'a str, timeout: Duration) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                match self.find(selector).await {
                    Ok(_) => return Ok(()),
                    Err(ActionError::NotFound(_)) => {
                        if tokio::time::Instant::now() >= deadline {
                            return Err(ActionError::Timeout(selector.to_string()));
                        }
                        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
                    }
                    Err(other) => return Err(other),
                }
            }
        })
    }

    fn scroll_into_view<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            let id = self.find(selector).await?;
            self.execute_script(
                "arguments[0].scrollIntoView();",
                json!([{ELEMENT_KEY: id}]),
            )
            .await?;
            Ok(())
        })
    }

    fn scroll_by(&self, x: i64, y: i64) -> ActionFuture<'_, ()> {
        Box::pin(async move {
            self.execute_script("window.scrollBy(arguments[0], arguments[1]);", json!([x, y]))
                .await?;
            Ok(())
        })
    }

    fn screenshot<'a>(&'a self, path: &'a Path) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            let value = self
                .request(reqwest::Method::GET, "/screenshot", None)
                .await?;
            let encoded = value
                .as_str()
                .ok_or_else(|| ActionError::Driver("screenshot response was not a string".into()))?;
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| ActionError::Driver(format!("screenshot decode failed: {e}")))?;
            tokio::fs::write(path, bytes)
                .await
                .map_err(|e| ActionError::Driver(format!("writing screenshot failed: {e}")))?;
            Ok(())
        })
    }

    fn cookies(&self) -> ActionFuture<'_, Vec<StoredCookie>> {
        Box::pin(async move {
            let value = self.request(reqwest::Method::GET, "/cookie", None).await?;
            let cookies = value
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| {
                            Some(StoredCookie {
                                name: entry["name"].as_str()?.to_string(),
                                value: entry["value"].as_str()?.to_string(),
                                domain: entry["domain"].as_str().map(Into::into),
                                path: entry["path"].as_str().map(Into::into),
                                expires: entry["expiry"].as_f64(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(cookies)
        })
    }

    fn add_cookies<'a>(&'a self, cookies: &'a [StoredCookie]) -> ActionFuture<'a, ()> {
        Box::pin(async move {
            for cookie in cookies {
                let mut body = json!({
                    "name": cookie.name,
                    "value": cookie.value,
                });
                if let Some(ref domain) = cookie.domain {
                    body["domain"] = json!(domain);
                }
                if let Some(ref path) = cookie.path {
                    body["path"] = json!(path);
                }
                // The wire field is an integer; fractional expiries round down
                if let Some(expires) = cookie.expires {
                    body["expiry"] = json!(expires as i64);
                }
                self.request(
                    reqwest::Method::POST,
                    "/cookie",
                    Some(json!({"cookie": body})),
                )
                .await?;
            }
            Ok(())
        })
    }
}
