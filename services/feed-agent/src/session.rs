//! Feed interaction session
//!
//! Owns the page-interaction policy: log in (cookies first, credentials as
//! fallback), then walk the feed post by post: like, generate a comment,
//! post it, verify it, move on. Every per-post failure is contained: the
//! walk logs it, saves a screenshot, and continues with the next post.
//!
//! All element lookups go through the `Actions` boundary; this module knows
//! selectors and order, never the driver.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use gemini_pool::{CallResult, RetryDriver};
use rand::RngExt as _;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::actions::{ActionError, Actions};
use crate::cookies::CookieStore;
use crate::error::{Error, Result};
use crate::ledger::{ActionLedger, unix_time_ms, unix_time_secs};
use crate::schema::comment_schema;

const FEED_POST: &str = "article";
const INBOX_LINK: &str = "//a[contains(@href, '/direct/inbox/')]";
const LOGIN_USERNAME: &str = "input[name='username']";
const LOGIN_PASSWORD: &str = "input[name='password']";
const LOGIN_SUBMIT: &str = "button[type='submit']";
const VERIFICATION_CODE: &str = "input[name='verificationCode']";
const COMMENT_BOX: &str = "//div[contains(@role, 'textbox')][@aria-label='Add a comment…']";
const COMMENT_TEXTAREA: &str =
    "//textarea[@aria-label='Add a comment…' or @placeholder='Add a comment…']";
const POST_SUBMIT: &str = "//div[contains(text(), 'Post') and @role='button']";

fn post_selector(index: usize) -> String {
    format!("article:nth-of-type({index})")
}

fn like_button(index: usize) -> String {
    format!(
        "//article[{index}]//div[contains(@class, '_aamw')]/button[.//*[name()='svg'][@aria-label='Like' or @aria-label='Unlike']]"
    )
}

fn like_icon(index: usize) -> String {
    format!(
        "//article[{index}]//div[contains(@class, '_aamw')]//*[name()='svg'][@aria-label='Like' or @aria-label='Unlike']"
    )
}

fn comment_button(index: usize) -> String {
    format!(
        "//article[{index}]//div[contains(@class, '_aamx')]/button[.//*[name()='svg'][@aria-label='Comment']]"
    )
}

fn post_text(index: usize) -> String {
    format!("//article[{index}]//div[contains(@class, '_a9zs')]")
}

fn posted_comment(snippet: &str) -> String {
    format!("//div[contains(text(), '{snippet}')]")
}

const LOGIN_FORM_TIMEOUT: Duration = Duration::from_secs(10);
const LOGIN_VERIFY_TIMEOUT: Duration = Duration::from_secs(15);
const TWO_FACTOR_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const FEED_TIMEOUT: Duration = Duration::from_secs(10);
const COMMENT_UI_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_INTERACTION_RETRIES: u32 = 3;
const RETRY_DELAY_MIN_SECS: f64 = 2.0;
const RETRY_DELAY_MAX_SECS: f64 = 5.0;

/// Session-level knobs pulled out of the full config.
pub struct SessionSettings {
    pub start_url: String,
    pub username: String,
    pub password: Option<Secret<String>>,
    pub max_posts: usize,
    pub min_action_delay_secs: f64,
    pub max_action_delay_secs: f64,
}

/// Outcome of one comment attempt that did not error.
enum CommentOutcome {
    Posted,
    /// Generation produced nothing usable; not worth retrying
    Declined,
}

/// One login-plus-feed-walk run against a browser.
pub struct FeedSession {
    actions: Arc<dyn Actions>,
    driver: RetryDriver,
    cookies: CookieStore,
    ledger: ActionLedger,
    settings: SessionSettings,
}

impl FeedSession {
    pub fn new(
        actions: Arc<dyn Actions>,
        driver: RetryDriver,
        cookies: CookieStore,
        ledger: ActionLedger,
        settings: SessionSettings,
    ) -> Self {
        Self {
            actions,
            driver,
            cookies,
            ledger,
            settings,
        }
    }

    /// Run the whole session: login, then the feed walk.
    pub async fn run(&self) -> Result<()> {
        self.ledger.prune_expired(unix_time_ms()).await?;
        self.ensure_logged_in().await?;

        if let Err(e) = self.actions.screenshot(Path::new("logged_in.png")).await {
            warn!(error = %e, "could not save login screenshot, continuing");
        }

        self.actions.navigate(&self.settings.start_url).await?;
        self.walk_feed().await
    }

    /// Install stored cookies when they still hold a session; fall back to
    /// the credential form otherwise.
    async fn ensure_logged_in(&self) -> Result<()> {
        if self.cookies.has_valid_session(unix_time_secs()).await {
            info!("valid session cookies found, skipping login");
            self.actions.navigate(&self.settings.start_url).await?;
            let stored = self.cookies.load().await;
            self.actions.add_cookies(&stored).await?;
            self.actions.navigate(&self.settings.start_url).await?;

            match self.actions.wait_for(INBOX_LINK, LOGIN_VERIFY_TIMEOUT).await {
                Ok(()) => {
                    info!("login verified with cookies");
                    return Ok(());
                }
                Err(ActionError::Timeout(_)) => {
                    warn!("cookies invalid or expired, logging in again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.login_with_credentials().await
    }

    async fn login_with_credentials(&self) -> Result<()> {
        let password = self.settings.password.as_ref().ok_or_else(|| {
            Error::LoginFailed(
                "no password configured; set FEED_PASSWORD or password_file".into(),
            )
        })?;

        let login_url = format!(
            "{}/accounts/login/",
            self.settings.start_url.trim_end_matches('/')
        );
        self.actions.navigate(&login_url).await?;
        self.actions
            .wait_for(LOGIN_USERNAME, LOGIN_FORM_TIMEOUT)
            .await?;

        self.actions
            .type_text(LOGIN_USERNAME, &self.settings.username)
            .await?;
        self.actions
            .type_text(LOGIN_PASSWORD, password.expose())
            .await?;
        self.actions.click(LOGIN_SUBMIT).await?;

        // A verification-code field means the account wants interactive 2FA,
        // which an unattended session cannot answer.
        match self
            .actions
            .wait_for(VERIFICATION_CODE, TWO_FACTOR_PROBE_TIMEOUT)
            .await
        {
            Ok(()) => return Err(Error::TwoFactorRequired),
            Err(ActionError::Timeout(_)) => {
                info!("no verification prompt detected, continuing");
            }
            Err(e) => return Err(e.into()),
        }

        match self.actions.wait_for(INBOX_LINK, LOGIN_VERIFY_TIMEOUT).await {
            Ok(()) => info!("login successful"),
            Err(ActionError::Timeout(_)) => {
                return Err(Error::LoginFailed(
                    "inbox link not found after submitting credentials; check the account".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        info!("saving cookies");
        let captured = self.actions.cookies().await?;
        self.cookies.save(&captured).await?;
        Ok(())
    }

    async fn walk_feed(&self) -> Result<()> {
        for index in 1..=self.settings.max_posts {
            match self.interact_with_post(index).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    error!(post = index, error = %e, "error interacting with post");
                    let name = format!("error_post_{index}.png");
                    if let Err(shot) = self.actions.screenshot(Path::new(&name)).await {
                        warn!(error = %shot, "could not save failure screenshot");
                    }
                    self.jitter(self.settings.min_action_delay_secs, self.settings.max_action_delay_secs)
                        .await;
                }
            }
        }
        info!("feed walk finished");
        Ok(())
    }

    /// Handle one post. Returns Ok(false) when the feed ran out of posts.
    async fn interact_with_post(&self, index: usize) -> Result<bool> {
        self.actions.wait_for(FEED_POST, FEED_TIMEOUT).await?;
        let loaded = self.actions.count(FEED_POST).await?;
        if index > loaded {
            info!(loaded, "no more posts loaded, ending walk");
            return Ok(false);
        }

        self.like_post(index).await;

        if self.ledger.can_post().await? {
            self.comment_on_post(index).await;
        } else {
            info!(post = index, "comment limit reached for the rolling window, skipping comment");
        }

        let _ = self
            .actions
            .scroll_into_view(&post_selector(index.min(loaded)))
            .await;
        self.pause_between_posts().await;
        Ok(true)
    }

    /// Like with bounded retries; failures are logged, never propagated.
    async fn like_post(&self, index: usize) {
        for attempt in 1..=MAX_INTERACTION_RETRIES {
            match self.try_like(index).await {
                Ok(()) => return,
                Err(ActionError::NotFound(selector)) => {
                    warn!(post = index, attempt, selector = %selector, "like control not found");
                    if attempt < MAX_INTERACTION_RETRIES {
                        // A small scroll can reveal controls under the fold
                        let _ = self.actions.scroll_by(0, 100).await;
                        self.jitter(RETRY_DELAY_MIN_SECS, RETRY_DELAY_MAX_SECS).await;
                    } else {
                        error!(post = index, "failed to find like control, giving up");
                    }
                }
                Err(e) => {
                    warn!(post = index, attempt, error = %e, "like attempt failed");
                    if attempt < MAX_INTERACTION_RETRIES {
                        self.jitter(RETRY_DELAY_MIN_SECS, RETRY_DELAY_MAX_SECS).await;
                    } else {
                        error!(post = index, "failed to like post, giving up");
                    }
                }
            }
        }
    }

    async fn try_like(&self, index: usize) -> std::result::Result<(), ActionError> {
        let label = self
            .actions
            .attribute(&like_icon(index), "aria-label")
            .await?;
        match label.as_deref() {
            Some("Like") => {
                self.actions.click(&like_button(index)).await?;
                info!(post = index, "post liked");
            }
            Some("Unlike") => info!(post = index, "post already liked"),
            other => warn!(post = index, label = ?other, "unexpected like control label"),
        }
        Ok(())
    }

    /// Comment with bounded retries. A declined generation ends the attempt
    /// without retrying; only browser-side failures are retried.
    async fn comment_on_post(&self, index: usize) {
        for attempt in 1..=MAX_INTERACTION_RETRIES {
            match self.try_comment(index).await {
                Ok(CommentOutcome::Posted) => return,
                Ok(CommentOutcome::Declined) => return,
                Err(e) => {
                    warn!(post = index, attempt, error = %e, "comment attempt failed");
                    if attempt < MAX_INTERACTION_RETRIES {
                        self.jitter(RETRY_DELAY_MIN_SECS, RETRY_DELAY_MAX_SECS).await;
                    } else {
                        error!(post = index, "failed to comment on post, giving up");
                    }
                }
            }
        }
    }

    async fn try_comment(&self, index: usize) -> Result<CommentOutcome> {
        self.actions.click(&comment_button(index)).await?;
        self.actions.wait_for(COMMENT_BOX, COMMENT_UI_TIMEOUT).await?;

        let content = match self.actions.text(&post_text(index)).await {
            Ok(text) if !text.trim().is_empty() => text,
            _ => "No text content found in this post.".to_string(),
        };

        let prompt = format!(
            "Generate an engaging comment for this Instagram post. Post content: {content}"
        );
        info!(post = index, "generating comment");

        let payload = match self.driver.run(&comment_schema(), &prompt).await {
            CallResult::Success(payload) => payload,
            CallResult::Failure(message) => {
                warn!(post = index, %message, "comment generation failed");
                return Ok(CommentOutcome::Declined);
            }
        };

        let Some(comment) = extract_comment(&payload) else {
            warn!(post = index, "generated payload held no usable comment");
            return Ok(CommentOutcome::Declined);
        };

        info!(post = index, "typing comment");
        self.actions.type_text(COMMENT_TEXTAREA, &comment).await?;

        self.actions.wait_for(POST_SUBMIT, COMMENT_UI_TIMEOUT).await?;
        self.actions.click(POST_SUBMIT).await?;

        // Verify the comment actually landed before recording it
        let snippet: String = comment.chars().take(20).collect();
        self.actions
            .wait_for(&posted_comment(&snippet), COMMENT_UI_TIMEOUT)
            .await?;

        info!(post = index, "comment posted");
        self.ledger.record(&comment, unix_time_ms()).await?;
        Ok(CommentOutcome::Posted)
    }

    async fn pause_between_posts(&self) {
        info!("waiting before scrolling to the next post");
        self.jitter(
            self.settings.min_action_delay_secs,
            self.settings.max_action_delay_secs,
        )
        .await;
    }

    /// Sleep a uniform random duration in [lo, hi) seconds.
    async fn jitter(&self, lo: f64, hi: f64) {
        let secs = if hi > lo {
            rand::rng().random_range(lo..hi)
        } else {
            lo
        };
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Pull the first usable comment out of the generated payload: an array of
/// objects with a `comment` string. Double quotes are stripped so the typed
/// text never breaks out of the composer.
fn extract_comment(payload: &Value) -> Option<String> {
    let comment = payload.as_array()?.first()?.get("comment")?.as_str()?;
    let sanitized = comment.trim().replace('"', "");
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionFuture;
    use crate::cookies::StoredCookie;
    use gemini_client::Generator;
    use gemini_pool::KeyPool;
    use serde_json::json;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Far-future unix timestamp (year 2100), in seconds.
    const FUTURE_EXPIRY: f64 = 4_102_444_800.0;

    /// Generator returning a fixed payload, recording prompts it was given.
    struct FixedGenerator {
        payload: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedGenerator {
        fn new(payload: &'static str) -> Arc<Self> {
            Arc::new(Self {
                payload,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl Generator for FixedGenerator {
        fn id(&self) -> &str {
            "fixed"
        }

        fn generate<'a>(
            &'a self,
            _api_key: &'a str,
            _schema: &'a Value,
            prompt: &'a str,
        ) -> std::pin::Pin<
            Box<
                dyn std::future::Future<Output = gemini_client::Result<Option<String>>>
                    + Send
                    + 'a,
            >,
        > {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Box::pin(async move { Ok(Some(self.payload.to_string())) })
        }
    }

    /// Scripted browser: `present` drives wait_for, maps drive reads, and
    /// every mutation is recorded for assertions.
    #[derive(Default)]
    struct MockActions {
        present: HashSet<String>,
        texts: HashMap<String, String>,
        attributes: HashMap<String, String>,
        counts: HashMap<String, usize>,
        browser_cookies: Vec<StoredCookie>,
        clicks: Mutex<Vec<String>>,
        typed: Mutex<Vec<(String, String)>>,
        navigations: Mutex<Vec<String>>,
        added_cookies: Mutex<Vec<StoredCookie>>,
    }

    impl MockActions {
        fn attribute_key(selector: &str, name: &str) -> String {
            format!("{selector}|{name}")
        }

        fn clicked(&self, selector: &str) -> bool {
            self.clicks.lock().unwrap().iter().any(|s| s == selector)
        }

        fn typed_into(&self, selector: &str) -> Option<String> {
            self.typed
                .lock()
                .unwrap()
                .iter()
                .find(|(s, _)| s == selector)
                .map(|(_, text)| text.clone())
        }
    }

    impl Actions for MockActions {
        fn navigate<'a>(&'a self, url: &'a str) -> ActionFuture<'a, ()> {
            self.navigations.lock().unwrap().push(url.to_string());
            Box::pin(async { Ok(()) })
        }

        fn count<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, usize> {
            let count = self.counts.get(selector).copied().unwrap_or(0);
            Box::pin(async move { Ok(count) })
        }

        fn text<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, String> {
            let result = self
                .texts
                .get(selector)
                .cloned()
                .ok_or_else(|| ActionError::NotFound(selector.to_string()));
            Box::pin(async move { result })
        }

        fn attribute<'a>(
            &'a self,
            selector: &'a str,
            name: &'a str,
        ) -> ActionFuture<'a, Option<String>> {
            let key = Self::attribute_key(selector, name);
            let result = match self.attributes.get(&key) {
                Some(value) => Ok(Some(value.clone())),
                None => Err(ActionError::NotFound(selector.to_string())),
            };
            Box::pin(async move { result })
        }

        fn click<'a>(&'a self, selector: &'a str) -> ActionFuture<'a, ()> {
            self.clicks.lock().unwrap().push(selector.to_string());
            Box::pin(async { Ok(()) })
        }

        fn type_text<'a>(&'a self, selector: &'a str, text: &'a str) -> ActionFuture<'a, ()> {
            self.typed
                .lock()
                .unwrap()
                .push((selector.to_string(), text.to_string()));
            Box::pin(async { Ok(()) })
        }

        fn wait_for<'a>(&'a self, selector: &'a str, _timeout: Duration) -> ActionFuture<'a, ()> {
            let result = if self.present.contains(selector) {
                Ok(())
            } else {
                Err(ActionError::Timeout(selector.to_string()))
            };
            Box::pin(async move { result })
        }

        fn scroll_into_view<'a>(&'a self, _selector: &'a str) -> ActionFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }

        fn scroll_by(&self, _x: i64, _y: i64) -> ActionFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }

        fn screenshot<'a>(&'a self, _path: &'a Path) -> ActionFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }

        fn cookies(&self) -> ActionFuture<'_, Vec<StoredCookie>> {
            let cookies = self.browser_cookies.clone();
            Box::pin(async move { Ok(cookies) })
        }

        fn add_cookies<'a>(&'a self, cookies: &'a [StoredCookie]) -> ActionFuture<'a, ()> {
            self.added_cookies.lock().unwrap().extend_from_slice(cookies);
            Box::pin(async { Ok(()) })
        }
    }

    fn session_cookie() -> StoredCookie {
        StoredCookie {
            name: "sessionid".into(),
            value: "abc".into(),
            domain: Some(".instagram.com".into()),
            path: Some("/".into()),
            expires: Some(FUTURE_EXPIRY),
        }
    }

    fn settings(password: Option<&str>) -> SessionSettings {
        SessionSettings {
            start_url: "https://www.instagram.com".into(),
            username: "feedbot".into(),
            password: password.map(|p| Secret::new(p.to_string())),
            max_posts: 5,
            min_action_delay_secs: 0.0,
            max_action_delay_secs: 0.0,
        }
    }

    fn driver_with(generator: Arc<dyn Generator>) -> RetryDriver {
        RetryDriver::new(KeyPool::new(vec!["test-key".into()]).unwrap(), generator)
    }

    struct Harness {
        actions: Arc<MockActions>,
        session: FeedSession,
        cookie_store_path: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    async fn harness(
        mock: MockActions,
        generator: Arc<dyn Generator>,
        settings: SessionSettings,
        seed_cookies: bool,
        ledger_limit: usize,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cookie_path = dir.path().join("cookies/session.json");
        if seed_cookies {
            CookieStore::new(&cookie_path)
                .save(&[session_cookie()])
                .await
                .unwrap();
        }

        let actions = Arc::new(mock);
        let session = FeedSession::new(
            actions.clone(),
            driver_with(generator),
            CookieStore::new(&cookie_path),
            ActionLedger::new(dir.path().join("data/actions.json"), ledger_limit),
            settings,
        );
        Harness {
            actions,
            session,
            cookie_store_path: cookie_path,
            _dir: dir,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cookie_login_skips_credential_form() {
        let mut mock = MockActions::default();
        mock.present.insert(INBOX_LINK.into());
        mock.present.insert(FEED_POST.into());
        // Feed loads zero posts so the walk ends immediately

        let h = harness(
            mock,
            FixedGenerator::new("[]"),
            settings(Some("pw")),
            true,
            17,
        )
        .await;

        h.session.run().await.unwrap();

        assert!(h.actions.typed.lock().unwrap().is_empty(), "no form fill");
        assert_eq!(h.actions.added_cookies.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn credential_login_fills_form_and_saves_cookies() {
        let mut mock = MockActions::default();
        mock.present.insert(LOGIN_USERNAME.into());
        mock.present.insert(INBOX_LINK.into());
        mock.present.insert(FEED_POST.into());
        mock.browser_cookies = vec![session_cookie()];

        let h = harness(
            mock,
            FixedGenerator::new("[]"),
            settings(Some("hunter2")),
            false,
            17,
        )
        .await;

        h.session.run().await.unwrap();

        assert_eq!(
            h.actions.typed_into(LOGIN_USERNAME).as_deref(),
            Some("feedbot")
        );
        assert_eq!(
            h.actions.typed_into(LOGIN_PASSWORD).as_deref(),
            Some("hunter2")
        );
        assert!(h.actions.clicked(LOGIN_SUBMIT));

        // Captured cookies must be persisted for the next run
        let store = CookieStore::new(&h.cookie_store_path);
        assert!(store.has_valid_session(0).await);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_password_fails_login() {
        let mut mock = MockActions::default();
        mock.present.insert(LOGIN_USERNAME.into());

        let h = harness(mock, FixedGenerator::new("[]"), settings(None), false, 17).await;

        let err = h.session.run().await.unwrap_err();
        assert!(matches!(err, Error::LoginFailed(_)), "got: {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn verification_prompt_aborts_the_session() {
        let mut mock = MockActions::default();
        mock.present.insert(LOGIN_USERNAME.into());
        mock.present.insert(VERIFICATION_CODE.into());

        let h = harness(
            mock,
            FixedGenerator::new("[]"),
            settings(Some("pw")),
            false,
            17,
        )
        .await;

        let err = h.session.run().await.unwrap_err();
        assert!(matches!(err, Error::TwoFactorRequired), "got: {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn full_post_flow_likes_comments_and_records() {
        let mut mock = MockActions::default();
        mock.present.insert(INBOX_LINK.into());
        mock.present.insert(FEED_POST.into());
        mock.present.insert(COMMENT_BOX.into());
        mock.present.insert(POST_SUBMIT.into());
        mock.present.insert(posted_comment("nice shot"));
        mock.counts.insert(FEED_POST.into(), 1);
        mock.attributes.insert(
            MockActions::attribute_key(&like_icon(1), "aria-label"),
            "Like".into(),
        );
        mock.texts
            .insert(post_text(1), "golden hour at the pier".into());

        let generator = FixedGenerator::new(r#"[{"comment":"nice shot"}]"#);
        let h = harness(mock, generator.clone(), settings(Some("pw")), true, 1).await;

        h.session.run().await.unwrap();

        assert!(h.actions.clicked(&like_button(1)));
        assert!(h.actions.clicked(&comment_button(1)));
        assert!(h.actions.clicked(POST_SUBMIT));
        assert_eq!(
            h.actions.typed_into(COMMENT_TEXTAREA).as_deref(),
            Some("nice shot")
        );

        // The prompt must carry the post's own text
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("golden hour at the pier"));
        drop(prompts);

        // Ledger limit of 1 is now spent
        let ledger = ActionLedger::new(h._dir.path().join("data/actions.json"), 1);
        assert!(!ledger.can_post().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn already_liked_post_is_not_clicked_again() {
        let mut mock = MockActions::default();
        mock.present.insert(INBOX_LINK.into());
        mock.present.insert(FEED_POST.into());
        mock.counts.insert(FEED_POST.into(), 1);
        mock.attributes.insert(
            MockActions::attribute_key(&like_icon(1), "aria-label"),
            "Unlike".into(),
        );

        let h = harness(
            mock,
            FixedGenerator::new("[]"),
            settings(Some("pw")),
            true,
            17,
        )
        .await;

        h.session.run().await.unwrap();

        assert!(!h.actions.clicked(&like_button(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn spent_ledger_skips_commenting_but_still_likes() {
        let mut mock = MockActions::default();
        mock.present.insert(INBOX_LINK.into());
        mock.present.insert(FEED_POST.into());
        mock.counts.insert(FEED_POST.into(), 1);
        mock.attributes.insert(
            MockActions::attribute_key(&like_icon(1), "aria-label"),
            "Like".into(),
        );

        let h = harness(
            mock,
            FixedGenerator::new(r#"[{"comment":"should not appear"}]"#),
            settings(Some("pw")),
            true,
            1,
        )
        .await;

        // Spend the single ledger slot with a fresh record
        ActionLedger::new(h._dir.path().join("data/actions.json"), 1)
            .record("earlier comment", unix_time_ms())
            .await
            .unwrap();

        h.session.run().await.unwrap();

        assert!(h.actions.clicked(&like_button(1)));
        assert!(!h.actions.clicked(&comment_button(1)));
        assert!(h.actions.typed_into(COMMENT_TEXTAREA).is_none());
    }

    #[test]
    fn extract_comment_takes_first_entry_and_strips_quotes() {
        let payload = json!([
            {"comment": " \"what a view\" "},
            {"comment": "second"}
        ]);
        assert_eq!(extract_comment(&payload).as_deref(), Some("what a view"));
    }

    #[test]
    fn extract_comment_rejects_unusable_payloads() {
        assert!(extract_comment(&json!([])).is_none());
        assert!(extract_comment(&json!({"comment": "not an array"})).is_none());
        assert!(extract_comment(&json!([{"caption": "wrong field"}])).is_none());
        assert!(extract_comment(&json!([{"comment": "  \"\"  "}])).is_none());
        assert!(extract_comment(&json!([{"comment": 7}])).is_none());
    }
}
