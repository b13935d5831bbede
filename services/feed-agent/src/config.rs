//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets never live in the TOML: the login password comes from the
//! FEED_PASSWORD env var or a password_file, and the Gemini keys come from
//! GEMINI_API_KEY_1..=key_slots. Unset key slots fall back to the
//! placeholder value `API_KEY_{n}`, which the pool skips at runtime; the
//! pool always has `key_slots` entries regardless of how many are real.

use std::path::{Path, PathBuf};

use common::Secret;
use serde::Deserialize;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub login: LoginConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Assembled from GEMINI_API_KEY_{n} env vars at load time.
    #[serde(skip)]
    pub api_keys: Vec<String>,
}

/// Browser driver settings
#[derive(Debug, Deserialize)]
pub struct BrowserConfig {
    /// Address of a running WebDriver endpoint (chromedriver/geckodriver)
    pub webdriver_url: String,
    #[serde(default = "default_start_url")]
    pub start_url: String,
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginConfig {
    pub username: String,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    /// Path to a file containing the password (alternative to FEED_PASSWORD)
    #[serde(default)]
    pub password_file: Option<PathBuf>,
}

/// Generation settings
#[derive(Debug, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Number of GEMINI_API_KEY_{n} env slots to read
    #[serde(default = "default_key_slots")]
    pub key_slots: usize,
}

/// Feed session settings
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
    #[serde(default = "default_cookies_path")]
    pub cookies_path: PathBuf,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Comments allowed per rolling day
    #[serde(default = "default_comment_limit")]
    pub comment_limit: usize,
    #[serde(default = "default_min_delay")]
    pub min_action_delay_secs: f64,
    #[serde(default = "default_max_delay")]
    pub max_action_delay_secs: f64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            key_slots: default_key_slots(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_posts: default_max_posts(),
            cookies_path: default_cookies_path(),
            ledger_path: default_ledger_path(),
            comment_limit: default_comment_limit(),
            min_action_delay_secs: default_min_delay(),
            max_action_delay_secs: default_max_delay(),
        }
    }
}

fn default_start_url() -> String {
    "https://www.instagram.com".into()
}

fn default_model() -> String {
    gemini_client::DEFAULT_MODEL.into()
}

fn default_key_slots() -> usize {
    5
}

fn default_max_posts() -> usize {
    50
}

fn default_cookies_path() -> PathBuf {
    PathBuf::from("./cookies/session.json")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("./data/actions.json")
}

fn default_comment_limit() -> usize {
    17
}

fn default_min_delay() -> f64 {
    3.0
}

fn default_max_delay() -> f64 {
    7.0
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    ///
    /// Password resolution order: FEED_PASSWORD env var, then
    /// password_file. Username may be overridden with FEED_USERNAME.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.browser.webdriver_url.starts_with("http://")
            && !config.browser.webdriver_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "webdriver_url must start with http:// or https://, got: {}",
                config.browser.webdriver_url
            )));
        }

        if !config.browser.start_url.starts_with("http://")
            && !config.browser.start_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "start_url must start with http:// or https://, got: {}",
                config.browser.start_url
            )));
        }

        if config.gemini.key_slots == 0 {
            return Err(common::Error::Config(
                "key_slots must be greater than 0".into(),
            ));
        }

        if config.session.max_posts == 0 {
            return Err(common::Error::Config(
                "max_posts must be greater than 0".into(),
            ));
        }

        if config.session.comment_limit == 0 {
            return Err(common::Error::Config(
                "comment_limit must be greater than 0".into(),
            ));
        }

        if config.session.min_action_delay_secs > config.session.max_action_delay_secs {
            return Err(common::Error::Config(
                "min_action_delay_secs must not exceed max_action_delay_secs".into(),
            ));
        }

        // Resolve username override and password: env var takes precedence
        if let Ok(username) = std::env::var("FEED_USERNAME") {
            config.login.username = username;
        }

        if let Ok(password) = std::env::var("FEED_PASSWORD") {
            config.login.password = Some(Secret::new(password));
        } else if let Some(ref password_file) = config.login.password_file {
            let password = std::fs::read_to_string(password_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read password_file {}: {e}",
                    password_file.display()
                ))
            })?;
            let password = password.trim().to_owned();
            if !password.is_empty() {
                config.login.password = Some(Secret::new(password));
            }
        }

        // Assemble the key pool: one slot per GEMINI_API_KEY_{n}, unset
        // slots carrying the placeholder the pool knows to skip.
        config.api_keys = (1..=config.gemini.key_slots)
            .map(|n| {
                std::env::var(format!("GEMINI_API_KEY_{n}"))
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .unwrap_or_else(|| format!("API_KEY_{n}"))
            })
            .collect();

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("feed-agent.toml")
    }
}
