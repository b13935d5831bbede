//! feed-agent
//!
//! Single-binary bot that:
//! 1. Connects to a local WebDriver daemon (chromedriver)
//! 2. Logs into the feed site, preferring saved cookies over credentials
//! 3. Walks the feed, liking posts and posting AI-generated comments
//! 4. Rotates Gemini API keys per call, rate-limited by a rolling ledger

mod actions;
mod config;
mod cookies;
mod error;
mod ledger;
mod schema;
mod session;
mod webdriver;

use std::sync::Arc;

use anyhow::{Context, Result};
use gemini_client::GeminiClient;
use gemini_pool::{KeyPool, RetryDriver};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::cookies::CookieStore;
use crate::ledger::ActionLedger;
use crate::session::{FeedSession, SessionSettings};
use crate::webdriver::WebDriverActions;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting feed-agent");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let pool = KeyPool::new(config.api_keys.clone()).context("building the API key pool")?;
    let mut real_keys = 0;
    for i in 0..pool.len() {
        if !pool.is_placeholder(i) {
            real_keys += 1;
            tracing::debug!(slot = i + 1, key = %common::masked(pool.key(i)), "loaded API key");
        }
    }
    if real_keys == 0 {
        warn!("no GEMINI_API_KEY_{{n}} env vars set; every generation call will fail over to exhaustion");
    }

    info!(
        webdriver_url = %config.browser.webdriver_url,
        model = %config.gemini.model,
        key_slots = pool.len(),
        real_keys,
        max_posts = config.session.max_posts,
        "configuration loaded"
    );

    let http = reqwest::Client::new();
    let generator = Arc::new(GeminiClient::new(http.clone(), config.gemini.model.clone()));
    let driver = RetryDriver::new(pool, generator);

    let browser = Arc::new(
        WebDriverActions::connect(http, &config.browser.webdriver_url)
            .await
            .context("connecting to the WebDriver endpoint")?,
    );

    let session = FeedSession::new(
        browser.clone(),
        driver,
        CookieStore::new(config.session.cookies_path.clone()),
        ActionLedger::new(
            config.session.ledger_path.clone(),
            config.session.comment_limit,
        ),
        SessionSettings {
            start_url: config.browser.start_url.clone(),
            username: config.login.username.clone(),
            password: config.login.password.clone(),
            max_posts: config.session.max_posts,
            min_action_delay_secs: config.session.min_action_delay_secs,
            max_action_delay_secs: config.session.max_action_delay_secs,
        },
    );

    tokio::select! {
        result = session.run() => match result {
            Ok(()) => info!("session finished"),
            Err(e) => error!(error = %e, "session failed"),
        },
        _ = shutdown_signal() => info!("interrupted, shutting down"),
    }

    if let Err(e) = browser.close().await {
        warn!(error = %e, "failed to close WebDriver session");
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
