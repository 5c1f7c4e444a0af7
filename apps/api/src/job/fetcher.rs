//! Page fetching for job posting URLs.
//!
//! `BrowserFetcher` renders the page in headless Chrome so postings built client-side
//! come back with their content. `HttpFetcher` is a plain GET for environments without
//! a browser.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::FetchMode;
use crate::errors::AppError;

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const SETTLE_MAX_POLLS: usize = 20;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page markup for `url`.
    async fn fetch(&self, url: &str) -> Result<String, AppError>;
}

pub fn fetcher_for(mode: FetchMode) -> anyhow::Result<Arc<dyn PageFetcher>> {
    Ok(match mode {
        FetchMode::Browser => Arc::new(BrowserFetcher),
        FetchMode::Http => Arc::new(HttpFetcher::new()?),
    })
}

/// Headless Chrome fetcher. A browser is launched per fetch and closed when it is dropped.
pub struct BrowserFetcher;

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let target = url.to_string();
        // headless_chrome is synchronous; keep it off the async workers.
        let rendered = tokio::task::spawn_blocking(move || render_page(&target))
            .await
            .map_err(|e| anyhow!("browser task failed: {e}"))
            .and_then(|result| result);

        match rendered {
            Ok(html) => {
                info!("Fetched HTML from URL: {url}");
                Ok(html)
            }
            Err(e) => {
                error!("Error fetching URL: {e:#}");
                Err(AppError::Processing(format!("Failed to fetch URL: {e:#}")))
            }
        }
    }
}

fn render_page(url: &str) -> anyhow::Result<String> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .build()
        .map_err(|e| anyhow!("invalid browser launch options: {e}"))?;
    let browser = Browser::new(options).context("failed to launch headless browser")?;
    let tab = browser.new_tab().context("failed to open browser tab")?;

    tab.navigate_to(url)
        .with_context(|| format!("failed to navigate to {url}"))?
        .wait_until_navigated()
        .with_context(|| format!("navigation to {url} did not complete"))?;

    wait_for_settled_content(&tab)
}

/// Polls until the document reports `complete` and its markup stops changing between two
/// polls, so client-side rendering and late XHR content have landed. Gives up after
/// `SETTLE_MAX_POLLS` and returns whatever is rendered.
fn wait_for_settled_content(tab: &Tab) -> anyhow::Result<String> {
    let mut previous: Option<String> = None;

    for _ in 0..SETTLE_MAX_POLLS {
        let ready_state = tab
            .evaluate("document.readyState", false)
            .context("failed to read document state")?
            .value;
        let content = tab.get_content().context("failed to read rendered page")?;

        if is_settled(
            ready_state.as_ref().and_then(|v| v.as_str()),
            previous.as_deref(),
            &content,
        ) {
            return Ok(content);
        }

        previous = Some(content);
        std::thread::sleep(SETTLE_POLL_INTERVAL);
    }

    warn!("Page did not settle after {SETTLE_MAX_POLLS} polls; using current content");
    tab.get_content().context("failed to read rendered page")
}

fn is_settled(ready_state: Option<&str>, previous: Option<&str>, current: &str) -> bool {
    ready_state == Some("complete") && previous == Some(current)
}

/// Plain HTTP fetcher. No JavaScript is executed.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch job post")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        match self.get(url).await {
            Ok(html) => {
                info!("Fetched HTML from URL: {url}");
                Ok(html)
            }
            Err(e) => {
                error!("Error fetching URL: {e:#}");
                Err(AppError::Processing(format!("Failed to fetch URL: {e:#}")))
            }
        }
    }
}
