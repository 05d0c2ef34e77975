//! Chromium-backed listing driver
//!
//! Launches one browser per interactive site through the DevTools protocol
//! and exposes it as a [`ListingDriver`]. The CDP event handler runs on its
//! own task for the browser's lifetime.

use crate::config::InteractiveDiscovery;
use crate::crawler::interactive::ListingDriver;
use crate::{ConfigError, SweepError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const WINDOW_SIZE: (u32, u32) = (1400, 1000);

const IS_CONNECTED_FN: &str = "function() { return this.isConnected; }";

/// A launched Chromium instance with one open page
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
}

impl ChromiumDriver {
    /// Launches Chromium for an interactive site
    ///
    /// # Arguments
    ///
    /// * `settings` - Headless mode and executable path
    /// * `user_agent` - User-Agent the browser should present
    /// * `request_timeout` - Bound on each DevTools command
    pub async fn launch(
        settings: &InteractiveDiscovery,
        user_agent: &str,
        request_timeout: Duration,
    ) -> Result<Self, SweepError> {
        let mut builder = BrowserConfig::builder()
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1)
            .request_timeout(request_timeout)
            .arg(format!("--user-agent={}", user_agent))
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage");
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.browser_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(SweepError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "Browser handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(e.into());
            }
        };

        if let Err(e) = check_selectors(&page, settings).await {
            let _ = browser.close().await;
            handler.abort();
            return Err(e);
        }

        tracing::debug!(headless = settings.headless, "Browser launched");
        Ok(Self {
            browser,
            page,
            handler: Some(handler),
        })
    }
}

/// Parses every configured selector with the browser's CSS engine
///
/// Runs against the blank page, so a malformed selector is reported as a
/// configuration error before the entry page is requested.
async fn check_selectors(page: &Page, settings: &InteractiveDiscovery) -> Result<(), SweepError> {
    for selector in settings.selectors() {
        let script = selector_check_script(selector)?;
        let message: String = page
            .evaluate(script.as_str())
            .await?
            .into_value()
            .map_err(|e| SweepError::Browser(e.to_string()))?;

        if !message.is_empty() {
            return Err(ConfigError::InvalidSelector {
                selector: selector.to_string(),
                message,
            }
            .into());
        }
    }
    Ok(())
}

/// Expression yielding "" for a valid selector, otherwise the parse error
fn selector_check_script(selector: &str) -> Result<String, SweepError> {
    let literal =
        serde_json::to_string(selector).map_err(|e| SweepError::Browser(e.to_string()))?;
    Ok(format!(
        "(() => {{ try {{ document.querySelector({}); return ''; }} \
         catch (e) {{ return String(e.message || e) || 'invalid selector'; }} }})()",
        literal
    ))
}

#[async_trait]
impl ListingDriver for ChromiumDriver {
    type Handle = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), SweepError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn first_element(&mut self, selector: &str) -> Result<Option<Element>, SweepError> {
        let mut elements = self.page.find_elements(selector).await?;
        if elements.is_empty() {
            return Ok(None);
        }
        Ok(Some(elements.swap_remove(0)))
    }

    async fn extract_links(&mut self, selector: &str) -> Result<Vec<String>, SweepError> {
        let mut hrefs = Vec::new();
        for element in self.page.find_elements(selector).await? {
            if let Some(href) = element.attribute("href").await? {
                let href = href.trim();
                if !href.is_empty() {
                    hrefs.push(href.to_string());
                }
            }
        }
        Ok(hrefs)
    }

    async fn click_next(&mut self, selector: &str) -> Result<bool, SweepError> {
        let Some(button) = self.first_element(selector).await? else {
            return Ok(false);
        };
        button.scroll_into_view().await?;
        button.click().await?;
        Ok(true)
    }

    async fn is_stale(&mut self, handle: &Element) -> Result<bool, SweepError> {
        // A handle whose document is gone can no longer be called into.
        match handle.call_js_fn(IS_CONNECTED_FN, false).await {
            Ok(returns) => {
                let connected = returns
                    .result
                    .value
                    .as_ref()
                    .and_then(|value| value.as_bool())
                    .unwrap_or(false);
                Ok(!connected)
            }
            Err(_) => Ok(true),
        }
    }

    async fn close(&mut self) -> Result<(), SweepError> {
        let result = self.browser.close().await;
        let _ = self.browser.wait().await;
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        result?;
        tracing::debug!("Browser closed");
        Ok(())
    }
}
