//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the shared HTTP client with the configured identity
//! - Single-attempt page fetches with a per-request timeout
//! - Profile page fetch + field extraction (the detail fetcher)
//!
//! There is no retry. A transport error, a timeout or a non-success status
//! is returned to the caller, which decides whether it is fatal.

use crate::config::HttpConfig;
use crate::crawler::types::{DetailRecord, ProfileLink};
use crate::extract::FieldExtractors;
use crate::{ConfigError, SweepError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP identity and timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(SweepError)` - Invalid header value or client build failure
///
/// # Example
///
/// ```no_run
/// use roster_sweep::config::HttpConfig;
/// use roster_sweep::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, SweepError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    if let Some(language) = &config.accept_language {
        let value = HeaderValue::from_str(language).map_err(|e| {
            ConfigError::Validation(format!("Invalid accept-language '{}': {}", language, e))
        })?;
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a page body in a single attempt
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout` - Bound on the whole request, body included
///
/// # Returns
///
/// * `Ok(String)` - The response body of a 2xx response
/// * `Err(SweepError::Timeout)` - The request did not finish in time
/// * `Err(SweepError::Status)` - The server answered with a non-success status
/// * `Err(SweepError::Http)` - Any other transport failure
pub async fn fetch_page(client: &Client, url: &str, timeout: Duration) -> Result<String, SweepError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SweepError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify(url, e))
}

fn classify(url: &str, error: reqwest::Error) -> SweepError {
    if error.is_timeout() {
        SweepError::Timeout {
            url: url.to_string(),
        }
    } else {
        SweepError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Fetches one profile page and extracts its record
///
/// Fields the page yields nothing for fall back to the link's card seed.
/// An exhausted chain is not an error; only the fetch can fail.
pub async fn fetch_detail(
    client: &Client,
    link: &ProfileLink,
    extractors: &FieldExtractors,
    timeout: Duration,
) -> Result<DetailRecord, SweepError> {
    let body = fetch_page(client, &link.url, timeout).await?;

    let fields = {
        let document = Html::parse_document(&body);
        extractors.extract_page(&document, &body)
    };

    Ok(DetailRecord::from_fields(
        link.source_page,
        link.url.as_str(),
        fields.or_from(&link.seed),
    ))
}
