//! HTTP plumbing shared by the provider clients.
//!
//! Every provider talks plain HTTP/JSON but with its own headers and
//! quirks (NetEase and QQ answer JSON with a `text/plain` content type, so
//! bodies are always read as text and parsed with serde_json).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde::de::DeserializeOwned;

use super::domain::SearchError;

/// Desktop browser user agent; the catalogs reject unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// Build a client that sends the given origin/referer with every request.
pub fn build_client(
    origin: Option<&str>,
    referer: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, SearchError> {
    let mut headers = HeaderMap::new();
    if let Some(origin) = origin {
        let value = HeaderValue::from_str(origin)
            .map_err(|e| SearchError::Network(format!("invalid origin header: {}", e)))?;
        headers.insert(ORIGIN, value);
    }
    if let Some(referer) = referer {
        let value = HeaderValue::from_str(referer)
            .map_err(|e| SearchError::Network(format!("invalid referer header: {}", e)))?;
        headers.insert(REFERER, value);
    }

    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| SearchError::Network(e.to_string()))
}

/// Map a non-success status to an error, passing successful responses through.
pub fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Http {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

/// Read a response body as text and parse it as JSON.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SearchError> {
    let response = check_status(response)?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(SearchError::from)
}

/// GET a URL and parse the JSON body.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, SearchError> {
    let response = client.get(url).send().await?;
    read_json(response).await
}

/// Check whether an image URL answers 200 within `timeout`.
///
/// Any failure counts as unreachable.
pub async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    match client.get(url).timeout(timeout).send().await {
        Ok(response) => {
            let ok = response.status() == reqwest::StatusCode::OK;
            tracing::trace!(url, status = %response.status(), "cover probe");
            ok
        }
        Err(e) => {
            tracing::trace!(url, error = %e, "cover probe failed");
            false
        }
    }
}

/// Probe URLs concurrently and return the first reachable one in input order.
pub async fn first_reachable(
    client: &reqwest::Client,
    urls: &[String],
    timeout: Duration,
) -> Option<String> {
    let checks = urls.iter().map(|url| probe(client, url, timeout));
    let results = futures::future::join_all(checks).await;
    urls.iter()
        .zip(results)
        .find(|(_, ok)| *ok)
        .map(|(url, _)| url.clone())
}
