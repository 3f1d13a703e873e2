use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const TIMEOUT: Duration = Duration::from_secs(15);

/// Shared HTTP client for document fetches. The portals serve plain pages but
/// refuse obvious bot identities, so we carry a browser User-Agent.
pub fn build_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// GET a document body. Non-2xx and empty bodies are errors here; callers
/// treat any error as "zero listings from this source".
pub async fn fetch_document(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("{} returned {}", url, status));
    }
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Err(anyhow!("{} returned an empty body", url));
    }
    Ok(body)
}
