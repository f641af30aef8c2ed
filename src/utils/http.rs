// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Read an error body for logging, capped to keep log lines short.
pub async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    super::truncate_chars(text.trim(), 300)
}
