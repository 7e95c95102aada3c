// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// A fetched response body with its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

/// Minimal GET transport used by the crawlers.
///
/// Implemented for `reqwest::Client`; tests substitute simulated endpoints.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request. Transport-level failures are errors, any HTTP
    /// status is a successful return.
    async fn get(&self, url: &str) -> Result<FetchedPage>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        let response = reqwest::Client::get(self, url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage { status, body })
    }
}

/// Fetch a page body, treating any non-200 status as an error.
pub async fn fetch_text(transport: &dyn Transport, url: &str) -> Result<String> {
    let page = transport.get(url).await?;
    if !page.is_ok() {
        return Err(AppError::crawl(url, format!("HTTP {}", page.status)));
    }
    Ok(page.body)
}

/// Fetch a page and parse it as HTML.
pub async fn fetch_page_async(transport: &dyn Transport, url: &str) -> Result<Html> {
    let text = fetch_text(transport, url).await?;
    Ok(Html::parse_document(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    struct StaticTransport(u16);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn get(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: self.0,
                body: "<p>ok</p>".to_string(),
            })
        }
    }

    #[test]
    fn test_create_client_from_defaults() {
        assert!(create_async_client(&Config::default().crawler).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_non_200() {
        let err = fetch_text(&StaticTransport(404), "https://example.edu/x")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_fetch_text_returns_body() {
        let body = fetch_text(&StaticTransport(200), "https://example.edu/x")
            .await
            .unwrap();
        assert_eq!(body, "<p>ok</p>");
    }
}
