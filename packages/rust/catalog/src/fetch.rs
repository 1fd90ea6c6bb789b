//! Catalog page download.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use coursegraph_shared::{CatalogConfig, CourseGraphError, Result};

/// User-Agent string for catalog requests.
const USER_AGENT: &str = concat!("CourseGraph/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Options for fetching the catalog page.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for the request in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl From<&CatalogConfig> for FetchOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Fetch the catalog page. Any network error or non-success status is fatal.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_catalog(url: &Url, opts: &FetchOptions) -> Result<String> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| CourseGraphError::Network(format!("failed to build HTTP client: {e}")))?;

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| CourseGraphError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CourseGraphError::Network(format!("{url}: HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| CourseGraphError::Network(format!("{url}: body read failed: {e}")))?;

    info!(bytes = body.len(), "fetched catalog page");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetches_page_body() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/courses.html"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string("<html>catalog</html>"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/courses.html", server.uri())).unwrap();
        let body = fetch_catalog(&url, &FetchOptions::default()).await.unwrap();
        assert_eq!(body, "<html>catalog</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_fatal() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/missing.html"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.html", server.uri())).unwrap();
        let err = fetch_catalog(&url, &FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, CourseGraphError::Network(_)));
        assert!(err.to_string().contains("404"));
    }
}
