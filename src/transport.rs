use std::time::Duration;

use crate::{request::RequestDescriptor, Result};

/// Performs single HTTP exchanges against the configured base address.
#[derive(Clone, Debug)]
pub(crate) struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub(crate) fn new(http: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one attempt and returns once response headers arrive.
    ///
    /// The timeout also bounds reading the body, streamed or not.
    pub(crate) async fn send(&self, request: &RequestDescriptor) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .request(request.method().clone(), self.url(request.path()))
            .headers(request.headers().clone())
            .timeout(self.timeout);

        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        Ok(builder.send().await?)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Joins the base address and an operation path with exactly one slash.
///
/// Example: `("http://localhost:8000/", "api/tags")` → `"http://localhost:8000/api/tags"`
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
