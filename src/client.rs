use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{
    decode,
    ollama::Ollama,
    openai::OpenAi,
    request::RequestDescriptor,
    retry::RetryPolicy,
    stream::{EventStream, Framing, StreamEvent},
    transport::HttpTransport,
    ClientOptions, Result, SharpAiError,
};

/// Default base address of a locally running SharpAI server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

#[derive(Clone)]
/// HTTP client for a SharpAI inference server.
///
/// Cloning is cheap; clones share one connection pool.
pub struct SharpAiClient {
    transport: HttpTransport,
    retry: RetryPolicy,
    options: ClientOptions,
}

impl fmt::Debug for SharpAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharpAiClient")
            .field("endpoint", &self.transport.base_url())
            .field("options", &self.options)
            .finish()
    }
}

impl Default for SharpAiClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl SharpAiClient {
    /// Creates a client for the server at `endpoint` with default options.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sharpai_sdk::SharpAiClient;
    ///
    /// let client = SharpAiClient::new("http://localhost:8000");
    /// ```
    pub fn new(endpoint: impl Into<String>) -> Self {
        let options = ClientOptions::default();
        Self {
            transport: HttpTransport::new(
                reqwest::Client::new(),
                endpoint.into(),
                Duration::from_millis(options.timeout_ms),
            ),
            retry: RetryPolicy::from_options(&options),
            options,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SHARPAI_ENDPOINT`: base address, required
    /// - `SHARPAI_TIMEOUT_MS`: per-attempt timeout, optional
    /// - `SHARPAI_MAX_RETRIES`: retry budget, optional
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sharpai_sdk::SharpAiClient;
    ///
    /// let client = SharpAiClient::from_env().expect("missing SHARPAI_ENDPOINT");
    /// ```
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("SHARPAI_ENDPOINT").map_err(|_| {
            SharpAiError::Validation("missing SHARPAI_ENDPOINT environment variable".to_owned())
        })?;
        if endpoint.trim().is_empty() {
            return Err(SharpAiError::Validation(
                "SHARPAI_ENDPOINT is set but empty".to_owned(),
            ));
        }

        let mut options = ClientOptions::default();
        if let Some(timeout_ms) = env_number::<u64>("SHARPAI_TIMEOUT_MS")? {
            options.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = env_number::<usize>("SHARPAI_MAX_RETRIES")? {
            options.max_retries = max_retries;
        }
        Ok(Self::new(endpoint).with_options(options))
    }

    /// Applies client options such as timeout and retry behavior.
    ///
    /// Every option is replaced; nothing carries over from the previous set.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.transport = self
            .transport
            .with_timeout(Duration::from_millis(opts.timeout_ms));
        self.retry = RetryPolicy::from_options(&opts);
        self.options = opts;
        self
    }

    /// Uses a preconfigured `reqwest::Client`, e.g. one with a proxy.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.transport = self.transport.with_http(http);
        self
    }

    pub fn endpoint(&self) -> &str {
        self.transport.base_url()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Ollama-style operations (`/api/*`).
    pub fn ollama(&self) -> Ollama<'_> {
        Ollama::new(self)
    }

    /// OpenAI-compatible operations (`/v1/*`).
    pub fn openai(&self) -> OpenAi<'_> {
        OpenAi::new(self)
    }

    /// Checks that the server answers `HEAD /` with a non-error status.
    ///
    /// Failures of any kind, including exhausted retries, yield `false`.
    pub async fn validate_connectivity(&self) -> bool {
        let request = RequestDescriptor::head("/");
        let label = request.label();
        let transport = &self.transport;
        let request = &request;

        let outcome = self
            .retry
            .run(&label, move || async move {
                let response = transport.send(request).await?;
                let status = response.status().as_u16();
                if status >= 400 {
                    return Err(decode::status_error(status, ""));
                }
                Ok(())
            })
            .await;

        #[cfg(feature = "tracing")]
        {
            if let Err(err) = &outcome {
                tracing::debug!(endpoint = self.endpoint(), "connectivity check failed: {err}");
            }
        }

        outcome.is_ok()
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T> {
        let label = request.label();
        let transport = &self.transport;
        let request = &request;

        self.retry
            .run(&label, move || async move {
                let response = transport.send(request).await?;
                let status = response.status().as_u16();
                let body = response.text().await?;
                decode::decode_json(status, &body)
            })
            .await
    }

    pub(crate) async fn send_empty(&self, request: RequestDescriptor) -> Result<()> {
        let label = request.label();
        let transport = &self.transport;
        let request = &request;

        self.retry
            .run(&label, move || async move {
                let response = transport.send(request).await?;
                let status = response.status().as_u16();
                let body = response.text().await?;
                decode::decode_empty(status, &body)
            })
            .await
    }

    /// Retries until response headers with a success status arrive, then
    /// hands the live body to the stream decoder. Nothing is retried after
    /// that point.
    pub(crate) async fn send_stream<T: StreamEvent>(
        &self,
        request: RequestDescriptor,
    ) -> Result<EventStream<T>> {
        let label = request.label();
        let framing = request.framing().unwrap_or(Framing::Ndjson);
        let transport = &self.transport;
        let request = &request;

        let response = self
            .retry
            .run(&label, move || async move {
                let response = transport.send(request).await?;
                let status = response.status().as_u16();
                if !(200..300).contains(&status) {
                    let body = read_error_body(response).await;
                    return Err(decode::status_error(status, &body));
                }
                Ok(response)
            })
            .await?;

        Ok(EventStream::from_response(response, framing))
    }
}

/// Reads the body of a failed response for its message.
///
/// A body that cannot be read must not mask the status, so the error is
/// logged and the status alone decides the mapping.
async fn read_error_body(response: reqwest::Response) -> String {
    #[cfg(feature = "tracing")]
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => body,
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(status, "error response body unreadable: {_err}");
            String::new()
        }
    }
}

fn env_number<N: std::str::FromStr>(name: &str) -> Result<Option<N>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<N>()
            .map(Some)
            .map_err(|_| SharpAiError::Validation(format!("{name} must be a non-negative integer"))),
        _ => Ok(None),
    }
}
