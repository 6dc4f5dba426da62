use bytes::Bytes;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{stream::Framing, Result, SharpAiError};

/// One logical call, shared unchanged by every retry attempt.
#[derive(Clone, Debug)]
pub(crate) struct RequestDescriptor {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    framing: Option<Framing>,
}

impl RequestDescriptor {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            framing: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// Serializes `body` once; retries resend the same bytes.
    pub(crate) fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let encoded = serde_json::to_vec(body)
            .map_err(|err| SharpAiError::Validation(format!("request body not encodable: {err}")))?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }

    /// Marks the call as streaming with the given body framing.
    pub(crate) fn streaming(mut self, framing: Framing) -> Self {
        self.headers
            .insert(header::ACCEPT, HeaderValue::from_static(framing.media_type()));
        self.framing = Some(framing);
        self
    }

    pub(crate) fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// Short label used in log events, e.g. `POST api/chat`.
    pub(crate) fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Rejects empty or whitespace-only required text parameters.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SharpAiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
