use serde::{Deserialize, Serialize};

/// Request body with the streaming flag chosen by the calling operation.
#[derive(Debug, Serialize)]
pub(crate) struct StreamFlagged<'a, T: Serialize> {
    #[serde(flatten)]
    pub inner: &'a T,
    pub stream: bool,
}

impl<'a, T: Serialize> StreamFlagged<'a, T> {
    pub(crate) fn new(inner: &'a T, stream: bool) -> Self {
        Self { inner, stream }
    }
}

/// Error payload shapes the server may return.
///
/// SharpAI native: `{"Error": "NotFound", "Description": "..."}`.
/// Ollama: `{"error": "model not found"}`.
/// OpenAI: `{"error": {"message": "...", "type": "..."}}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default, rename = "Error")]
    pub code: Option<String>,
    #[serde(default, rename = "Description")]
    pub description: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorField>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorField {
    Text(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl ApiErrorBody {
    /// True when the payload carries any recognizable error marker.
    pub(crate) fn is_error(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }

    pub(crate) fn message(&self) -> Option<String> {
        if let Some(description) = &self.description {
            return Some(description.clone());
        }
        match &self.error {
            Some(ErrorField::Text(text)) => return Some(text.clone()),
            Some(ErrorField::Detail { message, kind }) => {
                if let Some(message) = message.as_ref().or(kind.as_ref()) {
                    return Some(message.clone());
                }
            }
            None => {}
        }
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::{ApiErrorBody, StreamFlagged};

    #[derive(Serialize)]
    struct Body {
        model: &'static str,
    }

    #[test]
    fn stream_flag_is_flattened_into_body() {
        let body = Body { model: "llama3" };
        let value = serde_json::to_value(StreamFlagged::new(&body, true)).expect("must encode");
        assert_eq!(value, json!({"model": "llama3", "stream": true}));
    }

    #[test]
    fn error_shapes_yield_messages() {
        let native: ApiErrorBody =
            serde_json::from_str(r#"{"Error":"NotFound","Description":"no such model"}"#)
                .expect("must parse");
        let ollama: ApiErrorBody =
            serde_json::from_str(r#"{"error":"model 'x' not found"}"#).expect("must parse");
        let openai: ApiErrorBody =
            serde_json::from_str(r#"{"error":{"message":"bad n","type":"invalid_request_error"}}"#)
                .expect("must parse");

        assert!(native.is_error() && ollama.is_error() && openai.is_error());
        assert_eq!(native.code.as_deref(), Some("NotFound"));
        assert_eq!(native.message().as_deref(), Some("no such model"));
        assert_eq!(ollama.message().as_deref(), Some("model 'x' not found"));
        assert_eq!(openai.message().as_deref(), Some("bad n"));
    }
}
