//! OpenAI-compatible dialect (`/v1/*`).

use serde::{Deserialize, Serialize};

use crate::{
    request::require_non_empty,
    stream::StreamEvent,
    types::{validate_messages, ChatMessage, TextInput},
    Result, SharpAiError,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: TextInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: impl Into<TextInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("model", &self.model)?;
        self.input.require_items("input")
    }
}

fn embedding_object() -> String {
    "embedding".to_owned()
}

fn list_object() -> String {
    "list".to_owned()
}

fn text_completion_object() -> String {
    "text_completion".to_owned()
}

fn chat_completion_object() -> String {
    "chat.completion".to_owned()
}

fn chat_completion_chunk_object() -> String {
    "chat.completion.chunk".to_owned()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingObject {
    #[serde(default = "embedding_object")]
    pub object: String,
    pub embedding: Vec<f32>,
    pub index: u32,
}

/// Response of `POST /v1/embeddings`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default = "list_object")]
    pub object: String,
    pub data: Vec<EmbeddingObject>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Body of `POST /v1/completions`. The `stream` flag is set by the operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: TextInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<TextInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl CompletionRequest {
    /// Creates a request for one completion (`n = 1`).
    pub fn new(model: impl Into<String>, prompt: impl Into<TextInput>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            n: Some(1),
            presence_penalty: None,
            frequency_penalty: None,
            stop: None,
            user: None,
            seed: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn stop(mut self, stop: impl Into<TextInput>) -> Self {
        self.stop = Some(stop.into());
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("model", &self.model)?;
        self.prompt.require_items("prompt")?;
        validate_choice_count(self.n)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: String,
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response of `POST /v1/completions`; streamed chunks share this shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    #[serde(default = "text_completion_object")]
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Text of the first choice.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .map(|choice| choice.text.as_str())
            .unwrap_or("")
    }
}

impl StreamEvent for CompletionResponse {}

/// Body of `POST /v1/chat/completions`. The `stream` flag is set by the operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<TextInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl ChatCompletionRequest {
    /// Creates a request for one completion (`n = 1`).
    pub fn new(model: impl Into<String>, messages: impl Into<Vec<ChatMessage>>) -> Self {
        Self {
            model: model.into(),
            messages: messages.into(),
            temperature: None,
            top_p: None,
            n: Some(1),
            stop: None,
            max_tokens: None,
            presence_penalty: None,
            frequency_penalty: None,
            user: None,
            seed: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn stop(mut self, stop: impl Into<TextInput>) -> Self {
        self.stop = Some(stop.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("model", &self.model)?;
        validate_messages(&self.messages)?;
        validate_choice_count(self.n)
    }
}

fn validate_choice_count(n: Option<u32>) -> Result<()> {
    if n == Some(0) {
        return Err(SharpAiError::Validation("n must be at least 1".to_owned()));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response of `POST /v1/chat/completions`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    #[serde(default = "chat_completion_object")]
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// Message content of the first choice.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or("")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionChunkChoice {
    pub index: u32,
    #[serde(default)]
    pub delta: ChatDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One streamed frame of `POST /v1/chat/completions`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default = "chat_completion_chunk_object")]
    pub object: String,
    pub created: i64,
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChatCompletionChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionChunk {
    /// Content delta of the first choice.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or("")
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}

impl StreamEvent for ChatCompletionChunk {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, CompletionRequest,
        EmbeddingRequest, EmbeddingResponse,
    };
    use crate::{ChatMessage, SharpAiError, TextInput};

    #[test]
    fn completion_request_encodes_only_present_fields() {
        let request = CompletionRequest::new("qwen2.5", "Once upon a time")
            .max_tokens(64)
            .temperature(0.5)
            .stop(["\n", "###"]);

        let encoded = serde_json::to_value(&request).expect("must encode");
        assert_eq!(
            encoded,
            json!({
                "model": "qwen2.5",
                "prompt": "Once upon a time",
                "max_tokens": 64,
                "temperature": 0.5,
                "n": 1,
                "stop": ["\n", "###"]
            })
        );
        let decoded: CompletionRequest = serde_json::from_value(encoded).expect("must decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn chat_completion_request_round_trips() {
        let request = ChatCompletionRequest::new(
            "qwen2.5",
            vec![ChatMessage::system("Be terse."), ChatMessage::user("What is a lifetime?")],
        )
        .max_tokens(100)
        .stop("\n");

        let text = serde_json::to_string(&request).expect("must encode");
        let decoded: ChatCompletionRequest = serde_json::from_str(&text).expect("must decode");
        assert_eq!(decoded, request);
        assert_eq!(decoded.stop, Some(TextInput::Single("\n".to_owned())));
    }

    #[test]
    fn validation_rejects_zero_choices_and_empty_input() {
        let mut request = ChatCompletionRequest::new("m", vec![ChatMessage::user("hi")]);
        request.n = Some(0);
        assert!(matches!(request.validate(), Err(SharpAiError::Validation(_))));

        assert!(matches!(
            EmbeddingRequest::new("m", Vec::<String>::new()).validate(),
            Err(SharpAiError::Validation(_))
        ));
        assert!(CompletionRequest::new("m", "p").validate().is_ok());
    }

    #[test]
    fn response_objects_default_when_absent() {
        let embeddings: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[0.1],"index":0}],"model":"minilm"}"#,
        )
        .expect("must decode");
        assert_eq!(embeddings.object, "list");
        assert_eq!(embeddings.data[0].object, "embedding");

        let chat: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"c1","created":1,"model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}],"usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#,
        )
        .expect("must decode");
        assert_eq!(chat.object, "chat.completion");
        assert_eq!(chat.content(), "Hello");
        assert_eq!(chat.usage.and_then(|usage| usage.total_tokens), Some(4));
    }

    #[test]
    fn chunk_exposes_delta_content() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c1","object":"chat.completion.chunk","created":1,"model":"m","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .expect("must decode");
        assert_eq!(chunk.content(), "Hel");
        assert_eq!(chunk.finish_reason(), None);
    }
}
