//! Ollama-style dialect (`/api/*`).

use serde::{Deserialize, Serialize};

use crate::{
    request::require_non_empty,
    stream::StreamEvent,
    types::{validate_messages, ChatMessage, TextInput},
    Result,
};

/// Model entry from `GET /api/tags`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub families: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization_level: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub model: String,
}

/// Progress report of `POST /api/pull`; the final one has status `success`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullProgress {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

impl PullProgress {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

impl StreamEvent for PullProgress {
    fn is_terminal(&self) -> bool {
        self.is_success()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,
    pub input: TextInput,
}

impl EmbedRequest {
    pub fn new(model: impl Into<String>, input: impl Into<TextInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("model", &self.model)?;
        self.input.require_items("input")
    }
}

/// One embedding vector.
///
/// Accepts both `{"embedding": [...], "index": 0}` objects and bare vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "EmbeddingRepr")]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingRepr {
    Bare(Vec<f32>),
    Indexed {
        embedding: Vec<f32>,
        #[serde(default)]
        index: Option<u32>,
    },
}

impl From<EmbeddingRepr> for EmbeddingData {
    fn from(repr: EmbeddingRepr) -> Self {
        match repr {
            EmbeddingRepr::Bare(embedding) => Self {
                embedding,
                index: None,
            },
            EmbeddingRepr::Indexed { embedding, index } => Self { embedding, index },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<EmbeddingData>>,
}

/// Sampling and runtime options for generate and chat requests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_keep: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tfs_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat_eta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalize_newline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numa: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_batch: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_gpu: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_vram: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f16_kv: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_mmap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_mlock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<i32>,
}

/// Body of `POST /api/generate`. The `stream` flag is set by the operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("model", &self.model)
    }
}

/// Response of `POST /api/generate`, or one frame of its stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl GenerateResponse {
    /// Generated text of this response or frame.
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or("")
    }
}

impl StreamEvent for GenerateResponse {
    fn is_terminal(&self) -> bool {
        self.done == Some(true)
    }
}

/// Body of `POST /api/chat`. The `stream` flag is set by the operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: impl Into<Vec<ChatMessage>>) -> Self {
        Self {
            model: model.into(),
            messages: messages.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("model", &self.model)?;
        validate_messages(&self.messages)
    }
}

/// Response of `POST /api/chat`, or one frame of its stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl ChatResponse {
    pub fn content(&self) -> &str {
        self.message
            .as_ref()
            .map(|message| message.content.as_str())
            .unwrap_or("")
    }
}

impl StreamEvent for ChatResponse {
    fn is_terminal(&self) -> bool {
        self.done == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ChatRequest, EmbedRequest, EmbedResponse, GenerateOptions, GenerateRequest,
        GenerateResponse, PullProgress, TagsResponse,
    };
    use crate::{stream::StreamEvent, ChatMessage, SharpAiError};

    #[test]
    fn generate_request_round_trips_and_omits_absent_options() {
        let request = GenerateRequest::new("qwen2.5", "What is Rust?").with_options(GenerateOptions {
            num_predict: Some(50),
            temperature: Some(0.7),
            stop: Some(vec!["\n\n".to_owned()]),
            ..GenerateOptions::default()
        });

        let encoded = serde_json::to_value(&request).expect("must encode");
        assert_eq!(
            encoded,
            json!({
                "model": "qwen2.5",
                "prompt": "What is Rust?",
                "options": {"num_predict": 50, "temperature": 0.7, "stop": ["\n\n"]}
            })
        );
        let decoded: GenerateRequest = serde_json::from_value(encoded).expect("must decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn chat_request_round_trips() {
        let request = ChatRequest::new(
            "qwen2.5",
            vec![ChatMessage::system("You are helpful."), ChatMessage::user("Hi")],
        );
        let text = serde_json::to_string(&request).expect("must encode");
        let decoded: ChatRequest = serde_json::from_str(&text).expect("must decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn validation_rejects_missing_parameters() {
        assert!(matches!(
            GenerateRequest::new(" ", "hi").validate(),
            Err(SharpAiError::Validation(_))
        ));
        assert!(matches!(
            ChatRequest::new("m", Vec::new()).validate(),
            Err(SharpAiError::Validation(_))
        ));
        assert!(matches!(
            EmbedRequest::new("m", Vec::<String>::new()).validate(),
            Err(SharpAiError::Validation(_))
        ));
        assert!(EmbedRequest::new("m", "text").validate().is_ok());
    }

    #[test]
    fn done_frames_are_terminal() {
        let frame: GenerateResponse =
            serde_json::from_str(r#"{"model":"m","response":"Hi","done":false}"#)
                .expect("must decode");
        let last: GenerateResponse =
            serde_json::from_str(r#"{"done":true,"eval_count":12}"#).expect("must decode");

        assert_eq!(frame.text(), "Hi");
        assert!(!frame.is_terminal());
        assert!(last.is_terminal());
        assert_eq!(last.eval_count, Some(12));

        let pulling: PullProgress =
            serde_json::from_str(r#"{"status":"pulling manifest"}"#).expect("must decode");
        let success: PullProgress =
            serde_json::from_str(r#"{"status":"success"}"#).expect("must decode");
        assert!(!pulling.is_terminal());
        assert!(success.is_terminal());
    }

    #[test]
    fn embeddings_accept_bare_and_indexed_vectors() {
        let bare: EmbedResponse =
            serde_json::from_str(r#"{"embeddings":[[0.5,0.25]]}"#).expect("must decode");
        let indexed: EmbedResponse =
            serde_json::from_str(r#"{"embeddings":[{"embedding":[0.5,0.25],"index":0}]}"#)
                .expect("must decode");

        let bare = bare.embeddings.expect("must have embeddings");
        let indexed = indexed.embeddings.expect("must have embeddings");
        assert_eq!(bare[0].embedding, vec![0.5, 0.25]);
        assert_eq!(bare[0].index, None);
        assert_eq!(indexed[0].index, Some(0));
    }

    #[test]
    fn tags_default_to_empty_list() {
        let tags: TagsResponse = serde_json::from_str("{}").expect("must decode");
        assert!(tags.models.is_empty());
    }
}
