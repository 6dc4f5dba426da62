//! `sharpai-sdk` is an async HTTP client for the SharpAI inference server.
//!
//! The server speaks two dialects, both reachable from one [`SharpAiClient`]:
//! - [`SharpAiClient::ollama`]: Ollama-style `/api/*` endpoints (NDJSON streams)
//! - [`SharpAiClient::openai`]: OpenAI-compatible `/v1/*` endpoints (SSE streams)
//!
//! Transient failures (network errors, timeouts, 5xx, 429) are retried with
//! exponential backoff. Streaming calls are retried only until the response
//! headers arrive; after that, failures surface as items of the
//! [`EventStream`].

mod client;
mod decode;
mod error;
mod ollama;
mod openai;
mod options;
mod request;
mod retry;
mod stream;
mod transport;
pub mod types;
mod wire;

pub use client::{SharpAiClient, DEFAULT_ENDPOINT};
pub use error::{ErrorKind, SharpAiError};
pub use ollama::Ollama;
pub use openai::OpenAi;
pub use options::ClientOptions;
pub use retry::RetryPolicy;
pub use stream::{EventStream, Framing, StreamEvent};
pub use types::ollama::{
    ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, EmbeddingData, GenerateOptions,
    GenerateRequest, GenerateResponse, ModelDetails, ModelInfo, PullProgress,
};
pub use types::openai::{
    ChatCompletionChoice, ChatCompletionChunk, ChatCompletionChunkChoice, ChatCompletionRequest,
    ChatCompletionResponse, ChatDelta, CompletionChoice, CompletionRequest, CompletionResponse,
    EmbeddingObject, EmbeddingRequest, EmbeddingResponse, Usage,
};
pub use types::{ChatMessage, TextInput};

pub type Result<T> = std::result::Result<T, SharpAiError>;
