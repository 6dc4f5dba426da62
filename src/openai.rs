use crate::{
    request::RequestDescriptor,
    stream::{EventStream, Framing},
    types::openai::{
        ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, CompletionRequest,
        CompletionResponse, EmbeddingRequest, EmbeddingResponse,
    },
    wire::StreamFlagged,
    Result, SharpAiClient,
};

/// OpenAI-compatible endpoints, borrowed from a [`SharpAiClient`].
///
/// Streaming variants read server-sent events and end at `data: [DONE]`.
#[derive(Clone, Copy, Debug)]
pub struct OpenAi<'a> {
    client: &'a SharpAiClient,
}

impl<'a> OpenAi<'a> {
    pub(crate) fn new(client: &'a SharpAiClient) -> Self {
        Self { client }
    }

    pub async fn create_embedding(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        request.validate()?;
        let request = RequestDescriptor::post("v1/embeddings").json(request)?;
        self.client.send_json(request).await
    }

    pub async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        request.validate()?;
        let request =
            RequestDescriptor::post("v1/completions").json(&StreamFlagged::new(request, false))?;
        self.client.send_json(request).await
    }

    /// Streams completion chunks; each chunk has the shape of a full response.
    pub async fn create_completion_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<EventStream<CompletionResponse>> {
        request.validate()?;
        let request = RequestDescriptor::post("v1/completions")
            .json(&StreamFlagged::new(request, true))?
            .streaming(Framing::Sse);
        self.client.send_stream(request).await
    }

    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        request.validate()?;
        let request = RequestDescriptor::post("v1/chat/completions")
            .json(&StreamFlagged::new(request, false))?;
        self.client.send_json(request).await
    }

    pub async fn create_chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<EventStream<ChatCompletionChunk>> {
        request.validate()?;
        let request = RequestDescriptor::post("v1/chat/completions")
            .json(&StreamFlagged::new(request, true))?
            .streaming(Framing::Sse);
        self.client.send_stream(request).await
    }
}
