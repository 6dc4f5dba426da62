use crate::{
    request::{require_non_empty, RequestDescriptor},
    stream::{EventStream, Framing},
    types::ollama::{
        ChatRequest, ChatResponse, DeleteRequest, EmbedRequest, EmbedResponse, GenerateRequest,
        GenerateResponse, ModelInfo, PullProgress, PullRequest, TagsResponse,
    },
    wire::StreamFlagged,
    Result, SharpAiClient,
};

/// Ollama-style endpoints, borrowed from a [`SharpAiClient`].
///
/// ```no_run
/// # async fn run() -> sharpai_sdk::Result<()> {
/// use sharpai_sdk::{GenerateRequest, SharpAiClient};
///
/// let client = SharpAiClient::new("http://localhost:8000");
/// let reply = client
///     .ollama()
///     .generate(&GenerateRequest::new("qwen2.5", "Why is the sky blue?"))
///     .await?;
/// println!("{}", reply.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Ollama<'a> {
    client: &'a SharpAiClient,
}

impl<'a> Ollama<'a> {
    pub(crate) fn new(client: &'a SharpAiClient) -> Self {
        Self { client }
    }

    /// Lists locally available models.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let tags: TagsResponse = self
            .client
            .send_json(RequestDescriptor::get("api/tags"))
            .await?;
        Ok(tags.models)
    }

    /// Pulls a model and returns the final status once the pull is complete.
    pub async fn pull_model(&self, model: &str) -> Result<PullProgress> {
        let body = pull_body(model)?;
        let request = RequestDescriptor::post("api/pull").json(&StreamFlagged::new(&body, false))?;
        self.client.send_json(request).await
    }

    /// Pulls a model, yielding progress reports until `success`.
    pub async fn pull_model_stream(&self, model: &str) -> Result<EventStream<PullProgress>> {
        let body = pull_body(model)?;
        let request = RequestDescriptor::post("api/pull")
            .json(&StreamFlagged::new(&body, true))?
            .streaming(Framing::Ndjson);
        self.client.send_stream(request).await
    }

    pub async fn delete_model(&self, name: &str) -> Result<()> {
        require_non_empty("name", name)?;
        let body = DeleteRequest {
            name: name.to_owned(),
        };
        let request = RequestDescriptor::delete("api/delete").json(&body)?;
        self.client.send_empty(request).await
    }

    /// Embeds one text or a batch of texts.
    pub async fn generate_embedding(&self, request: &EmbedRequest) -> Result<EmbedResponse> {
        request.validate()?;
        let request = RequestDescriptor::post("api/embed").json(request)?;
        self.client.send_json(request).await
    }

    /// Generates a completion and returns it once finished.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        request.validate()?;
        let request =
            RequestDescriptor::post("api/generate").json(&StreamFlagged::new(request, false))?;
        self.client.send_json(request).await
    }

    /// Generates a completion token by token.
    ///
    /// The last event has `done == Some(true)` and carries timing statistics.
    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<EventStream<GenerateResponse>> {
        request.validate()?;
        let request = RequestDescriptor::post("api/generate")
            .json(&StreamFlagged::new(request, true))?
            .streaming(Framing::Ndjson);
        self.client.send_stream(request).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        request.validate()?;
        let request = RequestDescriptor::post("api/chat").json(&StreamFlagged::new(request, false))?;
        self.client.send_json(request).await
    }

    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<EventStream<ChatResponse>> {
        request.validate()?;
        let request = RequestDescriptor::post("api/chat")
            .json(&StreamFlagged::new(request, true))?
            .streaming(Framing::Ndjson);
        self.client.send_stream(request).await
    }
}

fn pull_body(model: &str) -> Result<PullRequest> {
    require_non_empty("model", model)?;
    Ok(PullRequest {
        model: model.to_owned(),
    })
}
