use sharpai_sdk::{
    ChatCompletionRequest, ChatMessage, EmbeddingRequest, GenerateOptions, GenerateRequest,
    SharpAiClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = SharpAiClient::from_env()?;
    let model = std::env::var("SHARPAI_MODEL").unwrap_or_else(|_| "qwen2.5:0.5b".to_owned());

    if !client.validate_connectivity().await {
        anyhow::bail!("no SharpAI server reachable at {}", client.endpoint());
    }

    for info in client.ollama().list_models().await? {
        println!("model: {} ({:?} bytes)", info.name, info.size);
    }

    let request = GenerateRequest::new(&model, "Explain ownership in Rust in one sentence.")
        .with_options(GenerateOptions {
            num_predict: Some(60),
            temperature: Some(0.2),
            ..GenerateOptions::default()
        });
    let reply = client.ollama().generate(&request).await?;
    println!("generate: {}", reply.text());

    let chat = client
        .openai()
        .create_chat_completion(
            &ChatCompletionRequest::new(
                &model,
                vec![
                    ChatMessage::system("You answer in five words or fewer."),
                    ChatMessage::user("What is a borrow checker?"),
                ],
            )
            .max_tokens(20),
        )
        .await?;
    println!("chat: {}", chat.content());

    let embeddings = client
        .openai()
        .create_embedding(&EmbeddingRequest::new(&model, ["first text", "second text"]))
        .await?;
    for item in embeddings.data {
        println!("embedding {}: {} dimensions", item.index, item.embedding.len());
    }

    Ok(())
}
