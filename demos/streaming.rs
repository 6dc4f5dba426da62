use std::io::Write;

use futures::StreamExt;
use sharpai_sdk::{ChatCompletionRequest, ChatMessage, GenerateRequest, SharpAiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = SharpAiClient::from_env()?;
    let model = std::env::var("SHARPAI_MODEL").unwrap_or_else(|_| "qwen2.5:0.5b".to_owned());

    let mut progress = client.ollama().pull_model_stream(&model).await?;
    while let Some(event) = progress.next().await {
        let event = event?;
        match (event.completed, event.total) {
            (Some(done), Some(total)) => println!("{}: {done}/{total}", event.status),
            _ => println!("{}", event.status),
        }
    }

    let mut tokens = client
        .ollama()
        .generate_stream(&GenerateRequest::new(&model, "Write a haiku about crabs."))
        .await?;
    let mut stdout = std::io::stdout();
    while let Some(event) = tokens.next().await {
        let event = event?;
        write!(stdout, "{}", event.text())?;
        stdout.flush()?;
        if let Some(count) = event.eval_count {
            println!("\n[{count} tokens]");
        }
    }

    let mut chunks = client
        .openai()
        .create_chat_completion_stream(&ChatCompletionRequest::new(
            &model,
            vec![ChatMessage::user("Count from one to five.")],
        ))
        .await?;
    while let Some(chunk) = chunks.next().await {
        write!(stdout, "{}", chunk?.content())?;
        stdout.flush()?;
    }
    println!();

    Ok(())
}
