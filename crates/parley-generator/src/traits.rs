use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during text generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("generation transport failed: {0}")]
    Transport(String),

    #[error("generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("generator returned empty output")]
    Empty,
}

/// The core abstraction over a text generator (LLM provider)
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable name of the generator (e.g., "ollama", "scripted")
    fn name(&self) -> &str;

    /// Generate text for the given prompt within a token/temperature budget.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GeneratorError>;
}
