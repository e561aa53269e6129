use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{Generator, GeneratorError};

/// Wraps a generator with bounded retries.
///
/// Each retry halves the token budget: a call that timed out at the full
/// budget has a better chance of finishing with a shorter completion, and a
/// short real answer beats a canned fallback.
pub struct RetryGenerator {
    inner: Arc<dyn Generator>,
    max_retries: u32,
}

impl RetryGenerator {
    pub fn new(inner: Arc<dyn Generator>) -> Self {
        Self {
            inner,
            max_retries: 2,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl Generator for RetryGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GeneratorError> {
        let mut budget = max_tokens;
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            match self.inner.generate(prompt, budget, temperature).await {
                Ok(text) if text.trim().is_empty() => {
                    warn!(attempt, "generator returned empty output");
                    last_err = Some(GeneratorError::Empty);
                }
                Ok(text) => {
                    debug!(attempt, budget, "generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(attempt, budget, error = %e, "generation attempt failed");
                    last_err = Some(e);
                }
            }
            budget = (budget / 2).max(16);
        }

        Err(last_err.unwrap_or(GeneratorError::Empty))
    }
}
