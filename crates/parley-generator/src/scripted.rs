use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{Generator, GeneratorError};

/// One canned reply for the scripted generator.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    outcome: Result<String, String>,
    delay: Option<Duration>,
}

impl ScriptedReply {
    pub fn text(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            delay: None,
        }
    }

    pub fn failure(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Generator that replays a fixed queue of replies.
///
/// Used by tests and `--dry-run`: each call pops the next reply; an
/// exhausted queue behaves like a transport failure. Received prompts are
/// recorded for assertions.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn push(&self, reply: ScriptedReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GeneratorError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());

        match reply {
            Some(reply) => {
                if let Some(delay) = reply.delay {
                    tokio::time::sleep(delay).await;
                }
                reply
                    .outcome
                    .map_err(GeneratorError::Transport)
            }
            None => Err(GeneratorError::Transport("script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_exhausted() {
        let scripted = ScriptedGenerator::new(vec![
            ScriptedReply::text("one"),
            ScriptedReply::text("two"),
        ]);
        assert_eq!(scripted.generate("a", 10, 0.0).await.unwrap(), "one");
        assert_eq!(scripted.generate("b", 10, 0.0).await.unwrap(), "two");
        assert!(scripted.generate("c", 10, 0.0).await.is_err());
        assert_eq!(scripted.prompts(), vec!["a", "b", "c"]);
    }
}
