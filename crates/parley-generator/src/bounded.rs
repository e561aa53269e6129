use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::{Generator, GeneratorError};

/// Issue a generation request on a worker task and wait at most `timeout`.
///
/// On expiry the join handle is dropped and the in-flight call is abandoned:
/// the task runs to completion in the background and its result is
/// discarded. Under sustained timeout pressure this leaks work; the
/// transport would need real cancellation to tighten it.
pub async fn bounded_generate(
    generator: Arc<dyn Generator>,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
) -> Result<String, GeneratorError> {
    let handle =
        tokio::spawn(async move { generator.generate(&prompt, max_tokens, temperature).await });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(GeneratorError::Transport(format!(
            "generation task panicked: {}",
            join_err
        ))),
        Err(_) => {
            warn!(?timeout, "generation timed out, abandoning in-flight call");
            Err(GeneratorError::Timeout(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScriptedGenerator, ScriptedReply};

    #[tokio::test]
    async fn test_fast_reply_passes_through() {
        let scripted = Arc::new(ScriptedGenerator::new(vec![ScriptedReply::text("hi")]));
        let out = bounded_generate(
            scripted,
            "prompt".into(),
            100,
            0.7,
            Duration::from_secs(3),
        )
        .await
        .unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn test_slow_reply_times_out() {
        let scripted = Arc::new(ScriptedGenerator::new(vec![ScriptedReply::text(
            "too late",
        )
        .with_delay(Duration::from_secs(10))]));
        let err = bounded_generate(
            scripted,
            "prompt".into(),
            100,
            0.7,
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Timeout(_)));
    }
}
