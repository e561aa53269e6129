use std::time::Duration;

/// Tunables for the interview engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Demo mode shortens the script and caps follow-ups at one,
    /// issued only for very short answers.
    pub demo_mode: bool,
    /// Conversation memory depth (exchanges kept).
    pub max_history: usize,
    /// Maximum follow-ups per question index. The guard against
    /// infinite probing loops.
    pub max_follow_ups: usize,
    /// Character-level similarity ratio above which an answer is a
    /// duplicate of a prior answer to the same question.
    pub similarity_threshold: f64,
    /// Bounded wait for acknowledgment generation.
    pub ack_timeout: Duration,
    /// Bounded wait for follow-up generation.
    pub follow_up_timeout: Duration,
    /// Seed for the policy tie-break RNG. None seeds from entropy;
    /// tests pin it.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            max_history: 10,
            max_follow_ups: 2,
            similarity_threshold: 0.8,
            ack_timeout: Duration::from_secs(3),
            follow_up_timeout: Duration::from_secs(5),
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn demo() -> Self {
        Self {
            demo_mode: true,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_max_follow_ups(mut self, max: usize) -> Self {
        self.max_follow_ups = max;
        self
    }
}
