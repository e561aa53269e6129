use crate::cache::cache_key;
use crate::script::{Question, QuestionCategory};
use parley_generator::Generator;
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

const MOVE_ON_PHRASES: [&str; 11] = [
    "can we move",
    "next question",
    "moving on",
    "let's continue",
    "next section",
    "proceed",
    "getting rushed",
    "short on time",
    "move forward",
    "continue with",
    "go ahead",
];

const TECHNICAL_MARKERS: [&str; 12] = [
    "implemented",
    "designed",
    "developed",
    "algorithm",
    "complexity",
    "architecture",
    "solution",
    "framework",
    "database",
    "system",
    "code",
    "programming",
];

/// Decides whether a response deserves a follow-up question. Primary path is
/// an LLM quality score on a 1-10 scale; when scoring fails, length and
/// category heuristics fill in, with a seeded coin flip as the final
/// tie-break so runs are reproducible.
pub struct QualityPolicy {
    demo_mode: bool,
    max_follow_ups: u32,
    score_cache: HashMap<String, u8>,
    last_score: Option<(u8, bool)>,
}

impl QualityPolicy {
    pub fn new(demo_mode: bool, max_follow_ups: u32) -> Self {
        QualityPolicy {
            demo_mode,
            max_follow_ups,
            score_cache: HashMap::new(),
            last_score: None,
        }
    }

    /// Score behind the most recent decision, with a cache-hit flag.
    /// `None` when the decision never reached the scoring path.
    pub fn last_score(&self) -> Option<(u8, bool)> {
        self.last_score
    }

    pub async fn should_follow_up(
        &mut self,
        response: &str,
        question: &Question,
        follow_up_count: u32,
        generator: &Arc<dyn Generator>,
        rng: &mut SmallRng,
    ) -> bool {
        self.last_score = None;
        let lower = response.to_lowercase();
        if MOVE_ON_PHRASES.iter().any(|p| lower.contains(p)) {
            tracing::info!("candidate asked to move on, skipping follow-up");
            return false;
        }

        let word_count = response.split_whitespace().count();

        if self.demo_mode {
            if follow_up_count > 0 {
                return false;
            }
            return word_count < 15;
        }

        if follow_up_count >= self.max_follow_ups {
            tracing::info!("follow-up cap reached, moving on");
            return false;
        }

        match self.score(response, question, generator).await {
            Some(score) => {
                tracing::info!(score, "response quality scored");
                if score <= 3 {
                    true
                } else if score <= 6 && follow_up_count == 0 {
                    true
                } else {
                    // 7-10, or mid-range after a follow-up already happened.
                    false
                }
            }
            None => self.heuristic_follow_up(response, question, follow_up_count, word_count, rng),
        }
    }

    async fn score(
        &mut self,
        response: &str,
        question: &Question,
        generator: &Arc<dyn Generator>,
    ) -> Option<u8> {
        let key = cache_key(&["response_quality", response, &question.text]);
        if let Some(score) = self.score_cache.get(&key).copied() {
            tracing::debug!(score, "using cached quality score");
            self.last_score = Some((score, true));
            return Some(score);
        }

        let prompt = format!(
            "Evaluate this candidate response for depth, relevance, and completeness.\n\n\
             Question: \"{}\"\n\
             Category: {}\n\
             Candidate response: \"{}\"\n\n\
             Rate the response quality on a scale of 1-10, where:\n\
             1-3: Very shallow, generic, or irrelevant\n\
             4-6: Somewhat adequate but could use more detail or focus\n\
             7-10: Comprehensive, relevant, and well-explained\n\n\
             Return only the numeric score (1-10).",
            question.text, question.category, response
        );

        match generator.generate(&prompt, 10, 0.0).await {
            Ok(raw) => {
                let score = parse_score(&raw);
                self.score_cache.insert(key, score);
                self.last_score = Some((score, false));
                Some(score)
            }
            Err(err) => {
                tracing::warn!(error = %err, "quality scoring call failed");
                None
            }
        }
    }

    fn heuristic_follow_up(
        &self,
        response: &str,
        question: &Question,
        follow_up_count: u32,
        word_count: usize,
        rng: &mut SmallRng,
    ) -> bool {
        if word_count < 25 {
            return true;
        }

        let lower = response.to_lowercase();
        if question.category == QuestionCategory::Technical && follow_up_count == 0 {
            if word_count < 75 {
                return true;
            }
            let markers = TECHNICAL_MARKERS.iter().filter(|m| lower.contains(*m)).count();
            if markers < 2 {
                return true;
            }
        }

        if question.category == QuestionCategory::Behavioral && follow_up_count == 0 {
            let situation = ["when", "situation", "context", "challenge", "problem", "faced"]
                .iter()
                .any(|m| lower.contains(m));
            let action = ["did", "action", "took", "steps", "approach", "handled", "implemented"]
                .iter()
                .any(|m| lower.contains(m));
            let result = ["result", "outcome", "impact", "learned", "achieved", "ended", "succeeded"]
                .iter()
                .any(|m| lower.contains(m));
            if !(situation && action && result) {
                return true;
            }
        }

        if word_count > 100 {
            return false;
        }

        if follow_up_count == 0 {
            let flip = rng.gen_bool(0.5);
            tracing::info!(follow_up = flip, "tie-break coin flip for follow-up");
            return flip;
        }

        false
    }
}

/// Lenient score parsing: whole-string integer first, else the first run of
/// digits anywhere in the output, else mid-range. Clamped to 1-10.
fn parse_score(raw: &str) -> u8 {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<i64>().ok().or_else(|| {
        let digits: String = trimmed
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse::<i64>().ok()
    });
    parsed.unwrap_or(5).clamp(1, 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_generator::{ScriptedGenerator, ScriptedReply};
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn generator(replies: Vec<ScriptedReply>) -> Arc<dyn Generator> {
        Arc::new(ScriptedGenerator::new(replies))
    }

    fn technical_question() -> Question {
        Question::new(QuestionCategory::Technical, "Describe a hard bug.")
    }

    #[test]
    fn test_parse_score_variants() {
        assert_eq!(parse_score("7"), 7);
        assert_eq!(parse_score(" 9 \n"), 9);
        assert_eq!(parse_score("Score: 3/10"), 3);
        assert_eq!(parse_score("fifteen"), 5);
        assert_eq!(parse_score("42"), 10);
    }

    #[tokio::test]
    async fn test_move_on_phrase_skips_follow_up() {
        let mut policy = QualityPolicy::new(false, 2);
        let gen = generator(vec![]);
        let mut rng = rng();
        assert!(
            !policy
                .should_follow_up(
                    "That covers it, can we move to the next one?",
                    &technical_question(),
                    0,
                    &gen,
                    &mut rng
                )
                .await
        );
    }

    #[tokio::test]
    async fn test_high_score_skips_follow_up() {
        let mut policy = QualityPolicy::new(false, 2);
        let gen = generator(vec![ScriptedReply::text("9")]);
        let mut rng = rng();
        assert!(
            !policy
                .should_follow_up(
                    "A long and thorough answer about the bug and its fix.",
                    &technical_question(),
                    0,
                    &gen,
                    &mut rng
                )
                .await
        );
    }

    #[tokio::test]
    async fn test_mid_score_follows_up_only_once() {
        let mut policy = QualityPolicy::new(false, 2);
        let gen = generator(vec![ScriptedReply::text("5"), ScriptedReply::text("5")]);
        let mut rng = rng();
        let q = technical_question();
        assert!(policy.should_follow_up("Some answer.", &q, 0, &gen, &mut rng).await);
        // Cached score on identical text, second follow-up not warranted.
        assert!(!policy.should_follow_up("Some answer.", &q, 1, &gen, &mut rng).await);
    }

    #[tokio::test]
    async fn test_cap_reached_never_follows_up() {
        let mut policy = QualityPolicy::new(false, 2);
        let gen = generator(vec![]);
        let mut rng = rng();
        assert!(
            !policy
                .should_follow_up("anything", &technical_question(), 2, &gen, &mut rng)
                .await
        );
    }

    #[tokio::test]
    async fn test_demo_mode_only_short_responses() {
        let mut policy = QualityPolicy::new(true, 2);
        let gen = generator(vec![]);
        let mut rng = rng();
        let q = technical_question();
        assert!(policy.should_follow_up("Too short.", &q, 0, &gen, &mut rng).await);
        let long = "word ".repeat(20);
        assert!(!policy.should_follow_up(&long, &q, 0, &gen, &mut rng).await);
        assert!(!policy.should_follow_up("Too short.", &q, 1, &gen, &mut rng).await);
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back_to_heuristics() {
        let mut policy = QualityPolicy::new(false, 2);
        let gen = generator(vec![ScriptedReply::failure("down")]);
        let mut rng = rng();
        // Short response so the first heuristic fires deterministically.
        assert!(
            policy
                .should_follow_up("Brief.", &technical_question(), 0, &gen, &mut rng)
                .await
        );
    }

    #[tokio::test]
    async fn test_seeded_coin_flip_is_reproducible() {
        let q = Question::new(QuestionCategory::CompanyFit, "Why us?");
        // 60 words, non-technical category, so the decision reaches the flip.
        let response = "word ".repeat(60);
        let mut first = Vec::new();
        let mut second = Vec::new();
        for out in [&mut first, &mut second] {
            let mut policy = QualityPolicy::new(false, 2);
            let gen = generator(vec![ScriptedReply::failure("down"); 4]);
            let mut rng = SmallRng::seed_from_u64(99);
            for _ in 0..4 {
                out.push(
                    policy
                        .should_follow_up(&response, &q, 0, &gen, &mut rng)
                        .await,
                );
            }
        }
        assert_eq!(first, second);
    }
}
