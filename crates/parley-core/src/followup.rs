use crate::prompts::InterviewPrompts;
use crate::script::Question;
use parley_generator::{bounded_generate, Generator, GeneratorError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

const NO_FOLLOW_UP_SENTINEL: &str = "NO_FOLLOW_UP_NEEDED";
const TIMEOUT_FALLBACK: &str = "Could you elaborate more on that point?";

/// Result of asking the generator for a follow-up question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FollowUpOutcome {
    /// The generator declared the response complete.
    NotNeeded,
    /// A usable follow-up question.
    Generated { text: String },
    /// Generation failed and no stand-in applies; the caller advances.
    Failed,
}

/// Ask the generator for one follow-up question, bounded by `timeout`.
/// Timeouts degrade to a generic elaboration prompt rather than stalling
/// the interview; transport failures report `Failed`.
pub async fn generate_follow_up(
    generator: Arc<dyn Generator>,
    question: &Question,
    response: &str,
    timeout: Duration,
) -> FollowUpOutcome {
    let prompt = InterviewPrompts::follow_up(&question.text, response);
    match bounded_generate(generator, prompt, 100, 0.7, timeout).await {
        Ok(raw) => {
            if raw.contains(NO_FOLLOW_UP_SENTINEL) {
                return FollowUpOutcome::NotNeeded;
            }
            match clean_follow_up(&raw) {
                Some(text) => {
                    let lowered = text.to_lowercase();
                    if matches!(
                        lowered.as_str(),
                        "none" | "no follow-up needed" | "no follow-up necessary"
                    ) {
                        FollowUpOutcome::NotNeeded
                    } else {
                        FollowUpOutcome::Generated { text }
                    }
                }
                None => FollowUpOutcome::NotNeeded,
            }
        }
        Err(GeneratorError::Timeout(elapsed)) => {
            tracing::warn!(?elapsed, "follow-up generation timed out, using stand-in");
            FollowUpOutcome::Generated {
                text: TIMEOUT_FALLBACK.to_string(),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "follow-up generation failed");
            FollowUpOutcome::Failed
        }
    }
}

/// Canned follow-up for responses too short to score.
pub fn short_response_follow_up() -> String {
    "Could you please elaborate more on your answer? I'd like to hear more specific \
     details about your experience."
        .to_string()
}

/// Extract just the question from a potentially verbose generator reply.
/// Returns `None` when nothing question-like survives cleaning.
fn clean_follow_up(raw: &str) -> Option<String> {
    static PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    static QUESTION_RE: OnceLock<Regex> = OnceLock::new();
    let prefix_re = PREFIX_RE.get_or_init(|| {
        Regex::new(
            r"(?i)(follow-up question:|i would ask:|here's a follow-up:|my follow-up would be:|follow up:|answer:)",
        )
        .expect("static regex")
    });
    let question_re =
        QUESTION_RE.get_or_init(|| Regex::new(r"[^.!?]*\?").expect("static regex"));

    let stripped = prefix_re.replace_all(raw, "");

    if let Some(m) = question_re.find(&stripped) {
        let q = m.as_str().trim();
        if !q.is_empty() {
            return Some(q.to_string());
        }
    }

    // No question mark anywhere. Long prose at this point is generator
    // reasoning, not a question to put to the candidate.
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.len() > 150 {
        return None;
    }

    let rejections = ["none", "no follow-up needed", "no follow-up necessary"];
    stripped
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !rejections.contains(&l.to_lowercase().as_str()))
        .last()
        .map(str::to_string)
}
