use crate::cache::cache_key;
use crate::config::EngineConfig;
use crate::detector::ResponseClassifier;
use crate::error::EngineError;
use crate::followup::{generate_follow_up, short_response_follow_up, FollowUpOutcome};
use crate::memory::Exchange;
use crate::outcome::{StartOutput, TurnOutput};
use crate::profile::InterviewContext;
use crate::prompts::InterviewPrompts;
use crate::quality::QualityPolicy;
use crate::script::{InterviewScript, Question, QuestionCategory};
use crate::sequence::build_sequence;
use crate::session::{
    CandidateQuestion, FollowUpRecord, InterviewSession, ResponseRecord, SessionState,
};
use crate::summary::{Summary, VisualSummary};
use crate::analytics::Analytics;
use chrono::Utc;
use parley_extract::Stage;
use parley_generator::{bounded_generate, Generator, RetryGenerator};
use parley_logging::{FallbackKind, LogEvent, Logger};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;

const SIMPLE_ACKS: [&str; 5] = [
    "Thank you for your response.",
    "I appreciate your answer.",
    "Thanks for sharing that.",
    "I understand.",
    "Thanks for that perspective.",
];

const CANDIDATE_QUESTION_FALLBACK: &str =
    "That's a good question. Our company values transparency and innovation. Let's continue \
     with the interview questions.";

/// Orchestrates one interview: sequences questions, issues follow-ups,
/// intercepts candidate questions and duplicate answers, and produces the
/// closing summary. Every generation failure inside a turn degrades to
/// canned content so the candidate never sees an error.
pub struct InterviewController {
    generator: Arc<dyn Generator>,
    context: InterviewContext,
    config: EngineConfig,
    policy: QualityPolicy,
    classifier: ResponseClassifier,
    session: InterviewSession,
    logger: Arc<Logger>,
    rng: SmallRng,
    ack_cache: HashMap<String, String>,
}

impl InterviewController {
    pub fn new(
        generator: Arc<dyn Generator>,
        context: InterviewContext,
        config: EngineConfig,
        logger: Arc<Logger>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let policy = QualityPolicy::new(config.demo_mode, config.max_follow_ups as u32);
        let classifier = ResponseClassifier::new(config.similarity_threshold);
        let session = InterviewSession::new(config.max_history);
        InterviewController {
            generator,
            context,
            config,
            policy,
            classifier,
            session,
            logger,
            rng,
            ack_cache: HashMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub fn context(&self) -> &InterviewContext {
        &self.context
    }

    /// Ask the generator for a script and build the question sequence.
    /// Failures fall back to the canned script; either way the controller
    /// ends up ready to `start()`.
    pub async fn generate_script(&mut self) {
        let prompt = InterviewPrompts::script(&self.context, self.config.demo_mode);
        let retry = RetryGenerator::new(Arc::clone(&self.generator));
        let script = match retry.generate(&prompt, 2048, 0.7).await {
            Ok(text) => {
                let (script, stage) = InterviewScript::from_generator_text(&text);
                if stage == Stage::Defaults {
                    self.logger.log(&LogEvent::GenerationFallback {
                        question_index: 0,
                        kind: FallbackKind::Script,
                        reason: "script output had no extractable structure".to_string(),
                    });
                    InterviewScript::fallback(&self.context.job.title, self.config.demo_mode)
                } else {
                    script
                }
            }
            Err(err) => {
                self.logger.log(&LogEvent::GenerationFallback {
                    question_index: 0,
                    kind: FallbackKind::Script,
                    reason: err.to_string(),
                });
                InterviewScript::fallback(&self.context.job.title, self.config.demo_mode)
            }
        };
        self.session.sequence = build_sequence(&script);
        self.session.script = Some(script);
    }

    /// Install a pre-built script, for callers that generate it elsewhere.
    pub fn set_script(&mut self, script: InterviewScript) {
        self.session.sequence = build_sequence(&script);
        self.session.script = Some(script);
    }

    /// Begin the interview: returns the introduction and the first question.
    pub fn start(&mut self) -> Result<StartOutput, EngineError> {
        if self.session.complete {
            return Err(EngineError::AlreadyComplete);
        }
        let script = self.session.script.as_ref().ok_or(EngineError::NotInitialized)?;
        let introduction = script.introduction.clone();

        self.session.active = true;
        self.session.cursor = 0;
        self.session.responses.clear();
        self.session.follow_ups.clear();
        self.session.started_at = Utc::now();

        let first = self
            .session
            .current_question()
            .ok_or(EngineError::NotInitialized)?;

        self.logger.log(&LogEvent::InterviewStarted {
            session_id: self.session.id.clone(),
            total_questions: self.session.sequence.len(),
            demo_mode: self.config.demo_mode,
        });

        Ok(StartOutput {
            introduction,
            transition: first.transition.clone(),
            question: first.text.clone(),
            question_number: 1,
            total_questions: self.session.sequence.len(),
        })
    }

    /// Process one candidate response. This is the state machine's core
    /// transition; the cursor never moves backward, and a completed session
    /// returns the same completion output on every further call.
    pub async fn submit_response(&mut self, text: &str) -> Result<TurnOutput, EngineError> {
        if self.session.complete {
            return Ok(self.completion_output());
        }
        if !self.session.active {
            return Err(EngineError::NotInitialized);
        }

        let Some(current) = self.session.current_question().cloned() else {
            // Cursor ran past the sequence without completing; recover
            // deterministically rather than surfacing an error.
            self.logger.log(&LogEvent::ErrorEncountered {
                question_index: self.session.cursor,
                error: "no question at cursor".to_string(),
            });
            return Ok(self.fallback_advance().await);
        };

        let cursor = self.session.cursor;
        self.session.responses.push(ResponseRecord {
            question_index: cursor,
            question: current.text.clone(),
            response: text.to_string(),
            timestamp: Utc::now(),
            is_duplicate: false,
        });
        self.logger.log(&LogEvent::ResponseReceived {
            question_index: cursor,
            category: current.category.to_string(),
            word_count: text.split_whitespace().count(),
        });

        // Candidate questions are answered in place; the cursor stays put.
        if self.classifier.is_candidate_question(text, &self.generator).await {
            return Ok(self.answer_candidate_question(text, &current).await);
        }

        self.session.memory.add_exchange(&current, text, false);

        let previous = self
            .session
            .previous_responses
            .entry(cursor)
            .or_default();
        if let Some(similarity) = self.classifier.find_duplicate(text, previous) {
            if let Some(record) = self.session.responses.last_mut() {
                record.is_duplicate = true;
            }
            self.logger.log(&LogEvent::DuplicateDetected {
                question_index: cursor,
                similarity,
            });
            // A repeated answer gets no follow-up; move the interview along.
            return Ok(self
                .advance(Some("Thank you for your response.".to_string()))
                .await);
        }
        previous.push(text.to_string());

        let follow_up_count = self.session.follow_up_count(cursor);
        let wants_follow_up = self
            .policy
            .should_follow_up(text, &current, follow_up_count, &self.generator, &mut self.rng)
            .await;
        if let Some((score, cached)) = self.policy.last_score() {
            self.logger.log(&LogEvent::QualityScored {
                question_index: cursor,
                score,
                cached,
            });
        }

        if !wants_follow_up {
            return Ok(self.advance_with_acknowledgment(&current, text).await);
        }

        // Very short answers get a canned elaboration prompt instead of a
        // generated follow-up.
        if text.split_whitespace().count() < 20 {
            return Ok(self.issue_follow_up(&current, text, short_response_follow_up()));
        }

        match generate_follow_up(
            Arc::clone(&self.generator),
            &current,
            text,
            self.config.follow_up_timeout,
        )
        .await
        {
            FollowUpOutcome::Generated { text: follow_up } => {
                Ok(self.issue_follow_up(&current, text, follow_up))
            }
            FollowUpOutcome::NotNeeded => Ok(self.advance_with_acknowledgment(&current, text).await),
            FollowUpOutcome::Failed => {
                self.logger.log(&LogEvent::GenerationFallback {
                    question_index: cursor,
                    kind: FallbackKind::FollowUp,
                    reason: "follow-up generation failed".to_string(),
                });
                Ok(self
                    .advance(Some(
                        "Thank you for sharing that information. Let's move on to the next \
                         question."
                            .to_string(),
                    ))
                    .await)
            }
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.session.summary.as_ref()
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    /// Evaluation summary for the interview so far. Requires at least one
    /// response unless the interview is being cut short.
    pub async fn generate_summary(
        &mut self,
        early_termination: bool,
    ) -> Result<Summary, EngineError> {
        if self.session.responses.is_empty() && !early_termination {
            return Err(EngineError::NoResponses);
        }

        let prompt = InterviewPrompts::summary(
            &self.context,
            &self.session.responses,
            &self.session.memory,
            early_termination,
        );
        let retry = RetryGenerator::new(Arc::clone(&self.generator));
        let summary = match retry.generate(&prompt, 2048, 0.5).await {
            Ok(text) => {
                let (summary, stage) = Summary::from_generator_text(&text, &self.context);
                if stage == Stage::Defaults {
                    self.logger.log(&LogEvent::GenerationFallback {
                        question_index: self.session.cursor,
                        kind: FallbackKind::Summary,
                        reason: "summary output had no extractable structure".to_string(),
                    });
                    Summary::minimal(&self.context, self.session.responses.len(), early_termination)
                } else {
                    summary
                }
            }
            Err(err) => {
                self.logger.log(&LogEvent::GenerationFallback {
                    question_index: self.session.cursor,
                    kind: FallbackKind::Summary,
                    reason: err.to_string(),
                });
                Summary::minimal(&self.context, self.session.responses.len(), early_termination)
            }
        };

        self.logger.log(&LogEvent::SummaryGenerated {
            session_id: self.session.id.clone(),
            recommendation: summary.recommendation.clone(),
        });
        self.session.summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn visual_summary(&self) -> Option<VisualSummary> {
        self.session
            .summary
            .as_ref()
            .map(|s| VisualSummary::from_summary(s, &self.context))
    }

    pub fn analytics(&self) -> Analytics {
        Analytics::collect(
            &self.session,
            &self.context.candidate.name,
            &self.context.job.title,
        )
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.session.memory.history()
    }

    async fn answer_candidate_question(&mut self, text: &str, current: &Question) -> TurnOutput {
        let cursor = self.session.cursor;
        self.session.candidate_questions.push(CandidateQuestion {
            text: text.to_string(),
            question_index: cursor,
            timestamp: Utc::now(),
        });
        let asked = Question::new(current.category, text);
        self.session.memory.add_exchange(&asked, "", true);
        self.logger.log(&LogEvent::CandidateQuestionDetected {
            question_index: cursor,
        });

        let prompt = InterviewPrompts::candidate_question(
            &self.context,
            text,
            &self.session.memory.conversation_context(),
        );
        let answer = match self.generator.generate(&prompt, 300, 0.7).await {
            Ok(reply) => {
                let cleaned = reply.trim().trim_matches(['"', '\'', '`']).to_string();
                if cleaned.is_empty() {
                    self.log_fallback(FallbackKind::QuestionAnswer, "empty answer");
                    CANDIDATE_QUESTION_FALLBACK.to_string()
                } else {
                    cleaned
                }
            }
            Err(err) => {
                self.log_fallback(FallbackKind::QuestionAnswer, &err.to_string());
                CANDIDATE_QUESTION_FALLBACK.to_string()
            }
        };

        TurnOutput::Active {
            acknowledgment: Some(answer),
            transition: None,
            question: current.text.clone(),
            is_follow_up: self.session.awaiting_follow_up.is_some(),
            question_number: cursor + 1,
            total_questions: self.session.sequence.len(),
        }
    }

    fn issue_follow_up(
        &mut self,
        current: &Question,
        response: &str,
        follow_up: String,
    ) -> TurnOutput {
        let cursor = self.session.cursor;
        *self.session.follow_up_counts.entry(cursor).or_insert(0) += 1;
        self.session.follow_ups.push(FollowUpRecord {
            question_index: cursor,
            original_question: current.text.clone(),
            follow_up_text: follow_up.clone(),
            response: Some(response.to_string()),
        });
        self.session.awaiting_follow_up = Some(follow_up.clone());
        self.logger.log(&LogEvent::FollowUpIssued {
            question_index: cursor,
            follow_up_count: self.session.follow_up_count(cursor) as usize,
        });

        TurnOutput::Active {
            acknowledgment: Some(SIMPLE_ACKS[self.rng.gen_range(0..SIMPLE_ACKS.len())].to_string()),
            transition: None,
            question: follow_up,
            is_follow_up: true,
            question_number: cursor + 1,
            total_questions: self.session.sequence.len(),
        }
    }

    async fn advance_with_acknowledgment(&mut self, current: &Question, response: &str) -> TurnOutput {
        let acknowledgment = self.acknowledge(current, response).await;
        self.advance(Some(acknowledgment)).await
    }

    /// Move the cursor forward. Past the end of the sequence the interview
    /// completes and the summary is produced.
    async fn advance(&mut self, acknowledgment: Option<String>) -> TurnOutput {
        let previous = self.session.current_question().cloned();
        self.session.awaiting_follow_up = None;
        self.session.cursor += 1;

        if self.session.cursor >= self.session.sequence.len() {
            return self.complete_interview(false).await;
        }

        let next = self.session.sequence[self.session.cursor].clone();
        let transition = match previous {
            Some(prev) => self.contextual_transition(&prev, &next).await,
            None => next.transition.clone(),
        };
        self.logger.log(&LogEvent::QuestionAdvanced {
            question_index: self.session.cursor,
            category: next.category.to_string(),
        });

        TurnOutput::Active {
            acknowledgment,
            transition: Some(transition),
            question: next.text.clone(),
            is_follow_up: false,
            question_number: self.session.cursor + 1,
            total_questions: self.session.sequence.len(),
        }
    }

    async fn complete_interview(&mut self, early_termination: bool) -> TurnOutput {
        self.session.active = false;
        self.session.complete = true;

        if self.session.summary.is_none() {
            // NoResponses cannot occur here: completion follows at least one
            // recorded response, and early termination waives the check.
            if let Err(err) = self.generate_summary(early_termination).await {
                self.logger.log(&LogEvent::ErrorEncountered {
                    question_index: self.session.cursor,
                    error: err.to_string(),
                });
                self.session.summary = Some(Summary::minimal(
                    &self.context,
                    self.session.responses.len(),
                    early_termination,
                ));
            }
        }

        self.logger.log(&LogEvent::InterviewCompleted {
            session_id: self.session.id.clone(),
            responses: self.session.responses.len(),
            follow_ups: self.session.follow_ups.len(),
        });

        self.completion_output()
    }

    fn completion_output(&self) -> TurnOutput {
        let closing = self
            .session
            .script
            .as_ref()
            .map(|s| s.closing.clone())
            .unwrap_or_else(|| {
                "Thank you for your time today. We'll be in touch with next steps.".to_string()
            });
        let summary = self.session.summary.clone().unwrap_or_else(|| {
            Summary::minimal(&self.context, self.session.responses.len(), false)
        });
        TurnOutput::Complete {
            closing_remarks: closing,
            summary: Box::new(summary),
        }
    }

    /// Acknowledgment for a substantive answer: short answers get a canned
    /// phrase, longer ones a bounded-time generated acknowledgment with a
    /// per-response cache and category fallbacks.
    async fn acknowledge(&mut self, question: &Question, response: &str) -> String {
        let words = response.split_whitespace().count();
        if words < 15 {
            return SIMPLE_ACKS[self.rng.gen_range(0..SIMPLE_ACKS.len())].to_string();
        }

        let key = cache_key(&["acknowledgment", response, &question.text]);
        if let Some(cached) = self.ack_cache.get(&key) {
            return cached.clone();
        }

        let prompt =
            InterviewPrompts::acknowledgment(&question.text, question.category.as_str(), response);
        match bounded_generate(
            Arc::clone(&self.generator),
            prompt,
            60,
            0.7,
            self.config.ack_timeout,
        )
        .await
        {
            Ok(raw) => {
                let mut ack = raw.trim().trim_matches(['"', '\'']).trim().to_string();
                if ack.split_whitespace().count() > 25 {
                    ack = truncate_to_sentences(&ack, 2);
                }
                if ack.is_empty() {
                    self.log_fallback(FallbackKind::Acknowledgment, "empty acknowledgment");
                    return self.fallback_acknowledgment(question, response);
                }
                self.ack_cache.insert(key, ack.clone());
                ack
            }
            Err(err) => {
                self.log_fallback(FallbackKind::Acknowledgment, &err.to_string());
                self.fallback_acknowledgment(question, response)
            }
        }
    }

    fn fallback_acknowledgment(&mut self, question: &Question, response: &str) -> String {
        let options: [&str; 3] = match question.category {
            QuestionCategory::Introduction => [
                "Thank you for sharing that background information.",
                "I appreciate you giving us that overview.",
                "That's helpful context about your experience.",
            ],
            QuestionCategory::JobSpecific => [
                "Thank you for sharing those insights about your experience.",
                "I appreciate your detailed explanation of your relevant background.",
                "That's valuable information about your skills in this area.",
            ],
            QuestionCategory::Technical => [
                "Thanks for explaining your approach to that technical challenge.",
                "I appreciate your technical perspective on that topic.",
                "That's a helpful explanation of your technical expertise.",
            ],
            QuestionCategory::CompanyFit => [
                "Thank you for sharing your thoughts on our company culture.",
                "I appreciate your perspective on how you might fit with our team.",
                "That's helpful to understand your alignment with our values.",
            ],
            QuestionCategory::Behavioral => [
                "Thank you for sharing that experience with me.",
                "I appreciate the detailed example from your past work.",
                "That's a helpful illustration of how you handle those situations.",
            ],
            QuestionCategory::Closing => [
                "Thank you for your thoughtful questions.",
                "I appreciate your interest in our company.",
                "Thank you for all your insights throughout this interview.",
            ],
        };

        let words = response.split_whitespace().count();
        if words > 100 {
            format!("{} That was a very comprehensive answer.", options[0])
        } else if words > 50 {
            options[0].to_string()
        } else {
            options[self.rng.gen_range(0..options.len())].to_string()
        }
    }

    /// Conversational bridge into the next question, generated from memory
    /// context. Too-short or failed generations fall back to the scripted
    /// transition.
    async fn contextual_transition(&mut self, current: &Question, next: &Question) -> String {
        let prompt = self.session.memory.contextual_prompt(current, next);
        match bounded_generate(
            Arc::clone(&self.generator),
            prompt,
            80,
            0.7,
            self.config.ack_timeout,
        )
        .await
        {
            Ok(text) => {
                let cleaned = text.trim().trim_matches(['"', '\'']).trim().to_string();
                if cleaned.len() < 10 {
                    self.log_fallback(FallbackKind::Transition, "transition too short");
                    self.scripted_transition(next)
                } else {
                    cleaned
                }
            }
            Err(err) => {
                self.log_fallback(FallbackKind::Transition, &err.to_string());
                self.scripted_transition(next)
            }
        }
    }

    fn scripted_transition(&self, next: &Question) -> String {
        if next.transition.is_empty() {
            "Let's move on to the next question.".to_string()
        } else {
            next.transition.clone()
        }
    }

    fn log_fallback(&self, kind: FallbackKind, reason: &str) {
        self.logger.log(&LogEvent::GenerationFallback {
            question_index: self.session.cursor,
            kind,
            reason: reason.to_string(),
        });
    }

    /// Last-resort recovery used when turn state is inconsistent: advance
    /// deterministically, or close the interview, or hand out a hardcoded
    /// question when even the sequence is gone.
    async fn fallback_advance(&mut self) -> TurnOutput {
        if self.session.sequence.is_empty() {
            return TurnOutput::Active {
                acknowledgment: Some("I appreciate your patience. Let's continue.".to_string()),
                transition: None,
                question: "Could you tell me more about your experience?".to_string(),
                is_follow_up: false,
                question_number: 1,
                total_questions: 1,
            };
        }

        self.session.cursor += 1;
        if self.session.cursor < self.session.sequence.len() {
            let next = &self.session.sequence[self.session.cursor];
            TurnOutput::Active {
                acknowledgment: Some("Thank you. Let's move to the next question.".to_string()),
                transition: None,
                question: next.text.clone(),
                is_follow_up: false,
                question_number: self.session.cursor + 1,
                total_questions: self.session.sequence.len(),
            }
        } else {
            self.complete_interview(true).await
        }
    }
}

fn truncate_to_sentences(text: &str, count: usize) -> String {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(count)
        .collect();
    if sentences.is_empty() {
        text.to_string()
    } else {
        format!("{}.", sentences.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_sentences() {
        let text = "First thought. Second thought! Third thought? Fourth.";
        assert_eq!(
            truncate_to_sentences(text, 2),
            "First thought. Second thought."
        );
        assert_eq!(truncate_to_sentences("no punctuation", 2), "no punctuation.");
    }
}
