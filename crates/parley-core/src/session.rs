use crate::memory::ConversationMemory;
use crate::script::{InterviewScript, Question};
use crate::summary::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One recorded answer to a scripted question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question_index: usize,
    pub question: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub is_duplicate: bool,
}

/// A follow-up that was asked, and the answer once it arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRecord {
    pub question_index: usize,
    pub original_question: String,
    pub follow_up_text: String,
    #[serde(default)]
    pub response: Option<String>,
}

/// A question the candidate asked the interviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQuestion {
    pub text: String,
    pub question_index: usize,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of where an interview stands, safe to serialize for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub active: bool,
    pub complete: bool,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub responses_count: usize,
    pub follow_ups_count: usize,
}

/// All mutable state for one interview. The controller owns exactly one of
/// these; the cursor only ever moves forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: String,
    pub script: Option<InterviewScript>,
    pub sequence: Vec<Question>,
    pub cursor: usize,
    pub active: bool,
    pub complete: bool,
    pub responses: Vec<ResponseRecord>,
    pub follow_ups: Vec<FollowUpRecord>,
    pub candidate_questions: Vec<CandidateQuestion>,
    /// Previous answers per question index, for duplicate detection.
    pub previous_responses: HashMap<usize, Vec<String>>,
    /// Follow-ups already asked per question index.
    pub follow_up_counts: HashMap<usize, u32>,
    /// Whether the question currently on the table is a follow-up.
    pub awaiting_follow_up: Option<String>,
    pub memory: ConversationMemory,
    pub summary: Option<Summary>,
    pub started_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(max_history: usize) -> Self {
        InterviewSession {
            id: Uuid::new_v4().to_string(),
            script: None,
            sequence: Vec::new(),
            cursor: 0,
            active: false,
            complete: false,
            responses: Vec::new(),
            follow_ups: Vec::new(),
            candidate_questions: Vec::new(),
            previous_responses: HashMap::new(),
            follow_up_counts: HashMap::new(),
            awaiting_follow_up: None,
            memory: ConversationMemory::new(max_history),
            summary: None,
            started_at: Utc::now(),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.sequence.get(self.cursor)
    }

    pub fn next_question(&self) -> Option<&Question> {
        self.sequence.get(self.cursor + 1)
    }

    pub fn is_last_question(&self) -> bool {
        !self.sequence.is_empty() && self.cursor + 1 >= self.sequence.len()
    }

    pub fn follow_up_count(&self, question_index: usize) -> u32 {
        self.follow_up_counts.get(&question_index).copied().unwrap_or(0)
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            active: self.active,
            complete: self.complete,
            current_question_index: self.cursor,
            total_questions: self.sequence.len(),
            responses_count: self.responses.len(),
            follow_ups_count: self.follow_ups.len(),
        }
    }
}
