//! # parley-core
//!
//! The interview dialogue engine: a question-sequencing state machine that
//! stays coherent against an unreliable text generator. Every generated
//! artifact (script, follow-up, acknowledgment, summary) passes through
//! parley-extract before it is trusted, and every optional step degrades to
//! deterministic content rather than surfacing an error to the candidate.

mod analytics;
mod cache;
mod config;
mod controller;
mod detector;
mod error;
mod followup;
mod memory;
mod outcome;
mod profile;
mod prompts;
mod quality;
mod script;
mod sequence;
mod session;
mod summary;

pub use analytics::Analytics;
pub use config::EngineConfig;
pub use controller::InterviewController;
pub use detector::ResponseClassifier;
pub use error::EngineError;
pub use followup::FollowUpOutcome;
pub use memory::{ConversationMemory, Exchange};
pub use outcome::{StartOutput, TurnOutput};
pub use profile::{CandidateProfile, CompanyProfile, InterviewContext, JobSpec};
pub use prompts::InterviewPrompts;
pub use quality::QualityPolicy;
pub use script::{InterviewScript, Question, QuestionCategory};
pub use sequence::build_sequence;
pub use session::{
    CandidateQuestion, FollowUpRecord, InterviewSession, ResponseRecord, SessionState,
};
pub use summary::{ScoredItem, SkillRating, Summary, VisualSummary};
