use crate::script::QuestionCategory;
use crate::session::InterviewSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reporting rollup of one interview, derived entirely from session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub session_id: String,
    pub candidate_name: String,
    pub position: String,
    pub duration_secs: i64,
    pub question_count: usize,
    pub response_count: usize,
    pub follow_up_count: usize,
    pub candidate_questions: usize,
    pub question_categories: BTreeMap<QuestionCategory, usize>,
    pub avg_response_words: f64,
    pub key_topics: Vec<String>,
    pub communication_style: Option<String>,
}

impl Analytics {
    pub fn collect(session: &InterviewSession, candidate_name: &str, position: &str) -> Analytics {
        let mut categories: BTreeMap<QuestionCategory, usize> = BTreeMap::new();
        for question in &session.sequence {
            *categories.entry(question.category).or_insert(0) += 1;
        }

        let duration_secs = match (session.responses.first(), session.responses.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_seconds(),
            _ => 0,
        };

        let avg_response_words = if session.responses.is_empty() {
            0.0
        } else {
            let total: usize = session
                .responses
                .iter()
                .map(|r| r.response.split_whitespace().count())
                .sum();
            total as f64 / session.responses.len() as f64
        };

        Analytics {
            session_id: session.id.clone(),
            candidate_name: candidate_name.to_string(),
            position: position.to_string(),
            duration_secs,
            question_count: session.sequence.len(),
            response_count: session.responses.len(),
            follow_up_count: session.follow_ups.len(),
            candidate_questions: session.candidate_questions.len(),
            question_categories: categories,
            avg_response_words,
            key_topics: session.memory.recent_topics(),
            communication_style: session.memory.dominant_style().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Question;
    use crate::session::ResponseRecord;
    use chrono::Utc;

    #[test]
    fn test_collect_counts_and_averages() {
        let mut session = InterviewSession::new(10);
        session.sequence = vec![
            Question::new(QuestionCategory::Introduction, "a"),
            Question::new(QuestionCategory::Technical, "b"),
            Question::new(QuestionCategory::Technical, "c"),
        ];
        session.responses.push(ResponseRecord {
            question_index: 0,
            question: "a".to_string(),
            response: "one two three four".to_string(),
            timestamp: Utc::now(),
            is_duplicate: false,
        });
        session.responses.push(ResponseRecord {
            question_index: 1,
            question: "b".to_string(),
            response: "one two".to_string(),
            timestamp: Utc::now(),
            is_duplicate: false,
        });

        let analytics = Analytics::collect(&session, "Ana", "Backend Engineer");
        assert_eq!(analytics.response_count, 2);
        assert_eq!(analytics.question_count, 3);
        assert_eq!(
            analytics.question_categories.get(&QuestionCategory::Technical),
            Some(&2)
        );
        assert!((analytics.avg_response_words - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_session_yields_zeroes() {
        let session = InterviewSession::new(10);
        let analytics = Analytics::collect(&session, "Ana", "Role");
        assert_eq!(analytics.duration_secs, 0);
        assert_eq!(analytics.avg_response_words, 0.0);
        assert!(analytics.key_topics.is_empty());
    }
}
