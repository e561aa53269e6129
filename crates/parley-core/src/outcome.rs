use crate::summary::Summary;
use serde::{Deserialize, Serialize};

/// What the caller shows when the interview opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOutput {
    pub introduction: String,
    pub transition: String,
    pub question: String,
    pub question_number: usize,
    pub total_questions: usize,
}

/// Result of submitting one candidate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutput {
    /// The interview continues with the given question.
    Active {
        #[serde(skip_serializing_if = "Option::is_none")]
        acknowledgment: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transition: Option<String>,
        question: String,
        is_follow_up: bool,
        question_number: usize,
        total_questions: usize,
    },
    /// The interview is over; repeated submissions return this again.
    Complete {
        closing_remarks: String,
        summary: Box<Summary>,
    },
}

impl TurnOutput {
    pub fn is_complete(&self) -> bool {
        matches!(self, TurnOutput::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_serializes_with_status_tag() {
        let output = TurnOutput::Active {
            acknowledgment: None,
            transition: Some("Moving on.".to_string()),
            question: "Next?".to_string(),
            is_follow_up: false,
            question_number: 2,
            total_questions: 6,
        };
        let value = serde_json::to_value(&output).expect("serialize");
        assert_eq!(value["status"], "active");
        assert_eq!(value["question_number"], 2);
        assert!(value.get("acknowledgment").is_none());
    }
}
