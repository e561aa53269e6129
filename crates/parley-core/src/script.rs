use parley_extract::{extract, FieldSpec, RecordSchema, Stage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Category a scripted question belongs to. The sequence builder interleaves
/// categories so the conversation does not dwell on one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Introduction,
    JobSpecific,
    Technical,
    CompanyFit,
    Behavioral,
    Closing,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Introduction => "introduction",
            QuestionCategory::JobSpecific => "job_specific",
            QuestionCategory::Technical => "technical",
            QuestionCategory::CompanyFit => "company_fit",
            QuestionCategory::Behavioral => "behavioral",
            QuestionCategory::Closing => "closing",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scripted interview question with the interviewer-facing metadata
/// the generator is asked to produce alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub category: QuestionCategory,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub good_answer_criteria: String,
    #[serde(default)]
    pub transition: String,
}

impl Question {
    pub fn new(category: QuestionCategory, text: impl Into<String>) -> Self {
        Question {
            category,
            text: text.into(),
            purpose: String::new(),
            good_answer_criteria: String::new(),
            transition: String::new(),
        }
    }
}

/// A full interview script as produced by the generator: opening remarks,
/// question pools per category, and closing remarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewScript {
    pub introduction: String,
    pub job_specific: Vec<Question>,
    pub technical: Vec<Question>,
    pub company_fit: Vec<Question>,
    pub behavioral: Vec<Question>,
    pub closing: String,
}

const DEFAULT_INTRODUCTION: &str =
    "Welcome to your interview. I'm excited to learn more about your background and experience.";
const DEFAULT_CLOSING: &str =
    "Thank you for your time today. We'll be in touch regarding next steps.";

impl InterviewScript {
    fn schema() -> RecordSchema {
        RecordSchema::new(vec![
            FieldSpec::text("introduction", DEFAULT_INTRODUCTION),
            FieldSpec::object("questions", Value::Object(serde_json::Map::new())),
            FieldSpec::text("closing", DEFAULT_CLOSING),
        ])
    }

    /// Build a script from free-form generator output. Recovery is total:
    /// malformed output degrades to canned defaults rather than failing.
    /// Returns the parse stage so the caller can log how much repair was
    /// needed.
    pub fn from_generator_text(text: &str) -> (InterviewScript, Stage) {
        let extraction = extract(text, &Self::schema());
        let record = extraction.record;

        let introduction = record
            .get("introduction")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INTRODUCTION)
            .to_string();
        let closing = record
            .get("closing")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CLOSING)
            .to_string();

        let empty = serde_json::Map::new();
        let questions = record
            .get("questions")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let script = InterviewScript {
            introduction,
            job_specific: category_questions(questions, QuestionCategory::JobSpecific),
            technical: category_questions(questions, QuestionCategory::Technical),
            company_fit: category_questions(questions, QuestionCategory::CompanyFit),
            behavioral: category_questions(questions, QuestionCategory::Behavioral),
            closing,
        };
        (script, extraction.stage)
    }

    /// Canned script used when generation fails outright. Demo mode keeps the
    /// script to one question per category.
    pub fn fallback(job_title: &str, demo_mode: bool) -> InterviewScript {
        let mut job_specific = vec![question_with_meta(
            QuestionCategory::JobSpecific,
            format!("Could you tell me about your experience related to {job_title}?"),
            "To understand the candidate's relevant experience",
            "Specific examples of relevant work",
        )];
        if !demo_mode {
            job_specific.push(question_with_meta(
                QuestionCategory::JobSpecific,
                "What interests you most about this position?",
                "To gauge the candidate's motivation",
                "Alignment with job responsibilities",
            ));
        }

        InterviewScript {
            introduction: format!(
                "Hello and welcome to the interview for {job_title}. \
                 Thank you for taking the time to speak with us today."
            ),
            job_specific,
            technical: vec![question_with_meta(
                QuestionCategory::Technical,
                "What technical skills do you bring to this role?",
                "To assess technical capabilities",
                "Relevant technical skills with examples",
            )],
            company_fit: vec![question_with_meta(
                QuestionCategory::CompanyFit,
                "What do you know about our company?",
                "To assess company research",
                "Knowledge of company and its values",
            )],
            behavioral: vec![question_with_meta(
                QuestionCategory::Behavioral,
                "Tell me about a challenging situation you faced at work and how you handled it.",
                "To assess problem-solving abilities",
                "Clear problem description, actions taken, and results",
            )],
            closing: DEFAULT_CLOSING.to_string(),
        }
    }

    pub fn question_count(&self) -> usize {
        // +2 for the fixed introduction and closing questions the sequence adds.
        self.job_specific.len()
            + self.technical.len()
            + self.company_fit.len()
            + self.behavioral.len()
            + 2
    }
}

fn question_with_meta(
    category: QuestionCategory,
    text: impl Into<String>,
    purpose: &str,
    criteria: &str,
) -> Question {
    Question {
        category,
        text: text.into(),
        purpose: purpose.to_string(),
        good_answer_criteria: criteria.to_string(),
        transition: String::new(),
    }
}

/// Pull one category's question list out of the parsed `questions` object.
/// Entries that are not objects or lack a usable question text are dropped;
/// an empty or missing category gets a canned stand-in so the sequence always
/// covers every category.
fn category_questions(
    questions: &serde_json::Map<String, Value>,
    category: QuestionCategory,
) -> Vec<Question> {
    let mut out = Vec::new();
    if let Some(Value::Array(items)) = questions.get(category.as_str()) {
        for item in items {
            if let Some(obj) = item.as_object() {
                let text = obj
                    .get("question")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or("");
                if text.is_empty() {
                    continue;
                }
                out.push(Question {
                    category,
                    text: text.to_string(),
                    purpose: obj
                        .get("purpose")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    good_answer_criteria: obj
                        .get("good_answer_criteria")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    transition: obj
                        .get("transition")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                });
            } else if let Some(text) = item.as_str() {
                // Some models emit a bare string list instead of objects.
                if !text.trim().is_empty() {
                    out.push(Question::new(category, text.trim()));
                }
            }
        }
    }
    if out.is_empty() {
        out.push(stand_in_question(category));
    }
    out
}

fn stand_in_question(category: QuestionCategory) -> Question {
    match category {
        QuestionCategory::JobSpecific => question_with_meta(
            category,
            "Could you tell me about your relevant experience for this position?",
            "To understand the candidate's background",
            "Specific examples that demonstrate required skills",
        ),
        QuestionCategory::Technical => question_with_meta(
            category,
            "Can you describe a technical challenge you faced recently and how you resolved it?",
            "To assess problem-solving abilities",
            "Clear problem description and effective solution",
        ),
        QuestionCategory::CompanyFit => question_with_meta(
            category,
            "What interests you most about working with our company?",
            "To gauge cultural fit",
            "Alignment with company values",
        ),
        QuestionCategory::Behavioral => question_with_meta(
            category,
            "Tell me about a time when you had to adapt to a significant change.",
            "To assess adaptability",
            "Positive attitude toward change, specific actions taken",
        ),
        QuestionCategory::Introduction | QuestionCategory::Closing => question_with_meta(
            category,
            "Could you tell me more about your experience?",
            "To learn more about the candidate",
            "Specific, relevant detail",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_script_parses_directly() {
        let text = r#"```json
        {
            "introduction": "Welcome, Ana.",
            "questions": {
                "job_specific": [
                    {"question": "Why this role?", "purpose": "motivation", "good_answer_criteria": "specifics"}
                ],
                "technical": [
                    {"question": "Describe a hard bug.", "purpose": "depth", "good_answer_criteria": "clarity"}
                ],
                "company_fit": [
                    {"question": "What do you value in a team?", "purpose": "fit", "good_answer_criteria": "alignment"}
                ],
                "behavioral": [
                    {"question": "Tell me about a conflict.", "purpose": "maturity", "good_answer_criteria": "STAR"}
                ]
            },
            "closing": "Thanks, Ana."
        }
        ```"#;
        let (script, stage) = InterviewScript::from_generator_text(text);
        assert_eq!(stage, Stage::BlockExtract);
        assert_eq!(script.introduction, "Welcome, Ana.");
        assert_eq!(script.job_specific[0].text, "Why this role?");
        assert_eq!(script.behavioral[0].category, QuestionCategory::Behavioral);
        assert_eq!(script.closing, "Thanks, Ana.");
    }

    #[test]
    fn test_missing_categories_get_stand_ins() {
        let text = r#"{"introduction": "Hi", "questions": {"technical": [{"question": "Q1"}]}, "closing": "Bye"}"#;
        let (script, _) = InterviewScript::from_generator_text(text);
        assert_eq!(script.technical[0].text, "Q1");
        assert_eq!(script.job_specific.len(), 1);
        assert!(script.job_specific[0].text.contains("relevant experience"));
        assert_eq!(script.company_fit.len(), 1);
        assert_eq!(script.behavioral.len(), 1);
    }

    #[test]
    fn test_garbage_yields_defaults_not_error() {
        let (script, stage) = InterviewScript::from_generator_text("no json here at all");
        assert_eq!(stage, Stage::Defaults);
        assert_eq!(script.introduction, DEFAULT_INTRODUCTION);
        assert_eq!(script.closing, DEFAULT_CLOSING);
        assert_eq!(script.question_count(), 6);
    }

    #[test]
    fn test_fallback_demo_trims_second_job_question() {
        let full = InterviewScript::fallback("Backend Engineer", false);
        let demo = InterviewScript::fallback("Backend Engineer", true);
        assert_eq!(full.job_specific.len(), 2);
        assert_eq!(demo.job_specific.len(), 1);
        assert!(full.introduction.contains("Backend Engineer"));
    }

    #[test]
    fn test_bare_string_questions_accepted() {
        let text = r#"{"questions": {"technical": ["What is ownership?", "Explain borrowing."]}}"#;
        let (script, _) = InterviewScript::from_generator_text(text);
        assert_eq!(script.technical.len(), 2);
        assert_eq!(script.technical[1].text, "Explain borrowing.");
    }
}
