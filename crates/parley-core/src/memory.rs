use crate::script::{Question, QuestionCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const TECH_TERMS: [&str; 17] = [
    "python",
    "javascript",
    "react",
    "node",
    "aws",
    "cloud",
    "api",
    "database",
    "sql",
    "nosql",
    "frontend",
    "backend",
    "fullstack",
    "devops",
    "agile",
    "machine learning",
    "ai",
];

const HESITATION_WORDS: [&str; 6] = ["um", "uh", "like", "you know", "sort of", "kind of"];

const DEPTH_INDICATORS: [&str; 7] = [
    "implemented",
    "designed",
    "developed",
    "architected",
    "because",
    "in order to",
    "specifically",
];

const EXPERIENCE_TERMS: [&str; 6] =
    ["experience", "worked on", "project", "role", "position", "job"];

/// One question/answer turn retained in conversation memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub category: Option<QuestionCategory>,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub is_candidate_question: bool,
}

/// Bounded conversation history plus lightweight observations about the
/// candidate: topics they reference, communication style counters, and
/// per-category insight counters. Fed into transition and summary prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    history: VecDeque<Exchange>,
    max_history: usize,
    topics: BTreeSet<String>,
    style: BTreeMap<String, u32>,
    insights: BTreeMap<String, u32>,
}

impl ConversationMemory {
    pub fn new(max_history: usize) -> Self {
        ConversationMemory {
            history: VecDeque::new(),
            max_history,
            topics: BTreeSet::new(),
            style: BTreeMap::new(),
            insights: BTreeMap::new(),
        }
    }

    /// Record a turn. Oldest exchanges fall off once the bound is hit.
    /// Candidate questions are kept in history for context but do not feed
    /// the insight counters.
    pub fn add_exchange(&mut self, question: &Question, response: &str, is_candidate_question: bool) {
        self.history.push_back(Exchange {
            question: question.text.clone(),
            category: Some(question.category),
            response: response.to_string(),
            timestamp: Utc::now(),
            is_candidate_question,
        });
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        if !is_candidate_question {
            self.update_insights(response, question.category);
        }
    }

    fn update_insights(&mut self, response: &str, category: QuestionCategory) {
        let lower = response.to_lowercase();
        self.extract_topics(&lower);
        self.analyze_style(response, &lower);
        match category {
            QuestionCategory::Technical => self.analyze_technical(&lower),
            QuestionCategory::Behavioral => self.analyze_behavioral(&lower),
            QuestionCategory::JobSpecific => self.analyze_job_specific(&lower),
            _ => {}
        }
    }

    fn extract_topics(&mut self, lower: &str) {
        for term in TECH_TERMS {
            if contains_word(lower, term) {
                self.topics.insert(term.to_string());
            }
        }
    }

    fn analyze_style(&mut self, response: &str, lower: &str) {
        let words = response.split_whitespace().count();
        if words < 15 {
            *self.style.entry("concise".to_string()).or_insert(0) += 1;
        } else if words > 100 {
            *self.style.entry("verbose".to_string()).or_insert(0) += 1;
        }

        let jargon = self.topics.iter().filter(|t| lower.contains(t.as_str())).count();
        if jargon > 3 {
            *self.style.entry("technical".to_string()).or_insert(0) += 1;
        }

        let hesitations = HESITATION_WORDS.iter().filter(|w| lower.contains(*w)).count();
        if hesitations > 3 {
            *self.style.entry("hesitant".to_string()).or_insert(0) += 1;
        }
    }

    fn analyze_technical(&mut self, lower: &str) {
        let depth = DEPTH_INDICATORS.iter().filter(|i| lower.contains(*i)).count();
        if depth > 2 {
            *self.insights.entry("technical_depth".to_string()).or_insert(0) += 1;
        }
    }

    fn analyze_behavioral(&mut self, lower: &str) {
        let situation = ["situation", "context", "background", "when i"]
            .iter()
            .any(|t| lower.contains(t));
        let task = ["task", "goal", "objective", "needed to", "had to"]
            .iter()
            .any(|t| lower.contains(t));
        let action = ["action", "approach", "did", "implemented", "executed"]
            .iter()
            .any(|t| lower.contains(t));
        let result = ["result", "outcome", "impact", "learned", "accomplished"]
            .iter()
            .any(|t| lower.contains(t));
        let components = [situation, task, action, result].iter().filter(|b| **b).count();
        if components >= 3 {
            *self
                .insights
                .entry("structured_responses".to_string())
                .or_insert(0) += 1;
        }
    }

    fn analyze_job_specific(&mut self, lower: &str) {
        if EXPERIENCE_TERMS.iter().any(|t| lower.contains(*t)) {
            *self
                .insights
                .entry("relevant_experience".to_string())
                .or_insert(0) += 1;
        }
    }

    /// Prompt text for generating a natural transition between questions,
    /// seeded with the last few exchanges and accumulated observations.
    pub fn contextual_prompt(&self, current: &Question, next: &Question) -> String {
        let mut prompt = String::from("Based on the conversation so far:\n");
        let start = self.history.len().saturating_sub(3);
        for exchange in self.history.iter().skip(start) {
            prompt.push_str(&format!("Q: {}\n", exchange.question));
            prompt.push_str(&format!("A: {}\n\n", exchange.response));
        }

        prompt.push_str("Candidate insights:\n");
        if !self.topics.is_empty() {
            let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();
            prompt.push_str(&format!("- Topics mentioned: {}\n", topics.join(", ")));
        }
        if let Some(style) = self.dominant_style() {
            prompt.push_str(&format!("- Communication style: {style}\n"));
        }
        for (insight, count) in &self.insights {
            if *count > 0 {
                prompt.push_str(&format!(
                    "- {}: {} instances\n",
                    title_case(insight),
                    count
                ));
            }
        }

        prompt.push_str(&format!("\nCurrent question: {}\n", current.text));
        prompt.push_str(&format!("Next question: {}\n", next.text));
        prompt.push_str(
            "\nPlease create a natural, conversational transition between these questions that \
             acknowledges the candidate's previous response and flows naturally into the next \
             question.",
        );
        prompt
    }

    /// Recent exchanges rendered as plain text, used when answering a
    /// question the candidate asked.
    pub fn conversation_context(&self) -> String {
        let start = self.history.len().saturating_sub(5);
        let mut out = String::new();
        for exchange in self.history.iter().skip(start) {
            out.push_str(&format!("Interviewer: {}\n", exchange.question));
            out.push_str(&format!("Candidate: {}\n", exchange.response));
        }
        out
    }

    pub fn recent_topics(&self) -> Vec<String> {
        self.topics.iter().cloned().collect()
    }

    pub fn dominant_style(&self) -> Option<&str> {
        self.style
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(style, _)| style.as_str())
    }

    pub fn insights(&self) -> &BTreeMap<String, u32> {
        &self.insights
    }

    pub fn history(&self) -> impl Iterator<Item = &Exchange> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let left_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let right_ok = end == haystack.len() || !bytes[end].is_ascii_alphanumeric();
        if left_ok && right_ok {
            return true;
        }
        from = start + 1;
    }
    false
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::QuestionCategory;

    fn q(category: QuestionCategory) -> Question {
        Question::new(category, "Tell me about your work.")
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut memory = ConversationMemory::new(3);
        for i in 0..5 {
            memory.add_exchange(&q(QuestionCategory::JobSpecific), &format!("answer {i}"), false);
        }
        assert_eq!(memory.len(), 3);
        let first = memory.history().next().map(|e| e.response.clone());
        assert_eq!(first.as_deref(), Some("answer 2"));
    }

    #[test]
    fn test_topics_match_whole_words_only() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange(
            &q(QuestionCategory::Technical),
            "I use Python and therapist tools",
            false,
        );
        let topics = memory.recent_topics();
        assert!(topics.contains(&"python".to_string()));
        // "api" inside "therapist" must not count.
        assert!(!topics.contains(&"api".to_string()));
    }

    #[test]
    fn test_style_counters() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange(&q(QuestionCategory::JobSpecific), "Short answer.", false);
        assert_eq!(memory.dominant_style(), Some("concise"));
    }

    #[test]
    fn test_behavioral_star_insight() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange(
            &q(QuestionCategory::Behavioral),
            "The situation was a failing deploy, my task was to fix it, and the result was \
             a stable release.",
            false,
        );
        assert_eq!(memory.insights().get("structured_responses"), Some(&1));
    }

    #[test]
    fn test_candidate_questions_skip_insights() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange(
            &q(QuestionCategory::JobSpecific),
            "I have experience with projects",
            true,
        );
        assert!(memory.insights().is_empty());
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_contextual_prompt_includes_recent_exchanges() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange(&q(QuestionCategory::Technical), "I built APIs in Python", false);
        let current = q(QuestionCategory::Technical);
        let next = Question::new(QuestionCategory::Behavioral, "Tell me about a conflict.");
        let prompt = memory.contextual_prompt(&current, &next);
        assert!(prompt.contains("I built APIs in Python"));
        assert!(prompt.contains("Next question: Tell me about a conflict."));
    }
}
