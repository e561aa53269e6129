use crate::cache::cache_key;
use parley_generator::Generator;
use similar::TextDiff;
use std::collections::HashMap;
use std::sync::Arc;

const QUESTION_PHRASES: [&str; 18] = [
    "i have a question",
    "can you tell me",
    "could you explain",
    "tell me about",
    "what is",
    "how do you",
    "who is",
    "when will",
    "why do",
    "where is",
    "is there",
    "are there",
    "will you",
    "could you",
    "would it be",
    "do you know",
    "i wonder if",
    "i'd like to know",
];

/// Classifies candidate input: detects when a "response" is actually a
/// question aimed at the interviewer, and when it repeats an earlier answer.
pub struct ResponseClassifier {
    similarity_threshold: f64,
    verdict_cache: HashMap<String, bool>,
}

impl ResponseClassifier {
    pub fn new(similarity_threshold: f64) -> Self {
        ResponseClassifier {
            similarity_threshold,
            verdict_cache: HashMap::new(),
        }
    }

    /// Staged question detection: a trailing question mark is taken at face
    /// value, then a phrase list, then (for longer text only) a yes/no check
    /// against the generator. Generator failures classify as not-a-question
    /// so the interview keeps moving.
    pub async fn is_candidate_question(
        &mut self,
        text: &str,
        generator: &Arc<dyn Generator>,
    ) -> bool {
        let normalized = text.trim().to_lowercase();
        if normalized.ends_with('?') {
            return true;
        }
        if QUESTION_PHRASES.iter().any(|p| normalized.contains(p)) {
            return true;
        }
        if normalized.split_whitespace().count() <= 15 {
            return false;
        }

        let key = cache_key(&["question_detection", &normalized]);
        if let Some(verdict) = self.verdict_cache.get(&key) {
            return *verdict;
        }

        let prompt = format!(
            "Determine if the following text contains a question from a job candidate to an \
             interviewer.\nAnswer with only \"Yes\" or \"No\".\n\nText: \"{normalized}\""
        );
        let verdict = match generator.generate(&prompt, 5, 0.0).await {
            Ok(answer) => answer.trim().eq_ignore_ascii_case("yes"),
            Err(err) => {
                tracing::warn!(error = %err, "question detection call failed");
                false
            }
        };
        self.verdict_cache.insert(key, verdict);
        verdict
    }

    /// Compare against every previous answer to the same question and return
    /// the similarity ratio of the first match above the threshold.
    pub fn find_duplicate(&self, text: &str, previous: &[String]) -> Option<f64> {
        let normalized = text.trim().to_lowercase();
        for prior in previous {
            let prior_normalized = prior.trim().to_lowercase();
            let ratio = TextDiff::from_chars(normalized.as_str(), prior_normalized.as_str()).ratio();
            if f64::from(ratio) > self.similarity_threshold {
                return Some(f64::from(ratio));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_generator::ScriptedGenerator;

    fn scripted(replies: Vec<parley_generator::ScriptedReply>) -> Arc<dyn Generator> {
        Arc::new(ScriptedGenerator::new(replies))
    }

    #[tokio::test]
    async fn test_question_mark_detected_without_generator_call() {
        let generator = scripted(vec![]);
        let mut classifier = ResponseClassifier::new(0.8);
        assert!(
            classifier
                .is_candidate_question("What does the team look like?", &generator)
                .await
        );
    }

    #[tokio::test]
    async fn test_phrase_detected() {
        let generator = scripted(vec![]);
        let mut classifier = ResponseClassifier::new(0.8);
        assert!(
            classifier
                .is_candidate_question("I have a question about the role", &generator)
                .await
        );
    }

    #[tokio::test]
    async fn test_short_statement_is_not_a_question() {
        let generator = scripted(vec![]);
        let mut classifier = ResponseClassifier::new(0.8);
        assert!(
            !classifier
                .is_candidate_question("I worked at a startup", &generator)
                .await
        );
    }

    #[tokio::test]
    async fn test_long_ambiguous_text_asks_generator_and_caches() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            parley_generator::ScriptedReply::text("Yes"),
        ]));
        let trait_obj: Arc<dyn Generator> = generator.clone();
        let mut classifier = ResponseClassifier::new(0.8);
        let text = "I was wondering about the general structure of the engineering \
                    organization and whether teams rotate between projects over time";
        assert!(classifier.is_candidate_question(text, &trait_obj).await);
        // The second call must come from the cache, not the exhausted script.
        assert!(classifier.is_candidate_question(text, &trait_obj).await);
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_generator_failure_classifies_as_statement() {
        let generator = scripted(vec![parley_generator::ScriptedReply::failure("down")]);
        let mut classifier = ResponseClassifier::new(0.8);
        let text = "Over the last several years I have been responsible for building \
                    distributed systems across a number of different product areas";
        assert!(!classifier.is_candidate_question(text, &generator).await);
    }

    #[test]
    fn test_duplicate_detection() {
        let classifier = ResponseClassifier::new(0.8);
        let previous = vec!["I worked on backend systems for five years".to_string()];
        assert!(classifier
            .find_duplicate("I worked on backend systems for five years", &previous)
            .is_some());
        assert!(classifier
            .find_duplicate("My main interest is frontend animation work", &previous)
            .is_none());
    }

    #[test]
    fn test_duplicate_is_case_insensitive() {
        let classifier = ResponseClassifier::new(0.8);
        let previous = vec!["I led the migration to Kubernetes".to_string()];
        let hit = classifier.find_duplicate("  i led the migration to kubernetes ", &previous);
        assert!(hit.is_some());
        assert!(hit.unwrap() > 0.8);
    }
}
