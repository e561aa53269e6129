use crate::script::{InterviewScript, Question, QuestionCategory};

const JOB_TRANSITIONS: [&str; 3] = [
    "Building on what we've discussed, I'd like to ask about your experience with...",
    "I'm interested to hear more about your background in...",
    "Let's talk more specifically about your work with...",
];
const TECH_TRANSITIONS: [&str; 3] = [
    "Now I'd like to explore your technical knowledge in...",
    "Regarding the technical aspects of this role...",
    "Let's dive into some of the technical skills required for this position...",
];
const FIT_TRANSITIONS: [&str; 3] = [
    "Considering our company values...",
    "From a team perspective...",
    "In terms of our work environment...",
];
const BEHAVE_TRANSITIONS: [&str; 3] = [
    "Reflecting on your past experiences...",
    "I'm curious about how you've handled certain situations before...",
    "Let's discuss an example of when you've had to...",
];

/// Flatten a script's category pools into one conversational flow: a fixed
/// icebreaker, one question from each category to establish coverage, the
/// remainder interleaved with rotating transition phrases, and a fixed
/// closing question.
pub fn build_sequence(script: &InterviewScript) -> Vec<Question> {
    let mut job: Vec<Question> = script.job_specific.clone();
    let mut tech: Vec<Question> = script.technical.clone();
    let mut fit: Vec<Question> = script.company_fit.clone();
    let mut behave: Vec<Question> = script.behavioral.clone();

    let mut sequence = Vec::new();

    let mut intro = Question::new(
        QuestionCategory::Introduction,
        "Could you please tell me a bit about yourself and your interest in this position?",
    );
    intro.purpose = "To break the ice and hear the candidate's self-introduction".to_string();
    intro.transition =
        "Thanks for joining us today. I'd like to start by getting to know you a bit better."
            .to_string();
    sequence.push(intro);

    if !job.is_empty() {
        let mut q = job.remove(0);
        q.transition =
            "Thanks for sharing that. I'd like to learn more about your relevant experience."
                .to_string();
        sequence.push(q);
    }
    if !tech.is_empty() {
        let mut q = tech.remove(0);
        q.transition =
            "Now I'd like to understand your technical capabilities a bit better.".to_string();
        sequence.push(q);
    }
    if !fit.is_empty() {
        let mut q = fit.remove(0);
        q.transition = "Switching gears a bit, I'd like to explore how you might fit with our \
                        company culture."
            .to_string();
        sequence.push(q);
    }
    if !behave.is_empty() {
        let mut q = behave.remove(0);
        q.transition =
            "Let's talk about some of your past experiences and how you handled them.".to_string();
        sequence.push(q);
    }

    let mut remaining_job = job.len();
    let mut remaining_tech = tech.len();
    let mut remaining_fit = fit.len();
    let mut remaining_behave = behave.len();

    while !job.is_empty() || !tech.is_empty() || !fit.is_empty() || !behave.is_empty() {
        if !job.is_empty() {
            let mut q = job.remove(0);
            q.transition = JOB_TRANSITIONS[remaining_job % JOB_TRANSITIONS.len()].to_string();
            remaining_job -= 1;
            sequence.push(q);
        }
        if !behave.is_empty() {
            let mut q = behave.remove(0);
            q.transition =
                BEHAVE_TRANSITIONS[remaining_behave % BEHAVE_TRANSITIONS.len()].to_string();
            remaining_behave -= 1;
            sequence.push(q);
        }
        if !tech.is_empty() {
            let mut q = tech.remove(0);
            q.transition = TECH_TRANSITIONS[remaining_tech % TECH_TRANSITIONS.len()].to_string();
            remaining_tech -= 1;
            sequence.push(q);
        }
        if !fit.is_empty() {
            let mut q = fit.remove(0);
            q.transition = FIT_TRANSITIONS[remaining_fit % FIT_TRANSITIONS.len()].to_string();
            remaining_fit -= 1;
            sequence.push(q);
        }
    }

    let mut closing = Question::new(
        QuestionCategory::Closing,
        "Do you have any questions for me about the position or the company?",
    );
    closing.purpose =
        "To allow the candidate to ask questions and show their interest".to_string();
    closing.transition = "We've covered quite a bit today. Before we wrap up, I wanted to give \
                          you an opportunity to ask any questions you might have."
        .to_string();
    sequence.push(closing);

    sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_with(job: usize, tech: usize, fit: usize, behave: usize) -> InterviewScript {
        let fill = |category: QuestionCategory, n: usize| {
            (0..n)
                .map(|i| Question::new(category, format!("{category} q{i}")))
                .collect()
        };
        InterviewScript {
            introduction: "intro".to_string(),
            job_specific: fill(QuestionCategory::JobSpecific, job),
            technical: fill(QuestionCategory::Technical, tech),
            company_fit: fill(QuestionCategory::CompanyFit, fit),
            behavioral: fill(QuestionCategory::Behavioral, behave),
            closing: "closing".to_string(),
        }
    }

    #[test]
    fn test_sequence_starts_and_ends_fixed() {
        let seq = build_sequence(&script_with(2, 1, 1, 1));
        assert_eq!(seq.first().map(|q| q.category), Some(QuestionCategory::Introduction));
        assert_eq!(seq.last().map(|q| q.category), Some(QuestionCategory::Closing));
        assert_eq!(seq.len(), 2 + 2 + 1 + 1 + 1);
    }

    #[test]
    fn test_first_of_each_category_in_order() {
        let seq = build_sequence(&script_with(3, 3, 2, 2));
        let cats: Vec<_> = seq.iter().map(|q| q.category).collect();
        assert_eq!(
            &cats[..5],
            &[
                QuestionCategory::Introduction,
                QuestionCategory::JobSpecific,
                QuestionCategory::Technical,
                QuestionCategory::CompanyFit,
                QuestionCategory::Behavioral,
            ]
        );
    }

    #[test]
    fn test_every_question_has_transition() {
        let seq = build_sequence(&script_with(3, 2, 2, 3));
        assert!(seq.iter().all(|q| !q.transition.is_empty()));
    }

    #[test]
    fn test_remainder_is_interleaved() {
        let seq = build_sequence(&script_with(3, 3, 3, 3));
        // After the first-of-each block, the loop emits job, behavioral,
        // technical, company_fit rounds.
        let cats: Vec<_> = seq[5..9].iter().map(|q| q.category).collect();
        assert_eq!(
            cats,
            vec![
                QuestionCategory::JobSpecific,
                QuestionCategory::Behavioral,
                QuestionCategory::Technical,
                QuestionCategory::CompanyFit,
            ]
        );
    }
}
