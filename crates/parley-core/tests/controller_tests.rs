use parley_core::{
    CandidateProfile, CompanyProfile, EngineConfig, EngineError, InterviewContext,
    InterviewController, InterviewScript, JobSpec, TurnOutput,
};
use parley_generator::{Generator, ScriptedGenerator, ScriptedReply};
use parley_logging::{LogFormat, Logger};
use std::sync::Arc;
use std::time::Duration;

fn context() -> InterviewContext {
    InterviewContext {
        job: JobSpec {
            title: "Backend Engineer".to_string(),
            description: "Build and run distributed services.".to_string(),
            required_skills: vec!["Rust".to_string(), "SQL".to_string()],
        },
        company: CompanyProfile {
            name: "Acme".to_string(),
            description: "Infrastructure tooling company.".to_string(),
            values: "Craft and candor.".to_string(),
        },
        candidate: CandidateProfile {
            name: "Ana".to_string(),
            experience: "8 years".to_string(),
            background: "Distributed systems.".to_string(),
        },
    }
}

fn controller_with(replies: Vec<ScriptedReply>, config: EngineConfig) -> InterviewController {
    let generator: Arc<dyn Generator> = Arc::new(ScriptedGenerator::new(replies));
    let logger = Arc::new(Logger::new(LogFormat::Json));
    let mut controller = InterviewController::new(generator, context(), config, logger);
    // Demo-sized fallback script: 6 questions including intro and closing.
    controller.set_script(InterviewScript::fallback("Backend Engineer", true));
    controller
}

fn seeded_config() -> EngineConfig {
    EngineConfig {
        rng_seed: Some(42),
        ..EngineConfig::default()
    }
}

const SUMMARY_JSON: &str = r#"{
    "candidate_name": "Ana",
    "position": "Backend Engineer",
    "strengths": ["Concrete systems experience"],
    "areas_for_improvement": ["More depth on SQL"],
    "technical_evaluation": "Rust: Proficient. SQL: Basic",
    "cultural_fit": "Good alignment",
    "recommendation": "Recommend",
    "next_steps": "Second round with the team",
    "overall_assessment": "Solid candidate."
}"#;

#[test]
fn test_start_without_script_is_not_initialized() {
    let generator: Arc<dyn Generator> = Arc::new(ScriptedGenerator::new(vec![]));
    let logger = Arc::new(Logger::new(LogFormat::Json));
    let mut controller =
        InterviewController::new(generator, context(), seeded_config(), logger);
    assert!(matches!(controller.start(), Err(EngineError::NotInitialized)));
}

#[tokio::test]
async fn test_submit_before_start_is_not_initialized() {
    let mut controller = controller_with(vec![], seeded_config());
    let result = controller.submit_response("hello").await;
    assert!(matches!(result, Err(EngineError::NotInitialized)));
}

#[test]
fn test_start_returns_introduction_and_first_question() {
    let mut controller = controller_with(vec![], seeded_config());
    let output = controller.start().expect("start");
    assert!(output.introduction.contains("Backend Engineer"));
    assert_eq!(output.question_number, 1);
    assert_eq!(output.total_questions, 6);
    assert!(output.question.contains("tell me a bit about yourself"));
}

#[tokio::test]
async fn test_high_quality_run_completes_with_summary() {
    // Six questions, six short high-quality responses. Each non-final turn
    // consumes a quality score and a transition; the final turn consumes a
    // quality score and the summary generation.
    let mut replies = Vec::new();
    for _ in 0..5 {
        replies.push(ScriptedReply::text("9"));
        replies.push(ScriptedReply::text("Great, let's keep the conversation moving."));
    }
    replies.push(ScriptedReply::text("9"));
    replies.push(ScriptedReply::text(SUMMARY_JSON));

    let mut controller = controller_with(replies, seeded_config());
    controller.start().expect("start");

    let responses = [
        "I lead a small platform team.",
        "I have shipped several Rust services.",
        "I enjoy debugging production systems.",
        "Your infrastructure focus matches mine.",
        "I once untangled a gnarly outage.",
        "No more questions from me, thanks.",
    ];

    let mut last_cursor = 0;
    for (i, response) in responses.iter().enumerate() {
        let output = controller.submit_response(response).await.expect("turn");
        let state = controller.state();
        assert!(state.current_question_index >= last_cursor, "cursor rewound");
        last_cursor = state.current_question_index;

        if i < 5 {
            match output {
                TurnOutput::Active {
                    is_follow_up,
                    question_number,
                    ..
                } => {
                    assert!(!is_follow_up);
                    assert_eq!(question_number, i + 2);
                }
                TurnOutput::Complete { .. } => panic!("completed early at turn {i}"),
            }
        } else {
            match output {
                TurnOutput::Complete {
                    closing_remarks,
                    summary,
                } => {
                    assert!(!closing_remarks.is_empty());
                    assert_eq!(summary.candidate_name, "Ana");
                    assert_eq!(summary.recommendation, "Recommend");
                    assert!(!summary.strengths.is_empty());
                }
                TurnOutput::Active { .. } => panic!("expected completion on final turn"),
            }
        }
    }

    let state = controller.state();
    assert!(state.complete);
    assert!(!state.active);
    assert_eq!(state.responses_count, 6);
}

#[tokio::test]
async fn test_candidate_question_leaves_cursor_unchanged() {
    let replies = vec![ScriptedReply::text(
        "The team is eight engineers split across two squads.",
    )];
    let mut controller = controller_with(replies, seeded_config());
    controller.start().expect("start");

    let before = controller.state().current_question_index;
    let output = controller
        .submit_response("What does the team structure look like?")
        .await
        .expect("turn");
    let after = controller.state().current_question_index;

    assert_eq!(before, after);
    match output {
        TurnOutput::Active { acknowledgment, .. } => {
            let answer = acknowledgment.expect("answer");
            assert!(answer.contains("eight engineers"));
        }
        TurnOutput::Complete { .. } => panic!("should not complete"),
    }
    assert_eq!(controller.session().candidate_questions.len(), 1);
}

#[tokio::test]
async fn test_duplicate_response_bypasses_follow_up_and_advances() {
    // First submission scores low and triggers the canned short-response
    // follow-up; the identical second submission is a duplicate and advances.
    let replies = vec![
        ScriptedReply::text("2"),
        ScriptedReply::text("Understood, moving along to the next topic."),
    ];
    let mut controller = controller_with(replies, seeded_config());
    controller.start().expect("start");

    let first = controller
        .submit_response("I once fixed a build.")
        .await
        .expect("turn");
    match first {
        TurnOutput::Active { is_follow_up, .. } => assert!(is_follow_up),
        TurnOutput::Complete { .. } => panic!("should not complete"),
    }
    assert_eq!(controller.state().current_question_index, 0);

    let second = controller
        .submit_response("I once fixed a build.")
        .await
        .expect("turn");
    match second {
        TurnOutput::Active {
            is_follow_up,
            acknowledgment,
            question_number,
            ..
        } => {
            assert!(!is_follow_up);
            assert_eq!(acknowledgment.as_deref(), Some("Thank you for your response."));
            assert_eq!(question_number, 2);
        }
        TurnOutput::Complete { .. } => panic!("should not complete"),
    }
    assert_eq!(controller.state().current_question_index, 1);
    assert!(controller.session().responses.last().map(|r| r.is_duplicate) == Some(true));
}

#[tokio::test]
async fn test_follow_up_count_never_exceeds_cap() {
    // Three low-scoring distinct answers to the same question: two follow-ups
    // are issued, the third forces an advance.
    // The third turn hits the cap before scoring, so only two quality
    // scores are consumed; the last reply feeds the transition.
    let replies = vec![
        ScriptedReply::text("2"),
        ScriptedReply::text("2"),
        ScriptedReply::text("Understood, on to the next question now."),
    ];
    let mut controller = controller_with(replies, seeded_config());
    controller.start().expect("start");

    let outputs = [
        controller.submit_response("I wrote some code.").await.expect("turn"),
        controller.submit_response("It was mostly backend work.").await.expect("turn"),
        controller.submit_response("Mostly services and storage.").await.expect("turn"),
    ];

    for output in &outputs[..2] {
        match output {
            TurnOutput::Active { is_follow_up, .. } => assert!(is_follow_up),
            TurnOutput::Complete { .. } => panic!("should not complete"),
        }
    }
    match &outputs[2] {
        TurnOutput::Active { is_follow_up, .. } => assert!(!is_follow_up),
        TurnOutput::Complete { .. } => panic!("should not complete"),
    }

    assert_eq!(controller.session().follow_ups.len(), 2);
    assert_eq!(controller.state().current_question_index, 1);
}

#[tokio::test]
async fn test_acknowledgment_timeout_still_yields_text() {
    let config = EngineConfig {
        ack_timeout: Duration::from_millis(20),
        rng_seed: Some(7),
        ..EngineConfig::default()
    };
    // The long response triggers generator-backed question detection first,
    // then quality scoring; the delayed replies exercise both timeouts.
    let replies = vec![
        ScriptedReply::text("No"),
        ScriptedReply::text("9"),
        // Acknowledgment arrives too late; the category fallback is used.
        ScriptedReply::text("A sluggish acknowledgment.").with_delay(Duration::from_millis(200)),
        // Transition also times out under the same bound; scripted text wins.
        ScriptedReply::text("A sluggish transition.").with_delay(Duration::from_millis(200)),
    ];
    let mut controller = controller_with(replies, config);
    controller.start().expect("start");

    let long_response = "I have spent many years building and operating large distributed \
                         systems for a variety of product teams across several companies.";
    let output = controller.submit_response(long_response).await.expect("turn");
    match output {
        TurnOutput::Active {
            acknowledgment,
            transition,
            ..
        } => {
            let ack = acknowledgment.expect("acknowledgment");
            assert!(!ack.is_empty());
            let transition = transition.expect("transition");
            assert!(!transition.is_empty());
        }
        TurnOutput::Complete { .. } => panic!("should not complete"),
    }
}

#[tokio::test]
async fn test_completed_session_is_idempotent() {
    // Exhaust the interview with generator failures everywhere: quality
    // falls back to heuristics, transitions fall back to scripted text,
    // summary falls back to the minimal record.
    let mut controller = controller_with(vec![], seeded_config());
    controller.start().expect("start");

    let mut turns = 0;
    loop {
        let output = controller
            .submit_response(&format!("Short answer number {turns}."))
            .await
            .expect("turn");
        turns += 1;
        assert!(turns <= 30, "interview did not terminate");
        if output.is_complete() {
            break;
        }
    }

    let responses_before = controller.state().responses_count;
    let cursor_before = controller.state().current_question_index;

    let again = controller.submit_response("anything else").await.expect("turn");
    assert!(again.is_complete());
    assert_eq!(controller.state().responses_count, responses_before);
    assert_eq!(controller.state().current_question_index, cursor_before);
}

#[tokio::test]
async fn test_generator_failure_never_reaches_candidate() {
    // Everything the generator is asked for fails; the turn still produces
    // a question and eventually a minimal summary.
    let mut controller = controller_with(
        vec![ScriptedReply::failure("connection refused"); 8],
        seeded_config(),
    );
    controller.start().expect("start");

    let output = controller
        .submit_response("A perfectly ordinary answer about my experience.")
        .await
        .expect("turn");
    match output {
        TurnOutput::Active { question, .. } => assert!(!question.is_empty()),
        TurnOutput::Complete { .. } => {}
    }
}

#[tokio::test]
async fn test_generate_summary_requires_responses() {
    let mut controller = controller_with(vec![], seeded_config());
    controller.start().expect("start");
    let result = controller.generate_summary(false).await;
    assert!(matches!(result, Err(EngineError::NoResponses)));

    // With early termination the minimal summary is produced instead.
    let summary = controller.generate_summary(true).await.expect("summary");
    assert_eq!(summary.candidate_name, "Ana");
    assert!(summary.overall_assessment.contains("terminated early"));
}

#[tokio::test]
async fn test_analytics_reflect_session() {
    let replies = vec![
        ScriptedReply::text("9"),
        ScriptedReply::text("Good, next topic coming right up."),
    ];
    let mut controller = controller_with(replies, seeded_config());
    controller.start().expect("start");
    controller
        .submit_response("I built APIs in Python for years.")
        .await
        .expect("turn");

    let analytics = controller.analytics();
    assert_eq!(analytics.candidate_name, "Ana");
    assert_eq!(analytics.response_count, 1);
    assert_eq!(analytics.question_count, 6);
    assert!(analytics.key_topics.contains(&"python".to_string()));
}
