//! Interactive stdin interview loop.
//!
//! The controller lives in a [`SessionStore`] and is checked out for each
//! turn: taken before the (long-running) `submit_response` await and put
//! back afterwards, so the store lock is never held across an await. The
//! resource supervisor runs between turns; a candidate who walks away long
//! enough loses the session.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;

use parley_core::{EngineConfig, InterviewContext, InterviewController, TurnOutput};
use parley_generator::Generator;
use parley_logging::{LogEvent, Logger, TranscriptWriter};
use parley_sessions::{ResourceSupervisor, SessionStore};

/// What the loop was doing when it stopped reading stdin.
enum LoopEnd {
    Eof,
    Expired,
}

/// The question currently on the table, tracked for the transcript.
struct AskedQuestion {
    index: usize,
    category: String,
    text: String,
    is_follow_up: bool,
}

pub async fn run_interview(
    generator: Arc<dyn Generator>,
    context: InterviewContext,
    config: EngineConfig,
    logger: Arc<Logger>,
    supervisor: ResourceSupervisor,
    write_transcript: bool,
    json_output: bool,
) -> Result<()> {
    let demo_mode = config.demo_mode;
    let mut controller =
        InterviewController::new(generator, context.clone(), config, Arc::clone(&logger));

    eprintln!("{}", "Preparing interview questions...".dimmed());
    controller.generate_script().await;

    let opening = controller.start().context("Failed to start interview")?;
    let session_id = controller.session_id().to_string();

    let transcript = if write_transcript {
        match TranscriptWriter::new(&session_id) {
            Ok(writer) => {
                writer.write_start(
                    &session_id,
                    &context.candidate.name,
                    &context.job.title,
                    opening.total_questions,
                    demo_mode,
                );
                Some(writer)
            }
            Err(err) => {
                eprintln!("{} Transcript disabled: {}", "⚠".bright_yellow(), err);
                None
            }
        }
    } else {
        None
    };

    println!("{}", opening.introduction);
    println!();
    println!("{}", opening.transition);
    print_question(
        opening.question_number,
        opening.total_questions,
        false,
        &opening.question,
    );

    let mut asked = AskedQuestion {
        index: opening.question_number - 1,
        category: current_category(&controller),
        text: opening.question.clone(),
        is_follow_up: false,
    };

    let store: SessionStore<InterviewController> = SessionStore::new();
    store.insert(&session_id, controller);
    let started = Instant::now();

    let end = loop {
        let Some(response) = read_response()? else {
            break LoopEnd::Eof;
        };

        for report in supervisor.check(&store) {
            logger.log(&LogEvent::SessionEvicted {
                session_id: report.session_id.clone(),
                idle_secs: report.idle.as_secs_f64(),
            });
        }

        let Some(mut controller) = store.take(&session_id) else {
            break LoopEnd::Expired;
        };

        let candidate_questions_before = controller.session().candidate_questions.len();
        let output = controller
            .submit_response(&response)
            .await
            .context("Interview turn failed")?;
        let is_candidate_question =
            controller.session().candidate_questions.len() > candidate_questions_before;

        if let Some(writer) = &transcript {
            writer.write_turn(
                asked.index,
                &asked.category,
                &asked.text,
                &response,
                asked.is_follow_up,
                is_candidate_question,
            );
        }

        match output {
            TurnOutput::Active {
                acknowledgment,
                transition,
                question,
                is_follow_up,
                question_number,
                total_questions,
            } => {
                if let Some(ack) = acknowledgment {
                    println!();
                    println!("{}", ack);
                }
                if let Some(transition) = transition {
                    println!();
                    println!("{}", transition);
                }
                print_question(question_number, total_questions, is_follow_up, &question);

                asked = AskedQuestion {
                    index: question_number - 1,
                    category: current_category(&controller),
                    text: question,
                    is_follow_up,
                };
                store.insert(&session_id, controller);
            }
            TurnOutput::Complete {
                closing_remarks,
                summary,
            } => {
                println!();
                println!("{}", closing_remarks);

                if let Some(writer) = &transcript {
                    writer.write_end(
                        "complete",
                        controller.session().responses.len(),
                        controller.session().follow_ups.len(),
                        serde_json::to_value(summary.as_ref()).ok(),
                        started.elapsed().as_secs_f64(),
                    );
                    eprintln!();
                    eprintln!(
                        "{}",
                        format!("Transcript: {}", writer.path().display()).dimmed()
                    );
                }

                print_summary(&controller, json_output)?;
                print_analytics(&controller);
                return Ok(());
            }
        }
    };

    match end {
        LoopEnd::Eof => {
            let Some(mut controller) = store.take(&session_id) else {
                return Ok(());
            };
            eprintln!();
            eprintln!("{}", "Interview ended early.".dimmed());

            let summary = controller.generate_summary(true).await?;
            if let Some(writer) = &transcript {
                writer.write_end(
                    "terminated_early",
                    controller.session().responses.len(),
                    controller.session().follow_ups.len(),
                    serde_json::to_value(&summary).ok(),
                    started.elapsed().as_secs_f64(),
                );
            }
            print_summary(&controller, json_output)?;
            Ok(())
        }
        LoopEnd::Expired => {
            eprintln!();
            eprintln!(
                "{} Session expired after inactivity. Start a new interview to continue.",
                "⚠".bright_yellow()
            );
            Ok(())
        }
    }
}

/// Prompt for and read one non-empty line. Returns `None` at EOF.
fn read_response() -> io::Result<Option<String>> {
    let stdin = io::stdin();
    loop {
        print!("\n{} ", ">".bright_cyan());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }
}

fn current_category(controller: &InterviewController) -> String {
    controller
        .current_question()
        .map(|q| q.category.as_str().to_string())
        .unwrap_or_default()
}

fn print_question(number: usize, total: usize, is_follow_up: bool, text: &str) {
    println!();
    if is_follow_up {
        println!(
            "{}",
            format!("Follow-up (question {}/{})", number, total).bold()
        );
    } else {
        println!("{}", format!("Question {}/{}", number, total).bold());
    }
    println!("{}", text);
}

fn print_summary(controller: &InterviewController, json_output: bool) -> Result<()> {
    let Some(summary) = controller.summary() else {
        return Ok(());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!("{}", "=== INTERVIEW SUMMARY ===".bold());
    println!("Candidate: {}", summary.candidate_name);
    println!("Position:  {}", summary.position);

    if let Some(visual) = controller.visual_summary() {
        println!();
        println!(
            "Recommendation: {} ({}%)",
            visual.recommendation_text.bold(),
            visual.recommendation_score
        );

        if !visual.skill_ratings.is_empty() {
            println!();
            println!("{}", "Skills".bold());
            for skill in &visual.skill_ratings {
                println!("  {:<24} {} {}%", skill.name, bar(skill.score), skill.score);
            }
        }
        if !visual.strengths.is_empty() {
            println!();
            println!("{}", "Strengths".bold());
            for item in &visual.strengths {
                println!("  {} {}", "+".bright_green(), item.text);
            }
        }
        if !visual.improvements.is_empty() {
            println!();
            println!("{}", "Areas for improvement".bold());
            for item in &visual.improvements {
                println!("  {} {}", "-".bright_yellow(), item.text);
            }
        }
    }

    println!();
    println!("{}", "Assessment".bold());
    println!("{}", summary.overall_assessment);
    println!();
    println!("{}", "Next steps".bold());
    println!("{}", summary.next_steps);

    Ok(())
}

fn bar(score: u8) -> String {
    let filled = (score as usize / 10).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn print_analytics(controller: &InterviewController) {
    let analytics = controller.analytics();
    eprintln!();
    eprintln!(
        "{}",
        format!(
            "{} responses, {} follow-ups, avg {:.0} words, {}s",
            analytics.response_count,
            analytics.follow_up_count,
            analytics.avg_response_words,
            analytics.duration_secs
        )
        .dimmed()
    );
    if !analytics.key_topics.is_empty() {
        eprintln!(
            "{}",
            format!("Topics: {}", analytics.key_topics.join(", ")).dimmed()
        );
    }
    if let Some(style) = &analytics.communication_style {
        eprintln!("{}", format!("Communication style: {}", style).dimmed());
    }
}
