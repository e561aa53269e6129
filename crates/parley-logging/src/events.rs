use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// What kind of content a deterministic fallback replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Script,
    Acknowledgment,
    Transition,
    FollowUp,
    QuestionAnswer,
    Summary,
}

impl std::fmt::Display for FallbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackKind::Script => write!(f, "script"),
            FallbackKind::Acknowledgment => write!(f, "acknowledgment"),
            FallbackKind::Transition => write!(f, "transition"),
            FallbackKind::FollowUp => write!(f, "follow_up"),
            FallbackKind::QuestionAnswer => write!(f, "question_answer"),
            FallbackKind::Summary => write!(f, "summary"),
        }
    }
}

/// Structured log events for the interview lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    InterviewStarted {
        session_id: String,
        total_questions: usize,
        demo_mode: bool,
    },
    ResponseReceived {
        question_index: usize,
        category: String,
        word_count: usize,
    },
    QualityScored {
        question_index: usize,
        score: u8,
        cached: bool,
    },
    FollowUpIssued {
        question_index: usize,
        follow_up_count: usize,
    },
    CandidateQuestionDetected {
        question_index: usize,
    },
    DuplicateDetected {
        question_index: usize,
        similarity: f64,
    },
    QuestionAdvanced {
        question_index: usize,
        category: String,
    },
    /// A canned substitute replaced generated content. Candidate-facing
    /// text is unmarked; this event is the only trace.
    GenerationFallback {
        question_index: usize,
        kind: FallbackKind,
        reason: String,
    },
    InterviewCompleted {
        session_id: String,
        responses: usize,
        follow_ups: usize,
    },
    SummaryGenerated {
        session_id: String,
        recommendation: String,
    },
    SessionEvicted {
        session_id: String,
        idle_secs: f64,
    },
    ErrorEncountered {
        question_index: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for parley events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // Log to file if configured (always JSON format for file)
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        // Log to console based on format
        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::InterviewStarted {
                session_id,
                total_questions,
                demo_mode,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}",
                    "│".bright_blue(),
                    "parley".bold().bright_white()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Session:".dimmed(),
                    session_id.dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}{}",
                    "│".bright_blue(),
                    "Questions:".dimmed(),
                    total_questions,
                    if *demo_mode { " (demo)" } else { "" }
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::ResponseReceived {
                question_index,
                category,
                word_count,
            } => {
                let header = format!("─ Question {} ({}) ", question_index + 1, category);
                let _ = writeln!(
                    stderr,
                    "{}{}",
                    "┌".bright_blue(),
                    header.bright_blue().bold()
                );
                let _ = writeln!(
                    stderr,
                    "  {} response ({} words)",
                    "▶".bright_cyan(),
                    word_count
                );
            }
            LogEvent::QualityScored { score, cached, .. } => {
                let styled = if *score >= 7 {
                    format!("quality {}/10", score).bright_green().to_string()
                } else if *score <= 3 {
                    format!("quality {}/10", score).bright_red().to_string()
                } else {
                    format!("quality {}/10", score).bright_yellow().to_string()
                };
                let _ = writeln!(
                    stderr,
                    "    {}{}",
                    styled,
                    if *cached { " (cached)".dimmed().to_string() } else { String::new() }
                );
            }
            LogEvent::FollowUpIssued {
                follow_up_count, ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} follow-up #{}",
                    "↳".bright_magenta(),
                    follow_up_count
                );
            }
            LogEvent::CandidateQuestionDetected { .. } => {
                let _ = writeln!(stderr, "    {} candidate question", "?".bright_yellow());
            }
            LogEvent::DuplicateDetected { similarity, .. } => {
                let _ = writeln!(
                    stderr,
                    "    {} duplicate answer (similarity {:.2})",
                    "≈".bright_yellow(),
                    similarity
                );
            }
            LogEvent::QuestionAdvanced {
                question_index,
                category,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} advance to {} ({})",
                    "→".bright_green(),
                    question_index + 1,
                    category
                );
                let _ = writeln!(stderr);
            }
            LogEvent::GenerationFallback { kind, reason, .. } => {
                let _ = writeln!(
                    stderr,
                    "    {} fallback {}: {}",
                    "⚠".bright_yellow(),
                    kind,
                    reason.dimmed()
                );
            }
            LogEvent::InterviewCompleted {
                responses,
                follow_ups,
                ..
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Interview complete ({} responses, {} follow-ups)",
                    "✓".bright_green(),
                    responses,
                    follow_ups
                );
            }
            LogEvent::SummaryGenerated { recommendation, .. } => {
                let _ = writeln!(
                    stderr,
                    "{} Summary: {}",
                    "✓".bright_green(),
                    recommendation
                );
            }
            LogEvent::SessionEvicted {
                session_id,
                idle_secs,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} Evicted session {} (idle {:.0}s)",
                    "⚠".bright_yellow(),
                    session_id,
                    idle_secs
                );
            }
            LogEvent::ErrorEncountered {
                question_index,
                error,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} Error at question {}: {}",
                    "✗".bright_red(),
                    question_index + 1,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::InterviewStarted {
                total_questions, ..
            } => format!("[{}] interview:start q={}", timestamp, total_questions),
            LogEvent::ResponseReceived {
                question_index,
                word_count,
                ..
            } => format!(
                "[{}] response:{} words={}",
                timestamp,
                question_index + 1,
                word_count
            ),
            LogEvent::QualityScored {
                question_index,
                score,
                ..
            } => format!("[{}] quality:{} {}/10", timestamp, question_index + 1, score),
            LogEvent::FollowUpIssued {
                question_index,
                follow_up_count,
            } => format!(
                "[{}] followup:{} n={}",
                timestamp,
                question_index + 1,
                follow_up_count
            ),
            LogEvent::CandidateQuestionDetected { question_index } => {
                format!("[{}] candidate-question:{}", timestamp, question_index + 1)
            }
            LogEvent::DuplicateDetected {
                question_index,
                similarity,
            } => format!(
                "[{}] duplicate:{} sim={:.2}",
                timestamp,
                question_index + 1,
                similarity
            ),
            LogEvent::QuestionAdvanced { question_index, .. } => {
                format!("[{}] advance:{}", timestamp, question_index + 1)
            }
            LogEvent::GenerationFallback { kind, .. } => {
                format!("[{}] fallback:{}", timestamp, kind)
            }
            LogEvent::InterviewCompleted { responses, .. } => {
                format!("[{}] interview:done responses={}", timestamp, responses)
            }
            LogEvent::SummaryGenerated { .. } => format!("[{}] summary:done", timestamp),
            LogEvent::SessionEvicted { session_id, .. } => {
                format!("[{}] evict:{}", timestamp, session_id)
            }
            LogEvent::ErrorEncountered {
                question_index,
                error,
            } => format!("[{}] error:{} {}", timestamp, question_index + 1, error),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LogEvent::QualityScored {
            question_index: 2,
            score: 8,
            cached: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "quality_scored");
        assert_eq!(json["score"], 8);
    }

    #[test]
    fn test_file_logging_appends_jsonl() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("parley.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();
        logger.log(&LogEvent::InterviewStarted {
            session_id: "s1".into(),
            total_questions: 6,
            demo_mode: false,
        });
        logger.log(&LogEvent::QuestionAdvanced {
            question_index: 1,
            category: "technical".into(),
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "interview_started");
        assert!(first["timestamp"].is_string());
    }
}
