use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Represents each line type in the transcript JSONL file.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptLine {
    InterviewStart {
        timestamp: DateTime<Utc>,
        session_id: String,
        candidate: String,
        position: String,
        total_questions: usize,
        demo_mode: bool,
    },
    Turn {
        question_index: usize,
        category: String,
        question: String,
        response: String,
        is_follow_up: bool,
        is_candidate_question: bool,
        timestamp: DateTime<Utc>,
    },
    InterviewEnd {
        status: String,
        responses: usize,
        follow_ups: usize,
        summary: Option<serde_json::Value>,
        duration_secs: f64,
        timestamp: DateTime<Utc>,
    },
}

/// Writes the interview transcript as JSONL to a file in
/// ~/.local/share/parley/transcripts/.
pub struct TranscriptWriter {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl TranscriptWriter {
    /// Create a new TranscriptWriter. Computes the transcript file path from the
    /// current UTC timestamp and a hash of the session id, creates parent
    /// directories, and opens the file for writing.
    pub fn new(session_id: &str) -> io::Result<Self> {
        let transcripts_dir = Self::transcripts_dir()?;
        Self::with_dir(session_id, &transcripts_dir)
    }

    /// Create a TranscriptWriter under a custom directory (useful for testing).
    pub fn with_dir(session_id: &str, dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let now = Utc::now();
        let timestamp_str = now.format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut hasher = Sha256::new();
        hasher.update(session_id.as_bytes());
        let hash = hex::encode(hasher.finalize());
        let short_hash = &hash[..6];

        let filename = format!("{}_{}.jsonl", timestamp_str, short_hash);
        let path = dir.join(filename);

        let file = File::create(&path)?;
        let writer = BufWriter::new(file);

        Ok(Self {
            file: Mutex::new(writer),
            path,
        })
    }

    fn transcripts_dir() -> io::Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine data directory")
        })?;
        Ok(data_dir.join("parley").join("transcripts"))
    }

    /// Returns the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the interview start line.
    pub fn write_start(
        &self,
        session_id: &str,
        candidate: &str,
        position: &str,
        total_questions: usize,
        demo_mode: bool,
    ) {
        let line = TranscriptLine::InterviewStart {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            candidate: candidate.to_string(),
            position: position.to_string(),
            total_questions,
            demo_mode,
        };
        self.write_line(&line);
    }

    /// Write one question/response turn. Accepts individual fields to avoid a
    /// circular dependency on parley-core's Exchange.
    #[allow(clippy::too_many_arguments)]
    pub fn write_turn(
        &self,
        question_index: usize,
        category: &str,
        question: &str,
        response: &str,
        is_follow_up: bool,
        is_candidate_question: bool,
    ) {
        let line = TranscriptLine::Turn {
            question_index,
            category: category.to_string(),
            question: question.to_string(),
            response: response.to_string(),
            is_follow_up,
            is_candidate_question,
            timestamp: Utc::now(),
        };
        self.write_line(&line);
    }

    /// Write the interview end line.
    pub fn write_end(
        &self,
        status: &str,
        responses: usize,
        follow_ups: usize,
        summary: Option<serde_json::Value>,
        duration_secs: f64,
    ) {
        let line = TranscriptLine::InterviewEnd {
            status: status.to_string(),
            responses,
            follow_ups,
            summary,
            duration_secs,
            timestamp: Utc::now(),
        };
        self.write_line(&line);
    }

    fn write_line(&self, line: &TranscriptLine) {
        if let Ok(json) = serde_json::to_string(line) {
            if let Ok(mut writer) = self.file.lock() {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_round_trip_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = TranscriptWriter::with_dir("session-1", dir.path()).unwrap();
        writer.write_start("session-1", "Ana", "Backend Engineer", 6, false);
        writer.write_turn(0, "introduction", "Tell me about yourself", "Hi, I am Ana", false, false);
        writer.write_end("complete", 1, 0, None, 42.0);

        let content = fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "interview_start");
        assert_eq!(lines[1]["type"], "turn");
        assert_eq!(lines[2]["type"], "interview_end");
        assert_eq!(lines[1]["question_index"], 0);
    }
}
