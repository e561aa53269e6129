use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use parley_core::EngineConfig;
use parley_generator::{Generator, OllamaGenerator, ScriptedGenerator};
use parley_logging::{init_tracing, LogFormat, Logger};
use parley_sessions::{ResourceSupervisor, SupervisorConfig};

mod config;
mod interview;

use config::ProjectConfig;

const DEFAULT_MODEL: &str = "llama3.2";

#[derive(Parser, Debug)]
#[command(
    name = "parley",
    about = "Conversational interview engine with a local LLM backend",
    version,
    author
)]
struct Cli {
    /// Position title to interview for (overrides parley.toml)
    #[arg(short, long)]
    position: Option<String>,

    /// Candidate name (overrides parley.toml)
    #[arg(short, long)]
    candidate: Option<String>,

    /// Working directory containing parley.toml (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,

    /// Run the shortened demo interview
    #[arg(long)]
    demo: bool,

    /// Dry run: no generator calls, deterministic scripted content only
    #[arg(long)]
    dry_run: bool,

    /// Maximum follow-ups per question
    #[arg(long)]
    max_follow_ups: Option<usize>,

    /// Seed for the follow-up tie-break RNG (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Append structured log events to a JSONL file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Skip writing the interview transcript
    #[arg(long)]
    no_transcript: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json_output: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing("info", log_format);
    let logger = match &cli.log_file {
        Some(path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);

    let context = project.context(cli.position.as_deref(), cli.candidate.as_deref())?;

    let defaults = EngineConfig::default();
    let engine = EngineConfig {
        demo_mode: cli.demo || project.demo.unwrap_or(false),
        max_follow_ups: cli
            .max_follow_ups
            .or(project.max_follow_ups)
            .unwrap_or(defaults.max_follow_ups),
        rng_seed: cli.seed,
        ..defaults
    };

    let generator: Arc<dyn Generator> = if cli.dry_run {
        // Every generation call fails fast, so the whole interview runs on
        // the deterministic fallback content.
        eprintln!("Dry run: using scripted content, no generator calls.");
        Arc::new(ScriptedGenerator::new(Vec::new()))
    } else {
        let model = cli
            .model
            .clone()
            .or_else(|| project.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        match cli.ollama_url.clone().or_else(|| project.ollama_url.clone()) {
            Some(url) => Arc::new(OllamaGenerator::with_base_url(&model, &url)),
            None => Arc::new(OllamaGenerator::new(&model)),
        }
    };

    let supervisor = ResourceSupervisor::new(SupervisorConfig {
        max_idle: project
            .session_idle_timeout
            .unwrap_or(Duration::from_secs(30 * 60)),
        ..Default::default()
    });

    interview::run_interview(
        generator,
        context,
        engine,
        logger,
        supervisor,
        !cli.no_transcript,
        cli.json_output,
    )
    .await
}
