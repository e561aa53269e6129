//! Project configuration file support for parley.
//!
//! Loads configuration from `parley.toml` in the working directory.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use parley_core::{CandidateProfile, CompanyProfile, InterviewContext, JobSpec};

/// Project-level configuration loaded from `parley.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Ollama model name
    pub model: Option<String>,
    /// Ollama server URL
    pub ollama_url: Option<String>,
    /// Run the shortened demo interview
    pub demo: Option<bool>,
    /// Maximum follow-ups per question
    pub max_follow_ups: Option<usize>,
    /// Evict a session idle longer than this (e.g. "30m")
    #[serde(default, with = "humantime_serde::option")]
    pub session_idle_timeout: Option<Duration>,
    /// The position being interviewed for
    #[serde(default)]
    pub job: JobSection,
    /// The hiring company
    #[serde(default)]
    pub company: CompanySection,
    /// The candidate being interviewed
    #[serde(default)]
    pub candidate: CandidateSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct JobSection {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CompanySection {
    pub name: Option<String>,
    pub description: Option<String>,
    pub values: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CandidateSection {
    pub name: Option<String>,
    pub experience: Option<String>,
    pub background: Option<String>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "parley.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Build the interview context, letting CLI values override the file.
    /// Priority per field: CLI flag > config file > default.
    pub fn context(
        &self,
        cli_position: Option<&str>,
        cli_candidate: Option<&str>,
    ) -> Result<InterviewContext> {
        let title = cli_position
            .map(str::to_string)
            .or_else(|| self.job.title.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No position provided. Use --position or set [job] title in {}",
                    CONFIG_FILE_NAME
                )
            })?;

        let candidate_name = cli_candidate
            .map(str::to_string)
            .or_else(|| self.candidate.name.clone())
            .unwrap_or_else(|| "Candidate".to_string());

        Ok(InterviewContext {
            job: JobSpec {
                title,
                description: self.job.description.clone().unwrap_or_default(),
                required_skills: self.job.required_skills.clone(),
            },
            company: CompanyProfile {
                name: self.company.name.clone().unwrap_or_default(),
                description: self.company.description.clone().unwrap_or_default(),
                values: self.company.values.clone().unwrap_or_default(),
            },
            candidate: CandidateProfile {
                name: candidate_name,
                experience: self.candidate.experience.clone().unwrap_or_default(),
                background: self.candidate.background.clone().unwrap_or_default(),
            },
        })
    }
}
