use serde::{Deserialize, Serialize};

/// The position being interviewed for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
}

/// The hiring company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub values: String,
}

/// The candidate being interviewed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub background: String,
}

/// Everything the engine knows about who is talking to whom.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewContext {
    pub job: JobSpec,
    pub company: CompanyProfile,
    pub candidate: CandidateProfile,
}
