//! # parley-generator
//!
//! The text-generation capability the interview engine treats as an
//! unreliable oracle: given a prompt and a token/temperature budget, return
//! text; fail on timeout or transport error. No guarantee of
//! schema-conformant output — that is parley-extract's problem.

mod bounded;
mod ollama;
mod retry;
mod scripted;
mod traits;

pub use bounded::bounded_generate;
pub use ollama::OllamaGenerator;
pub use retry::RetryGenerator;
pub use scripted::{ScriptedGenerator, ScriptedReply};
pub use traits::{Generator, GeneratorError};
