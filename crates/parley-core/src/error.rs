use thiserror::Error;

/// The only errors that reach the caller. Everything else degrades to
/// deterministic content inside the controller.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no interview script has been generated")]
    NotInitialized,

    #[error("interview is already complete")]
    AlreadyComplete,

    #[error("no responses recorded, cannot generate summary")]
    NoResponses,
}
