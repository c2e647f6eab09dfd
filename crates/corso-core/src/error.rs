use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorsoError {
    // Flow errors
    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    #[error("No flow matches the message")]
    NoMatchingFlow,

    #[error("Step '{step}' not found in flow '{flow}'")]
    MissingStep { flow: String, step: String },

    #[error("Flow '{flow}' exceeded the step budget ({budget})")]
    StepBudgetExhausted { flow: String, budget: usize },

    #[error("Failed to parse flow file {path}: {message}")]
    FlowParse { path: String, message: String },

    // Capability errors
    #[error("Capability failed: {capability}: {message}")]
    Capability { capability: String, message: String },

    #[error("Capability timeout after {timeout_secs}s: {capability}")]
    CapabilityTimeout {
        capability: String,
        timeout_secs: u64,
    },

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CorsoError>;
