use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plan Integrity Error: {0}")]
    Integrity(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

pub type PfResult<T> = Result<T, PlanError>;
