use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevSweepError {
    #[error("API error (status {status}): {message}")]
    ApiStatus { status: u16, message: String },

    #[error("API error (status {status}) after {retries} retries")]
    ApiAfterRetries { status: u16, retries: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Inconsistent pipeline structure")]
    InconsistentPipeline,

    #[error("Delete operation {0} failed on the remote service")]
    WorkRequestFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DevSweepError>;
