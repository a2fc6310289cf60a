use thiserror::Error;

#[derive(Error, Debug)]
pub enum CigraphError {
    #[error("Invalid request: {0}")]
    Request(String),

    #[error("Could not decode configuration: {0}")]
    Decode(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CigraphError>;
