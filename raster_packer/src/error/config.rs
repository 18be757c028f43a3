use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid JSON")]
    Json(#[from] serde_json::Error),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
