use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid color literal '{0}'")]
    InvalidColor(String),
    #[error("measurement payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}
