use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("insufficient sequence samples: {0}")]
    InsufficientSequence(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pipeline error: {0}")]
    Pipeline(String),
}
