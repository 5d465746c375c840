use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// User-facing validation message; no state was changed.
    #[error("{0}")]
    Validation(String),

    #[error("policy blocked: {0}")]
    PolicyBlocked(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("all {attempts} sources failed; last error: {last_error}")]
    FallbackExhausted {
        attempts: usize,
        failures: Vec<String>,
        last_error: String,
    },

    #[error("pdf extraction failed: {0}")]
    PdfExtraction(String),

    #[error("summarizer error: {0}")]
    Summarizer(String),

    #[error("invalid transition: {0}")]
    Transition(String),

    #[error("{0} is already running")]
    Busy(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
