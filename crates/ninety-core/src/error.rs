#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{backend} extraction failed: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },

    #[error("{backend} extraction timed out")]
    BackendTimeout { backend: &'static str },

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("all extraction backends failed: {0}")]
    AllBackendsFailed(String),

    #[error("document contains no pages")]
    EmptyDocument,

    #[error("invalid artifact pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
