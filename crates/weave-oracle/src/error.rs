use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("oracle request timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed HTTP response: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed oracle response: {0}")]
    Response(String),
}
