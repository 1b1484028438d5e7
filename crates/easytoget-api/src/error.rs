use thiserror::Error;

/// Every way a call to the content API can fail
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never completed (DNS, refused connection, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Status: {status}")]
    Http { status: u16 },

    /// The server answered with an envelope saying `success: false`
    #[error("Request rejected (status {status}){}", detail(.message))]
    Rejected { status: u16, message: Option<String> },

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status the failure is tied to, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ApiError>;
