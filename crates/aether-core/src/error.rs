use thiserror::Error;

#[derive(Debug, Error)]
pub enum AetherError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error {status} on {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl AetherError {
    /// Returns `true` for failures that happened on the wire (transport or a
    /// non-success response), as opposed to local validation or storage.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }

    /// Returns `true` when the backend rejected the request with 401/403.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 401 || *status == 403,
            Self::Http(e) => e
                .status()
                .map(|s| s.as_u16() == 401 || s.as_u16() == 403)
                .unwrap_or(false),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AetherError>;
