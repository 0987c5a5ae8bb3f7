use thiserror::Error;

/// Failures talking to the catalog API
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Catalog API token is invalid or missing")]
    Unauthorized,

    #[error("Failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Catalog request was cancelled")]
    Cancelled,
}

/// Failures talking to the user-data backend
#[derive(Debug, Error)]
pub enum UserDataError {
    /// No signed-in user, or the backend rejected the session
    #[error("Sign in required")]
    AuthRequired,

    #[error("User-data request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User-data backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid user-data row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl UserDataError {
    pub fn is_auth_required(&self) -> bool {
        matches!(self, UserDataError::AuthRequired)
    }
}
