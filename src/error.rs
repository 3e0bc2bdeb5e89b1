use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CamlibError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("No API key specified. You can get one at {}", crate::constants::API_KEY_SIGNUP_URL)]
    MissingApiKey,

    #[error("No previously uncompressed PNG or JPEG images found")]
    NoImagesFound,

    #[error("Cache flush attempted with {0} operation(s) still in flight")]
    UndrainedFlush(usize),

    #[error("Failed to persist cache to {}: {source}", .path.display())]
    CachePersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CamlibError {
    /// Conditions that end the run before any work starts. They are reported
    /// to the operator but are not a process failure.
    pub fn is_precondition(&self) -> bool {
        matches!(self, CamlibError::MissingApiKey | CamlibError::NoImagesFound)
    }
}

impl From<reqwest::Error> for CamlibError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => CamlibError::Transport(format!("HTTP {}: {}", status.as_u16(), e)),
            None => CamlibError::Transport(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CamlibError>;
