use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GriddleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error loading mappings: {0}")]
    MappingLoad(String),

    #[error("No mapping found for document kind: {0}")]
    MappingNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Error decoding engine response: {0}")]
    Decode(String),

    #[error("Unexpected response from engine ({status}) while {context}")]
    Engine { status: u16, context: String },

    #[error("Unable to block writes for index: {0}")]
    WriteBlockRejected(String),

    #[error("Reindex did not complete after {attempts} polls")]
    ReindexIncomplete { attempts: usize },

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GriddleError>;

impl From<std::io::Error> for GriddleError {
    fn from(e: std::io::Error) -> Self {
        GriddleError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for GriddleError {
    fn from(e: serde_json::Error) -> Self {
        GriddleError::Json(e.to_string())
    }
}

impl From<reqwest::Error> for GriddleError {
    fn from(e: reqwest::Error) -> Self {
        GriddleError::Http(e.to_string())
    }
}
