use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Record not found")]
    NotFound,

    /// A write was rejected by a uniqueness or exclusion constraint.
    #[error("Write conflicts with existing data: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl DatabaseError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => DatabaseError::Unauthorized,
            404 => DatabaseError::NotFound,
            409 => DatabaseError::Conflict(message),
            400 | 422 => DatabaseError::InvalidInput(message),
            _ => DatabaseError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for DatabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DatabaseError::Decode(err.to_string())
        } else {
            DatabaseError::ConnectionError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Decode(err.to_string())
    }
}
