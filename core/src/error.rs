use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("No public key registered for key id {key_id}")]
    UnknownKey { key_id: Uuid },

    #[error("Malformed signature record: {0}")]
    MalformedSignature(String),

    #[error("Signed field path '{path}' is unknown to the current report schema")]
    UnknownSignedField { path: String },

    #[error("Signed field path '{path}' is absent from the report being verified")]
    MissingSignedField { path: String },

    #[error("Corrupt stored record: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
