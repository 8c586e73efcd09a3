use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("selection ambiguous: {0}")]
    SelectionAmbiguous(String),

    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    /// A private partition was about to be queried without its fund predicate.
    /// Always a programming defect; never recovered from.
    #[error("partition isolation violation: {0}")]
    PartitionIsolationViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid chunk: {0}")]
    InvalidChunk(String),

    #[error("embedding provider failed: {0}")]
    Embedding(String),

    #[error("vector store failed: {0}")]
    Storage(String),

    #[error("language model failed: {0}")]
    LanguageModel(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable, caller-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidRequest,
    RetrievalUnavailable,
    SelectionAmbiguous,
    SynthesisFailed,
    PartitionIsolationViolation,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::RetrievalUnavailable => "RETRIEVAL_UNAVAILABLE",
            ErrorKind::SelectionAmbiguous => "SELECTION_AMBIGUOUS",
            ErrorKind::SynthesisFailed => "SYNTHESIS_FAILED",
            ErrorKind::PartitionIsolationViolation => "PARTITION_ISOLATION_VIOLATION",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Generic text shown to callers; details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "Both fund_id and question are required.",
            ErrorKind::RetrievalUnavailable => "The document index is currently unavailable. Please try again later.",
            ErrorKind::SelectionAmbiguous => "The question could not be routed to a knowledge source.",
            ErrorKind::SynthesisFailed => "The answer could not be generated. Please try again later.",
            ErrorKind::PartitionIsolationViolation => "The request was rejected by a data isolation check.",
            ErrorKind::Internal => "An internal error occurred.",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::RetrievalUnavailable(_) | Error::Embedding(_) | Error::Storage(_) => ErrorKind::RetrievalUnavailable,
            Error::SelectionAmbiguous(_) => ErrorKind::SelectionAmbiguous,
            Error::SynthesisFailed(_) | Error::LanguageModel(_) => ErrorKind::SynthesisFailed,
            Error::PartitionIsolationViolation(_) => ErrorKind::PartitionIsolationViolation,
            Error::InvalidConfig(_) | Error::InvalidChunk(_) => ErrorKind::Internal,
        }
    }
}
