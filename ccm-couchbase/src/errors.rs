use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CouchbaseError>;

#[derive(Debug, Error)]
pub enum CouchbaseError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid endpoint uri: {0}")]
    InvalidUri(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("memory quota is too small")]
    MemoryQuotaTooSmall,

    #[error("index memory quota is too small")]
    IndexMemoryQuotaTooSmall,

    #[error("full text search memory quota is too small")]
    FtsMemoryQuotaTooSmall,

    #[error("bucket not found")]
    BucketNotFound,

    #[error("unexpected response: status {status}: {body}")]
    UnexpectedResponse { status: StatusCode, body: String },

    #[error("invalid response payload: {0}")]
    InvalidPayload(String),
}
