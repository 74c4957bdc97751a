// Error taxonomy for the fetch-transform pipeline
use thiserror::Error;

/// Failures while obtaining the bearer credential. Polling never starts after one.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("identity service rejected the credentials (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("identity service returned an unexpected body: {0}")]
    MalformedResponse(String),
}

/// Failures of a single poll. The store keeps its previous snapshot and the next tick retries.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unparseable response body: {0}")]
    MalformedBody(String),

    #[error("no credential available for an authenticated source")]
    MissingCredential,
}

/// A raw record that cannot be decoded. The record is skipped, the rest are processed.
#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no zone name")]
    MissingName,

    #[error("record for zone {0} has no values list")]
    MissingValues(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::MalformedBody(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}
