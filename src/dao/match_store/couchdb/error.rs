//! Errors raised by the CouchDB match store.

use reqwest::StatusCode;
use thiserror::Error;

pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures of the CouchDB match store.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request never got an answer (connection refused, timeout, ...).
    #[error("CouchDB request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with a status the store does not handle.
    #[error("unexpected CouchDB status {status} for `{path}`")]
    UnexpectedStatus { path: String, status: StatusCode },
    /// The document revision changed between read and write; nothing was written.
    #[error("document `{path}` was modified concurrently")]
    Conflict { path: String },
    /// The response body was not the expected JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A listed document does not have the match shape.
    #[error("malformed CouchDB document in `{path}`")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A document id lacks a valid match UUID.
    #[error("document ID `{doc_id}` does not name a match")]
    InvalidDocId {
        doc_id: String,
        #[source]
        source: uuid::Error,
    },
}
