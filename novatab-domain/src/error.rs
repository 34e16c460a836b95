use novatab_core::error::{CoreError, StoreError};
use thiserror::Error;
use uuid::Uuid;

use crate::settings::types::ApiSource;

/// Errors raised by domain operations.
///
/// Storage and network failures are recovered by the caller wherever a
/// degraded render is possible; they only reach the user on explicit actions
/// (saving settings, editing a pinned app).
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Image unavailable '{uri}': {reason}")]
    ImageUnavailable { uri: String, reason: String },

    #[error("Pinned app not found: {0}")]
    AppNotFound(Uuid),

    #[error("No background image available")]
    NoImageAvailable,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// User-facing input problems. An operation that fails validation applies no
/// mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Settings document is missing required section '{0}'")]
    MissingSection(String),

    #[error("Malformed settings document: {0}")]
    MalformedDocument(String),

    #[error("Reorder does not match the current apps: {0}")]
    UnknownOrdering(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Could not parse response: {0}")]
    Parse(String),

    #[error("No API key configured for {0:?}")]
    MissingApiKey(ApiSource),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        NetworkError::Request(err.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
