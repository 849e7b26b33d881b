//! Error types for the farm assistant API client.
//!
//! # Design
//! `ValidationError` covers every rule the request builder enforces before a
//! request exists; its `Display` text is what the user sees in the alert.
//! `ApiError` wraps it together with the failures that can only happen after
//! dispatch. `NotFound` keeps a dedicated variant because profile loading
//! treats "no such farmer" differently from "server broken" in logs.

use thiserror::Error;

/// A local rule violated while building a request. No network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Type a message or attach a photo first")]
    EmptyMessage,

    #[error("Please select or take a photo first")]
    MissingImage,

    #[error("Please enter text to translate")]
    EmptyTranslationText,

    #[error("Please choose both a source and a target language")]
    MissingLanguage,

    #[error("Source and target languages cannot be the same")]
    SameLanguage,

    #[error("Please enter a location")]
    EmptyLocation,

    #[error("Please fill in all required fields ({0} is missing)")]
    MissingField(&'static str),

    #[error("Please describe your question for the officer")]
    EmptyQuery,

    #[error("The selected image is not valid base64 data")]
    InvalidImage,

    #[error("The selected image is too large ({size} bytes, limit {limit})")]
    ImageTooLarge { size: usize, limit: usize },
}

/// Errors returned by client build, parse and dispatch operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The exchange never produced a response (connection refused, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The owning screen went away before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
