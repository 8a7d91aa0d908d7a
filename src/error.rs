//! Error types for the community reporting core

use thiserror::Error;

use crate::status::ComplaintStatus;

/// Main error type for complaint store and account operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Complaint not found in the local store
    #[error("Complaint not found: {0}")]
    ComplaintNotFound(i64),

    /// A required field was missing or blank at the store boundary
    #[error("Required field is blank: {0}")]
    MissingField(&'static str),

    /// Rejected status transition (not the exact required predecessor)
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the record currently holds
        from: ComplaintStatus,
        /// Requested target status
        to: ComplaintStatus,
    },

    /// HTTP transport failed before a backend answer was received
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Backend rejected the request; message is the backend text, verbatim
    #[error("Remote store error ({status}): {message}")]
    RemoteError {
        /// HTTP status code returned by the backend
        status: u16,
        /// Backend error message, unmodified
        message: String,
    },

    /// A stored document could not be read into the typed model
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Submission under a category outside the known service list
    #[error("Unknown service category: {0}")]
    UnknownCategory(String),

    /// Registration with an email that already has an account
    #[error("An account with this email already exists")]
    DuplicateAccount,

    /// Password rejected by the identity service
    #[error("Weak password: {0}")]
    WeakPassword(String),

    /// Email/password pair rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No account exists for the given email
    #[error("No account found for this email")]
    UnknownUser,

    /// External service directory lookup failed
    #[error("Service directory unavailable: {0}")]
    DirectoryError(String),
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::DatabaseError(err.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
