//! Error types for the core library.

use thiserror::Error;

use crate::account::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Sending failed; carries the session transcript.
    #[error("SMTP error: {0}")]
    Smtp(#[from] mailpost_smtp::SendError),

    /// Mailbox retrieval failed.
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] mailpost_mailbox::Error),

    /// The account is incomplete or malformed.
    #[error("Invalid account: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
