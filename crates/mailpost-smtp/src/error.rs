//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

use crate::connection::Step;
use crate::transcript::Transcript;
use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The socket to the server could not be established.
    #[error("Connection to {endpoint} failed: {source}")]
    Connection {
        /// `host:port` that was dialled.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The server answered a step with an unexpected reply.
    #[error("{step} rejected: expected {expected}, server replied {received:?}")]
    Protocol {
        /// Step that failed.
        step: Step,
        /// Reply code the step requires.
        expected: ReplyCode,
        /// Raw reply text (empty if the server closed the connection).
        received: String,
    },

    /// The server rejected one of the AUTH LOGIN steps.
    #[error("Authentication failed at {step}: expected {expected}, server replied {received:?}")]
    Auth {
        /// Step that failed.
        step: Step,
        /// Reply code the step requires.
        expected: ReplyCode,
        /// Raw reply text.
        received: String,
    },

    /// No reply arrived within the read timeout.
    #[error("Timed out after {after:?} waiting for reply to {step}")]
    Timeout {
        /// Step that was awaiting a reply.
        step: Step,
        /// Configured bound.
        after: Duration,
    },

    /// TLS negotiation failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation not valid in the current session state.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates the error for a reply that did not match the expected code.
    ///
    /// Mismatches during AUTH steps are reported as [`Error::Auth`].
    #[must_use]
    pub fn unexpected_reply(step: Step, expected: ReplyCode, received: impl Into<String>) -> Self {
        let received = received.into();
        if step.is_auth() {
            Self::Auth {
                step,
                expected,
                received,
            }
        } else {
            Self::Protocol {
                step,
                expected,
                received,
            }
        }
    }

    /// Returns the protocol step this error is attached to, if any.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::Protocol { step, .. } | Self::Auth { step, .. } | Self::Timeout { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }

    /// Returns the reply code the server actually sent, if one was parsed.
    #[must_use]
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Self::Protocol { received, .. } | Self::Auth { received, .. } => received
                .get(..3)
                .and_then(|code| code.parse::<u16>().ok())
                .map(ReplyCode::new),
            _ => None,
        }
    }

    /// Returns true if the failure happened during authentication.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns true if the server replied with a permanent error (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.reply_code().is_some_and(ReplyCode::is_permanent)
    }

    /// Returns true if the server replied with a transient error (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.reply_code().is_some_and(ReplyCode::is_transient)
    }
}

/// A failed send, carrying the transcript recorded up to the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SendError {
    /// What went wrong.
    #[source]
    pub error: Error,
    /// Every exchange performed before the session was aborted.
    pub transcript: Transcript,
}

impl SendError {
    /// Attaches a transcript to an error.
    #[must_use]
    pub const fn new(error: Error, transcript: Transcript) -> Self {
        Self { error, transcript }
    }
}

impl From<Error> for SendError {
    fn from(error: Error) -> Self {
        Self::new(error, Transcript::new())
    }
}
