//! Error types for mailbox retrieval.

use thiserror::Error;

/// Errors that can occur while searching or reading a mailbox.
#[derive(Debug, Error)]
pub enum Error {
    /// The mailbox could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected or failed the search.
    #[error("Search failed: {0}")]
    Search(String),

    /// A message could not be read.
    #[error("Fetch failed for message {uid}: {message}")]
    Fetch {
        /// UID of the message being read.
        uid: u32,
        /// Description of what went wrong.
        message: String,
    },

    /// The filter string cannot be turned into search criteria.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
