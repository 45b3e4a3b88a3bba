//! # mailpost-core
//!
//! Accounts and the two mail operations built on them.
//!
//! This crate provides:
//! - The account model: identity, SMTP submission settings and an optional
//!   mailbox
//! - Account validation
//! - [`send_email`]: compose and submit one message
//! - [`fetch_messages`]: filtered retrieval of the newest messages

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod error;
pub mod service;

pub use account::{Account, ValidationError, ValidationResult, validate_account};
pub use error::{Error, Result};
pub use service::{fetch_messages, send_email};

pub use mailpost_mailbox::{MailboxAccess, MailboxConfig, RetrievedMessage};
pub use mailpost_smtp::{Envelope, SendReport, SmtpConfig, Transcript};
