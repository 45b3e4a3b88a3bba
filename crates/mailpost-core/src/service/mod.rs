//! Core services for email operations.
//!
//! One entry point for sending and one for reading, each parameterized by
//! the account whose endpoints it targets.

pub mod mail;
pub mod smtp;

pub use mail::fetch_messages;
pub use smtp::send_email;
