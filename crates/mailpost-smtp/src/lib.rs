//! # mailpost-smtp
//!
//! A minimal SMTP submission client that drives the protocol directly over a
//! socket and records every exchange.
//!
//! ## Features
//!
//! - **Explicit session object**: one [`Session`] per send, owning its socket,
//!   state and [`Transcript`]
//! - **TLS support**: implicit TLS (port 465) and in-place STARTTLS upgrade
//! - **Authentication**: AUTH LOGIN, skipped when no credentials are set
//! - **Bounded waits**: every reply must arrive within the read timeout
//! - **Diagnostics**: failures carry the step, expected and received codes
//!   and the full transcript
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpost_smtp::{Credentials, Endpoint, Envelope, SecurityMode, SmtpConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SmtpConfig::new(Endpoint::new("smtp.example.com", 587, SecurityMode::StartTls))
//!         .with_credentials(Credentials::new("user@example.com", "password"));
//!
//!     let envelope = Envelope::new("user@example.com", "friend@example.org", "Hello", "Hi there!")
//!         .from_name("User");
//!
//!     match mailpost_smtp::send_mail(&config, &envelope).await {
//!         Ok(report) => println!("sent {}", report.message_id),
//!         Err(failure) => eprintln!("{failure}\n{}", failure.transcript),
//!     }
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! Disconnected ─connect/220→ Connected ─EHLO/250→ Greeted
//!   Greeted ─STARTTLS/220→ TlsNegotiating ─handshake→ SecureGreeted ─EHLO/250→ Greeted
//!   Greeted ─AUTH LOGIN/334→ AuthUser ─user/334→ AuthPass ─pass/235→ Authenticated
//!   Authenticated ─MAIL FROM/250→ SenderSet ─RCPT TO/250→ RecipientSet
//!   RecipientSet ─DATA/354→ Transmitting ─message/250→ Sent ─QUIT/221→ Closed
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`compose`]: Message composition
//! - [`config`]: Endpoint, credentials and timeouts
//! - [`connection`]: Socket setup and the session state machine
//! - [`parser`]: Reply parser
//! - [`transcript`]: Exchange log
//! - [`types`]: Addresses and reply codes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod compose;
pub mod config;
pub mod connection;
mod error;
pub mod parser;
pub mod transcript;
pub mod types;

pub use compose::{ComposedMessage, Envelope, MessageId, compose};
pub use config::{Credentials, Endpoint, SecurityMode, SmtpConfig};
pub use connection::{Connector, SendReport, Session, State, Step, TcpConnector};
pub use error::{Error, Result, SendError};
pub use transcript::{Direction, Transcript, TranscriptEntry};
pub use types::{Address, Mailbox, Reply, ReplyCode, format_address};

/// Composes `envelope` and delivers it through a fresh session.
///
/// # Errors
///
/// Returns a [`SendError`] whose transcript is empty when composition fails
/// and holds every exchange up to the failure otherwise.
pub async fn send_mail(
    config: &SmtpConfig,
    envelope: &Envelope,
) -> std::result::Result<SendReport, SendError> {
    let message = compose(envelope, &config.local_name)?;
    Session::new(config.clone()).send(&message).await
}
