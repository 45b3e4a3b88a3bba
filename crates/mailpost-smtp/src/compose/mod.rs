//! Builds the wire form of a plain-text message.
//!
//! The composed text contains the header block, a blank line, the body with
//! CRLF line endings and dot-stuffing applied, and the terminating `.` line
//! (without its final CRLF, which the session appends when transmitting).

mod message_id;

pub use message_id::MessageId;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::validate_local_name;
use crate::error::{Error, Result};
use crate::types::{Address, Mailbox, format_address};

/// Value of the `X-Mailer` header.
pub const MAILER: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Addressing and content supplied by the caller for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sender address.
    pub from: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// Primary recipient.
    pub to: String,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<String>,
    /// Subject line (UTF-8, encoded on the wire).
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl Envelope {
    /// Creates an envelope with one recipient.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Sets the sender display name.
    #[must_use]
    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = Some(name.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }
}

/// A message ready for the DATA phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    sender: Address,
    recipients: Vec<Address>,
    message_id: MessageId,
    text: String,
}

impl ComposedMessage {
    /// Envelope sender for `MAIL FROM`.
    #[must_use]
    pub const fn sender(&self) -> &Address {
        &self.sender
    }

    /// Envelope recipients for `RCPT TO`: `to`, then `cc`, then `bcc`.
    #[must_use]
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    /// The generated `Message-ID`.
    #[must_use]
    pub const fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Wire text, ending with the `.` terminator line.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Composes a message dated now with a fresh Message-ID.
///
/// # Errors
///
/// Returns [`Error::Config`] if `from` or `to` is empty, if any address or the
/// display name would break the header block, or if `local_name` is not a
/// valid host token.
pub fn compose(envelope: &Envelope, local_name: &str) -> Result<ComposedMessage> {
    validate_local_name(local_name)?;
    compose_with(envelope, Local::now(), MessageId::generate(local_name))
}

/// Composes a message with an explicit date and Message-ID.
///
/// # Errors
///
/// Same as [`compose`].
pub fn compose_with<Tz>(
    envelope: &Envelope,
    date: DateTime<Tz>,
    message_id: MessageId,
) -> Result<ComposedMessage>
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if envelope.from.trim().is_empty() {
        return Err(Error::config("sender address is required"));
    }
    if envelope.to.trim().is_empty() {
        return Err(Error::config("recipient address is required"));
    }

    let sender = match envelope.from_name.as_deref() {
        Some(name) => Mailbox::with_name(name, envelope.from.as_str())?,
        None => Mailbox::new(envelope.from.as_str())?,
    };
    let to = Address::new(envelope.to.as_str())?;
    let cc = parse_list(&envelope.cc)?;
    let bcc = parse_list(&envelope.bcc)?;

    let mut headers = Vec::with_capacity(12);
    headers.push(format!("Date: {}", date.to_rfc2822()));
    headers.push(format!("To: {}", format_address(to.as_str(), None)));
    headers.push(format!("From: {sender}"));
    if !cc.is_empty() {
        headers.push(format!("Cc: {}", join_addresses(&cc)));
    }
    if !bcc.is_empty() {
        headers.push(format!("Bcc: {}", join_addresses(&bcc)));
    }
    headers.push(format!("Subject: {}", encode_subject(&envelope.subject)));
    headers.push(format!("Message-ID: {message_id}"));
    headers.push(format!("X-Mailer: {MAILER}"));
    headers.push("MIME-Version: 1.0".to_string());
    headers.push("Content-Type: text/plain; charset=UTF-8".to_string());
    headers.push("Content-Transfer-Encoding: 8bit".to_string());

    let mut text = headers.join("\r\n");
    text.push_str("\r\n\r\n");
    text.push_str(&transparent_body(&envelope.body));
    text.push_str("\r\n.");

    let mut recipients = Vec::with_capacity(1 + cc.len() + bcc.len());
    recipients.push(to);
    recipients.extend(cc);
    recipients.extend(bcc);

    Ok(ComposedMessage {
        sender: sender.address,
        recipients,
        message_id,
        text,
    })
}

/// Encodes a subject as an RFC 2047 `B` encoded-word.
#[must_use]
pub fn encode_subject(subject: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
}

fn parse_list(addresses: &[String]) -> Result<Vec<Address>> {
    addresses
        .iter()
        .filter(|addr| !addr.trim().is_empty())
        .map(|addr| Address::new(addr.as_str()))
        .collect()
}

fn join_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(|addr| format_address(addr.as_str(), None))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalizes line endings to CRLF and dot-stuffs lines starting with `.`.
fn transparent_body(body: &str) -> String {
    body.split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.starts_with('.') {
                format!(".{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed(envelope: &Envelope) -> Result<ComposedMessage> {
        let date = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        compose_with(
            envelope,
            date,
            MessageId::from_parts(1, 2, "client.example.org"),
        )
    }

    #[test]
    fn headers_in_fixed_order() {
        let envelope = Envelope::new("alice@example.com", "bob@example.com", "Hi", "Hello Bob")
            .from_name("Alice")
            .cc("carol@example.com")
            .bcc("dave@example.com");
        let message = fixed(&envelope).unwrap();

        let expected = [
            "Date: Fri, 1 Mar 2024 12:30:00 +0000",
            "To: bob@example.com",
            "From: \"Alice\" <alice@example.com>",
            "Cc: carol@example.com",
            "Bcc: dave@example.com",
            "Subject: =?UTF-8?B?SGk=?=",
            "Message-ID: <1.2@client.example.org>",
            &format!("X-Mailer: {MAILER}"),
            "MIME-Version: 1.0",
            "Content-Type: text/plain; charset=UTF-8",
            "Content-Transfer-Encoding: 8bit",
            "",
            "Hello Bob",
            ".",
        ]
        .join("\r\n");
        assert_eq!(message.as_str(), expected);
    }

    #[test]
    fn cc_and_bcc_omitted_when_empty() {
        let message = fixed(&Envelope::new("a@x.com", "b@x.com", "s", "b")).unwrap();
        assert!(!message.as_str().contains("\r\nCc:"));
        assert!(!message.as_str().contains("\r\nBcc:"));
        assert!(message.as_str().contains("From: a@x.com\r\n"));
    }

    #[test]
    fn recipients_cover_to_cc_bcc() {
        let envelope = Envelope::new("a@x.com", "b@x.com", "s", "b")
            .cc("c@x.com")
            .bcc("d@x.com");
        let message = fixed(&envelope).unwrap();
        let recipients: Vec<_> = message.recipients().iter().map(Address::as_str).collect();
        assert_eq!(recipients, vec!["b@x.com", "c@x.com", "d@x.com"]);
        assert_eq!(message.sender().as_str(), "a@x.com");
    }

    #[test]
    fn empty_addresses_fail() {
        assert!(matches!(
            fixed(&Envelope::new("", "b@x.com", "s", "b")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            fixed(&Envelope::new("a@x.com", "", "s", "b")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn utf8_subject_is_b_encoded() {
        assert_eq!(encode_subject("Grüße"), "=?UTF-8?B?R3LDvMOfZQ==?=");
    }

    #[test]
    fn body_is_dot_stuffed_and_crlf() {
        assert_eq!(transparent_body("a\n.b\r\nc"), "a\r\n..b\r\nc");
        assert_eq!(transparent_body("."), "..");
    }

    #[test]
    fn compose_uses_local_name_in_message_id() {
        let message = compose(
            &Envelope::new("a@x.com", "b@x.com", "s", "b"),
            "relay.local",
        )
        .unwrap();
        assert!(message.message_id().as_str().ends_with("@relay.local>"));
    }

    #[test]
    fn local_name_with_line_break_is_rejected() {
        let envelope = Envelope::new("a@x.com", "b@x.com", "s", "b");
        assert!(matches!(
            compose(&envelope, "evil\r\nRSET"),
            Err(Error::Config(_))
        ));
        assert!(matches!(compose(&envelope, ""), Err(Error::Config(_))));
    }

    proptest! {
        #[test]
        fn always_ends_with_body_line_then_dot(body in "[ -~\n]{0,200}") {
            let message = fixed(&Envelope::new("a@x.com", "b@x.com", "s", body)).unwrap();
            let lines: Vec<&str> = message.as_str().split("\r\n").collect();
            prop_assert_eq!(lines.last().copied(), Some("."));
            // The terminator is the only bare dot line.
            prop_assert_eq!(lines.iter().filter(|line| **line == ".").count(), 1);
        }

        #[test]
        fn named_address_format(name in "[A-Za-z ]{1,20}") {
            let formatted = format_address("a@b.com", Some(&name));
            prop_assert_eq!(formatted, format!("\"{name}\" <a@b.com>"));
        }
    }
}
