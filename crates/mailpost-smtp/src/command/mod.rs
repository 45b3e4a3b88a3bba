//! SMTP command builder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::types::Address;

/// SMTP command issued by the submission session.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH LOGIN - Begin LOGIN authentication
    AuthLogin,
    /// Base64 answer to an AUTH LOGIN challenge
    AuthResponse {
        /// Already-encoded payload
        encoded: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Builds the answer to an AUTH LOGIN challenge.
    #[must_use]
    pub fn auth_response(secret: &str) -> Self {
        Self::AuthResponse {
            encoded: STANDARD.encode(secret.as_bytes()),
        }
    }

    /// Returns the command line without the trailing CRLF.
    ///
    /// AUTH payloads appear in their base64 form only.
    #[must_use]
    pub fn line(&self) -> String {
        match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthLogin => "AUTH LOGIN".to_string(),
            Self::AuthResponse { encoded } => encoded.clone(),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
    }

    /// Serializes the command to bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.line().into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthResponse { .. } => f.write_str("AuthResponse(<credentials>)"),
            other => f.write_str(&other.line()),
        }
    }
}
