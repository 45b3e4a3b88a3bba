//! Account model types.

use mailpost_mailbox::MailboxConfig;
use mailpost_smtp::SmtpConfig;
use serde::{Deserialize, Serialize};

/// A sending identity with its submission server and, optionally, the
/// mailbox it reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Display name for the account.
    pub name: String,
    /// Email address, used as the default sender.
    pub email: String,
    /// Sender display name used when an envelope has none.
    pub display_name: Option<String>,
    /// SMTP submission settings.
    pub smtp: SmtpConfig,
    /// Mailbox to search, if any.
    pub mailbox: Option<MailboxConfig>,
}

impl Account {
    /// Creates an account that submits through `smtp`.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, smtp: SmtpConfig) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            display_name: None,
            smtp,
            mailbox: None,
        }
    }

    /// Sets the default sender display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attaches a mailbox.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: MailboxConfig) -> Self {
        self.mailbox = Some(mailbox);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailpost_mailbox::Protocol;
    use mailpost_smtp::{Credentials, Endpoint, SecurityMode};

    use super::*;

    #[test]
    fn builders_fill_optional_parts() {
        let smtp = SmtpConfig::new(Endpoint::with_default_port(
            "smtp.example.com",
            SecurityMode::StartTls,
        ));
        let account = Account::new("Work", "me@example.com", smtp);
        assert!(account.display_name.is_none());
        assert!(account.mailbox.is_none());

        let account = account
            .with_display_name("Me")
            .with_mailbox(MailboxConfig::new(Protocol::Imap, "imap.example.com"));
        assert_eq!(account.display_name.as_deref(), Some("Me"));
        assert_eq!(
            account.mailbox.unwrap().uri(),
            "imaps://imap.example.com:993/INBOX"
        );
    }

    #[test]
    fn serializes_to_json() {
        let smtp = SmtpConfig::new(Endpoint::with_default_port(
            "smtp.example.com",
            SecurityMode::ImplicitTls,
        ))
        .with_credentials(Credentials::new("me@example.com", "secret"));
        let account = Account::new("Work", "me@example.com", smtp)
            .with_display_name("Someone")
            .with_mailbox(
                MailboxConfig::new(Protocol::Imap, "imap.example.com")
                    .with_login("me@example.com", "secret"),
            );
        let json = serde_json::to_string(&account).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
