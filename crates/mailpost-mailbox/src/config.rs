//! Mailbox endpoint configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mailbox folder opened when none is configured.
pub const DEFAULT_FOLDER: &str = "INBOX";

/// Mail-store protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// IMAP4.
    #[default]
    Imap,
    /// POP3.
    Pop3,
}

/// Connection security for the mail store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// No encryption.
    None,
    /// Plaintext upgraded with STARTTLS/STLS.
    StartTls,
    /// TLS from the start.
    #[default]
    Tls,
}

impl Security {
    /// Returns the default port for this protocol and security mode.
    #[must_use]
    pub const fn default_port(self, protocol: Protocol) -> u16 {
        match (protocol, self) {
            (Protocol::Imap, Self::None | Self::StartTls) => 143,
            (Protocol::Imap, Self::Tls) => 993,
            (Protocol::Pop3, Self::None | Self::StartTls) => 110,
            (Protocol::Pop3, Self::Tls) => 995,
        }
    }
}

/// Where and as whom to open a mailbox.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Mail-store protocol.
    pub protocol: Protocol,
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection security.
    pub security: Security,
    /// Folder to open.
    pub folder: String,
    /// Login name.
    pub username: String,
    /// Login secret.
    pub password: String,
}

impl MailboxConfig {
    /// Creates a configuration for `INBOX` on the protocol's default TLS port.
    #[must_use]
    pub fn new(protocol: Protocol, host: impl Into<String>) -> Self {
        let security = Security::default();
        Self {
            protocol,
            host: host.into(),
            port: security.default_port(protocol),
            security,
            folder: DEFAULT_FOLDER.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Sets the security mode and moves to its default port.
    #[must_use]
    pub const fn with_security(mut self, security: Security) -> Self {
        self.security = security;
        self.port = security.default_port(self.protocol);
        self
    }

    /// Overrides the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the folder to open.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Sets the login.
    #[must_use]
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Builds the mailbox URI, e.g. `imaps://imap.example.com:993/INBOX`.
    ///
    /// Implicit TLS uses the `imaps`/`pops` scheme. STARTTLS keeps the plain
    /// scheme and appends `;starttls`, so each security mode has its own URI.
    #[must_use]
    pub fn uri(&self) -> String {
        let scheme = match (self.protocol, self.security) {
            (Protocol::Imap, Security::Tls) => "imaps",
            (Protocol::Imap, _) => "imap",
            (Protocol::Pop3, Security::Tls) => "pops",
            (Protocol::Pop3, _) => "pop",
        };
        let suffix = match self.security {
            Security::StartTls => ";starttls",
            Security::None | Security::Tls => "",
        };
        format!("{scheme}://{}:{}/{}{suffix}", self.host, self.port, self.folder)
    }
}

impl fmt::Debug for MailboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("folder", &self.folder)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
