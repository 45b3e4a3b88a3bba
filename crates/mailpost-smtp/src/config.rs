//! Endpoint and credential configuration for a submission session.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default bound on how long a single reply may take to arrive.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(8);

/// Default bound on establishing the socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// No encryption (not recommended).
    Plain,
    /// STARTTLS upgrade after plaintext connect.
    #[default]
    StartTls,
    /// Implicit TLS (connect directly with TLS).
    ImplicitTls,
}

impl SecurityMode {
    /// Get the conventional submission port for the security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 25,
            Self::StartTls => 587,
            Self::ImplicitTls => 465,
        }
    }
}

/// Where the session connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Server hostname (also used for TLS server name verification).
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: SecurityMode,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: SecurityMode) -> Self {
        Self {
            host: host.into(),
            port,
            security,
        }
    }

    /// Creates an endpoint on the conventional port for `security`.
    #[must_use]
    pub fn with_default_port(host: impl Into<String>, security: SecurityMode) -> Self {
        Self::new(host, security.default_port(), security)
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Login for AUTH LOGIN.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a session needs besides the message itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Server to submit to.
    pub endpoint: Endpoint,
    /// Login; AUTH is skipped when absent.
    pub credentials: Option<Credentials>,
    /// Name announced in EHLO and used as the Message-ID domain.
    pub local_name: String,
    /// Bound on each reply.
    pub read_timeout: Duration,
    /// Bound on establishing the socket.
    pub connect_timeout: Duration,
}

impl SmtpConfig {
    /// Creates a configuration with default identity and timeouts.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            credentials: None,
            local_name: local_hostname(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the login.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Overrides the local identity.
    #[must_use]
    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = local_name.into();
        self
    }

    /// Overrides the reply timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Overrides the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Returns the machine's hostname, or `localhost` if it cannot be read.
#[must_use]
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Checks that `name` can be sent as the EHLO argument and Message-ID domain.
///
/// # Errors
///
/// Returns [`Error::Config`] if the name is empty or contains whitespace or
/// control characters.
pub fn validate_local_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config("local name cannot be empty"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::config(format!(
            "local name {name:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}
