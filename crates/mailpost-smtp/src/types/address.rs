//! Email address types.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Email address for the SMTP envelope.
///
/// Only structural safety is checked: the address must be non-empty and must
/// not contain characters that would break out of `MAIL FROM:<...>` or a
/// header line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the address is empty or contains CR, LF,
    /// `<` or `>`.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.trim().is_empty() {
            return Err(Error::config("address cannot be empty"));
        }

        if addr.contains(['\r', '\n', '<', '>']) {
            return Err(Error::config(format!(
                "address contains forbidden characters: {addr:?}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the name contains a
    /// line break.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.contains(['\r', '\n']) {
            return Err(Error::config("display name cannot contain line breaks"));
        }
        Ok(Self {
            name: Some(name),
            address: Address::new(address)?,
        })
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_address(
            self.address.as_str(),
            self.name.as_deref(),
        ))
    }
}

/// Formats an address for a header line.
///
/// Produces `"Name" <address>` when a non-empty display name is given and the
/// bare address otherwise.
#[must_use]
pub fn format_address(address: &str, display_name: Option<&str>) -> String {
    match display_name {
        Some(name) if !name.is_empty() => format!("\"{name}\" <{address}>"),
        _ => address.to_string(),
    }
}
