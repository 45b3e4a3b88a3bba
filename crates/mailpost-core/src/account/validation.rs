//! Account validation.

use mailpost_smtp::config::validate_local_name;

use super::model::Account;

/// Validation error for account configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account name is empty.
    EmptyName,
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// SMTP host is empty.
    EmptySmtpHost,
    /// SMTP port is invalid.
    InvalidSmtpPort,
    /// SMTP username is empty.
    EmptySmtpUsername,
    /// SMTP password is empty.
    EmptySmtpPassword,
    /// EHLO name is empty.
    EmptyLocalName,
    /// EHLO name contains whitespace or control characters.
    InvalidLocalName,
    /// Mailbox host is empty.
    EmptyMailboxHost,
    /// Mailbox port is invalid.
    InvalidMailboxPort,
    /// Mailbox username is empty.
    EmptyMailboxUsername,
    /// Mailbox password is empty.
    EmptyMailboxPassword,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyName => "Account name is required",
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptySmtpHost => "SMTP server is required",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
            Self::EmptySmtpUsername => "SMTP username is required",
            Self::EmptySmtpPassword => "SMTP password is required",
            Self::EmptyLocalName => "Local host name is required",
            Self::InvalidLocalName => "Local host name cannot contain spaces or line breaks",
            Self::EmptyMailboxHost => "Mailbox server is required",
            Self::InvalidMailboxPort => "Mailbox port must be 1-65535",
            Self::EmptyMailboxUsername => "Mailbox username is required",
            Self::EmptyMailboxPassword => "Mailbox password is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyName => "name",
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::EmptySmtpHost => "smtp_host",
            Self::InvalidSmtpPort => "smtp_port",
            Self::EmptySmtpUsername => "smtp_username",
            Self::EmptySmtpPassword => "smtp_password",
            Self::EmptyLocalName | Self::InvalidLocalName => "local_name",
            Self::EmptyMailboxHost => "mailbox_host",
            Self::InvalidMailboxPort => "mailbox_port",
            Self::EmptyMailboxUsername => "mailbox_username",
            Self::EmptyMailboxPassword => "mailbox_password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an account configuration.
///
/// SMTP login fields are only checked when credentials are set; the mailbox
/// only when one is attached.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_account(account: &Account) -> ValidationResult {
    let mut errors = Vec::new();

    if account.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    if account.email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !is_valid_email(&account.email) {
        errors.push(ValidationError::InvalidEmail);
    }

    // SMTP
    let smtp = &account.smtp;
    if smtp.endpoint.host.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpHost);
    }
    if smtp.endpoint.port == 0 {
        errors.push(ValidationError::InvalidSmtpPort);
    }
    if let Some(credentials) = &smtp.credentials {
        if credentials.username.trim().is_empty() {
            errors.push(ValidationError::EmptySmtpUsername);
        }
        if credentials.password.is_empty() {
            errors.push(ValidationError::EmptySmtpPassword);
        }
    }
    if smtp.local_name.trim().is_empty() {
        errors.push(ValidationError::EmptyLocalName);
    } else if validate_local_name(&smtp.local_name).is_err() {
        errors.push(ValidationError::InvalidLocalName);
    }

    // Mailbox
    if let Some(mailbox) = &account.mailbox {
        if mailbox.host.trim().is_empty() {
            errors.push(ValidationError::EmptyMailboxHost);
        }
        if mailbox.port == 0 {
            errors.push(ValidationError::InvalidMailboxPort);
        }
        if mailbox.username.trim().is_empty() {
            errors.push(ValidationError::EmptyMailboxUsername);
        }
        if mailbox.password.is_empty() {
            errors.push(ValidationError::EmptyMailboxPassword);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain needs at least one dot and no empty labels
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}
