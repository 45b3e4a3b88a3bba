//! SMTP service for sending emails.
//!
//! Provides the single send entry point on top of the SMTP session.

use mailpost_smtp::{Envelope, SendReport};
use tracing::info;

use crate::account::{Account, validate_account};
use crate::error::Result;

/// Send an email using the account's SMTP settings.
///
/// An envelope without a sender is sent from the account address, with the
/// account display name when the envelope has none.
///
/// # Errors
///
/// Returns [`Error::Validation`](crate::Error::Validation) for an incomplete
/// account and [`Error::Smtp`](crate::Error::Smtp), transcript attached, if
/// composition or the session fails.
pub async fn send_email(account: &Account, envelope: Envelope) -> Result<SendReport> {
    validate_account(account)?;
    let envelope = with_account_sender(account, envelope);

    info!(
        account = %account.name,
        recipients = 1 + envelope.cc.len() + envelope.bcc.len(),
        "sending email"
    );
    Ok(mailpost_smtp::send_mail(&account.smtp, &envelope).await?)
}

fn with_account_sender(account: &Account, mut envelope: Envelope) -> Envelope {
    if envelope.from.trim().is_empty() {
        envelope.from.clone_from(&account.email);
    }
    if envelope.from_name.is_none() {
        envelope.from_name.clone_from(&account.display_name);
    }
    envelope
}
