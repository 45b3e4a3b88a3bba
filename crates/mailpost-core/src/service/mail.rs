//! Mailbox service for reading emails.

use mailpost_mailbox::{MailboxAccess, RetrievedMessage, retrieve};
use tracing::info;

use crate::account::{Account, validate_account};
use crate::error::{Error, Result};

/// Fetch up to `limit` messages matching `filter` from the account's
/// mailbox, newest first.
///
/// # Errors
///
/// Returns [`Error::Config`] if the account has no mailbox, a validation
/// error for an incomplete account, and [`Error::Mailbox`] if the mailbox
/// cannot be opened or read.
pub async fn fetch_messages<A: MailboxAccess>(
    account: &Account,
    access: &A,
    filter: &str,
    limit: usize,
) -> Result<Vec<RetrievedMessage>> {
    let mailbox = account
        .mailbox
        .as_ref()
        .ok_or_else(|| Error::Config(format!("account '{}' has no mailbox", account.name)))?;
    validate_account(account)?;

    let messages = retrieve(access, mailbox, filter, limit).await?;
    info!(account = %account.name, filter, count = messages.len(), "fetched messages");
    Ok(messages)
}
