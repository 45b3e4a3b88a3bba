//! The mailbox-access seam.
//!
//! Implementations talk to a real mail store (IMAP, POP3). The retrieval
//! operation only relies on the five calls below.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::criteria::SearchCriteria;
use crate::error::Result;

/// Summary fields of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    /// Subject header.
    pub subject: String,
    /// From header.
    pub from: String,
    /// Date header.
    pub date: String,
}

/// Opens, searches and reads a mailbox.
pub trait MailboxAccess {
    /// An open mailbox.
    type Handle: Send;

    /// Opens the mailbox at `uri`, as built by
    /// [`MailboxConfig::uri`](crate::MailboxConfig::uri). A `;starttls`
    /// suffix asks for an upgrade after the plaintext connect.
    ///
    /// Fails with [`Error::Connection`](crate::Error::Connection).
    fn open(
        &self,
        uri: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Self::Handle>> + Send;

    /// Returns the UIDs of all messages matching `criteria`.
    fn search(
        &self,
        handle: &mut Self::Handle,
        criteria: &SearchCriteria,
    ) -> impl Future<Output = Result<Vec<u32>>> + Send;

    /// Reads the summary of message `uid`.
    fn fetch_overview(
        &self,
        handle: &mut Self::Handle,
        uid: u32,
    ) -> impl Future<Output = Result<Overview>> + Send;

    /// Reads body section `part` of message `uid`.
    fn fetch_body(
        &self,
        handle: &mut Self::Handle,
        uid: u32,
        part: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Closes the mailbox.
    fn close(&self, handle: Self::Handle) -> impl Future<Output = ()> + Send;
}
