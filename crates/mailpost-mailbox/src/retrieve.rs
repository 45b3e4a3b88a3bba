//! Filtered retrieval of the newest messages.

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info_span, warn};

use crate::access::MailboxAccess;
use crate::config::MailboxConfig;
use crate::criteria::{Filter, SearchCriteria};
use crate::error::Result;

/// Body section read for each message (the text part of a simple
/// multipart/alternative message).
pub const BODY_PART: &str = "2";

/// One retrieved message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedMessage {
    /// Subject header.
    pub subject: String,
    /// From header.
    pub from: String,
    /// Date header.
    pub date: String,
    /// Content of [`BODY_PART`].
    pub body: String,
}

/// Returns up to `limit` messages matching `filter`, newest first.
///
/// The mailbox is closed before returning whenever it was opened. A failed
/// search yields an empty list.
///
/// # Errors
///
/// Returns [`Error::InvalidFilter`](crate::Error::InvalidFilter) for a filter
/// that cannot be quoted, [`Error::Connection`](crate::Error::Connection) if
/// the mailbox cannot be opened, and the first fetch error otherwise.
pub async fn retrieve<A: MailboxAccess>(
    access: &A,
    config: &MailboxConfig,
    filter: &str,
    limit: usize,
) -> Result<Vec<RetrievedMessage>> {
    let criteria = Filter::parse(filter)?.criteria();
    let uri = config.uri();
    let span = info_span!("mailbox_retrieve", %uri, %criteria, limit);

    async {
        let mut handle = access
            .open(&uri, &config.username, &config.password)
            .await?;
        let result = collect(access, &mut handle, &criteria, limit).await;
        access.close(handle).await;
        debug!("mailbox closed");
        result
    }
    .instrument(span)
    .await
}

async fn collect<A: MailboxAccess>(
    access: &A,
    handle: &mut A::Handle,
    criteria: &SearchCriteria,
    limit: usize,
) -> Result<Vec<RetrievedMessage>> {
    let mut uids = match access.search(handle, criteria).await {
        Ok(uids) => uids,
        Err(error) => {
            warn!(%error, "search failed, returning no messages");
            return Ok(Vec::new());
        }
    };
    debug!(matches = uids.len(), "search complete");

    // UIDs grow with arrival order.
    uids.sort_unstable_by(|a, b| b.cmp(a));
    uids.truncate(limit);

    let mut messages = Vec::with_capacity(uids.len());
    for uid in uids {
        let overview = access.fetch_overview(handle, uid).await?;
        let body = access.fetch_body(handle, uid, BODY_PART).await?;
        messages.push(RetrievedMessage {
            subject: overview.subject,
            from: overview.from,
            date: overview.date,
            body,
        });
    }
    Ok(messages)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::access::Overview;
    use crate::config::Protocol;
    use crate::error::Error;

    #[derive(Debug, Default)]
    struct FakeMailbox {
        messages: BTreeMap<u32, (Overview, String)>,
        refuse_open: bool,
        fail_search: bool,
        searches: Mutex<Vec<String>>,
        opened: Mutex<Vec<(String, String)>>,
        body_parts: Mutex<Vec<String>>,
        closes: AtomicUsize,
    }

    impl FakeMailbox {
        fn with_messages(count: u32) -> Self {
            let messages = (1..=count)
                .map(|uid| {
                    let overview = Overview {
                        subject: format!("subject {uid}"),
                        from: format!("sender{uid}@example.com"),
                        date: format!("Mon, {uid} Jan 2024 10:00:00 +0000"),
                    };
                    (uid, (overview, format!("body {uid}")))
                })
                .collect();
            Self {
                messages,
                ..Self::default()
            }
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    struct FakeHandle;

    impl MailboxAccess for FakeMailbox {
        type Handle = FakeHandle;

        async fn open(&self, uri: &str, username: &str, _password: &str) -> Result<FakeHandle> {
            if self.refuse_open {
                return Err(Error::Connection(format!("cannot reach {uri}")));
            }
            self.opened
                .lock()
                .unwrap()
                .push((uri.to_string(), username.to_string()));
            Ok(FakeHandle)
        }

        async fn search(
            &self,
            _handle: &mut FakeHandle,
            criteria: &SearchCriteria,
        ) -> Result<Vec<u32>> {
            self.searches.lock().unwrap().push(criteria.to_string());
            if self.fail_search {
                return Err(Error::Search("BAD".into()));
            }
            Ok(self.messages.keys().copied().collect())
        }

        async fn fetch_overview(&self, _handle: &mut FakeHandle, uid: u32) -> Result<Overview> {
            self.messages
                .get(&uid)
                .map(|(overview, _)| overview.clone())
                .ok_or_else(|| Error::Fetch {
                    uid,
                    message: "no such message".into(),
                })
        }

        async fn fetch_body(
            &self,
            _handle: &mut FakeHandle,
            uid: u32,
            part: &str,
        ) -> Result<String> {
            self.body_parts.lock().unwrap().push(part.to_string());
            self.messages
                .get(&uid)
                .map(|(_, body)| body.clone())
                .ok_or_else(|| Error::Fetch {
                    uid,
                    message: "no such message".into(),
                })
        }

        async fn close(&self, _handle: FakeHandle) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> MailboxConfig {
        MailboxConfig::new(Protocol::Imap, "imap.example.com").with_login("me", "secret")
    }

    #[tokio::test]
    async fn newest_first_up_to_limit() {
        let mailbox = FakeMailbox::with_messages(5);
        let messages = retrieve(&mailbox, &config(), "all", 3).await.unwrap();

        let subjects: Vec<_> = messages.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["subject 5", "subject 4", "subject 3"]);
        assert_eq!(messages[0].body, "body 5");
        assert_eq!(messages[0].from, "sender5@example.com");
        assert_eq!(mailbox.closes(), 1);
        assert_eq!(*mailbox.body_parts.lock().unwrap(), vec!["2", "2", "2"]);
        assert_eq!(
            *mailbox.opened.lock().unwrap(),
            vec![("imaps://imap.example.com:993/INBOX".to_string(), "me".to_string())]
        );
    }

    #[tokio::test]
    async fn filter_is_translated_and_quoted() {
        let mailbox = FakeMailbox::with_messages(1);
        retrieve(&mailbox, &config(), "From:alice \"the\" admin", 10)
            .await
            .unwrap();
        retrieve(&mailbox, &config(), "spam", 10).await.unwrap();
        retrieve(&mailbox, &config(), "whatever", 10).await.unwrap();

        assert_eq!(
            *mailbox.searches.lock().unwrap(),
            vec![
                r#"FROM "alice \"the\" admin""#,
                r#"KEYWORD "Junk""#,
                "ALL",
            ]
        );
        assert_eq!(mailbox.closes(), 3);
    }

    #[tokio::test]
    async fn failed_search_is_empty_and_closes() {
        let mailbox = FakeMailbox {
            fail_search: true,
            ..FakeMailbox::with_messages(2)
        };
        let messages = retrieve(&mailbox, &config(), "unseen", 10).await.unwrap();
        assert!(messages.is_empty());
        assert_eq!(mailbox.closes(), 1);
    }

    #[tokio::test]
    async fn open_failure_is_connection_error() {
        let mailbox = FakeMailbox {
            refuse_open: true,
            ..FakeMailbox::default()
        };
        let err = retrieve(&mailbox, &config(), "all", 10).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(mailbox.closes(), 0);
    }

    #[tokio::test]
    async fn invalid_filter_never_opens() {
        let mailbox = FakeMailbox::with_messages(1);
        let err = retrieve(&mailbox, &config(), "subject:a\r\nb", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
        assert!(mailbox.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_limit_fetches_nothing() {
        let mailbox = FakeMailbox::with_messages(3);
        let messages = retrieve(&mailbox, &config(), "all", 0).await.unwrap();
        assert!(messages.is_empty());
        assert!(mailbox.body_parts.lock().unwrap().is_empty());
        assert_eq!(mailbox.closes(), 1);
    }
}
