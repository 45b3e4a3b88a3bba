//! # mailpost-mailbox
//!
//! Keyword-filtered retrieval of the newest messages in a mailbox.
//!
//! The mail store itself is reached through [`MailboxAccess`], implemented
//! outside this crate for IMAP or POP3. This crate turns a `key[:value]`
//! filter into [`SearchCriteria`] (values always quoted and escaped), runs
//! the search and reads overview and body of each hit.
//!
//! ## Filters
//!
//! | Filter | Criterion |
//! |---|---|
//! | `unread`, `unseen` | `UNSEEN` |
//! | `read`, `seen` | `SEEN` |
//! | `important`, `starred`, `flagged` | `FLAGGED` |
//! | `spam`, `snoozed`, `social`, `updates`, `forums`, `promotions` | `KEYWORD "..."` |
//! | `trash`, `deleted` | `DELETED` |
//! | `from:x`, `to:x`, `cc:x`, `bcc:x`, `subject:x`, `body:x`, `text:x` | `FROM "x"`, ... |
//! | `before:d`, `on:d`, `since:d` | `BEFORE "d"`, ... |
//! | anything else | `ALL` |
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpost_mailbox::{MailboxConfig, Protocol, retrieve};
//!
//! let config = MailboxConfig::new(Protocol::Imap, "imap.example.com")
//!     .with_login("user@example.com", "password");
//! let unread = retrieve(&my_imap_access, &config, "unread", 10).await?;
//! for message in unread {
//!     println!("{} from {}", message.subject, message.from);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod access;
pub mod config;
pub mod criteria;
mod error;
pub mod retrieve;

pub use access::{MailboxAccess, Overview};
pub use config::{MailboxConfig, Protocol, Security};
pub use criteria::{Filter, SearchCriteria, search_criteria};
pub use error::{Error, Result};
pub use retrieve::{BODY_PART, RetrievedMessage, retrieve};
