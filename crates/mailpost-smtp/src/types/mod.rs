//! Core SMTP types.

mod address;
mod reply;

pub use address::{Address, Mailbox, format_address};
pub use reply::{Reply, ReplyCode};
