//! SMTP response parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from response lines (CRLF already stripped).
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK`
/// - Multi: `250-First line`, `250-Second line`, `250 Last line`
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::InvalidState("empty reply".into()));
    };

    let code = reply_code(first)
        .ok_or_else(|| Error::InvalidState(format!("invalid reply code in {first:?}")))?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        if reply_code(line) != Some(code) {
            return Err(Error::InvalidState(format!(
                "reply line {line:?} does not continue code {code}"
            )));
        }
        message.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(code, message))
}

/// Extracts the leading three-digit code of a reply line.
#[must_use]
pub fn reply_code(line: &str) -> Option<ReplyCode> {
    let digits = line.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(ReplyCode::new)
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Multi-line replies use `-` after the code for continuation; anything else
/// (a space, or nothing at all) ends the reply.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.as_bytes().get(3) != Some(&b'-')
}
