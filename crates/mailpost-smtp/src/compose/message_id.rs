//! Message-ID generation.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// A `Message-ID` header value, angle brackets included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generates `<time.random@local>` from the current time and 8 bytes of
    /// OS randomness, both base-36 encoded.
    #[must_use]
    pub fn generate(local: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        Self::from_parts(nanos, OsRng.next_u64(), local)
    }

    /// Builds an id from an explicit timestamp and random component.
    #[must_use]
    pub fn from_parts(timestamp: u128, random: u64, local: &str) -> Self {
        Self(format!(
            "<{}.{}@{local}>",
            to_base36(timestamp),
            to_base36(u128::from(random))
        ))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        // value % 36 < 36, so the index always fits
        #[allow(clippy::cast_possible_truncation)]
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u128::from(u64::MAX)), "3w5e11264sgsf");
    }

    #[test]
    fn shape() {
        let id = MessageId::from_parts(36, 35, "mail.example.com");
        assert_eq!(id.as_str(), "<10.z@mail.example.com>");
    }

    #[test]
    fn same_tick_different_random_differs() {
        let a = MessageId::from_parts(1_700_000_000, 1, "host");
        let b = MessageId::from_parts(1_700_000_000, 2, "host");
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> =
            (0..1000).map(|_| MessageId::generate("host")).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn generated_id_is_bracketed() {
        let id = MessageId::generate("client.example.org");
        assert!(id.as_str().starts_with('<'));
        assert!(id.as_str().ends_with("@client.example.org>"));
        assert_eq!(id.as_str().matches('.').count(), 3);
    }
}
