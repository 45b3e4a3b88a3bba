//! Ordered record of one session's exchanges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Written by the client.
    Sent,
    /// Read from the server.
    Received,
}

/// One command or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Position in the session, starting at 0.
    pub sequence: usize,
    /// Who wrote it.
    pub direction: Direction,
    /// Text as it went over the wire, without the trailing CRLF.
    pub text: String,
}

/// Append-only log of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, direction: Direction, text: impl Into<String>) {
        let sequence = self.entries.len();
        self.entries.push(TranscriptEntry {
            sequence,
            direction,
            text: text.into(),
        });
    }

    /// All entries in order of occurrence.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was exchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written by the client.
    pub fn sent(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.direction == Direction::Sent)
    }

    /// Entries read from the server.
    pub fn received(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.direction == Direction::Received)
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let prefix = match entry.direction {
                Direction::Sent => "C:",
                Direction::Received => "S:",
            };
            for line in entry.text.split('\n') {
                writeln!(f, "{prefix} {}", line.trim_end_matches('\r'))?;
            }
        }
        Ok(())
    }
}
