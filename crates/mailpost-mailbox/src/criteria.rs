//! Search criteria and the filter keywords that map onto them.
//!
//! A filter is written `key` or `key:value`. Keys are case-insensitive and
//! unknown keys match every message.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single search criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with \Seen flag.
    Seen,
    /// Messages without \Seen flag.
    Unseen,
    /// Messages with \Flagged flag.
    Flagged,
    /// Messages without \Flagged flag.
    Unflagged,
    /// Messages with \Answered flag.
    Answered,
    /// Messages without \Answered flag.
    Unanswered,
    /// Messages with \Deleted flag.
    Deleted,
    /// Messages without \Deleted flag.
    Undeleted,
    /// Messages with \Draft flag.
    Draft,
    /// Recent and unseen.
    New,
    /// Not recent.
    Old,
    /// Messages with \Recent flag.
    Recent,
    /// Messages carrying a keyword.
    Keyword(String),
    /// Messages not carrying a keyword.
    Unkeyword(String),
    /// Bcc contains text.
    Bcc(String),
    /// Cc contains text.
    Cc(String),
    /// Internal date before the given date.
    Before(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Subject contains text.
    Subject(String),
    /// Body contains text.
    Body(String),
    /// Text in header or body.
    Text(String),
    /// Internal date on the given date.
    On(String),
    /// Internal date on or after the given date.
    Since(String),
}

impl SearchCriteria {
    fn parts(&self) -> (&'static str, Option<&str>) {
        match self {
            Self::All => ("ALL", None),
            Self::Seen => ("SEEN", None),
            Self::Unseen => ("UNSEEN", None),
            Self::Flagged => ("FLAGGED", None),
            Self::Unflagged => ("UNFLAGGED", None),
            Self::Answered => ("ANSWERED", None),
            Self::Unanswered => ("UNANSWERED", None),
            Self::Deleted => ("DELETED", None),
            Self::Undeleted => ("UNDELETED", None),
            Self::Draft => ("DRAFT", None),
            Self::New => ("NEW", None),
            Self::Old => ("OLD", None),
            Self::Recent => ("RECENT", None),
            Self::Keyword(v) => ("KEYWORD", Some(v.as_str())),
            Self::Unkeyword(v) => ("UNKEYWORD", Some(v.as_str())),
            Self::Bcc(v) => ("BCC", Some(v.as_str())),
            Self::Cc(v) => ("CC", Some(v.as_str())),
            Self::Before(v) => ("BEFORE", Some(v.as_str())),
            Self::From(v) => ("FROM", Some(v.as_str())),
            Self::To(v) => ("TO", Some(v.as_str())),
            Self::Subject(v) => ("SUBJECT", Some(v.as_str())),
            Self::Body(v) => ("BODY", Some(v.as_str())),
            Self::Text(v) => ("TEXT", Some(v.as_str())),
            Self::On(v) => ("ON", Some(v.as_str())),
            Self::Since(v) => ("SINCE", Some(v.as_str())),
        }
    }

    /// Returns the search keyword, e.g. `FROM`.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        self.parts().0
    }

    /// Returns the unquoted argument, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.parts().1
    }
}

/// Renders the criterion in search-command form with the value quoted.
impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (keyword, value) = self.parts();
        f.write_str(keyword)?;
        if let Some(value) = value {
            f.write_str(" ")?;
            write_quoted(f, value)?;
        }
        Ok(())
    }
}

/// Writes `value` as a quoted string, escaping `"` and `\`.
fn write_quoted(f: &mut impl fmt::Write, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

/// Maps a lower-case filter key and its value to a criterion.
///
/// Keys that take no value ignore `value`. Unknown keys yield
/// [`SearchCriteria::All`].
#[must_use]
pub fn search_criteria(key: &str, value: &str) -> SearchCriteria {
    let value = || value.to_string();
    match key {
        "unread" | "unseen" => SearchCriteria::Unseen,
        "read" | "seen" => SearchCriteria::Seen,
        "important" | "starred" | "flagged" => SearchCriteria::Flagged,
        "spam" => SearchCriteria::Keyword("Junk".into()),
        "snoozed" => SearchCriteria::Keyword("Snoozed".into()),
        "draft" => SearchCriteria::Draft,
        "trash" | "deleted" => SearchCriteria::Deleted,
        "social" => SearchCriteria::Keyword("Social".into()),
        "updates" => SearchCriteria::Keyword("Updates".into()),
        "forums" => SearchCriteria::Keyword("Forums".into()),
        "promotions" => SearchCriteria::Keyword("Promotions".into()),
        "bcc" => SearchCriteria::Bcc(value()),
        "cc" => SearchCriteria::Cc(value()),
        "before" => SearchCriteria::Before(value()),
        "from" => SearchCriteria::From(value()),
        "to" => SearchCriteria::To(value()),
        "subject" => SearchCriteria::Subject(value()),
        "body" => SearchCriteria::Body(value()),
        "text" => SearchCriteria::Text(value()),
        "on" => SearchCriteria::On(value()),
        "since" => SearchCriteria::Since(value()),
        "unkeyword" => SearchCriteria::Unkeyword(value()),
        "answered" => SearchCriteria::Answered,
        "unanswered" => SearchCriteria::Unanswered,
        "undeleted" => SearchCriteria::Undeleted,
        "unflagged" => SearchCriteria::Unflagged,
        "new" => SearchCriteria::New,
        "old" => SearchCriteria::Old,
        "recent" => SearchCriteria::Recent,
        _ => SearchCriteria::All,
    }
}

/// A parsed `key[:value]` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    key: String,
    value: String,
}

impl Filter {
    /// Parses a filter, lower-casing the key and splitting on the first `:`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the value contains a line break or
    /// NUL, which a quoted search string cannot carry.
    pub fn parse(filter: &str) -> Result<Self> {
        let (key, value) = filter.split_once(':').unwrap_or((filter, ""));
        if value.contains(['\r', '\n', '\0']) {
            return Err(Error::InvalidFilter(format!(
                "value for '{key}' contains a control character"
            )));
        }
        Ok(Self {
            key: key.to_lowercase(),
            value: value.to_string(),
        })
    }

    /// Lower-cased key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value after the first colon, or empty.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Translates the filter to a criterion.
    #[must_use]
    pub fn criteria(&self) -> SearchCriteria {
        search_criteria(&self.key, &self.value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_with_value() {
        assert_eq!(
            search_criteria("from", "alice@x.com"),
            SearchCriteria::From("alice@x.com".into())
        );
    }

    #[test]
    fn unknown_key_matches_all() {
        assert_eq!(search_criteria("xyz", ""), SearchCriteria::All);
        assert_eq!(search_criteria("", ""), SearchCriteria::All);
        assert_eq!(search_criteria("latest", ""), SearchCriteria::All);
    }

    #[test]
    fn aliases() {
        assert_eq!(search_criteria("unread", ""), SearchCriteria::Unseen);
        assert_eq!(search_criteria("read", ""), SearchCriteria::Seen);
        assert_eq!(search_criteria("starred", ""), SearchCriteria::Flagged);
        assert_eq!(search_criteria("trash", ""), SearchCriteria::Deleted);
        assert_eq!(
            search_criteria("spam", ""),
            SearchCriteria::Keyword("Junk".into())
        );
        assert_eq!(
            search_criteria("promotions", "ignored"),
            SearchCriteria::Keyword("Promotions".into())
        );
    }

    #[test]
    fn display_quotes_values() {
        assert_eq!(SearchCriteria::Unseen.to_string(), "UNSEEN");
        assert_eq!(
            search_criteria("spam", "").to_string(),
            "KEYWORD \"Junk\""
        );
        assert_eq!(
            SearchCriteria::Subject("say \"hi\" \\o/".into()).to_string(),
            r#"SUBJECT "say \"hi\" \\o/""#
        );
        assert_eq!(SearchCriteria::From(String::new()).to_string(), "FROM \"\"");
    }

    #[test]
    fn filter_parsing() {
        let filter = Filter::parse("FROM:Alice@X.com").unwrap();
        assert_eq!(filter.key(), "from");
        assert_eq!(filter.value(), "Alice@X.com");

        let filter = Filter::parse("subject:re: lunch").unwrap();
        assert_eq!(filter.criteria(), SearchCriteria::Subject("re: lunch".into()));

        let filter = Filter::parse("Unread").unwrap();
        assert_eq!(filter.value(), "");
        assert_eq!(filter.criteria(), SearchCriteria::Unseen);
    }

    #[test]
    fn filter_rejects_line_breaks() {
        assert!(matches!(
            Filter::parse("subject:x\r\nA2 DELETE INBOX"),
            Err(Error::InvalidFilter(_))
        ));
    }

    /// Undoes the quoting done by `Display`, returning the content and
    /// whatever follows the closing quote.
    fn unquote(s: &str) -> Option<(String, &str)> {
        let rest = s.strip_prefix('"')?;
        let mut out = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => out.push(chars.next()?.1),
                '"' => return Some((out, &rest[i + 1..])),
                other => out.push(other),
            }
        }
        None
    }

    proptest! {
        #[test]
        fn quoted_value_never_escapes(value in "[ -~]{0,64}") {
            let rendered = SearchCriteria::Text(value.clone()).to_string();
            let quoted = rendered.strip_prefix("TEXT ").unwrap();
            let (content, trailing) = unquote(quoted).unwrap();
            prop_assert_eq!(content, value);
            prop_assert_eq!(trailing, "");
        }

        #[test]
        fn keys_are_case_insensitive(key in "(from|subject|unseen|spam|xyz)") {
            let upper = Filter::parse(&format!("{}:v", key.to_uppercase())).unwrap();
            let lower = Filter::parse(&format!("{key}:v")).unwrap();
            prop_assert_eq!(upper.criteria(), lower.criteria());
        }
    }
}
