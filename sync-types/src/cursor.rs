//! Pagination cursors.
//!
//! The listing endpoints hand back an opaque `nextId` token with every page.
//! Two situations must never be confused:
//! - "no cursor supplied yet" (start from the beginning), and
//! - "no more pages" (the server returned `nextId: null`).
//!
//! They are modelled as two distinct types: [`PageCursor`] is what the client
//! sends, [`NextCursor`] is what the server returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The cursor sent with a page request.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum PageCursor {
    /// First page of a traversal. Sent as "no `nextId` parameter".
    #[default]
    Start,
    /// A token previously returned by the same endpoint.
    At(String),
}

impl PageCursor {
    /// The `nextId` query value for this cursor, if one is sent.
    pub fn as_query_value(&self) -> Option<&str> {
        match self {
            Self::Start => None,
            Self::At(token) => Some(token),
        }
    }

    /// Check if this is the first page of a traversal.
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }
}

impl fmt::Debug for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "PageCursor(start)"),
            Self::At(token) => write!(f, "PageCursor({})", token),
        }
    }
}

/// The `nextId` returned with a page.
///
/// `null` (or a missing field) is the end-of-pagination sentinel.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NextCursor(Option<String>);

impl NextCursor {
    /// A cursor pointing at a further page.
    pub fn more(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// The terminal sentinel.
    pub fn end() -> Self {
        Self(None)
    }

    /// Check if the server signalled that no further pages remain.
    pub fn is_end(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the raw token, if any.
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Take the raw token, `None` on the terminal sentinel.
    pub fn into_token(self) -> Option<String> {
        self.0
    }
}

impl fmt::Debug for NextCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => write!(f, "NextCursor(end)"),
            Some(token) => write!(f, "NextCursor({:?})", token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_next_id_is_terminal() {
        let next: NextCursor = serde_json::from_str("null").unwrap();
        assert!(next.is_end());
        assert_eq!(next.into_token(), None);
    }

    #[test]
    fn empty_string_is_not_terminal() {
        // "" is a (bogus) token, not the end sentinel
        let next: NextCursor = serde_json::from_str("\"\"").unwrap();
        assert!(!next.is_end());
        assert_eq!(next.token(), Some(""));
    }

    #[test]
    fn more_yields_its_token() {
        let next = NextCursor::more("c1");
        assert_eq!(next.into_token(), Some("c1".to_string()));
    }

    #[test]
    fn start_cursor_sends_no_query_value() {
        assert_eq!(PageCursor::Start.as_query_value(), None);
        assert_eq!(PageCursor::At("c9".into()).as_query_value(), Some("c9"));
        assert!(PageCursor::default().is_start());
    }
}
