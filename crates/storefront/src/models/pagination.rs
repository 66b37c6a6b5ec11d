//! Cursor pagination.
//!
//! Cursors are opaque to clients: URL-safe base64 of the offset of the next
//! page. A page is fetched with one extra row to learn whether another page
//! follows.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;

const CURSOR_PREFIX: &str = "o:";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid cursor")]
pub struct CursorError;

/// Position of the first row of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    offset: i64,
}

impl Cursor {
    #[must_use]
    pub const fn start() -> Self {
        Self { offset: 0 }
    }

    #[must_use]
    pub const fn offset(self) -> i64 {
        self.offset
    }

    /// Decode an optional client-supplied cursor; `None` is the first page.
    ///
    /// # Errors
    ///
    /// Returns `CursorError` for anything this module did not produce.
    pub fn decode(raw: Option<&str>) -> Result<Self, CursorError> {
        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return Ok(Self::start());
        };

        let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|_| CursorError)?;
        let text = String::from_utf8(bytes).map_err(|_| CursorError)?;
        let offset = text
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .ok_or(CursorError)?;

        Ok(Self { offset })
    }

    #[must_use]
    pub fn encode(self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{CURSOR_PREFIX}{}", self.offset))
    }

    #[must_use]
    pub const fn advance(self, by: i64) -> Self {
        Self {
            offset: self.offset + by,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with `LIMIT limit + 1`.
    #[must_use]
    pub fn from_overfetch(mut rows: Vec<T>, cursor: Cursor, limit: i64) -> Self {
        let page_len = usize::try_from(limit).unwrap_or(0);
        let next_cursor = if rows.len() > page_len {
            rows.truncate(page_len);
            Some(cursor.advance(limit).encode())
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}
