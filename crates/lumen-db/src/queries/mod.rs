mod catalog;
mod library;
mod reviews;
mod users;

pub use catalog::SearchFilter;
pub use library::LibraryOrdering;

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Row;

use crate::models::BookSummaryRow;

/// Timestamps are stored the way SQLite's `datetime('now')` writes them.
pub(crate) fn sql_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Reads `id, title, author, image_url` starting at column `offset`.
pub(crate) fn summary_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<BookSummaryRow> {
    Ok(BookSummaryRow {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        author: row.get(offset + 2)?,
        image_url: row.get(offset + 3)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
