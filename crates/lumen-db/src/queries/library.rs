use anyhow::Result;
use rusqlite::params;

use super::{OptionalExt, summary_at};
use crate::Database;
use crate::models::{BookSummaryRow, LibraryRow, ReadingTotalsRow, SaveOutcome};

/// Sort orders for a personal library listing, keyed by their wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryOrdering {
    /// Most recently saved first.
    Saved = 1,
    Title = 2,
    Author = 3,
    /// Newest publication first.
    Published = 4,
}

impl LibraryOrdering {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Saved),
            2 => Some(Self::Title),
            3 => Some(Self::Author),
            4 => Some(Self::Published),
            _ => None,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Saved => "lb.created_at DESC, lb.id DESC",
            Self::Title => "b.title ASC, lb.id ASC",
            Self::Author => "b.author ASC, lb.id ASC",
            Self::Published => "b.publication_date DESC, lb.id ASC",
        }
    }
}

impl Database {
    // -- Libraries --

    pub fn library_for_user(&self, user_id: i64) -> Result<Option<LibraryRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT l.id, l.name, l.image_url, u.nickname, u.image_url
                 FROM libraries l
                 JOIN users u ON u.id = l.user_id
                 WHERE l.user_id = ?1",
                [user_id],
                |row| {
                    Ok(LibraryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        image_url: row.get(2)?,
                        nickname: row.get(3)?,
                        user_image: row.get(4)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Saves a book into the user's library, creating the library (named
    /// `library_name`) on first use.
    pub fn save_to_library(&self, user_id: i64, library_name: &str, book_id: i64) -> Result<SaveOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let book: Option<i64> = tx
                .query_row("SELECT id FROM books WHERE id = ?1", [book_id], |row| row.get(0))
                .optional()?;
            if book.is_none() {
                return Ok(SaveOutcome::NoSuchBook);
            }

            tx.execute(
                "INSERT OR IGNORE INTO libraries (user_id, name) VALUES (?1, ?2)",
                params![user_id, library_name],
            )?;
            let library_id: i64 = tx.query_row(
                "SELECT id FROM libraries WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO library_books (library_id, book_id) VALUES (?1, ?2)",
                params![library_id, book_id],
            )?;

            tx.commit()?;
            Ok(if inserted == 0 {
                SaveOutcome::AlreadySaved
            } else {
                SaveOutcome::Saved
            })
        })
    }

    pub fn library_books(&self, user_id: i64, ordering: LibraryOrdering) -> Result<Vec<BookSummaryRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT b.id, b.title, b.author, b.image_url
                 FROM library_books lb
                 JOIN libraries l ON l.id = lb.library_id
                 JOIN books b ON b.id = lb.book_id
                 WHERE l.user_id = ?1
                 ORDER BY {}",
                ordering.order_by()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], |row| summary_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reading progress --

    /// Upserts the (user, book) progress row: pages are overwritten, time
    /// accumulates.
    pub fn record_progress(&self, user_id: i64, book_id: i64, page: i64, read_secs: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_books (user_id, book_id, page, read_secs) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, book_id) DO UPDATE SET
                    page = excluded.page,
                    read_secs = user_books.read_secs + excluded.read_secs,
                    updated_at = datetime('now')",
                params![user_id, book_id, page, read_secs],
            )?;
            Ok(())
        })
    }

    pub fn reading_totals(&self, user_id: i64) -> Result<ReadingTotalsRow> {
        self.with_conn(|conn| {
            let totals = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(read_secs), 0) FROM user_books WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(ReadingTotalsRow {
                        book_count: row.get(0)?,
                        read_secs: row.get(1)?,
                    })
                },
            )?;
            Ok(totals)
        })
    }

    /// Category the user has read the most books in; lowest id wins ties.
    pub fn favourite_category(&self, user_id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT b.category_id
                 FROM user_books ub
                 JOIN books b ON b.id = ub.book_id
                 WHERE ub.user_id = ?1
                 GROUP BY b.category_id
                 ORDER BY COUNT(*) DESC, b.category_id ASC
                 LIMIT 1",
                [user_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Most recently published book, optionally within one category.
    pub fn latest_book(&self, category_id: Option<i64>) -> Result<Option<BookSummaryRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, author, image_url FROM books
                 WHERE ?1 IS NULL OR category_id = ?1
                 ORDER BY publication_date DESC, id ASC
                 LIMIT 1",
                [category_id],
                |row| summary_at(row, 0),
            )
            .optional()
        })
    }
}
