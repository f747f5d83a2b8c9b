use anyhow::Result;
use rusqlite::{Connection, params};

use super::OptionalExt;
use crate::Database;
use crate::models::{LikeToggle, ReviewRow};

const REVIEW_COLUMNS: &str = "SELECT r.id, r.user_id, r.book_id, u.nickname, u.image_url, r.contents, r.created_at,
        (SELECT COUNT(*) FROM likes l WHERE l.review_id = r.id) AS likes
 FROM reviews r
 JOIN users u ON u.id = r.user_id";

impl Database {
    // -- Reviews --

    pub fn create_review(&self, user_id: i64, book_id: i64, contents: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reviews (user_id, book_id, contents) VALUES (?1, ?2, ?3)",
                params![user_id, book_id, contents],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn reviews_for_book(&self, book_id: i64) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{REVIEW_COLUMNS} WHERE r.book_id = ?1 ORDER BY r.id"))?;
            let rows = stmt
                .query_map([book_id], review_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_review(&self, review_id: i64) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{REVIEW_COLUMNS} WHERE r.id = ?1"), [review_id], review_row)
                .optional()
        })
    }

    /// The review with the most likes; ties go to the oldest review.
    pub fn top_review(&self, book_id: i64) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{REVIEW_COLUMNS} WHERE r.book_id = ?1 ORDER BY likes DESC, r.id ASC LIMIT 1"),
                [book_id],
                review_row,
            )
            .optional()
        })
    }

    /// Returns false when there was nothing to delete.
    pub fn delete_review(&self, review_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM reviews WHERE id = ?1", [review_id])?;
            Ok(removed > 0)
        })
    }

    // -- Likes --

    /// Toggle a like: removes it if present, inserts it if not.
    pub fn toggle_like(&self, user_id: i64, review_id: i64) -> Result<LikeToggle> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !review_exists(&tx, review_id)? {
                return Ok(LikeToggle::NoSuchReview);
            }

            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND review_id = ?2",
                params![user_id, review_id],
            )?;

            let outcome = if removed > 0 {
                LikeToggle::Unliked
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, review_id) VALUES (?1, ?2)",
                    params![user_id, review_id],
                )?;
                LikeToggle::Liked
            };

            tx.commit()?;
            Ok(outcome)
        })
    }
}

fn review_exists(conn: &Connection, review_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM reviews WHERE id = ?1", [review_id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn review_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        nickname: row.get(3)?,
        user_image: row.get(4)?,
        contents: row.get(5)?,
        created_at: row.get(6)?,
        likes: row.get(7)?,
    })
}
