use anyhow::Result;
use chrono::{Days, NaiveDate, NaiveDateTime};
use rusqlite::params;

use super::{OptionalExt, sql_timestamp, summary_at};
use crate::Database;
use crate::models::{
    BookDetailRow, DatedBookRow, NewBook, RankedBookRow, ReadingMetricRow, SearchHitRow,
    TodayPickRow,
};

/// Dates outside years 1..=9999 are stored with a sign prefix and no longer
/// compare correctly as text, so query bounds are clamped into that range.
fn storable(date: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN);
    let last = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
    date.clamp(first, last)
}

/// Free-text search over author, title and company. Empty fields are ignored;
/// the non-empty ones are OR-combined.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub author: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
}

impl SearchFilter {
    fn predicates(&self) -> Vec<(&'static str, String)> {
        let mut predicates = Vec::new();
        for (column, value) in [
            ("author", &self.author),
            ("title", &self.title),
            ("company", &self.company),
        ] {
            if let Some(needle) = value.as_deref().filter(|v| !v.is_empty()) {
                predicates.push((column, needle.to_lowercase()));
            }
        }
        predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }
}

impl Database {
    // -- Catalog ingestion --

    pub fn insert_category(&self, name: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_keyword(&self, code: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO keywords (code) VALUES (?1)", [code])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_book(&self, book: &NewBook<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO books (title, subtitle, author, company, image_url, page,
                                    publication_date, contents, description, category_id, keyword_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    book.title,
                    book.subtitle,
                    book.author,
                    book.company,
                    book.image_url,
                    book.page,
                    book.publication_date,
                    book.contents,
                    book.description,
                    book.category_id,
                    book.keyword_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_today_pick(&self, book_id: i64, pick_date: NaiveDate, description: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO today_picks (book_id, pick_date, description) VALUES (?1, ?2, ?3)",
                params![book_id, pick_date, description],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn book_exists(&self, book_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT id FROM books WHERE id = ?1", [book_id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Read models --

    pub fn today_picks(&self, today: NaiveDate) -> Result<Vec<TodayPickRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.title, b.author, b.image_url, t.description
                 FROM today_picks t
                 JOIN books b ON b.id = t.book_id
                 WHERE t.pick_date = ?1
                 ORDER BY t.id",
            )?;

            let rows = stmt
                .query_map([today], |row| {
                    Ok(TodayPickRow {
                        book: summary_at(row, 0)?,
                        description: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Books published in `[today - days, today]`, newest first.
    pub fn recently_published(&self, today: NaiveDate, days: u64, limit: u32) -> Result<Vec<DatedBookRow>> {
        let from = storable(today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN));
        self.dated_books(
            "SELECT id, title, author, image_url, publication_date FROM books
             WHERE publication_date BETWEEN ?1 AND ?2
             ORDER BY publication_date DESC, id ASC
             LIMIT ?3",
            from,
            today,
            limit,
        )
    }

    /// Books published in `[today + 1, today + days]`, soonest first.
    pub fn upcoming_releases(&self, today: NaiveDate, days: u64, limit: u32) -> Result<Vec<DatedBookRow>> {
        let Some(from) = today.succ_opt() else {
            return Ok(vec![]);
        };
        let until = storable(today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX));
        self.dated_books(
            "SELECT id, title, author, image_url, publication_date FROM books
             WHERE publication_date BETWEEN ?1 AND ?2
             ORDER BY publication_date ASC, id ASC
             LIMIT ?3",
            from,
            until,
            limit,
        )
    }

    fn dated_books(&self, sql: &str, from: NaiveDate, until: NaiveDate, limit: u32) -> Result<Vec<DatedBookRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params![from, until, limit], |row| {
                    Ok(DatedBookRow {
                        book: summary_at(row, 0)?,
                        publication_date: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn search_books(&self, filter: &SearchFilter) -> Result<Vec<SearchHitRow>> {
        let predicates = filter.predicates();
        if predicates.is_empty() {
            return Ok(vec![]);
        }

        let clauses: Vec<String> = predicates
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("instr(fold({}), ?{}) > 0", column, i + 1))
            .collect();
        let sql = format!(
            "SELECT id, title, author, company, image_url FROM books WHERE {} ORDER BY id",
            clauses.join(" OR ")
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = predicates
                .iter()
                .map(|(_, needle)| needle as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(SearchHitRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        author: row.get(2)?,
                        company: row.get(3)?,
                        image_url: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Most-saved books across every library. `keyword` narrows to one tag;
    /// `None` means any tag from 2 upwards.
    pub fn best_sellers(&self, keyword: Option<i64>, limit: u32) -> Result<Vec<RankedBookRow>> {
        self.with_conn(|conn| {
            let filter = match keyword {
                Some(_) => "b.keyword_id = ?1",
                None => "b.keyword_id >= ?1",
            };
            let sql = format!(
                "SELECT b.id, b.title, b.author, b.image_url, COUNT(lb.id) AS saves
                 FROM library_books lb
                 JOIN books b ON b.id = lb.book_id
                 WHERE {filter}
                 GROUP BY b.id
                 ORDER BY saves DESC, b.id ASC
                 LIMIT ?2"
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![keyword.unwrap_or(2), limit], ranked_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Most-saved books of one keyword among saves made in `[since, now]`.
    pub fn weekly_recommendations(
        &self,
        keyword_id: i64,
        since: NaiveDateTime,
        now: NaiveDateTime,
        limit: u32,
    ) -> Result<Vec<RankedBookRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.title, b.author, b.image_url, COUNT(lb.id) AS saves
                 FROM library_books lb
                 JOIN books b ON b.id = lb.book_id
                 WHERE lb.created_at BETWEEN ?1 AND ?2 AND b.keyword_id = ?3
                 GROUP BY b.id
                 ORDER BY saves DESC, b.id ASC
                 LIMIT ?4",
            )?;

            let rows = stmt
                .query_map(
                    params![sql_timestamp(since), sql_timestamp(now), keyword_id, limit],
                    ranked_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `(id, image_url)` for books that have a cover.
    pub fn landing_images(&self, limit: u32) -> Result<Vec<(i64, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, image_url FROM books WHERE image_url != '' ORDER BY id LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn book_detail(&self, book_id: i64) -> Result<Option<BookDetailRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT b.id, b.title, b.subtitle, b.author, b.company, b.image_url, b.page,
                        b.publication_date, b.contents, b.company_review, b.description, c.name,
                        (SELECT COUNT(*) FROM reviews r WHERE r.book_id = b.id),
                        (SELECT COUNT(*) FROM user_books ub WHERE ub.book_id = b.id)
                 FROM books b
                 JOIN categories c ON c.id = b.category_id
                 WHERE b.id = ?1",
                [book_id],
                |row| {
                    Ok(BookDetailRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        subtitle: row.get(2)?,
                        author: row.get(3)?,
                        company: row.get(4)?,
                        image_url: row.get(5)?,
                        page: row.get(6)?,
                        publication_date: row.get(7)?,
                        contents: row.get(8)?,
                        company_review: row.get(9)?,
                        description: row.get(10)?,
                        category: row.get(11)?,
                        review_count: row.get(12)?,
                        reader_count: row.get(13)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Reading statistics of everyone who has progress recorded on a book.
    pub fn reading_metric(&self, book_id: i64) -> Result<ReadingMetricRow> {
        self.with_conn(|conn| {
            let metric = conn.query_row(
                "SELECT COUNT(ub.id),
                        COALESCE(AVG(ub.page), 0.0),
                        COALESCE(AVG(ub.read_secs), 0.0),
                        COALESCE(AVG(CASE WHEN b.page > 0 AND ub.page >= b.page THEN 1.0 ELSE 0.0 END), 0.0)
                 FROM user_books ub
                 JOIN books b ON b.id = ub.book_id
                 WHERE ub.book_id = ?1",
                [book_id],
                |row| {
                    Ok(ReadingMetricRow {
                        readers: row.get(0)?,
                        average_page: row.get(1)?,
                        average_read_secs: row.get(2)?,
                        completion_rate: row.get(3)?,
                    })
                },
            )?;
            Ok(metric)
        })
    }
}

fn ranked_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RankedBookRow> {
    Ok(RankedBookRow {
        book: summary_at(row, 0)?,
        saves: row.get(4)?,
    })
}
