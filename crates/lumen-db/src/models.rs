/// Database row types — these map directly to SQLite rows.
/// Distinct from lumen-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub nickname: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub password: Option<String>,
}

/// The columns every book listing shows.
#[derive(Debug, Clone)]
pub struct BookSummaryRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct DatedBookRow {
    pub book: BookSummaryRow,
    pub publication_date: chrono::NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SearchHitRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub company: String,
    pub image_url: String,
}

/// A book with the number of library saves that ranked it.
#[derive(Debug, Clone)]
pub struct RankedBookRow {
    pub book: BookSummaryRow,
    pub saves: i64,
}

pub struct BookDetailRow {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub company: String,
    pub image_url: String,
    pub page: i64,
    pub publication_date: String,
    pub contents: String,
    pub company_review: String,
    pub description: String,
    pub category: String,
    pub review_count: i64,
    pub reader_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingMetricRow {
    pub readers: i64,
    pub average_page: f64,
    pub average_read_secs: f64,
    pub completion_rate: f64,
}

pub struct TodayPickRow {
    pub book: BookSummaryRow,
    pub description: String,
}

/// Review joined with its author.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub nickname: String,
    pub user_image: Option<String>,
    pub contents: String,
    pub created_at: chrono::NaiveDateTime,
    pub likes: i64,
}

pub struct LibraryRow {
    pub id: i64,
    pub name: String,
    pub image_url: String,
    pub nickname: String,
    pub user_image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
    NoSuchBook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
    NoSuchReview,
}

pub struct ReadingTotalsRow {
    pub book_count: i64,
    pub read_secs: i64,
}

pub struct NewBook<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub author: &'a str,
    pub company: &'a str,
    pub image_url: &'a str,
    pub page: i64,
    pub publication_date: chrono::NaiveDate,
    pub contents: &'a str,
    pub description: &'a str,
    pub category_id: i64,
    pub keyword_id: Option<i64>,
}
