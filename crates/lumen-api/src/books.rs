use axum::{
    Json,
    extract::{Path, Query, State, rejection::PathRejection},
    response::IntoResponse,
};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use lumen_db::SearchFilter;
use lumen_db::models::BookSummaryRow;
use lumen_types::api::{
    BookCard, BookDetail, LandingImage, ReadingMetric, ReleaseDate, SearchHit, TodayBook,
    UpcomingBook,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, number_param};

/// Releases this close show a day count instead of a date.
const COUNTDOWN_DAYS: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub day: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub keyword: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub author: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    pub maximum: Option<String>,
}

pub(crate) fn card(row: BookSummaryRow) -> BookCard {
    BookCard {
        id: row.id,
        title: row.title,
        image: row.image_url,
        author: row.author,
    }
}

/// GET /books/today — today's editorial pick with its most-liked review.
pub async fn today_book(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();

    let picks = blocking(&state, move |db| {
        db.today_picks(today)?
            .into_iter()
            .map(|pick| {
                let review = db.top_review(pick.book.id)?;
                Ok((pick, review))
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await?;

    if picks.is_empty() {
        return Err(ApiError::NoBook);
    }

    let books: Vec<TodayBook> = picks
        .into_iter()
        .map(|(pick, review)| TodayBook {
            id: pick.book.id,
            title: pick.book.title,
            image: pick.book.image_url,
            author: pick.book.author,
            description: pick.description,
            reviewer_name: review.as_ref().map(|r| r.nickname.clone()),
            reviewer_image: review.as_ref().map(|r| r.user_image.clone().unwrap_or_default()),
            review_content: review.map(|r| r.contents),
        })
        .collect();

    Ok(Json(json!({ "todayBook": books })))
}

/// GET /books/recent?day=30&limit=10
pub async fn recent_books(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = number_param(query.day.as_deref(), "day", 30u64)?;
    let limit = number_param(query.limit.as_deref(), "limit", 10u32)?;
    let today = Utc::now().date_naive();

    let rows = blocking(&state, move |db| db.recently_published(today, days, limit)).await?;
    if rows.is_empty() {
        return Err(ApiError::NoBooks);
    }

    let books: Vec<BookCard> = rows.into_iter().map(|row| card(row.book)).collect();
    Ok(Json(json!({ "oneMonthBook": books })))
}

/// GET /books/upcoming?day=30&limit=10
pub async fn upcoming_books(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = number_param(query.day.as_deref(), "day", 30u64)?;
    let limit = number_param(query.limit.as_deref(), "limit", 10u32)?;
    let today = Utc::now().date_naive();

    let rows = blocking(&state, move |db| db.upcoming_releases(today, days, limit)).await?;
    if rows.is_empty() {
        return Err(ApiError::NoBooks);
    }

    let books: Vec<UpcomingBook> = rows
        .into_iter()
        .map(|row| UpcomingBook {
            date: release_date(row.publication_date, today),
            id: row.book.id,
            title: row.book.title,
            image: row.book.image_url,
            author: row.book.author,
        })
        .collect();

    Ok(Json(json!({ "commingSoonBook": books })))
}

fn release_date(published: NaiveDate, today: NaiveDate) -> ReleaseDate {
    let days = (published - today).num_days();
    if days <= COUNTDOWN_DAYS {
        ReleaseDate::InDays(days)
    } else {
        ReleaseDate::On(published.format("%m월%d").to_string())
    }
}

/// GET /books/search?author=&title=&company=
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SearchFilter {
        author: query.author,
        title: query.title,
        company: query.company,
    };
    if filter.is_empty() {
        return Err(ApiError::InvalidRequest);
    }

    let hits: Vec<SearchHit> = blocking(&state, move |db| db.search_books(&filter))
        .await?
        .into_iter()
        .map(|row| SearchHit {
            id: row.id,
            author: row.author,
            title: row.title,
            image_url: row.image_url,
            company: row.company,
        })
        .collect();

    Ok(Json(json!({ "message": "SUCCESS", "books": hits })))
}

/// Keywords 2 through 6 are the bestseller buckets; anything else means all
/// of them.
fn bestseller_bucket(keyword: i64) -> Option<i64> {
    (2..=6).contains(&keyword).then_some(keyword)
}

/// GET /books/bestseller?keyword=1&limit=10
pub async fn best_sellers(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let keyword = number_param(query.keyword.as_deref(), "keyword", 1i64)?;
    let limit = number_param(query.limit.as_deref(), "limit", 10u32)?;
    let bucket = bestseller_bucket(keyword);

    let rows = blocking(&state, move |db| db.best_sellers(bucket, limit)).await?;
    if rows.is_empty() {
        return Err(ApiError::NoBooks);
    }

    let books: Vec<BookCard> = rows.into_iter().map(|row| card(row.book)).collect();
    Ok(Json(json!({ "bestSellerBook": books })))
}

/// GET /books/recommend?keyword=2&limit=6 — most saved this ISO week.
pub async fn recommended_books(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let keyword = number_param(query.keyword.as_deref(), "keyword", 2i64)?;
    let limit = number_param(query.limit.as_deref(), "limit", 6u32)?;

    let now = Utc::now().naive_utc();
    let since = week_start(now.date()).and_time(NaiveTime::MIN);

    let rows = blocking(&state, move |db| db.weekly_recommendations(keyword, since, now, limit)).await?;
    if rows.is_empty() {
        return Err(ApiError::NoBooks);
    }

    let books: Vec<BookCard> = rows.into_iter().map(|row| card(row.book)).collect();
    Ok(Json(json!({ "recommendBook": books })))
}

/// Monday of the ISO week containing `day`.
fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(offset)).unwrap_or(day)
}

/// GET /books/landing?maximum=60 — cover images for the landing page.
pub async fn landing_images(
    State(state): State<AppState>,
    Query(query): Query<LandingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let maximum = number_param(query.maximum.as_deref(), "maximum", 60u32)?;

    let rows = blocking(&state, move |db| db.landing_images(maximum)).await?;
    if rows.is_empty() {
        return Err(ApiError::NoBooks);
    }

    let books: Vec<LandingImage> = rows
        .into_iter()
        .map(|(id, image_url)| LandingImage { id, image_url })
        .collect();
    Ok(Json(json!({ "message": "SUCCESS", "books": books })))
}

/// GET /books/{book_id}
pub async fn book_detail(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(book_id) = book_id.map_err(|_| ApiError::NotExistBook)?;

    let (detail, metric) = blocking(&state, move |db| {
        let Some(detail) = db.book_detail(book_id)? else {
            return Ok(None);
        };
        let metric = db.reading_metric(book_id)?;
        Ok(Some((detail, metric)))
    })
    .await?
    .ok_or(ApiError::NotExistBook)?;

    let detail = BookDetail {
        title: detail.title,
        subtitle: detail.subtitle,
        image_url: detail.image_url,
        company: detail.company,
        author: detail.author,
        contents: detail.contents,
        company_review: detail.company_review,
        page: detail.page,
        publication_date: detail.publication_date,
        description: detail.description,
        category: detail.category,
        review_count: detail.review_count,
        reder: detail.reader_count,
        numeric: ReadingMetric {
            readers: metric.readers,
            average_page: metric.average_page,
            average_read_time: metric.average_read_secs,
            completion_rate: metric.completion_rate,
        },
    };

    Ok(Json(json!({ "book_detail": detail, "like": false })))
}
