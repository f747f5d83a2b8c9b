use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use lumen_db::LibraryOrdering;
use lumen_db::models::SaveOutcome;
use lumen_types::api::{
    BookCard, Claims, LibraryInfo, ProgressRequest, ReadingStatistics, RecommendedBook,
    SaveBookRequest,
};

use crate::auth::AppState;
use crate::blocking;
use crate::books::card;
use crate::error::{ApiError, json_body, on_constraint};

#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    pub ordering: Option<String>,
}

/// POST /library — saves a book, creating the caller's library on first use.
pub async fn save_book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SaveBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let book_id = json_body(payload, ApiError::InvalidKeys)?
        .book_id
        .ok_or(ApiError::InvalidKeys)?;

    let user_id = claims.sub;
    let outcome = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_id(user_id)? else {
            return Ok(None);
        };
        db.save_to_library(user.id, &user.nickname, book_id).map(Some)
    })
    .await?;

    match outcome {
        None => {
            warn!(user_id, "token refers to a missing user");
            Err(ApiError::InvalidToken)
        }
        Some(SaveOutcome::Saved) => {
            info!(user_id, book_id, "book saved to library");
            Ok(Json(json!({ "book_save": "SUCCESS" })))
        }
        Some(SaveOutcome::AlreadySaved) => Err(ApiError::AlreadyBook),
        Some(SaveOutcome::NoSuchBook) => Err(ApiError::NotExistBook),
    }
}

/// GET /library/books?ordering=1
pub async fn library_books(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LibraryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ordering = match query.ordering.as_deref() {
        None => LibraryOrdering::Saved,
        Some(raw) => raw
            .trim()
            .parse()
            .ok()
            .and_then(LibraryOrdering::from_code)
            .ok_or(ApiError::InvalidOrdering)?,
    };

    let user_id = claims.sub;
    let books: Vec<BookCard> = blocking(&state, move |db| db.library_books(user_id, ordering))
        .await?
        .into_iter()
        .map(card)
        .collect();

    Ok(Json(json!({ "libraryBook": books })))
}

/// GET /library
pub async fn library_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let info: Vec<LibraryInfo> = blocking(&state, move |db| db.library_for_user(user_id))
        .await?
        .into_iter()
        .map(|library| LibraryInfo {
            library_name: library.name,
            library_image: library.image_url,
            user_name: library.nickname,
            user_image: library.user_image.unwrap_or_default(),
        })
        .collect();

    Ok(Json(json!({ "libraryInfo": info })))
}

/// GET /library/statistics — reading totals plus one recommended book.
pub async fn statistics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let (totals, recommended) = blocking(&state, move |db| {
        let totals = db.reading_totals(user_id)?;
        // No history: newest book overall. Otherwise newest in the favourite category.
        let recommended = if totals.book_count == 0 {
            db.latest_book(None)?
        } else {
            match db.favourite_category(user_id)? {
                Some(category_id) => db.latest_book(Some(category_id))?,
                None => None,
            }
        };
        Ok((totals, recommended))
    })
    .await?;

    let data = ReadingStatistics {
        total_book_count: totals.book_count,
        total_read_time: totals.read_secs,
        recommand_book: recommended.map(|book| RecommendedBook {
            id: book.id,
            title: book.title,
            image_url: book.image_url,
            author: book.author,
        }),
    };

    Ok(Json(json!({ "message": "SUCCESS", "data": data })))
}

/// PUT /books/{book_id}/progress — records a reading session.
pub async fn record_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    book_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(book_id) = book_id.map_err(|_| ApiError::NotExistBook)?;
    let req = json_body(payload, ApiError::KeyError)?;
    let (Some(page), Some(time)) = (req.page, req.time) else {
        return Err(ApiError::KeyError);
    };
    if page < 0 || time < 0 {
        return Err(ApiError::InvalidRequest);
    }

    let user_id = claims.sub;
    let recorded = blocking(&state, move |db| {
        if !db.book_exists(book_id)? {
            return Ok(false);
        }
        db.record_progress(user_id, book_id, page, time)?;
        Ok(true)
    })
    .await
    .map_err(|e| on_constraint(e, ApiError::InvalidToken))?;

    if !recorded {
        return Err(ApiError::NotExistBook);
    }
    Ok(Json(json!({ "message": "SUCCESS" })))
}
