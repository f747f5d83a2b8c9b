use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use lumen_db::models::LikeToggle;
use lumen_types::api::{Claims, CreateReviewRequest, ReviewItem, ToggleLikeRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, json_body, on_constraint};

/// Reviews must be strictly shorter than this many characters.
const MAX_REVIEW_CHARS: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteReviewQuery {
    pub review_id: Option<String>,
}

/// GET /books/{book_id}/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(book_id) = book_id.map_err(|_| ApiError::NotExistReview)?;

    let rows = blocking(&state, move |db| {
        if !db.book_exists(book_id)? {
            return Ok(None);
        }
        db.reviews_for_book(book_id).map(Some)
    })
    .await?
    .ok_or(ApiError::NotExistReview)?;

    let reviews: Vec<ReviewItem> = rows
        .into_iter()
        .map(|row| ReviewItem {
            review_id: row.id,
            nick_name: row.nickname,
            user_img: row.user_image,
            content: row.contents,
            created_at: row.created_at.format("%Y.%m.%d").to_string(),
        })
        .collect();

    Ok(Json(json!({ "review_list": reviews })))
}

/// POST /books/{book_id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    book_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(book_id) = book_id.map_err(|_| ApiError::NotExistBook)?;
    let contents = json_body(payload, ApiError::KeyError)?
        .contents
        .ok_or(ApiError::KeyError)?;

    if contents.chars().count() >= MAX_REVIEW_CHARS {
        return Err(ApiError::LongContents);
    }

    let user_id = claims.sub;
    let review_id = blocking(&state, move |db| {
        if !db.book_exists(book_id)? {
            return Ok(None);
        }
        db.create_review(user_id, book_id, &contents).map(Some)
    })
    .await
    // The book was just checked, so a failed foreign key means the token's user is gone.
    .map_err(|e| on_constraint(e, ApiError::InvalidToken))?
    .ok_or(ApiError::NotExistBook)?;

    info!(user_id, book_id, review_id, "review created");
    Ok(Json(json!({ "message": "SUCCESS" })))
}

/// DELETE /books/{book_id}/reviews?review_id=N — only the author may delete.
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    book_id: Result<Path<i64>, PathRejection>,
    Query(query): Query<DeleteReviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(book_id) = book_id.map_err(|_| ApiError::NotExistReview)?;
    let review_id: i64 = query
        .review_id
        .ok_or(ApiError::KeyError)?
        .trim()
        .parse()
        .map_err(|_| ApiError::NotExistReview)?;

    let review = blocking(&state, move |db| db.get_review(review_id))
        .await?
        .filter(|review| review.book_id == book_id)
        .ok_or(ApiError::NotExistReview)?;

    if review.user_id != claims.sub {
        return Err(ApiError::Unauthorized);
    }

    if !blocking(&state, move |db| db.delete_review(review_id)).await? {
        return Err(ApiError::NotExistReview);
    }

    info!(user_id = claims.sub, review_id, "review deleted");
    Ok(Json(json!({ "message": "SUCCESS" })))
}

/// PATCH /books/reviews/like — flips the caller's like on a review.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ToggleLikeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = json_body(payload, ApiError::KeyError)?
        .review_id
        .ok_or(ApiError::KeyError)?;

    let user_id = claims.sub;
    match blocking(&state, move |db| db.toggle_like(user_id, review_id)).await? {
        LikeToggle::Liked => Ok(Json(json!({ "message": "SUCCESS", "like": true }))),
        LikeToggle::Unliked => Ok(Json(json!({ "message": "CANCEL", "like": false }))),
        LikeToggle::NoSuchReview => Err(ApiError::NotExistReview),
    }
}
