pub mod auth;
pub mod books;
pub mod error;
pub mod library;
pub mod middleware;
pub mod reviews;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tracing::error;

use lumen_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Runs a database call off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!(e)
        })?
        .map_err(ApiError::from)
}

/// Every route the service exposes, with auth applied to the protected set.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/books/today", get(books::today_book))
        .route("/books/recent", get(books::recent_books))
        .route("/books/upcoming", get(books::upcoming_books))
        .route("/books/search", get(books::search_books))
        .route("/books/bestseller", get(books::best_sellers))
        .route("/books/recommend", get(books::recommended_books))
        .route("/books/landing", get(books::landing_images))
        .route("/books/{book_id}", get(books::book_detail))
        .route("/books/{book_id}/reviews", get(reviews::list_reviews))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/books/{book_id}/reviews",
            post(reviews::create_review).delete(reviews::delete_review),
        )
        .route("/books/reviews/like", patch(reviews::toggle_like))
        .route("/books/{book_id}/progress", put(library::record_progress))
        .route("/library", get(library::library_info).post(library::save_book))
        .route("/library/books", get(library::library_books))
        .route("/library/statistics", get(library::statistics))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
