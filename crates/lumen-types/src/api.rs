use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub nickname: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub nickname: String,
    pub token: String,
}

// -- Books --

/// The compact card every book list renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookCard {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub author: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayBook {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub author: String,
    pub description: String,
    pub reviewer_name: Option<String>,
    pub reviewer_image: Option<String>,
    pub review_content: Option<String>,
}

/// Releases within five days carry a day count, later ones a month/day label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReleaseDate {
    InDays(i64),
    On(String),
}

#[derive(Debug, Serialize)]
pub struct UpcomingBook {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub author: String,
    pub date: ReleaseDate,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub author: String,
    pub title: String,
    pub image_url: String,
    pub company: String,
}

#[derive(Debug, Serialize)]
pub struct LandingImage {
    pub id: i64,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct ReadingMetric {
    pub readers: i64,
    pub average_page: f64,
    pub average_read_time: f64,
    pub completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub company: String,
    pub author: String,
    pub contents: String,
    pub company_review: String,
    pub page: i64,
    pub publication_date: String,
    pub description: String,
    pub category: String,
    pub review_count: i64,
    /// Number of readers; the field name is part of the published contract.
    pub reder: i64,
    pub numeric: ReadingMetric,
}

// -- Reviews & likes --

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub contents: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewItem {
    pub review_id: i64,
    pub nick_name: String,
    pub user_img: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub review_id: Option<i64>,
}

// -- Library --

#[derive(Debug, Deserialize)]
pub struct SaveBookRequest {
    pub book_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub page: Option<i64>,
    /// Seconds spent reading in this session.
    pub time: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    pub library_name: String,
    pub library_image: String,
    pub user_name: String,
    pub user_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedBook {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub author: String,
}

#[derive(Debug, Serialize)]
pub struct ReadingStatistics {
    pub total_book_count: i64,
    /// Seconds.
    pub total_read_time: i64,
    pub recommand_book: Option<RecommendedBook>,
}
