use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Days, NaiveDate, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use lumen_api::auth::{AppState, AppStateInner, create_token};
use lumen_db::Database;
use lumen_db::models::NewBook;

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "integration-secret".into(),
            token_ttl_days: 1,
        });
        let router = lumen_api::router(state.clone());
        Self { state, router }
    }

    fn db(&self) -> &Database {
        &self.state.db
    }

    /// Creates a user and returns `(id, bearer token)`.
    fn user(&self, nickname: &str) -> (i64, String) {
        let id = self
            .db()
            .create_user(nickname, &format!("{nickname}@example.com"), "unused")
            .unwrap();
        (id, create_token(&self.state, id, nickname).unwrap())
    }

    fn category(&self, name: &str) -> i64 {
        self.db().insert_category(name).unwrap()
    }

    fn book(&self, title: &str, published: NaiveDate, category_id: i64, keyword_id: Option<i64>) -> i64 {
        self.db()
            .insert_book(&NewBook {
                title,
                subtitle: "",
                author: "Anonymous",
                company: "Open Shelf",
                image_url: "https://img.example/cover.png",
                page: 200,
                publication_date: published,
                contents: "",
                description: "",
                category_id,
                keyword_id,
            })
            .unwrap()
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None, None).await
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn days_from_today(days: i64) -> NaiveDate {
    if days >= 0 {
        today().checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today().checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/library", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "INVALID_TOKEN");

    let (status, _) = app.send("GET", "/library", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_then_login() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "nickname": "reader", "email": "reader@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "nickname": "again", "email": "reader@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "ALREADY_EXISTS");

    let (status, body) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "reader@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nickname"], "reader");

    let (status, body) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "reader@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "INVALID_USER");

    let (status, _) = app.send("GET", "/library", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn todays_pick_carries_most_liked_review() {
    let app = TestApp::new();
    let (status, body) = app.get("/books/today").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NO_BOOK");

    let fiction = app.category("fiction");
    let book = app.book("Picked", today(), fiction, None);
    app.db().insert_today_pick(book, today(), "editor's choice").unwrap();
    let (alice, _) = app.user("alice");
    let (bob, _) = app.user("bob");
    app.db().create_review(alice, book, "fine").unwrap();
    let loved = app.db().create_review(bob, book, "wonderful").unwrap();
    app.db().toggle_like(alice, loved).unwrap();

    let (status, body) = app.get("/books/today").await;
    assert_eq!(status, StatusCode::OK);
    let pick = &body["todayBook"][0];
    assert_eq!(pick["id"], book);
    assert_eq!(pick["description"], "editor's choice");
    assert_eq!(pick["reviewerName"], "bob");
    assert_eq!(pick["reviewerImage"], "");
    assert_eq!(pick["reviewContent"], "wonderful");
}

#[tokio::test]
async fn recent_books_are_newest_first_within_window() {
    let app = TestApp::new();
    let (status, body) = app.get("/books/recent").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NO_BOOKS");

    let fiction = app.category("fiction");
    let week_old = app.book("Week Old", days_from_today(-7), fiction, None);
    let fresh = app.book("Fresh", today(), fiction, None);
    app.book("Ancient", days_from_today(-40), fiction, None);
    app.book("Unreleased", days_from_today(3), fiction, None);

    let (status, body) = app.get("/books/recent").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["oneMonthBook"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![fresh, week_old]);

    let (_, body) = app.get("/books/recent?day=3&limit=5").await;
    assert_eq!(body["oneMonthBook"].as_array().unwrap().len(), 1);

    let (status, body) = app.get("/books/recent?limit=ten").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn upcoming_books_switch_format_after_five_days() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    app.book("On Boundary", days_from_today(5), fiction, None);
    let later = days_from_today(6);
    app.book("Later", later, fiction, None);
    app.book("Today", today(), fiction, None);

    let (status, body) = app.get("/books/upcoming").await;
    assert_eq!(status, StatusCode::OK);
    let books = body["commingSoonBook"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["date"], 5);
    assert_eq!(books[1]["date"], later.format("%m월%d").to_string());
}

#[tokio::test]
async fn search_needs_at_least_one_field() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let rust = app.book("Rustacean Handbook", today(), fiction, None);
    app.book("Cooking", today(), fiction, None);

    let (status, body) = app.get("/books/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "INVALID_REQUEST");

    let (status, body) = app.get("/books/search?author=&title=&company=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "INVALID_REQUEST");

    let (status, body) = app.get("/books/search?title=RUSTACEAN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "SUCCESS");
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], rust);
}

#[tokio::test]
async fn bestseller_and_recommendation_rank_library_saves() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    for code in 1..=3 {
        app.db().insert_keyword(code).unwrap();
    }
    let popular = app.book("Popular", today(), fiction, Some(2));
    let niche = app.book("Niche", today(), fiction, Some(3));

    let (status, body) = app.get("/books/bestseller").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NO_BOOKS");

    for name in ["a", "b"] {
        let (_, token) = app.user(name);
        app.send("POST", "/library", Some(&token), Some(json!({ "book_id": popular }))).await;
    }
    let (_, token) = app.user("c");
    app.send("POST", "/library", Some(&token), Some(json!({ "book_id": niche }))).await;

    let (status, body) = app.get("/books/bestseller").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bestSellerBook"][0]["id"], popular);
    assert_eq!(body["bestSellerBook"][1]["id"], niche);

    let (_, body) = app.get("/books/bestseller?keyword=3").await;
    assert_eq!(body["bestSellerBook"].as_array().unwrap().len(), 1);

    let (status, body) = app.get("/books/recommend").await;
    assert_eq!(status, StatusCode::OK);
    let recommended = body["recommendBook"].as_array().unwrap();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0]["id"], popular);

    let (status, body) = app.get("/books/recommend?keyword=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NO_BOOKS");
}

#[tokio::test]
async fn review_length_limit_is_exclusive() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let book = app.book("Reviewed", today(), fiction, None);
    let (_, token) = app.user("critic");
    let uri = format!("/books/{book}/reviews");

    let (status, body) = app
        .send("POST", &uri, Some(&token), Some(json!({ "contents": "가".repeat(199) })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "SUCCESS");

    let (status, body) = app
        .send("POST", &uri, Some(&token), Some(json!({ "contents": "a".repeat(200) })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "LONG_CONTENTS");

    let (status, body) = app.send("POST", &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "KEY_ERROR");

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    let reviews = body["review_list"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["nick_name"], "critic");
    assert_eq!(reviews[0]["created_at"], Utc::now().format("%Y.%m.%d").to_string());

    let (status, body) = app.get("/books/999/reviews").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NOT_EXIST_REVIEW");
}

#[tokio::test]
async fn only_the_author_deletes_a_review() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let book = app.book("Contested", today(), fiction, None);
    let (author, author_token) = app.user("author");
    let (_, other_token) = app.user("other");
    let review = app.db().create_review(author, book, "mine").unwrap();
    let uri = format!("/books/{book}/reviews?review_id={review}");

    let (status, body) = app.send("DELETE", &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "UNAUTHORIZED");

    let (status, body) = app.send("DELETE", &uri, Some(&author_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "SUCCESS");

    let (status, body) = app.send("DELETE", &uri, Some(&author_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NOT_EXIST_REVIEW");

    let (status, body) = app
        .send("DELETE", &format!("/books/{book}/reviews"), Some(&author_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "KEY_ERROR");
}

#[tokio::test]
async fn like_toggles_between_success_and_cancel() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let book = app.book("Liked", today(), fiction, None);
    let (author, _) = app.user("author");
    let (_, fan) = app.user("fan");
    let review = app.db().create_review(author, book, "lovely").unwrap();
    let body = json!({ "review_id": review });

    for expected in ["SUCCESS", "CANCEL", "SUCCESS"] {
        let (status, reply) = app
            .send("PATCH", "/books/reviews/like", Some(&fan), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["message"], expected);
    }

    let (status, reply) = app
        .send("PATCH", "/books/reviews/like", Some(&fan), Some(json!({ "review_id": 404 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["message"], "NOT_EXIST_REVIEW");

    let (_, reply) = app
        .send("PATCH", "/books/reviews/like", Some(&fan), Some(json!({})))
        .await;
    assert_eq!(reply["message"], "KEY_ERROR");
}

#[tokio::test]
async fn library_rejects_duplicates_and_bad_orderings() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let book = app.book("Shelved", today(), fiction, None);
    let (_, token) = app.user("collector");

    let (status, body) = app.send("GET", "/library", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["libraryInfo"].as_array().unwrap().is_empty());

    let save = json!({ "book_id": book });
    let (status, body) = app.send("POST", "/library", Some(&token), Some(save.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_save"], "SUCCESS");

    let (status, body) = app.send("POST", "/library", Some(&token), Some(save)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ALREADY_BOOK");

    let (status, body) = app.send("POST", "/library", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "INVAILD_KEYS");

    let (_, body) = app.send("GET", "/library/books?ordering=2", Some(&token), None).await;
    assert_eq!(body["libraryBook"].as_array().unwrap().len(), 1);

    let (status, body) = app.send("GET", "/library/books?ordering=9", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "INVALID_ORDERING");

    let (_, body) = app.send("GET", "/library", Some(&token), None).await;
    assert_eq!(body["libraryInfo"][0]["libraryName"], "collector");
    assert_eq!(body["libraryInfo"][0]["userImage"], "");
}

#[tokio::test]
async fn statistics_recommend_from_history() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let poetry = app.category("poetry");
    let newest = app.book("Newest Overall", days_from_today(-1), fiction, None);
    let old_poem = app.book("Old Poem", days_from_today(-300), poetry, None);
    let new_poem = app.book("New Poem", days_from_today(-30), poetry, None);
    let (_, token) = app.user("reader");

    let (status, body) = app.send("GET", "/library/statistics", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_book_count"], 0);
    assert_eq!(body["data"]["total_read_time"], 0);
    assert_eq!(body["data"]["recommand_book"]["id"], newest);

    let progress = json!({ "page": 40, "time": 1200 });
    let (status, _) = app
        .send("PUT", &format!("/books/{old_poem}/progress"), Some(&token), Some(progress))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", "/library/statistics", Some(&token), None).await;
    assert_eq!(body["data"]["total_book_count"], 1);
    assert_eq!(body["data"]["total_read_time"], 1200);
    assert_eq!(body["data"]["recommand_book"]["id"], new_poem);

    let (status, body) = app
        .send("PUT", "/books/999/progress", Some(&token), Some(json!({ "page": 1, "time": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NOT_EXIST_BOOK");
}

#[tokio::test]
async fn book_detail_reports_reading_metric() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let book = app.book("Detailed", today(), fiction, None);
    let (reader, _) = app.user("reader");
    app.db().record_progress(reader, book, 100, 3600).unwrap();

    let (status, body) = app.get(&format!("/books/{book}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["like"], false);
    let detail = &body["book_detail"];
    assert_eq!(detail["category"], "fiction");
    assert_eq!(detail["reder"], 1);
    assert_eq!(detail["numeric"]["readers"], 1);
    assert_eq!(detail["numeric"]["average_read_time"], 3600.0);
    assert_eq!(detail["numeric"]["completion_rate"], 0.0);

    let (status, body) = app.get("/books/12345").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NOT_EXIST_BOOK");
}

#[tokio::test]
async fn landing_lists_cover_images() {
    let app = TestApp::new();
    let (status, body) = app.get("/books/landing").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "NO_BOOKS");

    let fiction = app.category("fiction");
    let book = app.book("Covered", today(), fiction, None);
    let (status, body) = app.get("/books/landing?maximum=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"][0]["id"], book);
    assert_eq!(body["books"][0]["image_url"], "https://img.example/cover.png");
}

#[tokio::test]
async fn token_for_removed_user_cannot_write() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let book = app.book("Orphaned", today(), fiction, None);
    let ghost = create_token(&app.state, 999, "ghost").unwrap();

    let (status, body) = app
        .send("POST", &format!("/books/{book}/reviews"), Some(&ghost), Some(json!({ "contents": "boo" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "INVALID_TOKEN");

    let (status, body) = app
        .send("PUT", &format!("/books/{book}/progress"), Some(&ghost), Some(json!({ "page": 1, "time": 1 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "INVALID_TOKEN");
}

#[tokio::test]
async fn very_wide_windows_keep_their_books() {
    let app = TestApp::new();
    let fiction = app.category("fiction");
    let soon = app.book("Soon", days_from_today(2), fiction, None);
    let recent = app.book("Recent", days_from_today(-2), fiction, None);

    let (status, body) = app.get("/books/upcoming?day=3000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commingSoonBook"][0]["id"], soon);

    let (status, body) = app.get("/books/recent?day=18446744073709551615").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["oneMonthBook"][0]["id"], recent);
}
