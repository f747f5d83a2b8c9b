use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;

use lumen_db::Database;
use lumen_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::blocking;
use crate::error::{ApiError, json_body, on_constraint};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, ApiError::InvalidRequest)?;

    // Validate input
    let nickname_len = req.nickname.chars().count();
    if nickname_len == 0 || nickname_len > 45 || !req.email.contains('@') || req.password.len() < 8 {
        return Err(ApiError::InvalidRequest);
    }

    // Check if email is taken
    let email = req.email.clone();
    if blocking(&state, move |db| db.get_user_by_email(&email)).await?.is_some() {
        return Err(ApiError::AlreadyExists);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let nickname = req.nickname.clone();
    // A concurrent registration can still win the race to the UNIQUE email.
    let user_id = blocking(&state, move |db| db.create_user(&nickname, &req.email, &password_hash))
        .await
        .map_err(|e| on_constraint(e, ApiError::AlreadyExists))?;

    let token = create_token(&state, user_id, &req.nickname)?;
    info!(user_id, "user registered");

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, ApiError::InvalidRequest)?;
    let email = req.email.clone();
    let user = blocking(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::InvalidUser)?;

    // Verify password
    let stored = user.password.as_deref().ok_or(ApiError::InvalidUser)?;
    let parsed_hash =
        PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("stored hash unreadable: {}", e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidUser)?;

    let token = create_token(&state, user.id, &user.nickname)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        nickname: user.nickname,
        token,
    }))
}

pub fn create_token(state: &AppStateInner, user_id: i64, nickname: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        nickname: nickname.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(state.token_ttl_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::InvalidToken)?;

    Ok(token_data.claims)
}
