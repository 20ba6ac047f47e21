use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crabbit_shared::{AuthPayload, AuthResponse, User, UserInfo};

use crate::error::ApiError;
use crate::{store, AppState};

// ── JWT Claims ──

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,  // expiry (unix timestamp)
}

impl Claims {
    pub fn new(user_id: &str) -> Self {
        let exp = expiry(); // 30 days from now
        Self {
            sub: user_id.to_string(),
            exp,
        }
    }
}

fn expiry() -> usize {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize;
    now + 30 * 24 * 60 * 60
}

fn mint_token(user_id: &str, jwt_secret: &str) -> Result<String, ApiError> {
    encode(
        &Header::default(),
        &Claims::new(user_id),
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(ApiError::internal)
}

// ── Authenticated principal ──

/// Pulls the authenticated user ID out of the Authorization header. Every
/// core operation trusts this value as-is; a missing or bad token is a
/// caller contract violation, not a core failure.
pub fn extract_user_id(headers: &HeaderMap, jwt_secret: &str) -> Result<String, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Authentication required.".into()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token.".into()))?;

    Ok(data.claims.sub)
}

// ── Password hashing ──

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(ApiError::internal)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(ApiError::internal)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ── Core operations ──

pub fn signup_user(
    conn: &rusqlite::Connection,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let username = username.trim();
    if username.len() < 3 || username.len() > 20 {
        return Err(ApiError::Validation(
            "Username must be between 3 and 20 characters.".into(),
        ));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required.".into()));
    }

    let user = User::new(username.to_string(), hash_password(password)?);
    store::insert_user(conn, &user)?;
    Ok(user)
}

pub fn login_user(
    conn: &rusqlite::Connection,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = store::find_user_by_username(conn, username.trim())?
        .ok_or_else(|| ApiError::NotFound("No account with this username exists.".into()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid username or password.".into()));
    }
    Ok(user)
}

// ── Handlers ──

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<AuthPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = store::with_conn(state.db.clone(), move |conn| {
        signup_user(conn, &payload.username, &payload.password)
    })
    .await?;

    tracing::info!(username = %user.username, "new signup");

    let token = mint_token(&user.id, &state.jwt_secret)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserInfo {
                id: user.id,
                username: user.username,
            },
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AuthPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = store::with_conn(state.db.clone(), move |conn| {
        login_user(conn, &payload.username, &payload.password)
    })
    .await?;

    let token = mint_token(&user.id, &state.jwt_secret)?;
    Ok(Json(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            username: user.username,
        },
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserInfo>, ApiError> {
    let user_id = extract_user_id(&headers, &state.jwt_secret)?;

    let user = store::with_conn(state.db.clone(), move |conn| {
        store::find_user(conn, &user_id)?.ok_or_else(ApiError::user_not_found)
    })
    .await?;

    Ok(Json(UserInfo {
        id: user.id,
        username: user.username,
    }))
}
