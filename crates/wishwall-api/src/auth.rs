use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use wishwall_types::api::{
    AuthResponse, MIN_PASSWORD_LEN, SessionResponse, SignInRequest, SignUpRequest, normalize_email,
};

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::state::{AppState, with_db};

/// Every account starts with one wall carrying this title.
pub const DEFAULT_WALL_TITLE: &str = "My Wishing Wall";

const MAX_PASSWORD_LEN: usize = 256;

/// Verified against when the email is unknown, so a miss costs as much as a
/// wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("wishwall-dummy-password").ok());

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only if `hash` isn't a PHC string.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("corrupt password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// POST /auth/signup: create the account and its wall in one step.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email)
        .ok_or_else(|| ApiError::BadRequest("Invalid email address".into()))?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password should be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password is too long".into()));
    }

    let user_id = Uuid::new_v4();
    let wall_id = Uuid::new_v4();

    let em = email.clone();
    let created = with_db(&state, move |db| {
        // Hashing is CPU-bound, so it runs on the blocking pool with the insert
        let password_hash = hash_password(&req.password)?;

        db.create_user_with_wall(
            &user_id.to_string(),
            &em,
            &password_hash,
            &wall_id.to_string(),
            DEFAULT_WALL_TITLE,
        )
    })
    .await?;

    if !created {
        return Err(ApiError::EmailTaken);
    }

    info!("new account {} with wall {}", user_id, wall_id);
    let token = create_token(&state.jwt_secret, user_id, &email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            email,
            token,
            wall_id,
        }),
    ))
}

/// POST /auth/signin: verify credentials and return the caller's wall.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email).ok_or(ApiError::InvalidCredentials)?;

    let (user_id, email, wall_id) = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_email(&email)? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&req.password, dummy);
            }
            return Ok(Err(ApiError::InvalidCredentials));
        };

        let matches = verify_password(&req.password, &user.password)
            .map_err(|e| anyhow::anyhow!("user {}: {:#}", user.id, e))?;
        if !matches {
            return Ok(Err(ApiError::InvalidCredentials));
        }

        let Some(wall) = db.get_wall_by_owner(&user.id)? else {
            return Ok(Err(ApiError::NotFound("Wall")));
        };

        let user_id: Uuid = user.id.parse()?;
        let wall_id: Uuid = wall.id.parse()?;
        Ok(Ok((user_id, user.email, wall_id)))
    })
    .await??;

    let token = create_token(&state.jwt_secret, user_id, &email)?;

    Ok(Json(AuthResponse {
        user_id,
        email,
        token,
        wall_id,
    }))
}

/// GET /auth/session: who the bearer token belongs to.
pub async fn session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let found = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_id(&uid)? else {
            return Ok(None);
        };
        let wall = db.get_wall_by_owner(&uid)?;
        Ok(Some((user, wall)))
    })
    .await?;

    // Token outlived its account
    let (user, wall) = found.ok_or(ApiError::Unauthorized)?;

    let wall_id = match wall {
        Some(w) => Some(w.id.parse::<Uuid>().map_err(anyhow::Error::from)?),
        None => None,
    };

    Ok(Json(SessionResponse {
        user_id: claims.sub,
        email: user.email,
        wall_id,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
