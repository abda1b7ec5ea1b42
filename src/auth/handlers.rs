use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::Duration;
use tower_cookies::{Cookie, Cookies};
use tracing::{info, instrument, warn};

use super::dto::{LoginRequest, LoginResponse, RegisterRequest, SessionUser, StatusResponse};
use super::extractors::SESSION_COOKIE;
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo::{self, NewUser, Role};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, cookies, payload))]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();

    let user = repo::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            AppError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let session = SessionUser {
        name: user.name,
        email: user.email,
        profile_pic: user.profile_pic,
    };
    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&session)?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token.clone());
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(Duration::minutes(state.config.jwt.ttl_minutes));
    cookies.add(cookie);

    info!(email = %session.email, "user logged in");
    Ok(Json(LoginResponse {
        status: "success".into(),
        message: "User logged in successfully".into(),
        user: session,
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::Validation(
            "Name, email, and password are required.".into(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if repo::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists.".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = repo::insert(
        &state.db,
        &NewUser {
            name: payload.name.trim(),
            email: &email,
            password_hash: &password_hash,
            role: payload.role.unwrap_or(Role::Admin),
            profile_pic: payload.profile_pic.as_deref(),
        },
    )
    .await?;

    info!(user_id, email = %email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse {
            status: "success".into(),
        }),
    ))
}

/// Logout only clears the client-side cookie. Tokens issued before
/// logout stay valid until their expiry; there is no revocation list.
#[instrument(skip(cookies))]
pub async fn logout(cookies: Cookies) -> Json<StatusResponse> {
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").into());
    info!("user logged out");
    Json(StatusResponse {
        status: "Logged out".into(),
    })
}
