use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};

use super::dto::{AddUserRequest, EditUserRequest, MeResponse, StatusMessage};
use super::repo::{self, NewUser, Role, User, UserChanges};
use crate::auth::password::hash_password;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_PROFILE_PIC: &str = "/uploads/profiles/default.png";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(me))
        .route("/user/update-profile", post(update_profile))
        // 2 MB picture plus multipart framing and text fields
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/add-user", post(add_user))
        .route("/admin/get-user", get(get_users))
        .route("/admin/get-user/:id", get(get_user))
        .route("/admin/edit-user/:id", put(edit_user))
        .route("/admin/delete-users/:id", delete(delete_user))
}

#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = repo::find_by_email(&state.db, &auth.0.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(MeResponse {
        status: "Success".into(),
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        profile_pic: user.profile_pic,
    }))
}

#[derive(Default)]
struct ProfileForm {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    picture: Option<(String, Bytes)>,
}

async fn read_profile_form(mut multipart: Multipart) -> Result<ProfileForm, AppError> {
    let mut form = ProfileForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "name" => form.name = Some(field.text().await.map_err(bad_field)?),
            "email" => form.email = Some(field.text().await.map_err(bad_field)?),
            "password" => form.password = Some(field.text().await.map_err(bad_field)?),
            "profilePic" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(bad_field)?;
                form.picture = Some((content_type, data));
            }
            _ => {}
        }
    }
    Ok(form)
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(e.to_string())
}

#[instrument(skip(state, auth, multipart))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<StatusMessage>, AppError> {
    let form = read_profile_form(multipart).await?;

    let mut changes = UserChanges {
        name: form.name.filter(|v| !v.trim().is_empty()),
        email: form
            .email
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_lowercase()),
        ..Default::default()
    };

    if let Some(password) = form.password.filter(|p| !p.trim().is_empty()) {
        changes.password_hash = Some(hash_password(&password)?);
    }

    if let Some((content_type, data)) = form.picture {
        let relative = state.storage.save_profile_pic(&content_type, &data).await?;
        changes.profile_pic = Some(format!("/uploads/{relative}"));
    }

    let affected = repo::update_by_email(&state.db, &auth.0.email, &changes).await?;
    if affected == 0 {
        return Err(AppError::NotFound(
            "User not found or no changes made".into(),
        ));
    }

    info!(email = %auth.0.email, "profile updated");
    Ok(Json(StatusMessage {
        status: "Success".into(),
        message: "Profile updated successfully".into(),
    }))
}

#[instrument(skip(state, _auth, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<AddUserRequest>,
) -> Result<(StatusCode, Json<StatusMessage>), AppError> {
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
            role: payload.role.unwrap_or(Role::Guest),
            profile_pic: Some(payload.profile_pic.as_deref().unwrap_or(DEFAULT_PROFILE_PIC)),
        },
    )
    .await?;

    info!(user_id, email = %email, "user created by admin");
    Ok((
        StatusCode::CREATED,
        Json(StatusMessage {
            status: "Success".into(),
            message: "User created successfully.".into(),
        }),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn get_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(repo::list_all(&state.db).await?))
}

#[instrument(skip(state, _auth))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state, _auth, payload))]
pub async fn edit_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<EditUserRequest>,
) -> Result<Json<StatusMessage>, AppError> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() || payload.role.is_none()
    {
        return Err(AppError::Validation(
            "Name, email, and role are required fields.".into(),
        ));
    }

    let mut changes = UserChanges {
        name: Some(payload.name.trim().to_string()),
        email: Some(payload.email.trim().to_lowercase()),
        role: payload.role,
        ..Default::default()
    };
    if let Some(password) = payload.password.filter(|p| !p.trim().is_empty()) {
        changes.password_hash = Some(hash_password(&password)?);
    }

    let affected = repo::update_by_id(&state.db, id, &changes).await?;
    if affected == 0 {
        return Err(AppError::NotFound("User not found.".into()));
    }

    info!(user_id = id, "user edited by admin");
    Ok(Json(StatusMessage {
        status: "Success".into(),
        message: "User updated successfully.".into(),
    }))
}

#[instrument(skip(state, _auth))]
pub async fn delete_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<StatusMessage>, AppError> {
    let affected = repo::delete_by_id(&state.db, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("User not found.".into()));
    }

    info!(user_id = id, "user deleted by admin");
    Ok(Json(StatusMessage {
        status: "success".into(),
        message: "User deleted successfully.".into(),
    }))
}
