//! Authentication HTTP Handlers

use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sortie_common::validation::{validate_login, validate_profile_update, validate_registration};
use sortie_common::{parse_payload, Payload};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};
use super::jwt::generate_access_token;
use super::middleware::{AuthUser, TOKEN_HEADER};
use super::password::{hash_password_bounded, verify_password_bounded};
use crate::api::AppState;
use crate::db::{
    self, email_exists, find_user_by_email, find_user_by_id, is_unique_violation, NewUser, User,
    UserChanges,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request, read after the payload passes validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update. Absent or blank fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub interests: Option<Vec<String>>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

/// User profile response. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub interests: Vec<String>,
    pub warnings: i32,
    pub is_active: bool,
    pub avatar: String,
    pub banner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            birthdate: user.birthdate,
            description: user.description,
            location: user.location,
            interests: user.interests,
            warnings: user.warnings,
            is_active: user.is_active,
            avatar: user.avatar,
            banner: user.banner,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user.
///
/// POST /user/create
#[tracing::instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Payload>,
) -> AuthResult<(StatusCode, Json<UserProfile>)> {
    validate_registration(&payload, state.config.password_min_length)
        .into_result()
        .map_err(AuthError::Validation)?;
    let body: RegisterRequest = parse_payload(payload).map_err(AuthError::Validation)?;

    // Pre-check; the UNIQUE constraint catches concurrent registrations
    if email_exists(&state.db, &body.email).await? {
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = hash_password_bounded(body.password, state.config.hash_timeout()).await?;

    let new_user = NewUser {
        username: body.username,
        email: body.email,
        password_hash,
        birthdate: body.birthdate,
        description: body.description,
        location: body.location,
        interests: body.interests,
    };

    let user = db::create_user(&state.db, &new_user).await.map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::DuplicateEmail
        } else {
            AuthError::Database(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login with email and password.
///
/// Returns the profile and a token; the token is also set in `x-auth-token`.
///
/// POST /user/login
#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Payload>,
) -> AuthResult<Response> {
    validate_login(&payload)
        .into_result()
        .map_err(AuthError::Validation)?;
    let body: LoginRequest = parse_payload(payload).map_err(AuthError::Validation)?;

    let user = find_user_by_email(&state.db, &body.email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let valid = verify_password_bounded(
        body.password,
        user.password_hash.clone(),
        state.config.hash_timeout(),
    )
    .await?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_access_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_access_expiry,
    )?;
    let header = HeaderValue::from_str(&token)
        .map_err(|e| AuthError::Internal(format!("token is not a valid header value: {e}")))?;

    tracing::info!(user_id = %user.id, "User logged in");

    let mut response = Json(LoginResponse {
        user: user.into(),
        token,
    })
    .into_response();
    response.headers_mut().insert(TOKEN_HEADER, header);

    Ok(response)
}

/// Get the caller's profile.
///
/// GET /user/read
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id))]
pub async fn read_self(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AuthResult<Json<UserProfile>> {
    let user = find_user_by_id(&state.db, auth_user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Get any user's profile.
///
/// GET /user/{id}
#[tracing::instrument(skip(state, _auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AuthResult<Json<UserProfile>> {
    let user = find_user_by_id(&state.db, id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// List every user's profile.
///
/// GET /user/users
pub async fn list_users(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AuthResult<Json<Vec<UserProfile>>> {
    let users = db::list_users(&state.db).await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// Partially update the caller's profile.
///
/// PUT /user/update
#[tracing::instrument(skip(state, payload), fields(user_id = %auth_user.id))]
pub async fn update_self(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<Payload>,
) -> AuthResult<Json<UserProfile>> {
    validate_profile_update(&payload, state.config.password_min_length)
        .into_result()
        .map_err(AuthError::Validation)?;
    let body: UpdateProfileRequest = parse_payload(payload).map_err(AuthError::Validation)?;

    if let Some(email) = &body.email {
        if *email != auth_user.email && email_exists(&state.db, email).await? {
            return Err(AuthError::DuplicateEmail);
        }
    }

    let password_hash = match body.password {
        Some(password) => Some(hash_password_bounded(password, state.config.hash_timeout()).await?),
        None => None,
    };

    let changes = UserChanges {
        username: body.username,
        email: body.email,
        password_hash,
        birthdate: body.birthdate,
        description: body.description,
        location: body.location,
        interests: body.interests,
        avatar: body.avatar,
        banner: body.banner,
    };

    let user = db::update_user(&state.db, auth_user.id, &changes)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::DuplicateEmail
            } else {
                AuthError::Database(e)
            }
        })?
        .ok_or(AuthError::UserNotFound)?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(user.into()))
}

/// Delete the caller's account.
///
/// Owned events and memberships go with it.
///
/// DELETE /user/delete
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id))]
pub async fn delete_self(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AuthResult<Json<UserProfile>> {
    let user = db::delete_user(&state.db, auth_user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    tracing::info!(user_id = %user.id, "User deleted");

    Ok(Json(user.into()))
}
