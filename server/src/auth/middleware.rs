//! Authentication Middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::db::{find_user_by_id, User};

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Authenticated user injected into request extensions.
///
/// Use this in handlers to access the current user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Read the token from `x-auth-token`, falling back to `Authorization: Bearer`.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(token.trim()).filter(|t| !t.is_empty());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware to require authentication.
///
/// Validates the JWT, loads the user from the database, and injects
/// `AuthUser` into request extensions. A token whose user was deleted is
/// rejected as invalid.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(request.headers()).ok_or(AuthError::MissingAuthHeader)?;

    let claims = validate_access_token(token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;

    let user = find_user_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user in handlers behind `require_auth`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_custom_header_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("abc"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&headers), Some("abc"));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
