//! Authentication Service
//!
//! Registration, login, token checks and the caller's own profile.

mod error;
mod handlers;
pub mod jwt;
mod middleware;
mod password;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::api::AppState;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use handlers::UserProfile;
pub use middleware::{require_auth, AuthUser, TOKEN_HEADER};
pub use password::{hash_password, hash_password_bounded, verify_password};

/// Create the user router, mounted at `/user`.
///
/// Public routes:
/// - POST /create - Register a new user
/// - POST /login - Login with email/password
///
/// Protected routes:
/// - GET /read - Caller's profile
/// - GET /users - All profiles
/// - GET /{id} - One profile
/// - PUT /update - Update caller's profile
/// - DELETE /delete - Delete caller's account
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/create", post(handlers::register))
        .route("/login", post(handlers::login));

    let protected = Router::new()
        .route("/read", get(handlers::read_self))
        .route("/users", get(handlers::list_users))
        .route("/update", put(handlers::update_self))
        .route("/delete", delete(handlers::delete_self))
        .route("/{id}", get(handlers::get_user))
        .layer(from_fn_with_state(state, require_auth));

    public.merge(protected)
}
