//! Events
//!
//! Event CRUD and the waiting list / participant workflow.

mod error;
mod handlers;
pub mod participation;
pub mod types;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::AppState;

pub use error::{EventError, EventResult};
pub use handlers::{by_category, list as list_events};
pub use participation::{apply_transition, Transition};

/// Create the event router, mounted at `/event` behind `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list))
        .route("/create", post(handlers::create))
        .route("/owner", get(handlers::owned))
        .route("/id/{id}", get(handlers::get))
        .route("/participating", get(handlers::participating))
        .route("/postulating", get(handlers::postulating))
        .route("/edit/{id}", put(handlers::edit))
        .route("/delete/{id}", delete(handlers::delete))
        .route("/postulate/{id}", put(participation::postulate))
        .route("/unpostulate/{id}", put(participation::unpostulate))
        .route("/validate/{id}", put(participation::validate))
        .route("/unvalidate/{id}", put(participation::unvalidate))
}
