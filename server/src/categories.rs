//! Category API Handlers
//!
//! CRUD over the fixed set of event category tags.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use sortie_common::{CategoryTag, InvalidCategoryTag};
use thiserror::Error;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{require_auth, ErrorResponse};
use crate::db::{self, is_unique_violation, Category};
use crate::events;

// ============================================================================
// Types
// ============================================================================

/// Request to create a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Query for `GET /category/read`.
#[derive(Debug, Deserialize)]
pub struct ReadCategoryQuery {
    pub name: String,
}

/// Request to rename a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub id: Uuid,
    pub name: String,
}

/// Request to delete a category.
#[derive(Debug, Deserialize)]
pub struct DeleteCategoryRequest {
    pub id: Uuid,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    InvalidCategory(#[from] InvalidCategoryTag),

    #[error("Category already exists")]
    DuplicateCategory,

    #[error("Category not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidCategory(_) => (StatusCode::BAD_REQUEST, "INVALID_CATEGORY"),
            Self::DuplicateCategory => (StatusCode::CONFLICT, "DUPLICATE_CATEGORY"),
            Self::NotFound => (StatusCode::NOT_FOUND, "CATEGORY_NOT_FOUND"),
            Self::Database(e) => {
                tracing::error!(error = %e, "Category database error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("INTERNAL_ERROR", "Internal server error")),
                )
                    .into_response();
            }
        };
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

fn duplicate_or_database(e: sqlx::Error) -> CategoryError {
    if is_unique_violation(&e) {
        CategoryError::DuplicateCategory
    } else {
        CategoryError::Database(e)
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the category router, mounted at `/category`.
///
/// `POST /create` is public; everything else requires authentication.
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/all", get(list_categories))
        .route("/read", get(read_category))
        .route("/update", put(update_category))
        .route("/delete", delete(delete_category))
        .route("/{category}", get(events::by_category))
        .layer(from_fn_with_state(state, require_auth));

    Router::new()
        .route("/create", post(create_category))
        .merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a category from one of the known tags.
///
/// POST /category/create
#[tracing::instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), CategoryError> {
    let tag: CategoryTag = body.name.parse()?;

    if db::find_category_by_name(&state.db, tag.as_str())
        .await?
        .is_some()
    {
        return Err(CategoryError::DuplicateCategory);
    }

    let category = db::create_category(&state.db, tag.as_str())
        .await
        .map_err(duplicate_or_database)?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /category/all
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, CategoryError> {
    Ok(Json(db::list_categories(&state.db).await?))
}

/// GET /category/read?name=
pub async fn read_category(
    State(state): State<AppState>,
    Query(query): Query<ReadCategoryQuery>,
) -> Result<Json<Category>, CategoryError> {
    db::find_category_by_name(&state.db, &query.name)
        .await?
        .map(Json)
        .ok_or(CategoryError::NotFound)
}

/// Rename a category to another known tag.
///
/// PUT /category/update
#[tracing::instrument(skip(state))]
pub async fn update_category(
    State(state): State<AppState>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, CategoryError> {
    let tag: CategoryTag = body.name.parse()?;

    let category = db::update_category(&state.db, body.id, tag.as_str())
        .await
        .map_err(duplicate_or_database)?
        .ok_or(CategoryError::NotFound)?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category renamed");

    Ok(Json(category))
}

/// DELETE /category/delete
#[tracing::instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Json(body): Json<DeleteCategoryRequest>,
) -> Result<Json<Category>, CategoryError> {
    let category = db::delete_category(&state.db, body.id)
        .await?
        .ok_or(CategoryError::NotFound)?;

    tracing::info!(category_id = %category.id, "Category deleted");

    Ok(Json(category))
}
