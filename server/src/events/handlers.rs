//! Event HTTP Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sortie_common::validation::validate_event;
use sortie_common::{parse_payload, Payload};
use uuid::Uuid;

use super::error::{EventError, EventResult};
use super::types::{CreateEventRequest, EditEventRequest, EventResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, EventRow, MembershipState};

fn respond_all(rows: Vec<EventRow>) -> Json<Vec<EventResponse>> {
    Json(rows.into_iter().map(EventResponse::from).collect())
}

/// Create an event owned by the caller.
///
/// POST /event/create
#[tracing::instrument(skip(state, payload), fields(user_id = %auth_user.id))]
pub async fn create(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<Payload>,
) -> EventResult<(StatusCode, Json<EventResponse>)> {
    validate_event(&payload).into_result()?;
    let body: CreateEventRequest = parse_payload(payload)?;
    let new_event = body.into_new_event(auth_user.id)?;

    let event = db::create_event(&state.db, &new_event).await?;

    tracing::info!(event_id = %event.id, "Event created");

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// List all events.
///
/// GET /event/
pub async fn list(State(state): State<AppState>) -> EventResult<Json<Vec<EventResponse>>> {
    Ok(respond_all(db::list_events(&state.db).await?))
}

/// Events owned by the caller.
///
/// GET /event/owner
pub async fn owned(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> EventResult<Json<Vec<EventResponse>>> {
    Ok(respond_all(
        db::list_events_by_owner(&state.db, auth_user.id).await?,
    ))
}

/// GET /event/id/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> EventResult<Json<EventResponse>> {
    let event = db::find_event_by_id(&state.db, id)
        .await?
        .ok_or(EventError::NotFound)?;
    Ok(Json(event.into()))
}

/// Events where the caller is an approved participant.
///
/// GET /event/participating
pub async fn participating(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> EventResult<Json<Vec<EventResponse>>> {
    Ok(respond_all(
        db::list_events_by_member(&state.db, auth_user.id, MembershipState::Approved).await?,
    ))
}

/// Events where the caller is on the waiting list.
///
/// GET /event/postulating
pub async fn postulating(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> EventResult<Json<Vec<EventResponse>>> {
    Ok(respond_all(
        db::list_events_by_member(&state.db, auth_user.id, MembershipState::Waiting).await?,
    ))
}

/// Events tagged with a category.
///
/// GET /category/{category}
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> EventResult<Json<Vec<EventResponse>>> {
    Ok(respond_all(
        db::list_events_by_category(&state.db, &category).await?,
    ))
}

/// Partially update an event. Owner only.
///
/// Runs under the event row lock so the capacity check sees the current
/// participant count.
///
/// PUT /event/edit/{id}
#[tracing::instrument(skip(state, payload), fields(user_id = %auth_user.id))]
pub async fn edit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<Payload>,
) -> EventResult<Json<EventResponse>> {
    let body: EditEventRequest = parse_payload(payload)?;
    let changes = body.into_changes()?;

    let mut tx = state.db.begin().await?;

    let (owner_id, _) = db::lock_event(&mut *tx, id)
        .await?
        .ok_or(EventError::NotFound)?;
    if owner_id != auth_user.id {
        return Err(EventError::NotOwner);
    }

    if let Some(capacity) = changes.participants_number {
        let approved = db::list_event_members(&mut *tx, id)
            .await?
            .iter()
            .filter(|m| m.state == MembershipState::Approved)
            .count();
        if usize::try_from(capacity).unwrap_or(0) < approved {
            return Err(EventError::CapacityBelowParticipants);
        }
    }

    db::update_event(&mut *tx, id, &changes).await?;

    let event = db::find_event_by_id(&mut *tx, id)
        .await?
        .ok_or(EventError::NotFound)?;

    tx.commit().await?;

    tracing::info!(event_id = %id, "Event updated");

    Ok(Json(event.into()))
}

/// Delete an event and return it. Owner only.
///
/// DELETE /event/delete/{id}
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id))]
pub async fn delete(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> EventResult<Json<EventResponse>> {
    let event = db::find_event_by_id(&state.db, id)
        .await?
        .ok_or(EventError::NotFound)?;
    if event.owner_id != auth_user.id {
        return Err(EventError::NotOwner);
    }

    if !db::delete_event(&state.db, id).await? {
        return Err(EventError::NotFound);
    }

    tracing::info!(event_id = %id, "Event deleted");

    Ok(Json(event.into()))
}
