//! Event Participation
//!
//! Each transition runs in one transaction holding the event row lock, so
//! concurrent transitions on the same event apply one after another.

use axum::extract::{Path, State};
use axum::Json;
use sortie_common::{Outcome, ParticipationError, Roster};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::{EventError, EventResult};
use super::types::{EventResponse, MemberTarget};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, EventRow, MembershipState};

/// A membership change requested on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Postulate,
    Unpostulate,
    Validate,
    Unvalidate,
}

impl Transition {
    /// Validate and unvalidate are reserved to the event owner.
    pub const fn owner_only(self) -> bool {
        matches!(self, Self::Validate | Self::Unvalidate)
    }

    fn apply(self, roster: &mut Roster, user: Uuid) -> Result<Outcome, ParticipationError> {
        match self {
            Self::Postulate => roster.postulate(user),
            Self::Unpostulate => Ok(roster.unpostulate(user)),
            Self::Validate => roster.validate(user),
            Self::Unvalidate => roster.unvalidate(user),
        }
    }
}

/// Apply `transition` for `target` on behalf of `actor` and return the event.
///
/// Only the changed membership row is written.
#[tracing::instrument(skip(pool))]
pub async fn apply_transition(
    pool: &PgPool,
    event_id: Uuid,
    actor: Uuid,
    target: Uuid,
    transition: Transition,
) -> EventResult<EventRow> {
    let mut tx = pool.begin().await?;

    let (owner_id, capacity) = db::lock_event(&mut *tx, event_id)
        .await?
        .ok_or(EventError::NotFound)?;

    if transition.owner_only() && owner_id != actor {
        return Err(EventError::NotOwner);
    }

    let members = db::list_event_members(&mut *tx, event_id).await?;
    let capacity = capacity.and_then(|n| u32::try_from(n).ok());
    let mut roster = Roster::from_members(
        capacity,
        members.into_iter().map(|m| (m.user_id, m.state.into())),
    );

    let outcome = transition.apply(&mut roster, target)?;

    if let Outcome::Changed { from, to } = outcome {
        db::set_member_state(
            &mut *tx,
            event_id,
            target,
            MembershipState::from_member_state(to),
        )
        .await?;
        tracing::info!(
            event_id = %event_id,
            user_id = %target,
            from = ?from,
            to = ?to,
            "Membership changed"
        );
    }

    let event = db::find_event_by_id(&mut *tx, event_id)
        .await?
        .ok_or(EventError::NotFound)?;

    tx.commit().await?;

    Ok(event)
}

/// Join an event's waiting list.
///
/// PUT /event/postulate/{id}
pub async fn postulate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> EventResult<Json<EventResponse>> {
    let event =
        apply_transition(&state.db, id, auth_user.id, auth_user.id, Transition::Postulate).await?;
    Ok(Json(event.into()))
}

/// Leave an event's waiting list. A no-op if the caller is not waiting.
///
/// PUT /event/unpostulate/{id}
pub async fn unpostulate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> EventResult<Json<EventResponse>> {
    let event = apply_transition(
        &state.db,
        id,
        auth_user.id,
        auth_user.id,
        Transition::Unpostulate,
    )
    .await?;
    Ok(Json(event.into()))
}

/// Approve a waiting user. Owner only.
///
/// PUT /event/validate/{id}
pub async fn validate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MemberTarget>,
) -> EventResult<Json<EventResponse>> {
    let event =
        apply_transition(&state.db, id, auth_user.id, body.user_id, Transition::Validate).await?;
    Ok(Json(event.into()))
}

/// Move a participant back to the end of the waiting list. Owner only.
///
/// PUT /event/unvalidate/{id}
pub async fn unvalidate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MemberTarget>,
) -> EventResult<Json<EventResponse>> {
    let event = apply_transition(
        &state.db,
        id,
        auth_user.id,
        body.user_id,
        Transition::Unvalidate,
    )
    .await?;
    Ok(Json(event.into()))
}

#[cfg(test)]
mod tests {
    use sortie_common::MemberState;

    use super::*;

    #[test]
    fn test_owner_only_transitions() {
        assert!(!Transition::Postulate.owner_only());
        assert!(!Transition::Unpostulate.owner_only());
        assert!(Transition::Validate.owner_only());
        assert!(Transition::Unvalidate.owner_only());
    }

    #[test]
    fn test_apply_dispatches_to_roster() {
        let user = Uuid::now_v7();
        let mut roster = Roster::new(Some(1));

        assert_eq!(
            Transition::Unpostulate.apply(&mut roster, user),
            Ok(Outcome::Unchanged)
        );
        Transition::Postulate.apply(&mut roster, user).unwrap();
        Transition::Validate.apply(&mut roster, user).unwrap();
        assert_eq!(roster.state_of(user), MemberState::Approved);
        Transition::Unvalidate.apply(&mut roster, user).unwrap();
        assert_eq!(roster.state_of(user), MemberState::Waiting);
    }
}
