//! Database Models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sortie_common::MemberState;
use sqlx::FromRow;
use uuid::Uuid;

/// User model.
///
/// Carries the password hash; never serialize it directly to clients.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
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

/// Fields written when registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub interests: Vec<String>,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub interests: Option<Vec<String>>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

/// Category model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Stored membership state (`member_state` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_state", rename_all = "lowercase")]
pub enum MembershipState {
    Waiting,
    Approved,
}

impl From<MembershipState> for MemberState {
    fn from(state: MembershipState) -> Self {
        match state {
            MembershipState::Waiting => Self::Waiting,
            MembershipState::Approved => Self::Approved,
        }
    }
}

impl MembershipState {
    /// Stored form of a roster state. `None` has no row.
    pub const fn from_member_state(state: MemberState) -> Option<Self> {
        match state {
            MemberState::Waiting => Some(Self::Waiting),
            MemberState::Approved => Some(Self::Approved),
            MemberState::None => None,
        }
    }
}

/// One `event_members` row.
#[derive(Debug, Clone, FromRow)]
pub struct EventMember {
    pub user_id: Uuid,
    pub state: MembershipState,
}

/// Event with its participant and waiting lists aggregated in list order.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub period: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub owner_id: Uuid,
    pub participants_number: Option<i32>,
    pub coordinates: Vec<f64>,
    pub status: Option<bool>,
    pub warnings: i32,
    pub participants: Vec<Uuid>,
    pub waiting_list: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written when creating an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub period: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub owner_id: Uuid,
    pub participants_number: Option<i32>,
    pub coordinates: Vec<f64>,
    pub status: Option<bool>,
}

/// Partial event update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub period: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub participants_number: Option<i32>,
    pub coordinates: Option<Vec<f64>>,
    pub status: Option<bool>,
}
