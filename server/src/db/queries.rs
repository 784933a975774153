//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::error;
use uuid::Uuid;

use super::models::{
    Category, EventChanges, EventMember, EventRow, MembershipState, NewEvent, NewUser, User,
    UserChanges,
};

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated, making production debugging easier.
macro_rules! db_error {
    ($query:expr) => {
        |e| {
            error!(query = $query, error = %e, "Database query failed");
            e
        }
    };
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Find user by email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_email", email = %email))
}

/// Check if email exists.
pub async fn email_exists(pool: &PgPool, email: &str) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(result.0)
}

/// List every user, oldest first.
pub async fn list_users(pool: &PgPool) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_users"))
}

/// Create a new user.
pub async fn create_user(pool: &PgPool, user: &NewUser) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (id, username, email, password_hash, birthdate, description, location, interests)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        ",
    )
    .bind(Uuid::now_v7())
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.birthdate)
    .bind(&user.description)
    .bind(&user.location)
    .bind(&user.interests)
    .fetch_one(pool)
    .await
}

/// Update a user's profile.
///
/// Only non-None values are updated. Returns `None` if the user is gone.
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    changes: &UserChanges,
) -> sqlx::Result<Option<User>> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

    if let Some(username) = &changes.username {
        builder.push(", username = ").push_bind(username);
    }
    if let Some(email) = &changes.email {
        builder.push(", email = ").push_bind(email);
    }
    if let Some(hash) = &changes.password_hash {
        builder.push(", password_hash = ").push_bind(hash);
    }
    if let Some(birthdate) = changes.birthdate {
        builder.push(", birthdate = ").push_bind(birthdate);
    }
    if let Some(description) = &changes.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(location) = &changes.location {
        builder.push(", location = ").push_bind(location);
    }
    if let Some(interests) = &changes.interests {
        builder.push(", interests = ").push_bind(interests);
    }
    if let Some(avatar) = &changes.avatar {
        builder.push(", avatar = ").push_bind(avatar);
    }
    if let Some(banner) = &changes.banner {
        builder.push(", banner = ").push_bind(banner);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(user_id)
        .push(" RETURNING *");

    builder
        .build_query_as::<User>()
        .fetch_optional(pool)
        .await
        .map_err(db_error!("update_user", user_id = %user_id))
}

/// Delete a user. Owned events and memberships cascade.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("delete_user", user_id = %user_id))
}

// ============================================================================
// Category Queries
// ============================================================================

/// List all categories ordered by name.
pub async fn list_categories(pool: &PgPool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_categories"))
}

/// Find category by name.
pub async fn find_category_by_name(pool: &PgPool, name: &str) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_category_by_name", name = %name))
}

/// Create a category. A duplicate name surfaces as a unique violation.
pub async fn create_category(pool: &PgPool, name: &str) -> sqlx::Result<Category> {
    sqlx::query_as::<_, Category>("INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING *")
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(pool)
        .await
}

/// Rename a category.
pub async fn update_category(pool: &PgPool, id: Uuid, name: &str) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>("UPDATE categories SET name = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Delete a category and return it.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>("DELETE FROM categories WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("delete_category", category_id = %id))
}

// ============================================================================
// Event Queries
// ============================================================================

/// Build an event `SELECT` with both membership lists aggregated.
///
/// `filter` is appended as the `WHERE` clause and may reference `e.*`.
fn select_events(filter: &str) -> String {
    format!(
        r"
        SELECT e.id, e.title, e.description, e.category, e.date, e.period, e.time,
               e.location, e.owner_id, e.participants_number, e.coordinates, e.status,
               e.warnings, e.created_at, e.updated_at,
               COALESCE(
                   ARRAY_AGG(m.user_id ORDER BY m.entered_at) FILTER (WHERE m.state = 'approved'),
                   '{{}}'
               ) AS participants,
               COALESCE(
                   ARRAY_AGG(m.user_id ORDER BY m.entered_at) FILTER (WHERE m.state = 'waiting'),
                   '{{}}'
               ) AS waiting_list
        FROM events e
        LEFT JOIN event_members m ON m.event_id = e.id
        WHERE {filter}
        GROUP BY e.id
        ORDER BY e.date, e.id
        "
    )
}

/// Find event by ID.
pub async fn find_event_by_id<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<EventRow>>
where
    E: PgExecutor<'e>,
{
    let sql = select_events("e.id = $1");
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_event_by_id", event_id = %id))
}

/// List every event.
pub async fn list_events(pool: &PgPool) -> sqlx::Result<Vec<EventRow>> {
    let sql = select_events("TRUE");
    sqlx::query_as::<_, EventRow>(&sql)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_events"))
}

/// List events owned by a user.
pub async fn list_events_by_owner(pool: &PgPool, owner_id: Uuid) -> sqlx::Result<Vec<EventRow>> {
    let sql = select_events("e.owner_id = $1");
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_events_by_owner", owner_id = %owner_id))
}

/// List events tagged with `category`.
pub async fn list_events_by_category(pool: &PgPool, category: &str) -> sqlx::Result<Vec<EventRow>> {
    let sql = select_events("e.category = $1");
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(category)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_events_by_category", category = %category))
}

/// List events where the user holds `state`.
pub async fn list_events_by_member(
    pool: &PgPool,
    user_id: Uuid,
    state: MembershipState,
) -> sqlx::Result<Vec<EventRow>> {
    let sql = select_events(
        "e.id IN (SELECT event_id FROM event_members WHERE user_id = $1 AND state = $2)",
    );
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(user_id)
        .bind(state)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_events_by_member", user_id = %user_id, state = ?state))
}

/// Create an event and return it with empty lists.
pub async fn create_event(pool: &PgPool, event: &NewEvent) -> sqlx::Result<EventRow> {
    let id = Uuid::now_v7();
    sqlx::query(
        r"
        INSERT INTO events (id, title, description, category, date, period, time, location,
                            owner_id, participants_number, coordinates, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ",
    )
    .bind(id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.category)
    .bind(event.date)
    .bind(&event.period)
    .bind(&event.time)
    .bind(&event.location)
    .bind(event.owner_id)
    .bind(event.participants_number)
    .bind(&event.coordinates)
    .bind(event.status)
    .execute(pool)
    .await
    .map_err(db_error!("create_event", owner_id = %event.owner_id))?;

    find_event_by_id(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Lock an event row for the rest of the transaction.
///
/// Returns `(owner_id, participants_number)` or `None` if the event is gone.
pub async fn lock_event(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> sqlx::Result<Option<(Uuid, Option<i32>)>> {
    sqlx::query_as::<_, (Uuid, Option<i32>)>(
        "SELECT owner_id, participants_number FROM events WHERE id = $1 FOR UPDATE",
    )
    .bind(event_id)
    .fetch_optional(conn)
    .await
    .map_err(db_error!("lock_event", event_id = %event_id))
}

/// Membership rows of an event in list order.
pub async fn list_event_members(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> sqlx::Result<Vec<EventMember>> {
    sqlx::query_as::<_, EventMember>(
        "SELECT user_id, state FROM event_members WHERE event_id = $1 ORDER BY entered_at",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
    .map_err(db_error!("list_event_members", event_id = %event_id))
}

/// Write the membership state of one user. `None` removes the row.
///
/// Entering a state moves the user to the end of that list.
pub async fn set_member_state(
    conn: &mut PgConnection,
    event_id: Uuid,
    user_id: Uuid,
    state: Option<MembershipState>,
) -> sqlx::Result<()> {
    let result = match state {
        Some(state) => {
            sqlx::query(
                r"
                INSERT INTO event_members (event_id, user_id, state)
                VALUES ($1, $2, $3)
                ON CONFLICT (event_id, user_id)
                DO UPDATE SET state = EXCLUDED.state, entered_at = clock_timestamp()
                ",
            )
            .bind(event_id)
            .bind(user_id)
            .bind(state)
            .execute(conn)
            .await
        }
        None => {
            sqlx::query("DELETE FROM event_members WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .execute(conn)
                .await
        }
    };

    result.map_err(db_error!("set_member_state", event_id = %event_id, user_id = %user_id))?;

    Ok(())
}

/// Apply a partial update to an event row.
///
/// The owner is never changed here.
pub async fn update_event(
    conn: &mut PgConnection,
    event_id: Uuid,
    changes: &EventChanges,
) -> sqlx::Result<()> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE events SET updated_at = NOW()");

    if let Some(title) = &changes.title {
        builder.push(", title = ").push_bind(title);
    }
    if let Some(description) = &changes.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(category) = &changes.category {
        builder.push(", category = ").push_bind(category);
    }
    if let Some(date) = changes.date {
        builder.push(", date = ").push_bind(date);
    }
    if let Some(period) = &changes.period {
        builder.push(", period = ").push_bind(period);
    }
    if let Some(time) = &changes.time {
        builder.push(", time = ").push_bind(time);
    }
    if let Some(location) = &changes.location {
        builder.push(", location = ").push_bind(location);
    }
    if let Some(number) = changes.participants_number {
        builder.push(", participants_number = ").push_bind(number);
    }
    if let Some(coordinates) = &changes.coordinates {
        builder.push(", coordinates = ").push_bind(coordinates);
    }
    if let Some(status) = changes.status {
        builder.push(", status = ").push_bind(status);
    }

    builder.push(" WHERE id = ").push_bind(event_id);

    builder
        .build()
        .execute(conn)
        .await
        .map_err(db_error!("update_event", event_id = %event_id))?;

    Ok(())
}

/// Delete an event. Memberships cascade.
pub async fn delete_event(pool: &PgPool, event_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event_id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_event", event_id = %event_id))?;

    Ok(result.rows_affected() > 0)
}
