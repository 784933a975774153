//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum router,
//! plus utilities for user and event creation and JWT generation.
//!
//! Each `TestApp` opens its own pool: a pool is bound to the runtime of the
//! `#[tokio::test]` that created it.
//!
//! ## Cleanup Guards
//!
//! Use [`CleanupGuard`] for RAII-based cleanup that runs even if a test panics.
#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sortie_server::api::{create_router, AppState};
use sortie_server::auth::{hash_password, jwt};
use sortie_server::config::Config;
use sortie_server::db::{self, NewEvent, NewUser};
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

/// Password given to every user made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "password1";

// ============================================================================
// Shared resources
// ============================================================================

/// Shared config across all tests in the same binary.
static SHARED_CONFIG: OnceCell<Config> = OnceCell::const_new();

/// Open a pool for the current test runtime and apply migrations.
pub async fn test_pool() -> PgPool {
    let config = shared_config().await;
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to test DB");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Get or create a shared config.
pub async fn shared_config() -> &'static Config {
    SHARED_CONFIG
        .get_or_init(|| async { Config::default_for_test() })
        .await
}

// ============================================================================
// Cleanup Guard
// ============================================================================

/// Async cleanup action type.
type CleanupAction = Box<dyn FnOnce(PgPool) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// RAII guard that runs cleanup actions on drop, even if the test panics.
///
/// # Example
///
/// ```ignore
/// let mut guard = app.cleanup_guard();
/// guard.delete_user(user_id);
///
/// assert_eq!(resp.status(), 200);
/// // guard dropped here → cleanup runs
/// ```
pub struct CleanupGuard {
    pool: PgPool,
    actions: Vec<CleanupAction>,
}

impl CleanupGuard {
    /// Create a new cleanup guard for the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            actions: Vec::new(),
        }
    }

    /// Register a generic async cleanup action.
    pub fn add<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(PgPool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.actions
            .push(Box::new(move |pool| Box::pin(action(pool))));
    }

    /// Register cleanup to delete a user by ID. Owned events cascade.
    pub fn delete_user(&mut self, user_id: Uuid) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&pool)
                .await;
        });
    }

    /// Register cleanup to delete a user by email.
    pub fn delete_user_by_email(&mut self, email: String) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM users WHERE email = $1")
                .bind(email)
                .execute(&pool)
                .await;
        });
    }

    /// Register cleanup to delete a category by name.
    pub fn delete_category(&mut self, name: &'static str) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM categories WHERE name = $1")
                .bind(name)
                .execute(&pool)
                .await;
        });
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let actions = std::mem::take(&mut self.actions);
        if actions.is_empty() {
            return;
        }

        let pool = self.pool.clone();
        let handle = tokio::runtime::Handle::current();

        // Spawn a blocking thread to run async cleanup.
        std::thread::spawn(move || {
            handle.block_on(async move {
                for action in actions {
                    action(pool.clone()).await;
                }
            });
        })
        .join()
        .expect("Cleanup thread panicked");
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app with a fresh DB pool.
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let config = shared_config().await.clone();

        let router = create_router(AppState::new(pool.clone(), config.clone()));

        Self {
            router,
            pool,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Build a JSON request, authenticated when `token` is given.
    pub fn json_request(
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Self::request(method, uri).header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("Failed to build request")
    }

    /// Build a body-less request, authenticated when `token` is given.
    pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Self::request(method, uri);
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        builder.body(Body::empty()).expect("Failed to build request")
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Create a [`CleanupGuard`] for this app's pool.
    pub fn cleanup_guard(&self) -> CleanupGuard {
        CleanupGuard::new(self.pool.clone())
    }
}

// ============================================================================
// User & Auth helpers
// ============================================================================

/// Random letters-only name that passes the username rules.
pub fn unique_name() -> String {
    // The tail of a v7 UUID is random
    Uuid::now_v7()
        .simple()
        .to_string()
        .chars()
        .rev()
        .take(12)
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from(b'g' + d as u8),
            None => c,
        })
        .collect()
}

/// Create a test user and return `(user_id, email)`.
pub async fn create_test_user(pool: &PgPool) -> (Uuid, String) {
    let name = unique_name();
    let email = format!("{name}@sortie.test");
    let user = db::create_user(
        pool,
        &NewUser {
            username: name,
            email: email.clone(),
            password_hash: hash_password(TEST_PASSWORD).expect("Failed to hash password"),
            birthdate: None,
            description: None,
            location: None,
            interests: Vec::new(),
        },
    )
    .await
    .expect("Failed to create test user");

    (user.id, email)
}

/// Create an event owned by `owner_id` with the given capacity.
pub async fn create_test_event(pool: &PgPool, owner_id: Uuid, capacity: Option<i32>) -> Uuid {
    let event = db::create_event(
        pool,
        &NewEvent {
            title: "Test event".into(),
            description: "Created by a test".into(),
            category: "sport".into(),
            date: chrono::Utc::now(),
            period: None,
            time: None,
            location: None,
            owner_id,
            participants_number: capacity,
            coordinates: Vec::new(),
            status: None,
        },
    )
    .await
    .expect("Failed to create test event");
    event.id
}

/// Generate an access token for the given user.
pub fn generate_access_token(config: &Config, user_id: Uuid) -> String {
    jwt::generate_access_token(user_id, &config.jwt_secret, config.jwt_access_expiry)
        .expect("Failed to generate access token")
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
