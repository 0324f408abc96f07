//! Integration test harness for Sonie Atelier.
//!
//! Spins up two in-process servers on ephemeral ports:
//!
//! - a mock Supabase backend covering the PostgREST (`/rest/v1`) and GoTrue
//!   (`/auth/v1`) surfaces the site talks to, backed by in-memory rows
//! - the real site router, configured to point at that backend
//!
//! Tests either call the mutation actions directly against the site's
//! [`AppState`] or drive the HTTP surface with a redirect-disabled client.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use uuid::Uuid;

use sonie_atelier_site::config::{CloudinaryConfig, SiteConfig, SupabaseConfig};
use sonie_atelier_site::routes;
use sonie_atelier_site::state::AppState;

/// Fixed credentials the mock identity provider accepts.
pub const TEST_EMAIL: &str = "admin@sonieatelier.com";
pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";
pub const TEST_REFRESH_TOKEN: &str = "test-refresh-token";
pub const TEST_AUTH_CODE: &str = "good-code";

/// In-memory rows behind the mock PostgREST surface.
pub struct Backend {
    pub bags: Mutex<Vec<Value>>,
    pub settings: Mutex<Vec<Value>>,
    next_id: AtomicI64,
    pub user_id: Uuid,
}

impl Backend {
    fn new() -> Self {
        Self {
            bags: Mutex::new(Vec::new()),
            settings: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            user_id: Uuid::new_v4(),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Seed a bag row directly, bypassing the HTTP surface.
    pub fn seed_bag(&self, mut row: Value) -> i64 {
        let id = self.allocate_id();
        row["id"] = json!(id);
        if row.get("created_at").is_none() {
            row["created_at"] = json!(chrono::Utc::now().to_rfc3339());
        }
        self.bags.lock().unwrap().push(row);
        id
    }

    pub fn bag(&self, id: i64) -> Option<Value> {
        self.bags
            .lock()
            .unwrap()
            .iter()
            .find(|row| row["id"] == json!(id))
            .cloned()
    }
}

/// A running site plus its backing mock, ready for requests.
pub struct TestSite {
    pub base_url: String,
    pub state: AppState,
    pub backend: Arc<Backend>,
}

impl TestSite {
    /// Start the mock backend and the site, both on ephemeral ports.
    pub async fn spawn() -> Self {
        let backend = Arc::new(Backend::new());
        let backend_addr = serve(backend_router(Arc::clone(&backend))).await;
        let backend_url = format!("http://{backend_addr}");

        let config = SiteConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: String::new(),
            session_secret: SecretString::from("kX9#mQ2$vL8@nR4!pT6&wY0*zB5^cF3j"),
            supabase: SupabaseConfig {
                url: backend_url,
                anon_key: SecretString::from("test-anon-key"),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: "sonie-test".to_owned(),
                api_key: "123456".to_owned(),
                api_secret: SecretString::from("tOpS3cretValue"),
            },
            sentry_dsn: None,
        };

        let state = AppState::new(config).unwrap();
        let app = routes::routes().with_state(state.clone());
        let site_addr = serve(app).await;

        Self {
            base_url: format!("http://{site_addr}"),
            state,
            backend,
        }
    }

    /// HTTP client that never follows redirects, so `Location` and
    /// `Set-Cookie` headers stay observable.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Mock backend
// =============================================================================

type BackendArc = Arc<Backend>;

fn backend_router(backend: BackendArc) -> Router {
    Router::new()
        .route("/auth/v1/token", axum::routing::post(auth_token))
        .route("/auth/v1/signup", axum::routing::post(auth_signup))
        .route("/auth/v1/user", get(auth_user))
        .route(
            "/rest/v1/bags",
            get(bags_select)
                .post(bags_insert)
                .patch(bags_update)
                .delete(bags_delete),
        )
        .route(
            "/rest/v1/settings",
            get(settings_select)
                .post(settings_insert)
                .patch(settings_update),
        )
        .with_state(backend)
}

fn session_body(backend: &Backend, email: &str) -> Value {
    json!({
        "access_token": TEST_ACCESS_TOKEN,
        "refresh_token": TEST_REFRESH_TOKEN,
        "expires_at": chrono::Utc::now().timestamp() + 3600,
        "user": { "id": backend.user_id, "email": email },
    })
}

#[derive(serde::Deserialize)]
struct GrantQuery {
    grant_type: String,
}

async fn auth_token(
    State(backend): State<BackendArc>,
    Query(query): Query<GrantQuery>,
    Json(body): Json<Value>,
) -> Response {
    match query.grant_type.as_str() {
        "password" => {
            let email = body["email"].as_str().unwrap_or_default();
            let password = body["password"].as_str().unwrap_or_default();
            if email == TEST_EMAIL && password == TEST_PASSWORD {
                Json(session_body(&backend, email)).into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error_description": "Invalid login credentials"})),
                )
                    .into_response()
            }
        }
        "pkce" => {
            if body["auth_code"].as_str() == Some(TEST_AUTH_CODE) {
                Json(session_body(&backend, TEST_EMAIL)).into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error_description": "invalid flow state"})),
                )
                    .into_response()
            }
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn auth_signup(State(backend): State<BackendArc>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    // Addresses containing "verify" simulate a pending email confirmation.
    if email.contains("verify") {
        Json(json!({"user": {"id": backend.user_id, "email": email}})).into_response()
    } else {
        Json(session_body(&backend, &email)).into_response()
    }
}

async fn auth_user(State(backend): State<BackendArc>, headers: HeaderMap) -> Response {
    if bearer(&headers) == Some(TEST_ACCESS_TOKEN) {
        Json(json!({"id": backend.user_id, "email": TEST_EMAIL})).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// PostgREST-style filter: `field=eq.value` / `field=neq.value`, plus
/// `limit`. `select` and `order` are accepted and ignored (rows are kept
/// newest-first by construction in these tests).
struct RowFilter {
    conditions: Vec<(String, bool, String)>,
    limit: Option<usize>,
}

impl RowFilter {
    fn parse(raw: Option<&str>) -> Self {
        let mut conditions = Vec::new();
        let mut limit = None;

        for pair in raw.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urldecode(value);
            match key {
                "select" | "order" => {}
                "limit" => limit = value.parse().ok(),
                _ => {
                    if let Some(rest) = value.strip_prefix("eq.") {
                        conditions.push((key.to_owned(), true, rest.to_owned()));
                    } else if let Some(rest) = value.strip_prefix("neq.") {
                        conditions.push((key.to_owned(), false, rest.to_owned()));
                    }
                }
            }
        }

        Self { conditions, limit }
    }

    fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|(field, want_equal, expected)| {
            let actual = match row.get(field) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => return !want_equal,
            };
            (actual == *expected) == *want_equal
        })
    }
}

fn urldecode(value: &str) -> String {
    // Good enough for the filter values these tests produce.
    value.replace("%20", " ").replace('+', " ")
}

fn select_rows(rows: &[Value], filter: &RowFilter) -> Vec<Value> {
    let mut matched: Vec<Value> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
    matched.reverse(); // newest-first, matching order=created_at.desc
    if let Some(limit) = filter.limit {
        matched.truncate(limit);
    }
    matched
}

async fn bags_select(State(backend): State<BackendArc>, RawQuery(raw): RawQuery) -> Json<Value> {
    let filter = RowFilter::parse(raw.as_deref());
    let rows = backend.bags.lock().unwrap();
    Json(Value::Array(select_rows(&rows, &filter)))
}

async fn bags_insert(
    State(backend): State<BackendArc>,
    Json(mut row): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let id = backend.allocate_id();
    row["id"] = json!(id);
    row["created_at"] = json!(chrono::Utc::now().to_rfc3339());
    backend.bags.lock().unwrap().push(row.clone());
    (StatusCode::CREATED, Json(Value::Array(vec![row])))
}

async fn bags_update(
    State(backend): State<BackendArc>,
    RawQuery(raw): RawQuery,
    Json(changes): Json<Value>,
) -> Json<Value> {
    let filter = RowFilter::parse(raw.as_deref());
    let mut rows = backend.bags.lock().unwrap();
    let mut updated = Vec::new();

    for row in rows.iter_mut().filter(|r| filter.matches(r)) {
        if let (Some(target), Some(source)) = (row.as_object_mut(), changes.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        updated.push(row.clone());
    }

    Json(Value::Array(updated))
}

async fn bags_delete(State(backend): State<BackendArc>, RawQuery(raw): RawQuery) -> Json<Value> {
    let filter = RowFilter::parse(raw.as_deref());
    let mut rows = backend.bags.lock().unwrap();
    let removed: Vec<Value> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
    rows.retain(|r| !filter.matches(r));
    Json(Value::Array(removed))
}

async fn settings_select(
    State(backend): State<BackendArc>,
    RawQuery(raw): RawQuery,
) -> Json<Value> {
    let filter = RowFilter::parse(raw.as_deref());
    let rows = backend.settings.lock().unwrap();
    Json(Value::Array(select_rows(&rows, &filter)))
}

async fn settings_insert(
    State(backend): State<BackendArc>,
    Json(mut row): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let id = backend.allocate_id();
    row["id"] = json!(id);
    backend.settings.lock().unwrap().push(row.clone());
    (StatusCode::CREATED, Json(Value::Array(vec![row])))
}

async fn settings_update(
    State(backend): State<BackendArc>,
    RawQuery(raw): RawQuery,
    Json(changes): Json<Value>,
) -> Json<Value> {
    let filter = RowFilter::parse(raw.as_deref());
    let mut rows = backend.settings.lock().unwrap();
    let mut updated = Vec::new();

    for row in rows.iter_mut().filter(|r| filter.matches(r)) {
        if let (Some(target), Some(source)) = (row.as_object_mut(), changes.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        updated.push(row.clone());
    }

    Json(Value::Array(updated))
}
