// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: the mock backend, counting doubles, and
//! assertion helpers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::credential::{CredentialKind, CredentialStore, MemoryCredentialStore, Profile};
use crate::session::SessionTerminator;

/// reqwest is built without a bundled TLS provider; install one before any
/// client is constructed, mirroring the binary's startup.
pub fn install_crypto_provider() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

// ---------------------------------------------------------------------------
// Counting doubles
// ---------------------------------------------------------------------------

/// Credential store wrapper that counts mutations.
pub struct CountingStore {
    inner: MemoryCredentialStore,
    set_pairs: AtomicU32,
    clears: AtomicU32,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCredentialStore::new(),
            set_pairs: AtomicU32::new(0),
            clears: AtomicU32::new(0),
        })
    }

    /// Build a store pre-loaded with a credential pair. Seeding does not
    /// count as a mutation.
    pub fn seeded(access: &str, refresh: &str) -> Arc<Self> {
        let store = Self::new();
        store.inner.set_pair(access, refresh);
        store
    }

    pub fn set_pairs(&self) -> u32 {
        self.set_pairs.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> u32 {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for CountingStore {
    fn get(&self, kind: CredentialKind) -> Option<String> {
        self.inner.get(kind)
    }

    fn set_pair(&self, access: &str, refresh: &str) {
        self.set_pairs.fetch_add(1, Ordering::SeqCst);
        self.inner.set_pair(access, refresh);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear();
    }

    fn profile(&self) -> Option<Profile> {
        self.inner.profile()
    }

    fn set_profile(&self, profile: &Profile) {
        self.inner.set_profile(profile);
    }
}

/// Terminator double: records invocations and clears the store the way the
/// production terminator does.
pub struct RecordingTerminator {
    store: Arc<dyn CredentialStore>,
    calls: AtomicU32,
    reasons: parking_lot::Mutex<Vec<String>>,
}

impl RecordingTerminator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            calls: AtomicU32::new(0),
            reasons: parking_lot::Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().clone()
    }
}

impl SessionTerminator for RecordingTerminator {
    fn terminate(&self, reason: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reasons.lock().push(reason.to_owned());
        self.store.clear();
    }
}

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

/// Scripted outcome for refresh exchanges.
#[derive(Debug, Clone)]
pub enum RefreshScript {
    /// Answer with a fresh pair; the new access token becomes the only one
    /// the protected routes accept.
    Rotate { access: String, refresh: String },
    /// Reject every exchange with this status and message.
    Reject { status: u16, message: String },
    /// Answer with a fresh pair the protected routes will still reject.
    RotateStale { access: String, refresh: String },
    /// Answer 200 with a body that does not carry a token pair.
    Garbled,
}

/// Server-side state shared with the test body.
pub struct MockState {
    /// Access token the protected routes currently accept.
    pub valid_access: parking_lot::Mutex<String>,
    pub refresh_script: parking_lot::Mutex<RefreshScript>,
    /// Sleep before answering a refresh. Long enough to let every concurrent
    /// 401 reach the coordinator while the flight is still up.
    pub refresh_delay: parking_lot::Mutex<Duration>,
    pub refresh_calls: AtomicU32,
    /// JSON bodies every refresh exchange carried.
    pub refresh_bodies: parking_lot::Mutex<Vec<Value>>,
    /// `(path, bearer)` for every request the protected routes saw.
    pub seen: parking_lot::Mutex<Vec<(String, Option<String>)>>,
}

/// In-process mock of the campus backend.
pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockApi {
    /// Start with `token-1` valid and a refresh that rotates to `token-2`.
    pub async fn start() -> Self {
        Self::start_with(
            "token-1",
            RefreshScript::Rotate { access: "token-2".to_owned(), refresh: "refresh-2".to_owned() },
            Duration::ZERO,
        )
        .await
    }

    pub async fn start_with(valid_access: &str, script: RefreshScript, delay: Duration) -> Self {
        install_crypto_provider();
        let state = Arc::new(MockState {
            valid_access: parking_lot::Mutex::new(valid_access.to_owned()),
            refresh_script: parking_lot::Mutex::new(script),
            refresh_delay: parking_lot::Mutex::new(delay),
            refresh_calls: AtomicU32::new(0),
            refresh_bodies: parking_lot::Mutex::new(Vec::new()),
            seen: parking_lot::Mutex::new(Vec::new()),
        });

        let router = build_router(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn refresh_calls(&self) -> u32 {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens the given protected path was called with, in order.
    pub fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
        self.state
            .seen
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, bearer)| bearer.clone())
            .collect()
    }

    pub fn set_valid_access(&self, token: &str) {
        *self.state.valid_access.lock() = token.to_owned();
    }

    pub fn set_refresh_script(&self, script: RefreshScript) {
        *self.state.refresh_script.lock() = script;
    }
}

fn build_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(me))
        .route("/api/colleges", get(list_colleges))
        .route("/api/batches", get(list_batches))
        .route("/api/students", get(list_students))
        .route("/api/students/{id}", get(show_student))
        .route("/api/courses", get(list_courses))
        .route("/api/assessments", get(list_assessments))
        .route("/api/attendance", post(mark_attendance))
        .route("/api/reports/overview", get(report_overview))
        .with_state(state)
}

fn sample_user() -> Value {
    json!({ "id": 1, "name": "Dev Admin", "email": "admin@example.edu", "role": "admin" })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Record the request and demand the currently-valid access token.
fn authorize(state: &MockState, path: &str, headers: &HeaderMap) -> Result<(), Response> {
    let token = bearer(headers);
    state.seen.lock().push((path.to_owned(), token.clone()));
    if token.as_deref() == Some(state.valid_access.lock().as_str()) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, Json(json!({ "message": "jwt expired" }))).into_response())
    }
}

fn guarded(state: &MockState, path: &str, headers: &HeaderMap, payload: Value) -> Response {
    match authorize(state, path, headers) {
        Ok(()) => (StatusCode::OK, Json(json!({ "data": payload }))).into_response(),
        Err(resp) => resp,
    }
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["password"] == "open-sesame" {
        let tokens = json!({
            "accessToken": *state.valid_access.lock(),
            "refreshToken": "refresh-0",
        });
        (StatusCode::OK, Json(json!({ "data": { "user": sample_user(), "tokens": tokens } })))
            .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid credentials" })))
            .into_response()
    }
}

async fn signup(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["email"].as_str().is_some_and(|e| e.contains("taken")) {
        return (StatusCode::CONFLICT, Json(json!({ "message": "email already registered" })))
            .into_response();
    }
    let tokens = json!({
        "accessToken": *state.valid_access.lock(),
        "refreshToken": "refresh-0",
    });
    let user = json!({
        "id": 2,
        "name": body["name"].as_str().unwrap_or("New User"),
        "email": body["email"].as_str().unwrap_or("new@example.edu"),
        "role": "staff",
    });
    (StatusCode::CREATED, Json(json!({ "data": { "user": user, "tokens": tokens } })))
        .into_response()
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    state.refresh_bodies.lock().push(body);
    state.seen.lock().push(("/api/auth/refresh".to_owned(), bearer(&headers)));

    let delay = *state.refresh_delay.lock();
    if delay > Duration::ZERO {
        tokio::time::sleep(delay).await;
    }

    let script = state.refresh_script.lock().clone();
    match script {
        RefreshScript::Rotate { access, refresh } => {
            *state.valid_access.lock() = access.clone();
            (
                StatusCode::OK,
                Json(json!({
                    "data": { "tokens": { "accessToken": access, "refreshToken": refresh } }
                })),
            )
                .into_response()
        }
        RefreshScript::Reject { status, message } => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED);
            (code, Json(json!({ "message": message }))).into_response()
        }
        RefreshScript::RotateStale { access, refresh } => (
            StatusCode::OK,
            Json(json!({
                "data": { "tokens": { "accessToken": access, "refreshToken": refresh } }
            })),
        )
            .into_response(),
        RefreshScript::Garbled => {
            (StatusCode::OK, Json(json!({ "data": { "unexpected": true } }))).into_response()
        }
    }
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(&state, "/api/auth/me", &headers, sample_user())
}

async fn list_colleges(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        "/api/colleges",
        &headers,
        json!([
            { "id": 1, "name": "North Campus", "city": "Pune", "batches": 4 },
            { "id": 2, "name": "River College", "city": "Nashik", "batches": 2 },
        ]),
    )
}

async fn list_batches(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        "/api/batches",
        &headers,
        json!([
            { "id": 11, "name": "2026-A", "collegeId": 1, "students": 34 },
            { "id": 12, "name": "2026-B", "collegeId": 1, "students": 29 },
        ]),
    )
}

async fn list_students(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        "/api/students",
        &headers,
        json!([
            { "id": 101, "name": "Meera Joshi", "email": "meera@example.edu", "batchId": 11 },
            { "id": 102, "name": "Rahul Verma", "email": "rahul@example.edu", "batchId": 11 },
        ]),
    )
}

async fn show_student(
    State(state): State<Arc<MockState>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    guarded(
        &state,
        &format!("/api/students/{id}"),
        &headers,
        json!({ "id": id, "name": "Meera Joshi", "email": "meera@example.edu", "batchId": 11 }),
    )
}

async fn list_courses(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        "/api/courses",
        &headers,
        json!([
            { "id": 21, "name": "Data Structures", "code": "CS201", "batchId": 11 },
            { "id": 22, "name": "Databases", "code": "CS204", "batchId": 11 },
        ]),
    )
}

async fn list_assessments(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        "/api/assessments",
        &headers,
        json!([
            { "id": 31, "title": "Midterm", "courseId": 21, "maxScore": 100 },
        ]),
    )
}

async fn mark_attendance(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let recorded = body["records"].as_array().map_or(0, Vec::len);
    guarded(&state, "/api/attendance", &headers, json!({ "recorded": recorded }))
}

async fn report_overview(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    guarded(
        &state,
        "/api/reports/overview",
        &headers,
        json!({ "colleges": 2, "batches": 4, "students": 120, "courses": 9, "assessments": 31 }),
    )
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
