//! Common Test Utilities for Integration Tests
//!
//! A stub of the Taskboard API serving `/login` and `/tasks`, plus token helpers.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use taskboard_client::session::SessionConfig;

pub const EMAIL: &str = "student@example.com";
pub const PASSWORD: &str = "secret";
/// Password for which the stub answers 500
pub const FAULTY_PASSWORD: &str = "boom";
/// Password for which the stub answers with an already expired token
pub const EXPIRED_PASSWORD: &str = "stale";

/// Build a JWT-shaped token; the signature segment is never checked client-side
pub fn make_token(subject: &str, expires_at: Option<u64>) -> String {
    let mut claims = serde_json::json!({ "sub": subject });
    if let Some(exp) = expires_at {
        claims["exp"] = exp.into();
    }
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Knobs and counters shared with the running stub
#[derive(Clone, Default)]
pub struct StubState {
    /// When set, `/tasks` rejects every token
    pub revoked: Arc<AtomicBool>,
    pub login_calls: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<StubState>, Json(body): Json<LoginBody>) -> impl IntoResponse {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    if body.email != EMAIL {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Invalid credentials" })),
        );
    }
    match body.password.as_str() {
        PASSWORD => (
            StatusCode::OK,
            Json(serde_json::json!({ "token": make_token(EMAIL, Some(now_secs() + 3600)) })),
        ),
        EXPIRED_PASSWORD => (
            StatusCode::OK,
            Json(serde_json::json!({ "token": make_token(EMAIL, Some(now_secs() - 60)) })),
        ),
        FAULTY_PASSWORD => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": "Database unavailable" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Invalid credentials" })),
        ),
    }
}

async fn tasks(State(state): State<StubState>, headers: HeaderMap) -> impl IntoResponse {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));

    if !bearer || state.revoked.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Token invalide" })),
        );
    }
    (StatusCode::OK, Json(serde_json::json!([])))
}

/// Create the stub router with its state
pub fn create_test_app() -> (Router, StubState) {
    let state = StubState::default();
    let app = Router::new()
        .route("/login", post(login))
        .route("/tasks", get(tasks))
        .with_state(state.clone());
    (app, state)
}

/// Start the stub on an ephemeral port
pub async fn start_test_server() -> (SocketAddr, StubState, tokio::task::JoinHandle<()>) {
    let (app, state) = create_test_app();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, state, handle)
}

/// An address nothing listens on
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn session_config(addr: SocketAddr) -> SessionConfig {
    SessionConfig {
        login_url: format!("http://{}/login", addr),
        ..SessionConfig::default()
    }
}
