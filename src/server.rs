//! HTTP server exposing presence sessions to a browser front end.
//!
//! This module provides an HTTP server that:
//! - Opens a session per page visit via POST /sessions
//! - Accepts batches of interaction events via POST /sessions/:id/events
//! - Reports the current assessment via GET /sessions/:id
//! - Gates form submission via POST /sessions/:id/submit
//!
//! Session time is always the server's clock. Client timestamps are kept for
//! interval measurements but are capped at the server clock.
//!
//! # Architecture
//!
//! ```text
//! Page script ──→ POST /sessions/:id/events ──→ Session ──→ GateStatus
//!                                                  ↑
//!                                    GET / submit tick at server clock
//! ```

use crate::collector::types::InputEvent;
use crate::core::{GateError, Session, SessionReport, VerdictPolicy};
use crate::transparency::{create_shared_log, SharedTransparencyLog, TransparencyStats};
use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Sessions untouched for this long are dropped.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 30 * 60;
/// Upper bound on live sessions; the least recently used is dropped beyond it.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
/// How far a client-supplied session start may differ from the server clock.
pub const MAX_START_SKEW_MS: i64 = 2_000;

/// Source of "now" for session time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Verdict policy for sessions opened through this server
    pub policy: VerdictPolicy,
    /// Idle time after which a session is dropped
    pub session_ttl: Duration,
    /// Maximum number of live sessions
    pub max_sessions: usize,
}

impl ServerConfig {
    pub fn new(port: u16, policy: VerdictPolicy) -> Self {
        Self {
            port,
            policy,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(0, VerdictPolicy::default())
    }
}

struct SessionEntry {
    session: Session,
    last_access: DateTime<Utc>,
}

/// Shared server state
pub struct ServerState {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    policy: VerdictPolicy,
    log: SharedTransparencyLog,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
    max_sessions: usize,
}

impl ServerState {
    pub fn new(policy: VerdictPolicy) -> Self {
        Self::from_config(&ServerConfig::new(0, policy))
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            policy: config.policy,
            log: create_shared_log(),
            clock: Arc::new(SystemClock),
            session_ttl: config.session_ttl,
            max_sessions: config.max_sessions.max(1),
        }
    }

    /// Replace the session clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_access > self.session_ttl
    }

    /// Drop expired sessions, then the least recently used ones while at capacity.
    fn make_room(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, live = sessions.len(), "Evicted idle sessions");
        }
    }

    /// Look up a live session and mark it accessed at `now`.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, SessionEntry>,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&'a mut Session, ApiError> {
        let expired = sessions
            .get(&id)
            .map(|entry| self.is_expired(entry, now))
            .ok_or_else(|| session_not_found(id))?;
        if expired {
            sessions.remove(&id);
            tracing::debug!(session = %id, "Session expired");
            return Err(session_not_found(id));
        }

        let entry = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        entry.last_access = now;
        Ok(&mut entry.session)
    }
}

/// Body of POST /sessions. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Client's view of the session start; must be within a small skew of
    /// the server clock. Defaults to the server's receipt time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Response from the submit endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
    pub observed: TransparencyStats,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn session_not_found(id: Uuid) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No session with id {}", id),
            code: "SESSION_NOT_FOUND".to_string(),
        }),
    )
}

impl From<GateError> for ErrorResponse {
    fn from(err: GateError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// The event as the session sees it: never later than the server clock.
fn clamp_to_clock(event: &InputEvent, now: DateTime<Utc>) -> InputEvent {
    InputEvent::at(event.time.min(now), event.signal)
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.session_count().await,
        observed: state.log.stats(),
    })
}

/// POST /sessions
async fn create_session(
    State(state): State<Arc<ServerState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let now = state.clock.now();

    let started_at = match request.started_at {
        None => now,
        Some(t) if (t - now).num_milliseconds().abs() <= MAX_START_SKEW_MS => t.min(now),
        Some(t) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!(
                        "started_at {} is more than {} ms from server time {}",
                        t, MAX_START_SKEW_MS, now
                    ),
                    code: "INVALID_START_TIME".to_string(),
                }),
            ));
        }
    };

    let session = Session::with_policy(started_at, state.policy);
    let session_id = session.id();
    {
        let mut sessions = state.sessions.write().await;
        state.make_room(&mut sessions, now);
        sessions.insert(
            session_id,
            SessionEntry {
                session,
                last_access: now,
            },
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            started_at,
        }),
    ))
}

/// POST /sessions/:id/events
///
/// Ingests the batch in order, with timestamps capped at the server clock,
/// then applies a duration tick at the server clock.
async fn ingest_events(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
    Json(events): Json<Vec<InputEvent>>,
) -> Result<Json<SessionReport>, ApiError> {
    let now = state.clock.now();
    let mut sessions = state.sessions.write().await;
    let session = state.touch(&mut sessions, id, now)?;

    for event in &events {
        state.log.record_event(event.kind());
        session.ingest(&clamp_to_clock(event, now));
    }

    session.tick(now);
    state.log.record_tick();

    tracing::debug!(session = %id, events = events.len(), "Ingested event batch");
    Ok(Json(session.report(now)))
}

/// GET /sessions/:id
async fn get_session(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionReport>, ApiError> {
    let now = state.clock.now();
    let mut sessions = state.sessions.write().await;
    let session = state.touch(&mut sessions, id, now)?;

    session.tick(now);
    state.log.record_tick();

    Ok(Json(session.report(now)))
}

/// POST /sessions/:id/submit
///
/// 200 only when the session is resolved as human; 403 otherwise.
async fn submit(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let now = state.clock.now();
    let mut sessions = state.sessions.write().await;
    let session = state.touch(&mut sessions, id, now)?;

    session.tick(now);
    state.log.record_tick();

    session
        .submit(|| {
            tracing::info!(session = %id, "Submission accepted");
            Json(SubmitResponse {
                status: "ok".to_string(),
                message: "Submission accepted".to_string(),
            })
        })
        .map_err(|e| {
            tracing::warn!(session = %id, code = e.code(), "Submission refused: {}", e);
            (StatusCode::FORBIDDEN, Json(e.into()))
        })
}

/// DELETE /sessions/:id
async fn delete_session(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = state.sessions.write().await.remove(&id);
    match removed {
        Some(SessionEntry { session, .. }) => {
            tracing::info!(
                session = %id,
                state = %session.state(),
                score = session.trust_score().rounded(),
                "Session ended"
            );
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found(id)),
    }
}

/// Build the router without binding a socket.
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/events", post(ingest_events))
        .route("/sessions/:id/submit", post(submit))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::from_config(&config));
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Presence server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
