//! Request/response types and axum handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use presence_types::{CheckinRecord, UserId, VenueId, MAX_TOTAL_SCORE, PASS_THRESHOLD};
use presence_verification::{
    Caller, CodeCheckResult, CommitRequest, LocationCheckResult, LocationFix, ReceiptCheckResult,
    ReceiptEvidence, VerificationError, VerificationPhase,
};

use crate::server::AppState;
use crate::RpcError;

/// Authenticated user id, set by the session gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// `guest` for anonymous sessions.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Resolve the caller from gateway headers. A missing user id or an explicit
/// guest role is a guest.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, RpcError> {
    let header_str = |name: &str| -> Result<Option<&str>, RpcError> {
        headers
            .get(name)
            .map(|v| {
                v.to_str()
                    .map_err(|_| RpcError::InvalidRequest(format!("{name} is not valid text")))
            })
            .transpose()
    };

    if header_str(USER_ROLE_HEADER)?.is_some_and(|role| role.trim().eq_ignore_ascii_case("guest")) {
        return Ok(Caller::Guest);
    }
    match header_str(USER_ID_HEADER)? {
        None => Ok(Caller::Guest),
        Some(raw) => UserId::parse(raw.trim())
            .map(Caller::User)
            .map_err(|e| RpcError::InvalidRequest(e.to_string())),
    }
}

/// Caller for endpoints that only users may call. Guests are turned away
/// before the request body is parsed.
fn authenticated(state: &AppState, headers: &HeaderMap) -> Result<Caller, RpcError> {
    state.observe(caller_from_headers(headers).and_then(|caller| {
        caller.require_user()?;
        Ok(caller)
    }))
}

type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn parse_body<T>(state: &AppState, body: JsonBody<T>) -> Result<T, RpcError> {
    state.observe(body.map(|Json(v)| v).map_err(RpcError::from))
}

async fn run_blocking<T, F>(f: F) -> Result<T, RpcError>
where
    F: FnOnce() -> Result<T, VerificationError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(RpcError::from),
        Err(e) => Err(RpcError::Server(format!("blocking task failed: {e}"))),
    }
}

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CodeCheckRequest {
    pub venue_id: VenueId,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct GpsCheckRequest {
    pub venue_id: VenueId,
    #[serde(flatten)]
    pub fix: LocationFix,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptCheckRequest {
    pub venue_id: VenueId,
    #[serde(flatten)]
    pub evidence: ReceiptEvidence,
}

#[derive(Debug, Deserialize)]
pub struct CommitCheckinRequest {
    pub venue_id: VenueId,
    #[serde(flatten)]
    pub fix: LocationFix,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub receipt: Option<ReceiptEvidence>,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CheckinView {
    pub id: String,
    pub user_id: String,
    pub venue_id: String,
    pub gps_score: u8,
    pub qr_score: u8,
    pub receipt_score: u8,
    pub total_score: u8,
    pub passed: bool,
    pub verified_at: u64,
}

impl From<&CheckinRecord> for CheckinView {
    fn from(r: &CheckinRecord) -> Self {
        Self {
            id: r.id.to_string(),
            user_id: r.user_id.to_string(),
            venue_id: r.venue_id.to_string(),
            gps_score: r.gps_score,
            qr_score: r.qr_score,
            receipt_score: r.receipt_score,
            total_score: r.total_score,
            passed: r.passed,
            verified_at: r.verified_at.as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub has_checked_in: bool,
    pub state: VerificationPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin: Option<CheckinView>,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub checkin: CheckinView,
    pub state: VerificationPhase,
    pub newly_passed: bool,
    pub max_score: u8,
    pub pass_threshold: u8,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn check_code(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<CodeCheckRequest>,
) -> Result<Json<CodeCheckResult>, RpcError> {
    state.metrics.code_checks.inc();
    let caller = authenticated(&state, &headers)?;
    let req = parse_body(&state, body)?;
    let engine = state.engine.clone();
    let result = state.observe(
        run_blocking(move || engine.check_code(&caller, &req.venue_id, &req.code)).await,
    )?;
    if result.valid {
        state.metrics.code_checks_valid.inc();
    }
    Ok(Json(result))
}

pub async fn check_gps(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<GpsCheckRequest>,
) -> Result<Json<LocationCheckResult>, RpcError> {
    state.metrics.gps_checks.inc();
    let caller = authenticated(&state, &headers)?;
    let req = parse_body(&state, body)?;
    let engine = state.engine.clone();
    let result = state.observe(
        run_blocking(move || engine.check_location_fix(&caller, &req.venue_id, &req.fix)).await,
    )?;
    Ok(Json(result))
}

pub async fn check_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<ReceiptCheckRequest>,
) -> Result<Json<ReceiptCheckResult>, RpcError> {
    state.metrics.receipt_checks.inc();
    let caller = authenticated(&state, &headers)?;
    let req = parse_body(&state, body)?;
    let engine = state.engine.clone();
    let result = state.observe(
        run_blocking(move || engine.check_receipt(&caller, &req.venue_id, &req.evidence)).await,
    )?;
    Ok(Json(result))
}

pub async fn commit_checkin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<CommitCheckinRequest>,
) -> Result<Json<CommitResponse>, RpcError> {
    state.metrics.commits.inc();
    let started = Instant::now();
    let caller = authenticated(&state, &headers)?;
    let req = parse_body(&state, body)?;
    let engine = state.engine.clone();
    let result = state.observe(
        run_blocking(move || {
            let request = CommitRequest {
                location: None,
                code: req.code,
                receipt: req.receipt,
            };
            engine.commit_fix(&caller, &req.venue_id, &req.fix, &request)
        })
        .await,
    )?;
    state
        .metrics
        .commit_duration_ms
        .observe(started.elapsed().as_secs_f64() * 1000.0);
    if result.newly_passed {
        state.metrics.checkins_passed.inc();
    }
    Ok(Json(CommitResponse {
        checkin: CheckinView::from(&result.record),
        state: result.phase,
        newly_passed: result.newly_passed,
        max_score: MAX_TOTAL_SCORE,
        pass_threshold: PASS_THRESHOLD,
    }))
}

pub async fn checkin_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(venue_id): Path<String>,
) -> Result<Json<StatusResponse>, RpcError> {
    let caller = state.observe(caller_from_headers(&headers))?;
    let venue_id = state.observe(
        VenueId::parse(venue_id).map_err(|e| RpcError::InvalidRequest(e.to_string())),
    )?;
    let engine = state.engine.clone();
    let result = state.observe(run_blocking(move || engine.status(&caller, &venue_id)).await)?;
    Ok(Json(StatusResponse {
        has_checked_in: result.has_checked_in,
        state: result.phase,
        checkin: result.checkin.as_ref().map(CheckinView::from),
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "presence",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, RpcError> {
    let body = state.metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn caller_resolution() {
        assert_eq!(caller_from_headers(&headers(&[])).unwrap(), Caller::Guest);
        assert_eq!(
            caller_from_headers(&headers(&[("x-user-id", "u1")])).unwrap(),
            Caller::User(UserId::new("u1"))
        );
        assert_eq!(
            caller_from_headers(&headers(&[("x-user-id", "u1"), ("x-user-role", "Guest")]))
                .unwrap(),
            Caller::Guest
        );
        assert!(caller_from_headers(&headers(&[("x-user-id", "  ")])).is_err());
    }
}
