use axum::{
    Extension, Json,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::{
    error::Result,
    models::caller::Caller,
    services::{
        attendance as attendance_service,
        issuer::{self as issuer_service, IssuerSettings},
        verifier as verifier_service,
    },
    state::AppState,
};

/// The request payload for recording attendance from a scanned code.
#[derive(Deserialize, Debug)]
pub struct ScanRequest {
    pub token: String,
}

/// Resolves the caller's network origin: proxy header first, then the
/// socket peer address.
fn resolve_origin(headers: &HeaderMap, peer: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Issues a fresh attendance session for a lesson (owning teacher only).
#[axum::debug_handler]
pub async fn issue_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Response> {
    let issued = issuer_service::issue_session(
        state.store.as_ref(),
        state.roster.as_ref(),
        state.clock.as_ref(),
        IssuerSettings {
            window: state.config.token_window(),
            token_bytes: state.config.token_bytes,
        },
        lesson_id,
        &caller,
    )
    .await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "qr_code": {
            "token": issued.token,
            "expires_at": issued.expires_at.to_rfc3339(),
        },
        "message": "Attendance session issued"
    }))
    .unwrap();

    Ok((StatusCode::CREATED, response).into_response())
}

/// Records attendance from a scanned QR code.
#[axum::debug_handler]
pub async fn scan(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ScanRequest>,
) -> Result<Response> {
    let origin = resolve_origin(&headers, &peer);

    let recorded = verifier_service::record_attendance(
        state.store.as_ref(),
        state.roster.as_ref(),
        state.clock.as_ref(),
        &payload.token,
        caller.user_id,
        origin,
    )
    .await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "lesson_id": recorded.lesson_id.to_string(),
        "recorded_at": recorded.recorded_at.to_rfc3339(),
        "message": "Attendance recorded successfully"
    }))
    .unwrap();

    Ok((StatusCode::OK, response).into_response())
}

/// Lists the recorded attendance for a lesson (owning teacher only).
#[axum::debug_handler]
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Response> {
    let list = attendance_service::list_attendance(
        state.store.as_ref(),
        state.roster.as_ref(),
        lesson_id,
        &caller,
    )
    .await?;

    let records_json: Vec<_> = list
        .attendance_list
        .iter()
        .map(|r| {
            sonic_rs::json!({
                "student_id": r.student_id.to_string(),
                "recorded_at": r.recorded_at.to_rfc3339(),
                "origin_address": r.origin_address.clone(),
            })
        })
        .collect();

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "attendance_count": list.attendance_count,
        "attendance_list": records_json,
    }))
    .unwrap();

    Ok((StatusCode::OK, response).into_response())
}
