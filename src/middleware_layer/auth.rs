use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::caller::{Caller, Role};

/// A middleware that requires the upstream gateway's identity headers.
///
/// Credential checks happen at the gateway; by the time a request reaches
/// this service the caller is already authenticated and these headers are
/// trusted. Requests missing either header never reach a handler.
///
/// # Arguments
///
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `StatusCode`.
pub async fn require_caller(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    tracing::debug!("🔐 Resolving caller identity...");

    let headers = request.headers();

    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            tracing::warn!("❌ Missing or malformed x-user-id header");
            StatusCode::FORBIDDEN
        })?;

    let role = headers
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Role>().ok())
        .ok_or_else(|| {
            tracing::warn!("❌ Missing or malformed x-user-role header");
            StatusCode::FORBIDDEN
        })?;

    tracing::debug!("✅ Caller resolved: {} ({:?})", user_id, role);

    request.extensions_mut().insert(Caller { user_id, role });

    Ok(next.run(request).await)
}
