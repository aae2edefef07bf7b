use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    clock::Clock,
    crypto::token,
    error::{AppError, Result},
    models::caller::{Caller, Role},
    roster::Roster,
    store::AttendanceStore,
};

/// Issuance tuning, supplied by the caller rather than baked-in constants.
#[derive(Debug, Clone, Copy)]
pub struct IssuerSettings {
    /// How long an issued token stays valid.
    pub window: Duration,
    /// The number of random bytes per token.
    pub token_bytes: usize,
}

/// What the display surface gets back: the token and its deadline, nothing
/// else.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    /// The opaque token to render as a QR code.
    pub token: String,
    /// When the token stops validating.
    pub expires_at: DateTime<Utc>,
}

/// Issues a fresh attendance session for a lesson.
///
/// Only the lesson's owning teacher may issue. Any previously active session
/// for the lesson is deactivated in the same store write, so a stale QR code
/// left on screen stops validating the instant the new one exists. The raw
/// token goes into the return value and nowhere else; it is never logged.
///
/// # Arguments
///
/// * `store` - The attendance store.
/// * `roster` - The class-membership collaborator view.
/// * `clock` - The time source for the expiry deadline.
/// * `settings` - Window and token sizing.
/// * `lesson_id` - The lesson to issue for.
/// * `caller` - The authenticated requester.
///
/// # Returns
///
/// A `Result` containing the `IssuedSession`.
pub async fn issue_session(
    store: &dyn AttendanceStore,
    roster: &dyn Roster,
    clock: &dyn Clock,
    settings: IssuerSettings,
    lesson_id: Uuid,
    caller: &Caller,
) -> Result<IssuedSession> {
    if caller.role != Role::Teacher {
        tracing::warn!(
            "❌ Caller {} with role {:?} tried to issue an attendance session",
            caller.user_id,
            caller.role
        );
        return Err(AppError::Unauthorized);
    }

    let owner = roster
        .lesson_owner(lesson_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if owner != caller.user_id {
        tracing::warn!(
            "❌ Caller {} does not own lesson {}",
            caller.user_id,
            lesson_id
        );
        return Err(AppError::Unauthorized);
    }

    let token = token::generate_attendance_token(settings.token_bytes)?;
    let issued_at = clock.now();
    let expires_at = issued_at + settings.window;

    let session = store
        .create_session_deactivating_prior(lesson_id, token, issued_at, expires_at)
        .await?;

    tracing::info!(
        "✅ Attendance session {} issued for lesson {} (expires {})",
        session.id,
        lesson_id,
        session.expires_at
    );

    Ok(IssuedSession {
        token: session.token,
        expires_at: session.expires_at,
    })
}
