use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::{AppError, Result},
    roster::Roster,
    store::AttendanceStore,
};

/// The successful outcome of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedAttendance {
    /// The lesson the student was recorded for.
    pub lesson_id: Uuid,
    /// When the attendance was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Verifies a presented token and records attendance for the student.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. token lookup and expiry,
/// 2. enrollment,
/// 3. the store's conditional insert.
///
/// A resubmitted scan deterministically lands on step 1 or step 3 depending
/// on state; nothing is retried here.
///
/// # Arguments
///
/// * `store` - The attendance store.
/// * `roster` - The class-membership collaborator view.
/// * `clock` - The time source for the expiry re-check.
/// * `presented_token` - The raw string decoded from the scanned image.
/// * `student_id` - The authenticated student.
/// * `origin_address` - The caller's network origin, kept for audit.
///
/// # Returns
///
/// A `Result` containing the `RecordedAttendance`.
pub async fn record_attendance(
    store: &dyn AttendanceStore,
    roster: &dyn Roster,
    clock: &dyn Clock,
    presented_token: &str,
    student_id: Uuid,
    origin_address: String,
) -> Result<RecordedAttendance> {
    let session = store
        .find_active_session_by_token(presented_token)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

    // Expiry is re-checked at scan time; the deadline stamped at issuance
    // is not trusted on its own.
    let now = clock.now();
    if now >= session.expires_at {
        return Err(AppError::InvalidOrExpiredToken);
    }

    if !roster.is_enrolled(session.lesson_id, student_id).await? {
        tracing::warn!(
            "❌ Student {} is not enrolled for lesson {}",
            student_id,
            session.lesson_id
        );
        return Err(AppError::NotEnrolled);
    }

    let record = store
        .insert_attendance_if_absent(
            session.lesson_id,
            student_id,
            session.id,
            now,
            origin_address,
        )
        .await?
        .ok_or(AppError::DuplicateAttendance)?;

    tracing::info!(
        "✅ Attendance recorded for student {} in lesson {}",
        student_id,
        session.lesson_id
    );

    Ok(RecordedAttendance {
        lesson_id: record.lesson_id,
        recorded_at: record.recorded_at,
    })
}
