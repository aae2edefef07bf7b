pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::attendance::{AttendanceRecord, AttendanceSession};

/// Durable storage for attendance sessions and records.
///
/// The store is the sole writer of both tables. Issuer and verifier go
/// through these primitives rather than touching storage directly, so the
/// uniqueness invariants are enforced in exactly one place. Each method is a
/// single atomic unit; no intermediate state is observable.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Inserts a new active session for `lesson_id`, deactivating any
    /// previously active session for the same lesson in the same write.
    async fn create_session_deactivating_prior(
        &self,
        lesson_id: Uuid,
        token: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<AttendanceSession>;

    /// Looks up the active session carrying `token`, if any.
    ///
    /// Expiry is not checked here; the verifier re-checks it against the
    /// injected clock at decision time.
    async fn find_active_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AttendanceSession>>;

    /// Inserts an attendance record unless one already exists for
    /// (`lesson_id`, `student_id`). Returns `None` on conflict.
    ///
    /// The existence check and the insert are one conditional write, so two
    /// concurrent scans from the same student yield exactly one record.
    async fn insert_attendance_if_absent(
        &self,
        lesson_id: Uuid,
        student_id: Uuid,
        session_id: Uuid,
        recorded_at: DateTime<Utc>,
        origin_address: String,
    ) -> Result<Option<AttendanceRecord>>;

    /// Lists the attendance recorded for a lesson, newest first.
    async fn list_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<AttendanceRecord>>;

    /// Flips `active` off on sessions past their expiry and returns how many
    /// were touched. Hygiene only; verification never trusts `active`
    /// without re-checking `expires_at`.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
