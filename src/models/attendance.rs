use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// An attendance session: the token/expiry pair a teacher has on screen.
///
/// For a given lesson at most one session is active at any instant; issuing
/// a new session deactivates the previous one in the same store write, so a
/// stale QR code can never validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSession {
    /// The unique identifier for the session.
    pub id: Uuid,
    /// The lesson this session belongs to.
    pub lesson_id: Uuid,
    /// The opaque token the QR code carries.
    pub token: String,
    /// The timestamp when the session was issued.
    pub issued_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
    /// Whether this is still the lesson's current session.
    pub active: bool,
}

impl From<&Row> for AttendanceSession {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            lesson_id: row.get("lesson_id"),
            token: row.get("token"),
            issued_at: row.get("issued_at"),
            expires_at: row.get("expires_at"),
            active: row.get("active"),
        }
    }
}

/// A recorded attendance entry. Written exactly once per student and lesson,
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The unique identifier for the record.
    pub id: Uuid,
    /// The lesson attendance was recorded for.
    pub lesson_id: Uuid,
    /// The student who scanned.
    pub student_id: Uuid,
    /// The session that was valid at scan time.
    pub session_id: Uuid,
    /// The timestamp of the successful scan.
    pub recorded_at: DateTime<Utc>,
    /// The caller-supplied network origin. Stored for audit only; no
    /// decision is ever based on it.
    pub origin_address: String,
}

impl From<&Row> for AttendanceRecord {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            lesson_id: row.get("lesson_id"),
            student_id: row.get("student_id"),
            session_id: row.get("session_id"),
            recorded_at: row.get("recorded_at"),
            origin_address: row.get("origin_address"),
        }
    }
}
