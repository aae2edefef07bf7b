use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::attendance::{AttendanceRecord, AttendanceSession},
    store::AttendanceStore,
};

/// The PostgreSQL-backed attendance store.
///
/// The deactivate-prior/insert pair runs inside one transaction; the
/// duplicate check rides on the unique (`lesson_id`, `student_id`) index via
/// a conditional insert.
#[derive(Clone)]
pub struct PgAttendanceStore {
    pool: Pool,
}

impl PgAttendanceStore {
    /// Creates a new store over the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn create_session_deactivating_prior(
        &self,
        lesson_id: Uuid,
        token: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<AttendanceSession> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        tx.execute(
            r#"
            UPDATE attendance_sessions
            SET active = false
            WHERE lesson_id = $1 AND active = true
            "#,
            &[&lesson_id],
        )
        .await?;

        let row = tx
            .query_one(
                r#"
                INSERT INTO attendance_sessions (id, lesson_id, token, issued_at, expires_at, active)
                VALUES ($1, $2, $3, $4, $5, true)
                RETURNING id, lesson_id, token, issued_at, expires_at, active
                "#,
                &[&Uuid::new_v4(), &lesson_id, &token, &issued_at, &expires_at],
            )
            .await?;

        tx.commit().await?;

        Ok(AttendanceSession::from(&row))
    }

    async fn find_active_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AttendanceSession>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, lesson_id, token, issued_at, expires_at, active
                FROM attendance_sessions
                WHERE token = $1 AND active = true
                "#,
                &[&token],
            )
            .await?;
        Ok(row.map(|r| AttendanceSession::from(&r)))
    }

    async fn insert_attendance_if_absent(
        &self,
        lesson_id: Uuid,
        student_id: Uuid,
        session_id: Uuid,
        recorded_at: DateTime<Utc>,
        origin_address: String,
    ) -> Result<Option<AttendanceRecord>> {
        let client = self.pool.get().await?;
        // The duplicate check is the insert itself; a separate existence
        // check would race.
        let row = client
            .query_opt(
                r#"
                INSERT INTO attendance_records (id, lesson_id, student_id, session_id, recorded_at, origin_address)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (lesson_id, student_id) DO NOTHING
                RETURNING id, lesson_id, student_id, session_id, recorded_at, origin_address
                "#,
                &[
                    &Uuid::new_v4(),
                    &lesson_id,
                    &student_id,
                    &session_id,
                    &recorded_at,
                    &origin_address,
                ],
            )
            .await?;
        Ok(row.map(|r| AttendanceRecord::from(&r)))
    }

    async fn list_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, lesson_id, student_id, session_id, recorded_at, origin_address
                FROM attendance_records
                WHERE lesson_id = $1
                ORDER BY recorded_at DESC
                "#,
                &[&lesson_id],
            )
            .await?;
        Ok(rows.iter().map(AttendanceRecord::from).collect())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let client = self.pool.get().await?;
        let touched = client
            .execute(
                r#"
                UPDATE attendance_sessions
                SET active = false
                WHERE active = true AND expires_at <= $1
                "#,
                &[&now],
            )
            .await?;
        Ok(touched)
    }
}
