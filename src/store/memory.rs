use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    error::Result,
    models::attendance::{AttendanceRecord, AttendanceSession},
    store::AttendanceStore,
};

/// An in-memory attendance store.
///
/// One mutex guards both tables, so every primitive is linearizable by
/// construction. Backs the test suite; also usable for embedded deployments
/// that don't need durability.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    sessions: Vec<AttendanceSession>,
    records: Vec<AttendanceRecord>,
}

impl MemoryAttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the sessions table, for invariant assertions in tests.
    pub fn sessions(&self) -> Vec<AttendanceSession> {
        self.inner.lock().unwrap().sessions.clone()
    }

    /// Snapshot of the records table.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.inner.lock().unwrap().records.clone()
    }
}

/// Token equality without an early exit on the first differing byte.
fn token_matches(candidate: &str, presented: &str) -> bool {
    candidate.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn create_session_deactivating_prior(
        &self,
        lesson_id: Uuid,
        token: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<AttendanceSession> {
        let mut tables = self.inner.lock().unwrap();

        for session in tables
            .sessions
            .iter_mut()
            .filter(|s| s.lesson_id == lesson_id)
        {
            session.active = false;
        }

        let session = AttendanceSession {
            id: Uuid::new_v4(),
            lesson_id,
            token,
            issued_at,
            expires_at,
            active: true,
        };
        tables.sessions.push(session.clone());

        Ok(session)
    }

    async fn find_active_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AttendanceSession>> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.active && token_matches(&s.token, token))
            .cloned())
    }

    async fn insert_attendance_if_absent(
        &self,
        lesson_id: Uuid,
        student_id: Uuid,
        session_id: Uuid,
        recorded_at: DateTime<Utc>,
        origin_address: String,
    ) -> Result<Option<AttendanceRecord>> {
        let mut tables = self.inner.lock().unwrap();

        let exists = tables
            .records
            .iter()
            .any(|r| r.lesson_id == lesson_id && r.student_id == student_id);
        if exists {
            return Ok(None);
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            lesson_id,
            student_id,
            session_id,
            recorded_at,
            origin_address,
        };
        tables.records.push(record.clone());

        Ok(Some(record))
    }

    async fn list_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let tables = self.inner.lock().unwrap();
        let mut records: Vec<AttendanceRecord> = tables
            .records
            .iter()
            .filter(|r| r.lesson_id == lesson_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.inner.lock().unwrap();
        let mut touched = 0;
        for session in tables
            .sessions
            .iter_mut()
            .filter(|s| s.active && s.expires_at <= now)
        {
            session.active = false;
            touched += 1;
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn reissue_deactivates_prior_session() {
        let store = MemoryAttendanceStore::new();
        let lesson = Uuid::new_v4();

        let first = store
            .create_session_deactivating_prior(lesson, "tok-1".into(), t0(), t0() + Duration::minutes(15))
            .await
            .unwrap();
        let second = store
            .create_session_deactivating_prior(lesson, "tok-2".into(), t0(), t0() + Duration::minutes(15))
            .await
            .unwrap();

        let active: Vec<_> = store.sessions().into_iter().filter(|s| s.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert!(store
            .find_active_session_by_token(&first.token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sweep_deactivates_only_expired_sessions() {
        let store = MemoryAttendanceStore::new();
        let expired_lesson = Uuid::new_v4();
        let current_lesson = Uuid::new_v4();

        store
            .create_session_deactivating_prior(
                expired_lesson,
                "tok-old".into(),
                t0(),
                t0() + Duration::minutes(15),
            )
            .await
            .unwrap();
        store
            .create_session_deactivating_prior(
                current_lesson,
                "tok-new".into(),
                t0() + Duration::minutes(20),
                t0() + Duration::minutes(35),
            )
            .await
            .unwrap();

        let touched = store
            .deactivate_expired(t0() + Duration::minutes(20))
            .await
            .unwrap();

        assert_eq!(touched, 1);
        let active: Vec<_> = store.sessions().into_iter().filter(|s| s.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].lesson_id, current_lesson);
    }

    #[tokio::test]
    async fn conditional_insert_reports_conflict() {
        let store = MemoryAttendanceStore::new();
        let lesson = Uuid::new_v4();
        let student = Uuid::new_v4();
        let session = Uuid::new_v4();

        let first = store
            .insert_attendance_if_absent(lesson, student, session, t0(), "10.0.0.1".into())
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .insert_attendance_if_absent(lesson, student, session, t0(), "10.0.0.1".into())
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.records().len(), 1);
    }
}
