use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use rollcall::clock::ManualClock;
use rollcall::error::AppError;
use rollcall::models::caller::{Caller, Role};
use rollcall::roster::MemoryRoster;
use rollcall::services::attendance;
use rollcall::services::issuer::{self, IssuedSession, IssuerSettings};
use rollcall::services::verifier::{self, RecordedAttendance};
use rollcall::store::memory::MemoryAttendanceStore;

// Shared test context: one lesson owned by one teacher, one enrolled
// student, a pinned clock.
struct TestContext {
    store: MemoryAttendanceStore,
    roster: MemoryRoster,
    clock: ManualClock,
    teacher: Uuid,
    student: Uuid,
    lesson: Uuid,
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()
}

fn settings() -> IssuerSettings {
    IssuerSettings {
        window: Duration::minutes(15),
        token_bytes: 32,
    }
}

fn teacher_caller(user_id: Uuid) -> Caller {
    Caller {
        user_id,
        role: Role::Teacher,
    }
}

impl TestContext {
    fn new() -> Self {
        let roster = MemoryRoster::new();
        let teacher = Uuid::new_v4();
        let student = Uuid::new_v4();
        let lesson = Uuid::new_v4();
        roster.add_lesson(lesson, teacher);
        roster.enroll(lesson, student);

        Self {
            store: MemoryAttendanceStore::new(),
            roster,
            clock: ManualClock::new(t0()),
            teacher,
            student,
            lesson,
        }
    }

    async fn issue(&self) -> IssuedSession {
        issuer::issue_session(
            &self.store,
            &self.roster,
            &self.clock,
            settings(),
            self.lesson,
            &teacher_caller(self.teacher),
        )
        .await
        .expect("issuance failed")
    }

    async fn scan(&self, token: &str, student: Uuid) -> Result<RecordedAttendance, AppError> {
        verifier::record_attendance(
            &self.store,
            &self.roster,
            &self.clock,
            token,
            student,
            "10.0.0.1".to_string(),
        )
        .await
    }
}

#[tokio::test]
async fn scan_records_once_then_rejects_duplicate() {
    let ctx = TestContext::new();

    let issued = ctx.issue().await;
    assert_eq!(issued.expires_at, t0() + Duration::minutes(15));

    ctx.clock.advance(Duration::seconds(10));
    let recorded = ctx.scan(&issued.token, ctx.student).await.unwrap();
    assert_eq!(recorded.lesson_id, ctx.lesson);
    assert_eq!(recorded.recorded_at, t0() + Duration::seconds(10));

    ctx.clock.advance(Duration::seconds(1));
    match ctx.scan(&issued.token, ctx.student).await {
        Err(AppError::DuplicateAttendance) => {}
        other => panic!("expected DuplicateAttendance, got {:?}", other),
    }

    assert_eq!(ctx.store.records().len(), 1);
}

#[tokio::test]
async fn reissue_supersedes_displayed_token() {
    let ctx = TestContext::new();

    let first = ctx.issue().await;
    ctx.clock.advance(Duration::seconds(5));
    let second = ctx.issue().await;

    ctx.clock.advance(Duration::seconds(1));
    match ctx.scan(&first.token, ctx.student).await {
        Err(AppError::InvalidOrExpiredToken) => {}
        other => panic!("expected InvalidOrExpiredToken, got {:?}", other),
    }

    let recorded = ctx.scan(&second.token, ctx.student).await.unwrap();
    assert_eq!(recorded.lesson_id, ctx.lesson);
}

#[tokio::test]
async fn at_most_one_session_active_per_lesson() {
    let ctx = TestContext::new();

    let mut latest = None;
    for _ in 0..5 {
        latest = Some(ctx.issue().await);
        ctx.clock.advance(Duration::seconds(30));

        let active: Vec<_> = ctx
            .store
            .sessions()
            .into_iter()
            .filter(|s| s.active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, latest.as_ref().unwrap().token);
    }

    assert_eq!(ctx.store.sessions().len(), 5);
    assert!(latest.is_some());
}

#[tokio::test]
async fn unknown_token_is_indistinguishable_from_expired() {
    let ctx = TestContext::new();
    ctx.issue().await;

    // Well-formed but never issued.
    let bogus = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    match ctx.scan(bogus, ctx.student).await {
        Err(AppError::InvalidOrExpiredToken) => {}
        other => panic!("expected InvalidOrExpiredToken, got {:?}", other),
    }
}

#[tokio::test]
async fn expiry_boundary_is_exclusive() {
    let ctx = TestContext::new();
    let issued = ctx.issue().await;

    ctx.clock.set(issued.expires_at - Duration::milliseconds(1));
    assert!(ctx.scan(&issued.token, ctx.student).await.is_ok());

    let ctx = TestContext::new();
    let issued = ctx.issue().await;

    ctx.clock.set(issued.expires_at);
    match ctx.scan(&issued.token, ctx.student).await {
        Err(AppError::InvalidOrExpiredToken) => {}
        other => panic!("expected InvalidOrExpiredToken, got {:?}", other),
    }
}

#[tokio::test]
async fn expired_token_rejection_is_idempotent() {
    let ctx = TestContext::new();
    let issued = ctx.issue().await;

    ctx.clock.set(issued.expires_at + Duration::minutes(1));
    for _ in 0..3 {
        match ctx.scan(&issued.token, ctx.student).await {
            Err(AppError::InvalidOrExpiredToken) => {}
            other => panic!("expected InvalidOrExpiredToken, got {:?}", other),
        }
    }
    assert!(ctx.store.records().is_empty());
}

#[tokio::test]
async fn unenrolled_student_is_rejected_without_a_record() {
    let ctx = TestContext::new();
    let issued = ctx.issue().await;
    let outsider = Uuid::new_v4();

    ctx.clock.advance(Duration::seconds(10));
    match ctx.scan(&issued.token, outsider).await {
        Err(AppError::NotEnrolled) => {}
        other => panic!("expected NotEnrolled, got {:?}", other),
    }
    assert!(ctx.store.records().is_empty());
}

#[tokio::test]
async fn issuance_requires_the_owning_teacher() {
    let ctx = TestContext::new();

    // Student role.
    let result = issuer::issue_session(
        &ctx.store,
        &ctx.roster,
        &ctx.clock,
        settings(),
        ctx.lesson,
        &Caller {
            user_id: ctx.student,
            role: Role::Student,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));

    // Teacher, but not the owner.
    let result = issuer::issue_session(
        &ctx.store,
        &ctx.roster,
        &ctx.clock,
        settings(),
        ctx.lesson,
        &teacher_caller(Uuid::new_v4()),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));

    // Unknown lesson.
    let result = issuer::issue_session(
        &ctx.store,
        &ctx.roster,
        &ctx.clock,
        settings(),
        Uuid::new_v4(),
        &teacher_caller(ctx.teacher),
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound)));

    assert!(ctx.store.sessions().is_empty());
}

#[tokio::test]
async fn attendance_list_is_newest_first_and_owner_only() {
    let ctx = TestContext::new();
    let second_student = Uuid::new_v4();
    ctx.roster.enroll(ctx.lesson, second_student);

    let issued = ctx.issue().await;
    ctx.clock.advance(Duration::seconds(10));
    ctx.scan(&issued.token, ctx.student).await.unwrap();
    ctx.clock.advance(Duration::seconds(10));
    ctx.scan(&issued.token, second_student).await.unwrap();

    let list = attendance::list_attendance(
        &ctx.store,
        &ctx.roster,
        ctx.lesson,
        &teacher_caller(ctx.teacher),
    )
    .await
    .unwrap();

    assert_eq!(list.attendance_count, 2);
    assert_eq!(list.attendance_list[0].student_id, second_student);
    assert_eq!(list.attendance_list[1].student_id, ctx.student);

    let result = attendance::list_attendance(
        &ctx.store,
        &ctx.roster,
        ctx.lesson,
        &teacher_caller(Uuid::new_v4()),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));

    let result = attendance::list_attendance(
        &ctx.store,
        &ctx.roster,
        ctx.lesson,
        &Caller {
            user_id: ctx.student,
            role: Role::Student,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}
