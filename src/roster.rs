use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::error::Result;

/// Read-only view of the class-management collaborator's data.
///
/// Lessons and enrollment are owned elsewhere; this service only asks who
/// owns a lesson and whether a student is enrolled in the class it belongs
/// to.
#[async_trait]
pub trait Roster: Send + Sync {
    /// Returns the owning teacher of `lesson_id`, or `None` if the lesson
    /// does not exist.
    async fn lesson_owner(&self, lesson_id: Uuid) -> Result<Option<Uuid>>;

    /// Whether `student_id` is enrolled in the class owning `lesson_id`.
    async fn is_enrolled(&self, lesson_id: Uuid, student_id: Uuid) -> Result<bool>;
}

/// Roster backed by the collaborator's PostgreSQL tables.
#[derive(Clone)]
pub struct PgRoster {
    pool: Pool,
}

impl PgRoster {
    /// Creates a new roster view over the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Roster for PgRoster {
    async fn lesson_owner(&self, lesson_id: Uuid) -> Result<Option<Uuid>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT teacher_id
                FROM lessons
                WHERE id = $1
                "#,
                &[&lesson_id],
            )
            .await?;
        Ok(row.map(|r| r.get("teacher_id")))
    }

    async fn is_enrolled(&self, lesson_id: Uuid, student_id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM enrollments e
                    JOIN lessons l ON l.class_id = e.class_id
                    WHERE l.id = $1 AND e.student_id = $2
                ) AS enrolled
                "#,
                &[&lesson_id, &student_id],
            )
            .await?;
        Ok(row.get("enrolled"))
    }
}

/// An in-memory roster for tests.
#[derive(Default)]
pub struct MemoryRoster {
    inner: Mutex<Classes>,
}

#[derive(Default)]
struct Classes {
    /// lesson -> owning teacher
    lessons: HashMap<Uuid, Uuid>,
    /// (lesson, student) pairs
    enrollment: HashSet<(Uuid, Uuid)>,
}

impl MemoryRoster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lesson with its owning teacher.
    pub fn add_lesson(&self, lesson_id: Uuid, teacher_id: Uuid) {
        self.inner.lock().unwrap().lessons.insert(lesson_id, teacher_id);
    }

    /// Enrolls a student for a lesson's class.
    pub fn enroll(&self, lesson_id: Uuid, student_id: Uuid) {
        self.inner
            .lock()
            .unwrap()
            .enrollment
            .insert((lesson_id, student_id));
    }
}

#[async_trait]
impl Roster for MemoryRoster {
    async fn lesson_owner(&self, lesson_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.inner.lock().unwrap().lessons.get(&lesson_id).copied())
    }

    async fn is_enrolled(&self, lesson_id: Uuid, student_id: Uuid) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .enrollment
            .contains(&(lesson_id, student_id)))
    }
}
