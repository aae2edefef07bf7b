use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::attendance::AttendanceRecord,
    models::caller::{Caller, Role},
    roster::Roster,
    store::AttendanceStore,
};

/// The teacher-facing attendance list for a lesson.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceList {
    pub attendance_count: usize,
    pub attendance_list: Vec<AttendanceRecord>,
}

/// Lists the attendance recorded for a lesson, newest scan first.
///
/// Restricted to the lesson's owning teacher, mirroring issuance.
pub async fn list_attendance(
    store: &dyn AttendanceStore,
    roster: &dyn Roster,
    lesson_id: Uuid,
    caller: &Caller,
) -> Result<AttendanceList> {
    if caller.role != Role::Teacher {
        return Err(AppError::Unauthorized);
    }

    let owner = roster
        .lesson_owner(lesson_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if owner != caller.user_id {
        return Err(AppError::Unauthorized);
    }

    let records = store.list_for_lesson(lesson_id).await?;

    Ok(AttendanceList {
        attendance_count: records.len(),
        attendance_list: records,
    })
}
