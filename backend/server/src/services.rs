//! # Services
//!
//! What the routes call into. Both take the store handle explicitly.
//!
//! ## Verification
//! - Lookup-and-branch, NOT authentication: anyone who knows a teacher's email and course can pass
//! - Teacher found by email, then one offered course must match branch, name and code together
//!
//! ## Marking
//! - Students selected by course code only, `branch` is carried for logging and never filters
//! - One timestamp per request, shared by every student it touches
//! - Each append is atomic in the store, students are processed one after another
//! - A failure aborts the request, students already handled keep their record
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::{
    database::{DocumentStore, StoreError},
    models::AttendanceRecord,
};

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyForm {
    pub email: String,
    pub branch: String,
    pub course_name: String,
    pub course_code: String,
}

#[derive(Debug, Default, Clone)]
pub struct MarkForm {
    pub branch: String,
    pub course_code: String,
}

pub async fn verify_teacher(store: &dyn DocumentStore, form: &VerifyForm) -> Result<bool, StoreError> {
    let verified = store
        .find_teacher(&form.email)
        .await?
        .is_some_and(|teacher| teacher.teaches(&form.branch, &form.course_name, &form.course_code));

    info!(
        "Verification for {} on {} ({}): {verified}",
        form.email, form.course_code, form.branch
    );

    Ok(verified)
}

pub async fn mark_attendance(store: &dyn DocumentStore, form: &MarkForm) -> Result<usize, StoreError> {
    mark_attendance_at(store, form, Utc::now()).await
}

pub async fn mark_attendance_at(
    store: &dyn DocumentStore,
    form: &MarkForm,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let emails = store.emails_in_course(&form.course_code).await?;
    let record = AttendanceRecord::present(now);

    for email in &emails {
        store
            .append_attendance(email, &form.course_code, &record)
            .await?;
    }

    info!(
        "Attendance successfully marked for {} students in {} ({})",
        emails.len(),
        form.course_code,
        form.branch
    );

    Ok(emails.len())
}
