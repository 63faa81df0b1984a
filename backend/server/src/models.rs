//! # Documents
//!
//! The two collections kept by the store.
//!
//! ## Students
//! - Identified by **email**, unique per collection
//! - Enrolled courses: (name: **string**, code: **string**)
//! - Attendance: one entry per course code, created on first mark, holding every record ever appended
//!
//! ## Teachers
//! - Identified by **email**, unique per collection
//! - Offered courses: (name: **string**, code: **string**, branch: **string**)
//! - Attendance: marking log (branch, course code, date), never linked to outcomes
//!
//! ## Notes
//! - Records accumulate without dedup by date, marking twice on one day leaves two `Present` records
//! - Field names serialize in camelCase so the JSON matches the form field names (`courseCode`)
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::StoreError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Present,
    Absent,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub date: DateTime<Utc>,
    pub status: Status,
}

impl AttendanceRecord {
    pub fn present(date: DateTime<Utc>) -> Self {
        Self {
            date,
            status: Status::Present,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendance {
    pub course_code: String,
    #[serde(default)]
    pub records: Vec<AttendanceRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub name: String,
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub semester: String,
    pub courses: Vec<Course>,
    #[serde(default)]
    pub attendance: Vec<CourseAttendance>,
    #[serde(default)]
    pub notices: Vec<String>,
}

impl Student {
    pub fn is_enrolled_in(&self, course_code: &str) -> bool {
        self.courses.iter().any(|course| course.code == course_code)
    }

    pub fn attendance_for(&self, course_code: &str) -> Option<&CourseAttendance> {
        self.attendance
            .iter()
            .find(|entry| entry.course_code == course_code)
    }

    /// Appends to the entry for `course_code`, creating it at the end of the list if missing.
    pub fn record_attendance(&mut self, course_code: &str, record: AttendanceRecord) {
        let index = match self
            .attendance
            .iter()
            .position(|entry| entry.course_code == course_code)
        {
            Some(index) => index,
            None => {
                self.attendance.push(CourseAttendance {
                    course_code: course_code.to_string(),
                    records: Vec::new(),
                });
                self.attendance.len() - 1
            }
        };

        self.attendance[index].records.push(record);
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        required("student", "name", &self.name)?;
        required("student", "email", &self.email)?;
        required("student", "phone", &self.phone)?;
        required("student", "semester", &self.semester)?;

        for course in &self.courses {
            required("student", "courses.name", &course.name)?;
            required("student", "courses.code", &course.code)?;
        }

        for entry in &self.attendance {
            required("student", "attendance.courseCode", &entry.course_code)?;
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TeacherCourse {
    pub name: String,
    pub code: String,
    pub branch: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkingEvent {
    pub branch: String,
    pub course_code: String,
    pub date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub courses: Vec<TeacherCourse>,
    #[serde(default)]
    pub attendance: Vec<MarkingEvent>,
    #[serde(default)]
    pub notices: Vec<String>,
}

impl Teacher {
    /// True when a single offered course matches all three fields.
    pub fn teaches(&self, branch: &str, course_name: &str, course_code: &str) -> bool {
        self.courses.iter().any(|course| {
            course.branch == branch && course.name == course_name && course.code == course_code
        })
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        required("teacher", "name", &self.name)?;
        required("teacher", "email", &self.email)?;
        required("teacher", "phone", &self.phone)?;

        for course in &self.courses {
            required("teacher", "courses.name", &course.name)?;
            required("teacher", "courses.code", &course.code)?;
            required("teacher", "courses.branch", &course.branch)?;
        }

        for event in &self.attendance {
            required("teacher", "attendance.branch", &event.branch)?;
            required("teacher", "attendance.courseCode", &event.course_code)?;
        }

        Ok(())
    }
}

fn required(collection: &'static str, field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation { collection, field });
    }

    Ok(())
}
