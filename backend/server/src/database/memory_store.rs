use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{DocumentStore, STUDENTS, StoreError, TEACHERS};
use crate::models::{AttendanceRecord, Student, Teacher};

/// Process-local store, collections kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    teachers: Mutex<Vec<Teacher>>,
    students: Mutex<Vec<Student>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError> {
        teacher.validate()?;

        let mut teachers = self.teachers.lock().await;
        if teachers.iter().any(|t| t.email == teacher.email) {
            return Err(StoreError::Duplicate {
                collection: TEACHERS,
                email: teacher.email.clone(),
            });
        }

        teachers.push(teacher.clone());
        Ok(())
    }

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError> {
        student.validate()?;

        let mut students = self.students.lock().await;
        if students.iter().any(|s| s.email == student.email) {
            return Err(StoreError::Duplicate {
                collection: STUDENTS,
                email: student.email.clone(),
            });
        }

        students.push(student.clone());
        Ok(())
    }

    async fn find_teacher(&self, email: &str) -> Result<Option<Teacher>, StoreError> {
        let teachers = self.teachers.lock().await;

        Ok(teachers.iter().find(|t| t.email == email).cloned())
    }

    async fn find_student(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let students = self.students.lock().await;

        Ok(students.iter().find(|s| s.email == email).cloned())
    }

    async fn emails_in_course(&self, course_code: &str) -> Result<Vec<String>, StoreError> {
        let students = self.students.lock().await;

        Ok(students
            .iter()
            .filter(|s| s.is_enrolled_in(course_code))
            .map(|s| s.email.clone())
            .collect())
    }

    async fn students_in_course(&self, course_code: &str) -> Result<Vec<Student>, StoreError> {
        let students = self.students.lock().await;

        Ok(students
            .iter()
            .filter(|s| s.is_enrolled_in(course_code))
            .cloned()
            .collect())
    }

    async fn append_attendance(
        &self,
        email: &str,
        course_code: &str,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError> {
        let mut students = self.students.lock().await;

        if let Some(student) = students.iter_mut().find(|s| s.email == email) {
            student.record_attendance(course_code, record.clone());
        }

        Ok(())
    }
}
