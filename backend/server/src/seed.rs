//! Fixed mock data behind `GET /seed`.
//!
//! Not idempotent: the store refuses the second insert of the same email, so a repeat call fails
//! on the teacher before touching any student.
use tracing::info;

use crate::{
    database::{DocumentStore, StoreError},
    models::{Course, Student, Teacher, TeacherCourse},
};

const IOT_NAME: &str = "Internet of Things (IoT) and Machine Learning";
const IOT_CODE: &str = "ME102";

pub fn seed_teacher() -> Teacher {
    Teacher {
        name: "Dr. Alice Johnson".to_string(),
        email: "alice.johnson@university.com".to_string(),
        phone: "9876543210".to_string(),
        courses: vec![TeacherCourse {
            name: IOT_NAME.to_string(),
            code: IOT_CODE.to_string(),
            branch: "Electronics".to_string(),
        }],
        attendance: Vec::new(),
        notices: vec![
            "First notice for Dr. Alice".to_string(),
            "Reminder: IoT workshop".to_string(),
        ],
    }
}

pub fn seed_students() -> Vec<Student> {
    [
        ("Ayush Kumar", "kumarayush0926@gmail.com", "9876543210", "Holiday on 25th Dec for IoT course."),
        ("Akhil", "akhil@example.com", "9876543211", "Semester exams starting from 10th Jan."),
        ("Utkarsh", "vermautkarsh653@gmail.com", "9876543212", "Important: Submit project by 15th Dec."),
        ("Shaad", "shaad@example.com", "9876543213", "Class postponed to 26th Dec."),
    ]
    .into_iter()
    .map(|(name, email, phone, notice)| Student {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        semester: "6".to_string(),
        courses: vec![Course {
            name: IOT_NAME.to_string(),
            code: IOT_CODE.to_string(),
        }],
        attendance: Vec::new(),
        notices: vec![notice.to_string()],
    })
    .collect()
}

pub async fn seed(store: &dyn DocumentStore) -> Result<(), StoreError> {
    store.insert_teacher(&seed_teacher()).await?;

    let students = seed_students();
    for student in &students {
        store.insert_student(student).await?;
    }

    info!("Seeded 1 teacher and {} students", students.len());
    Ok(())
}
