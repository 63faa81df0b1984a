//! # Document Store
//!
//! Persistence for the two collections.
//!
//! Core purpose is to keep student and teacher documents, look them up by email or by enrolled
//! course code, and append attendance records.
//!
//! ## Requirements
//!
//! - Email uniqueness per collection, enforced by the store on insert
//! - Required text fields validated before anything is written
//! - Appending an attendance record is one atomic operation per student, no read-modify-save
//! - Students come back in insertion order
//!
//! ## Backends
//!
//! - [`RedisStore`]: production backend, see [`redis_store`] for the key layout
//! - [`MemoryStore`]: process-local, selected with `STORE_URL=memory://`, used by the tests
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

use crate::{
    config::Config,
    models::{AttendanceRecord, Student, Teacher},
};

pub const MEMORY_URL: &str = "memory://";

pub const STUDENTS: &str = "students";
pub const TEACHERS: &str = "teachers";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate key: {collection} already contains {email}")]
    Duplicate {
        collection: &'static str,
        email: String,
    },

    #[error("Validation failed: {collection}.{field} is required")]
    Validation {
        collection: &'static str,
        field: &'static str,
    },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError>;

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError>;

    async fn find_teacher(&self, email: &str) -> Result<Option<Teacher>, StoreError>;

    async fn find_student(&self, email: &str) -> Result<Option<Student>, StoreError>;

    /// Emails of every student whose course list contains `course_code`, without loading documents.
    async fn emails_in_course(&self, course_code: &str) -> Result<Vec<String>, StoreError>;

    /// Every student whose course list contains `course_code`.
    async fn students_in_course(&self, course_code: &str) -> Result<Vec<Student>, StoreError>;

    /// Appends `record` under `course_code`, creating the course entry on first use.
    async fn append_attendance(
        &self,
        email: &str,
        course_code: &str,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError>;
}

pub async fn init_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    if config.store_url.starts_with(MEMORY_URL) {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::default()));
    }

    let store = RedisStore::connect(&config.store_url, &config.store_prefix).await?;
    info!("Connected to store");

    Ok(Arc::new(store))
}
