//! # Redis
//!
//! Document store on top of Redis.
//!
//! ## Implementation
//!
//! - Redis hash per collection: 1 big key, then email-document pairs, documents stored as JSON
//! - `HSETNX` on insert gives the unique email constraint for free
//! - Array-field index: one list per course code holding enrolled student emails, in insertion order
//! - Attendance lives outside the student document:
//!   - one list of course codes per student, keeping the order entries were created
//!   - one list of JSON records per (student, course code)
//! - Inserts and appends run as Lua scripts, Redis executes each script atomically, so two
//!   concurrent marks for the same student both land
//!
//! ## Keys
//!
//! ```text
//! {prefix}:teachers                              hash   email -> teacher JSON
//! {prefix}:students                              hash   email -> student JSON (no attendance)
//! {prefix}:course:{code}:students                list   student emails
//! {prefix}:student:{email}:attendance            list   course codes
//! {prefix}:student:{email}:attendance:{code}     list   record JSON
//! ```
use std::{collections::BTreeSet, time::Duration};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::debug;

use super::{DocumentStore, STUDENTS, StoreError, TEACHERS};
use crate::models::{AttendanceRecord, CourseAttendance, Student, Teacher};

const INSERT_STUDENT: &str = r#"
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 0 then
    return 0
end
for i = 2, #KEYS do
    redis.call('RPUSH', KEYS[i], ARGV[1])
end
return 1
"#;

const APPEND_ATTENDANCE: &str = r#"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 0 then
    return 0
end
if redis.call('LPOS', KEYS[2], ARGV[2]) == false then
    redis.call('RPUSH', KEYS[2], ARGV[2])
end
redis.call('RPUSH', KEYS[3], ARGV[3])
return 1
"#;

pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
    insert_student: Script,
    append_attendance: Script,
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

/// Escapes `%` and `:` so user text can never form a key separator.
fn key_segment(raw: &str) -> String {
    raw.replace('%', "%25").replace(':', "%3A")
}

impl RedisStore {
    pub async fn connect(redis_url: &str, prefix: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_redis(redis_url).await?, prefix))
    }

    pub fn new(connection: ConnectionManager, prefix: &str) -> Self {
        Self {
            connection,
            prefix: prefix.to_string(),
            insert_student: Script::new(INSERT_STUDENT),
            append_attendance: Script::new(APPEND_ATTENDANCE),
        }
    }

    fn collection_key(&self, collection: &str) -> String {
        format!("{}:{collection}", self.prefix)
    }

    fn course_key(&self, course_code: &str) -> String {
        format!("{}:course:{}:students", self.prefix, key_segment(course_code))
    }

    fn attendance_key(&self, email: &str) -> String {
        format!("{}:student:{}:attendance", self.prefix, key_segment(email))
    }

    fn records_key(&self, email: &str, course_code: &str) -> String {
        format!(
            "{}:student:{}:attendance:{}",
            self.prefix,
            key_segment(email),
            key_segment(course_code)
        )
    }

    async fn load_attendance(&self, email: &str) -> Result<Vec<CourseAttendance>, StoreError> {
        let mut conn = self.connection.clone();

        let codes: Vec<String> = conn.lrange(self.attendance_key(email), 0, -1).await?;
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for code in &codes {
            pipe.lrange(self.records_key(email, code), 0, -1);
        }
        let raw_records: Vec<Vec<String>> = pipe.query_async(&mut conn).await?;

        codes
            .into_iter()
            .zip(raw_records)
            .map(|(course_code, raw)| {
                let records = raw
                    .iter()
                    .map(|record| serde_json::from_str(record))
                    .collect::<Result<Vec<AttendanceRecord>, _>>()?;

                Ok::<_, StoreError>(CourseAttendance {
                    course_code,
                    records,
                })
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError> {
        teacher.validate()?;

        let mut conn = self.connection.clone();
        let created: bool = conn
            .hset_nx(
                self.collection_key(TEACHERS),
                &teacher.email,
                serde_json::to_string(teacher)?,
            )
            .await?;

        if !created {
            return Err(StoreError::Duplicate {
                collection: TEACHERS,
                email: teacher.email.clone(),
            });
        }

        Ok(())
    }

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError> {
        student.validate()?;

        let profile = Student {
            attendance: Vec::new(),
            ..student.clone()
        };

        let mut invocation = self.insert_student.key(self.collection_key(STUDENTS));
        let codes: BTreeSet<&str> = student.courses.iter().map(|c| c.code.as_str()).collect();
        for code in codes {
            invocation.key(self.course_key(code));
        }
        invocation
            .arg(&student.email)
            .arg(serde_json::to_string(&profile)?);

        let mut conn = self.connection.clone();
        let created: i64 = invocation.invoke_async(&mut conn).await?;

        if created == 0 {
            return Err(StoreError::Duplicate {
                collection: STUDENTS,
                email: student.email.clone(),
            });
        }

        for entry in &student.attendance {
            for record in &entry.records {
                self.append_attendance(&student.email, &entry.course_code, record)
                    .await?;
            }
        }

        Ok(())
    }

    async fn find_teacher(&self, email: &str) -> Result<Option<Teacher>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.hget(self.collection_key(TEACHERS), email).await?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn find_student(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.hget(self.collection_key(STUDENTS), email).await?;

        let Some(json) = raw else {
            return Ok(None);
        };

        let mut student: Student = serde_json::from_str(&json)?;
        student.attendance = self.load_attendance(email).await?;

        Ok(Some(student))
    }

    async fn emails_in_course(&self, course_code: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let emails: Vec<String> = conn.lrange(self.course_key(course_code), 0, -1).await?;

        #[cfg(feature = "verbose")]
        debug!("{} enrolled in {course_code}", emails.len());

        Ok(emails)
    }

    async fn students_in_course(&self, course_code: &str) -> Result<Vec<Student>, StoreError> {
        let emails = self.emails_in_course(course_code).await?;

        let mut students = Vec::with_capacity(emails.len());
        for email in &emails {
            if let Some(student) = self.find_student(email).await? {
                students.push(student);
            }
        }

        Ok(students)
    }

    async fn append_attendance(
        &self,
        email: &str,
        course_code: &str,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let appended: i64 = self
            .append_attendance
            .key(self.collection_key(STUDENTS))
            .key(self.attendance_key(email))
            .key(self.records_key(email, course_code))
            .arg(email)
            .arg(course_code)
            .arg(serde_json::to_string(record)?)
            .invoke_async(&mut conn)
            .await?;

        if appended == 0 {
            debug!("Skipped attendance for unknown student {email}");
        }

        Ok(())
    }
}
