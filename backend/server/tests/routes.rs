use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{CONTENT_TYPE, LOCATION},
    multipart,
    redirect::Policy,
};
use server::{
    build_router,
    config::{Config, DEFAULT_REJECT_URL},
    database::{DocumentStore, MemoryStore, StoreError},
    error::{MARK_FAILED, SEED_FAILED, VERIFY_FAILED},
    models::{AttendanceRecord, Status, Student, Teacher},
    routes::{MARKED, SEEDED},
    state::State,
};
use tokio::{net::TcpListener, task::JoinSet};

const IOT: &str = "Internet of Things (IoT) and Machine Learning";
const ALICE: &str = "alice.johnson@university.com";

/// Memory store whose teacher lookups always fail and whose appends fail from the `fail_on`th call.
struct FailingStore {
    inner: MemoryStore,
    appends: AtomicUsize,
    fail_on: usize,
}

impl FailingStore {
    fn new(fail_on: usize) -> Self {
        Self {
            inner: MemoryStore::default(),
            appends: AtomicUsize::new(0),
            fail_on,
        }
    }
}

fn unavailable() -> StoreError {
    StoreError::Connection(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError> {
        self.inner.insert_teacher(teacher).await
    }

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError> {
        self.inner.insert_student(student).await
    }

    async fn find_teacher(&self, _email: &str) -> Result<Option<Teacher>, StoreError> {
        Err(unavailable())
    }

    async fn find_student(&self, email: &str) -> Result<Option<Student>, StoreError> {
        self.inner.find_student(email).await
    }

    async fn emails_in_course(&self, course_code: &str) -> Result<Vec<String>, StoreError> {
        self.inner.emails_in_course(course_code).await
    }

    async fn students_in_course(&self, course_code: &str) -> Result<Vec<Student>, StoreError> {
        self.inner.students_in_course(course_code).await
    }

    async fn append_attendance(
        &self,
        email: &str,
        course_code: &str,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError> {
        if self.appends.fetch_add(1, Ordering::SeqCst) + 1 >= self.fail_on {
            return Err(unavailable());
        }
        self.inner.append_attendance(email, course_code, record).await
    }
}

async fn spawn_server() -> (SocketAddr, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let addr = spawn_with_store(store.clone()).await;

    (addr, store)
}

async fn spawn_with_store(store: Arc<dyn DocumentStore>) -> SocketAddr {
    let state = State::with_store(Config::default(), store);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("serve");
    });

    addr
}

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("client")
}

async fn seed(client: &Client, addr: SocketAddr) -> (StatusCode, String) {
    let res = client
        .get(format!("http://{addr}/seed"))
        .send()
        .await
        .expect("seed request");
    let status = res.status();
    (status, res.text().await.expect("seed body"))
}

async fn verify_multipart(
    client: &Client,
    addr: SocketAddr,
    fields: &[(&str, &str)],
) -> reqwest::Response {
    let form = fields.iter().fold(multipart::Form::new(), |form, (name, value)| {
        form.text(name.to_string(), value.to_string())
    });

    client
        .post(format!("http://{addr}/verify-teacher"))
        .multipart(form)
        .send()
        .await
        .expect("verify request")
}

async fn verify(client: &Client, addr: SocketAddr, branch: &str) -> reqwest::Response {
    client
        .post(format!("http://{addr}/verify-teacher"))
        .form(&[
            ("email", ALICE),
            ("branch", branch),
            ("courseName", IOT),
            ("courseCode", "ME102"),
        ])
        .send()
        .await
        .expect("verify request")
}

async fn mark(client: &Client, addr: SocketAddr, course_code: &str) -> (StatusCode, String) {
    let form = multipart::Form::new()
        .text("branch", "Electronics")
        .text("courseCode", course_code.to_string())
        .text("image", "data:image/png;base64,iVBORw0KGgo=");

    let res = client
        .post(format!("http://{addr}/mark-attendance"))
        .multipart(form)
        .send()
        .await
        .expect("mark request");
    let status = res.status();
    (status, res.text().await.expect("mark body"))
}

#[tokio::test]
async fn login_page_is_served() {
    let (addr, _) = spawn_server().await;

    let res = client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("login request");

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.expect("body").contains("loginForm"));
}

#[tokio::test]
async fn scripts_are_served_statically() {
    let (addr, _) = spawn_server().await;

    let res = client()
        .get(format!("http://{addr}/scripts/scripts.js"))
        .send()
        .await
        .expect("script request");

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.expect("body").contains("/mark-attendance"));
}

#[tokio::test]
async fn seed_succeeds_once_then_fails() {
    let (addr, _) = spawn_server().await;
    let client = client();

    assert_eq!(seed(&client, addr).await, (StatusCode::OK, SEEDED.to_string()));
    assert_eq!(
        seed(&client, addr).await,
        (StatusCode::INTERNAL_SERVER_ERROR, SEED_FAILED.to_string())
    );
}

#[tokio::test]
async fn verified_teacher_gets_capture_page() {
    let (addr, _) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    let res = verify(&client, addr, "Electronics").await;

    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()[CONTENT_TYPE].to_str().expect("content type");
    assert!(content_type.starts_with("text/html"));
    assert!(res.text().await.expect("body").contains("uploadForm"));
}

#[tokio::test]
async fn wrong_branch_is_redirected_away() {
    let (addr, _) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    let res = verify(&client, addr, "Mechanical").await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], DEFAULT_REJECT_URL);
}

#[tokio::test]
async fn missing_verify_fields_are_a_rejection() {
    let (addr, _) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    let res = client
        .post(format!("http://{addr}/verify-teacher"))
        .form(&[("email", ALICE)])
        .send()
        .await
        .expect("verify request");

    assert_eq!(res.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn marking_after_seed_updates_every_enrolled_student() {
    let (addr, store) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    assert_eq!(mark(&client, addr, "ME102").await, (StatusCode::OK, MARKED.to_string()));

    let today = chrono::Utc::now().date_naive();
    let students = store.students_in_course("ME102").await.expect("query");
    assert_eq!(students.len(), 4);
    for student in students {
        let records = &student.attendance_for("ME102").expect("entry").records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Present);
        assert_eq!(records[0].date.date_naive(), today);
    }
}

#[tokio::test]
async fn marking_twice_keeps_duplicate_records() {
    let (addr, store) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    mark(&client, addr, "ME102").await;
    mark(&client, addr, "ME102").await;

    let student = store
        .find_student("akhil@example.com")
        .await
        .expect("query")
        .expect("seeded student");
    assert_eq!(student.attendance.len(), 1);
    assert_eq!(student.attendance[0].records.len(), 2);
}

#[tokio::test]
async fn concurrent_marks_lose_no_records() {
    let (addr, store) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    let mut marks = JoinSet::new();
    for _ in 0..8 {
        let client = client.clone();
        marks.spawn(async move { mark(&client, addr, "ME102").await });
    }
    while let Some(result) = marks.join_next().await {
        assert_eq!(result.expect("task").0, StatusCode::OK);
    }

    for student in store.students_in_course("ME102").await.expect("query") {
        assert_eq!(student.attendance_for("ME102").expect("entry").records.len(), 8);
    }
}

#[tokio::test]
async fn malformed_multipart_is_rejected() {
    let (addr, _) = spawn_server().await;

    let res = client()
        .post(format!("http://{addr}/mark-attendance"))
        .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
        .body("--XYZ\r\nContent-Disposition: form-data; name=\"courseCode\"\r\n\r\nME1")
        .send()
        .await
        .expect("mark request");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_ne!(res.text().await.expect("body"), MARK_FAILED);
}

#[tokio::test]
async fn multipart_login_is_verified_like_urlencoded() {
    let (addr, _) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    let res = verify_multipart(
        &client,
        addr,
        &[
            ("email", ALICE),
            ("branch", "Electronics"),
            ("courseName", IOT),
            ("courseCode", "ME102"),
        ],
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.expect("body").contains("uploadForm"));
}

#[tokio::test]
async fn multipart_login_mismatch_is_redirected_away() {
    let (addr, _) = spawn_server().await;
    let client = client();
    seed(&client, addr).await;

    let wrong_branch = [
        ("email", ALICE),
        ("branch", "Mechanical"),
        ("courseName", IOT),
        ("courseCode", "ME102"),
    ];
    let missing_fields = [("email", ALICE)];
    for fields in [&wrong_branch[..], &missing_fields[..]] {
        let res = verify_multipart(&client, addr, fields).await;

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[LOCATION], DEFAULT_REJECT_URL);
    }
}

#[tokio::test]
async fn verify_store_failure_is_a_server_error() {
    let addr = spawn_with_store(Arc::new(FailingStore::new(1))).await;
    let client = client();
    assert_eq!(seed(&client, addr).await.0, StatusCode::OK);

    let res = verify(&client, addr, "Electronics").await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.expect("body"), VERIFY_FAILED);
}

#[tokio::test]
async fn mark_store_failure_is_a_server_error_after_partial_commit() {
    let store = Arc::new(FailingStore::new(3));
    let addr = spawn_with_store(store.clone()).await;
    let client = client();
    assert_eq!(seed(&client, addr).await.0, StatusCode::OK);

    assert_eq!(
        mark(&client, addr, "ME102").await,
        (StatusCode::INTERNAL_SERVER_ERROR, MARK_FAILED.to_string())
    );

    let mut counts = Vec::new();
    for email in store.emails_in_course("ME102").await.expect("query") {
        let student = store.find_student(&email).await.expect("query").expect("seeded student");
        counts.push(student.attendance_for("ME102").map_or(0, |a| a.records.len()));
    }
    assert_eq!(counts, [1, 1, 0, 0]);
}
