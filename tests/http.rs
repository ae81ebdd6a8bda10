use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct HabitCardView {
    id: u64,
    title: String,
    completed_dates: Vec<String>,
    completed_today: bool,
}

#[derive(Debug, Deserialize)]
struct HabitsResponse {
    habits: Vec<HabitCardView>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Mutation {
    op: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct SelectionResponse {
    card: HabitCardView,
    mutations: Vec<Mutation>,
    selection: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habit_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client
            .get(format!("{base_url}/api/habits"))
            .header("x-user-id", "probe")
            .send()
            .await
        {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("APP_CACHE_TTL_SECS", "30")
        .env_remove("APP_DEFAULT_USER")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create(client: &Client, base: &str, user: &str, title: &str) -> HabitCardView {
    let response = client
        .post(format!("{base}/api/habits"))
        .header("x-user-id", user)
        .json(&serde_json::json!({ "title": title }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn list(client: &Client, base: &str, user: &str) -> Vec<HabitCardView> {
    let response: HabitsResponse = client
        .get(format!("{base}/api/habits"))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    response.habits
}

async fn select(
    client: &Client,
    base: &str,
    user: &str,
    id: u64,
    previous: &[&str],
    selected: &[&str],
) -> SelectionResponse {
    let response = client
        .post(format!("{base}/api/habits/{id}/selection"))
        .header("x-user-id", user)
        .json(&serde_json::json!({ "previous": previous, "selected": selected }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_list_is_scoped_to_user() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let mine = create(&client, &server.base_url, "scope-alice", "Run").await;
    create(&client, &server.base_url, "scope-bob", "Read").await;

    let habits = list(&client, &server.base_url, "scope-alice").await;
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].id, mine.id);
    assert_eq!(habits[0].title, "Run");

    let response = client
        .get(format!("{}/api/habits/{}/completions", server.base_url, mine.id))
        .header("x-user-id", "scope-bob")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_deselection_issues_one_delete() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "deselect-user";

    let habit = create(&client, &server.base_url, user, "Stretch").await;
    select(&client, &server.base_url, user, habit.id, &[], &["2024-01-01"]).await;
    select(&client, &server.base_url, user, habit.id, &["2024-01-01"], &["2024-01-01", "2024-01-03"]).await;

    let response = select(
        &client,
        &server.base_url,
        user,
        habit.id,
        &["2024-01-01", "2024-01-03"],
        &["2024-01-03"],
    )
    .await;
    assert_eq!(
        response.mutations,
        vec![Mutation {
            op: "delete".into(),
            date: "2024-01-01".into()
        }]
    );
    assert_eq!(response.selection, vec!["2024-01-03".to_string()]);
    assert_eq!(response.card.completed_dates, vec!["2024-01-03".to_string()]);
}

#[tokio::test]
async fn http_selection_does_not_duplicate_insert() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "select-user";

    let habit = create(&client, &server.base_url, user, "Read").await;
    assert!(habit.completed_dates.is_empty());

    let first = select(&client, &server.base_url, user, habit.id, &[], &["2024-02-10"]).await;
    assert_eq!(first.mutations.len(), 1);
    assert_eq!(first.mutations[0].op, "insert");
    assert_eq!(first.mutations[0].date, "2024-02-10");

    let again = select(&client, &server.base_url, user, habit.id, &[], &["2024-02-10"]).await;
    assert!(again.mutations.is_empty());
    assert_eq!(again.card.completed_dates, vec!["2024-02-10".to_string()]);
}

#[tokio::test]
async fn http_toggle_today_twice_restores_state() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "toggle-user";

    let habit = create(&client, &server.base_url, user, "Meditate").await;
    assert!(!habit.completed_today);

    let url = format!("{}/api/habits/{}/toggle", server.base_url, habit.id);
    let done: HabitCardView = client
        .post(&url)
        .header("x-user-id", user)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(done.completed_today);
    assert_eq!(done.completed_dates.len(), 1);

    let undone: HabitCardView = client
        .post(&url)
        .header("x-user-id", user)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!undone.completed_today);
    assert!(undone.completed_dates.is_empty());
}

#[tokio::test]
async fn http_delete_removes_habit_from_list() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "delete-user";

    let habit = create(&client, &server.base_url, user, "Journal").await;
    select(&client, &server.base_url, user, habit.id, &[], &["2024-03-01"]).await;
    assert_eq!(list(&client, &server.base_url, user).await.len(), 1);

    let response = client
        .delete(format!("{}/api/habits/{}", server.base_url, habit.id))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(list(&client, &server.base_url, user).await.is_empty());
    let response = client
        .get(format!("{}/api/habits/{}/completions", server.base_url, habit.id))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_rejects_blank_title_and_missing_user() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/habits", server.base_url))
        .header("x-user-id", "blank-user")
        .json(&serde_json::json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.contains("title"));
    assert!(!body.retryable);

    let response = client
        .get(format!("{}/api/habits", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn http_index_renders_dashboard() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    create(&client, &server.base_url, "page-user", "Water plants").await;
    let body = client
        .get(format!("{}/", server.base_url))
        .header("x-user-id", "page-user")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Water plants"));
    assert!(body.contains("page-user"));
}

#[tokio::test]
async fn http_toggle_explicit_date_and_rejects_invalid_date() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "toggle-date-user";

    let habit = create(&client, &server.base_url, user, "Swim").await;
    let url = format!("{}/api/habits/{}/toggle", server.base_url, habit.id);

    let done: HabitCardView = client
        .post(&url)
        .header("x-user-id", user)
        .json(&serde_json::json!({ "date": "2024-01-02" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done.completed_dates, vec!["2024-01-02".to_string()]);

    let response = client
        .post(&url)
        .header("x-user-id", user)
        .json(&serde_json::json!({ "date": "2024-13-45" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.retryable);

    let response = client
        .post(&url)
        .header("x-user-id", user)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let card: HabitCardView = client
        .get(format!("{}/api/habits/{}/completions", server.base_url, habit.id))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(card.completed_dates, vec!["2024-01-02".to_string()]);
    assert!(!card.completed_today);
}

#[tokio::test]
async fn http_malformed_requests_get_json_errors() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let user = "malformed-user";

    let habit = create(&client, &server.base_url, user, "Cook").await;

    let response = client
        .post(format!("{}/api/habits/{}/selection", server.base_url, habit.id))
        .header("x-user-id", user)
        .json(&serde_json::json!({ "previous": [], "selected": ["nope"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());
    assert!(!body.retryable);

    let response = client
        .delete(format!("{}/api/habits/abc", server.base_url))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());

    assert_eq!(list(&client, &server.base_url, user).await.len(), 1);
    let card = &list(&client, &server.base_url, user).await[0];
    assert!(card.completed_dates.is_empty());
}

#[tokio::test]
async fn http_index_rejects_blank_user_header() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/", server.base_url))
        .header("x-user-id", "   ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.contains("x-user-id"));

    let response = client.get(format!("{}/", server.base_url)).send().await.unwrap();
    assert!(response.status().is_success());
}
