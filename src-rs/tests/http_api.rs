use std::net::TcpListener;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use task_tracker_rs::api::serve;
use task_tracker_rs::{ServerConfig, TaskServer, TaskStore};

async fn spawn_server(server: TaskServer) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = server.router();
    tokio::spawn(async move {
        serve(listener, app, std::future::pending())
            .await
            .expect("serve app");
    });
    format!("http://{}", addr)
}

async fn spawn_app() -> String {
    spawn_server(TaskServer::with_store(
        ServerConfig::default(),
        Arc::new(TaskStore::in_memory()),
    ))
    .await
}

fn task_form(title: &str, description: &str, deadline: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("description", description.to_string())
        .text("deadline", deadline.to_string())
}

async fn create(client: &reqwest::Client, base: &str, form: Form) -> Value {
    let resp = client
        .post(format!("{}/tasks", base))
        .multipart(form)
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("create body")
}

async fn list(client: &reqwest::Client, base: &str) -> Vec<Value> {
    let resp = client
        .get(format!("{}/tasks", base))
        .send()
        .await
        .expect("list request");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("list body")
}

#[tokio::test]
async fn create_returns_pending_task_with_fresh_id() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let a = create(&client, &base, task_form("A", "B", "2099-01-01")).await;
    let b = create(&client, &base, task_form("C", "D", "2099-01-02")).await;

    assert_eq!(a["status"], "PENDING");
    assert_eq!(a["title"], "A");
    assert_eq!(a["deadline"], "2099-01-01T00:00:00Z");
    assert!(a["linkedFile"].is_null());
    assert_ne!(a["_id"], b["_id"]);

    let tasks = list(&client, &base).await;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["_id"], a["_id"]);
    assert_eq!(tasks[1]["_id"], b["_id"]);
}

#[tokio::test]
async fn create_with_missing_field_is_rejected_and_not_persisted() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    for form in [
        Form::new().text("description", "B").text("deadline", "2099-01-01"),
        task_form("A", "", "2099-01-01"),
        Form::new().text("title", "A").text("description", "B"),
    ] {
        let resp = client
            .post(format!("{}/tasks", base))
            .multipart(form)
            .send()
            .await
            .expect("create request");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("error body");
        assert!(body["message"].as_str().unwrap().ends_with("required"));
    }

    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn create_rejects_non_multipart_body() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/tasks", base))
        .json(&json!({"title": "A", "description": "B", "deadline": "2099-01-01"}))
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn uploaded_file_is_listed_without_bytes_and_downloads_exactly() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let bytes: Vec<u8> = (0u8..=255).cycle().take(4096).collect();

    let part = Part::bytes(bytes.clone())
        .file_name("data sheet.pdf")
        .mime_str("application/pdf")
        .expect("mime");
    let created = create(
        &client,
        &base,
        task_form("A", "B", "2099-01-01").part("linkedFile", part),
    )
    .await;
    assert_eq!(created["linkedFile"]["originalName"], "data sheet.pdf");
    assert!(created["linkedFile"].get("data").is_none());

    let tasks = list(&client, &base).await;
    let file = &tasks[0]["linkedFile"];
    assert_eq!(file["contentType"], "application/pdf");
    assert_eq!(file["size"], 4096);
    assert!(file.get("data").is_none());

    let id = created["_id"].as_str().unwrap();
    let resp = client
        .get(format!("{}/tasks/{}/download", base, id))
        .send()
        .await
        .expect("download request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"data sheet.pdf\""
    );
    assert_eq!(resp.bytes().await.expect("download body").to_vec(), bytes);
}

#[tokio::test]
async fn second_file_part_is_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let form = task_form("A", "B", "2099-01-01")
        .part("linkedFile", Part::bytes(vec![1]).file_name("a.bin"))
        .part("attachment", Part::bytes(vec![2]).file_name("b.bin"));
    let resp = client
        .post(format!("{}/tasks", base))
        .multipart(form)
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn duplicate_linked_file_is_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let form = task_form("A", "B", "2099-01-01")
        .part("linkedFile", Part::bytes(vec![1]).file_name("a.bin"))
        .part("linkedFile", Part::bytes(vec![2]).file_name("b.bin"));
    let resp = client
        .post(format!("{}/tasks", base))
        .multipart(form)
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["message"], "only one linkedFile may be uploaded");
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn upload_over_size_limit_is_rejected() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let base = spawn_server(TaskServer::with_store(config, Arc::new(TaskStore::in_memory()))).await;
    let client = reqwest::Client::new();

    let form = task_form("A", "B", "2099-01-01").part(
        "linkedFile",
        Part::bytes(vec![7u8; 64 * 1024]).file_name("big.bin"),
    );
    let resp = client
        .post(format!("{}/tasks", base))
        .multipart(form)
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("malformed multipart body"));
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn download_without_file_is_not_found() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, task_form("A", "B", "2099-01-01")).await;
    let id = created["_id"].as_str().unwrap();

    for url in [
        format!("{}/tasks/{}/download", base, id),
        format!("{}/tasks/unknown/download", base),
    ] {
        let resp = client.get(url).send().await.expect("download request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.expect("error body");
        assert_eq!(body["message"], "File not found");
    }
}

#[tokio::test]
async fn status_update_is_partial_and_idempotent() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, task_form("A", "B", "2099-01-01")).await;
    let url = format!("{}/tasks/{}", base, created["_id"].as_str().unwrap());

    for _ in 0..2 {
        let resp = client
            .put(&url)
            .json(&json!({"status": "DONE"}))
            .send()
            .await
            .expect("update request");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("update body");
        assert_eq!(body["status"], "DONE");
        assert_eq!(body["title"], "A");
        assert_eq!(body["description"], "B");
        assert_eq!(body["deadline"], created["deadline"]);
    }

    let tasks = list(&client, &base).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["status"], "DONE");
}

#[tokio::test]
async fn empty_strings_do_not_clear_fields() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, task_form("A", "B", "2099-01-01")).await;
    let url = format!("{}/tasks/{}", base, created["_id"].as_str().unwrap());

    let resp = client
        .put(&url)
        .json(&json!({"title": "", "description": "", "deadline": "", "status": ""}))
        .send()
        .await
        .expect("update request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("update body");
    assert_eq!(body["title"], "A");
    assert_eq!(body["description"], "B");
    assert_eq!(body["deadline"], created["deadline"]);
    assert_eq!(body["status"], "PENDING");
}

#[tokio::test]
async fn update_accepts_form_encoded_bodies() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, task_form("A", "B", "2099-01-01")).await;
    let url = format!("{}/tasks/{}", base, created["_id"].as_str().unwrap());

    let resp = client
        .put(&url)
        .header("content-type", "application/x-www-form-urlencoded")
        .body("title=Renamed&deadline=2100-02-03")
        .send()
        .await
        .expect("update request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("update body");
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["description"], "B");
    assert_eq!(body["deadline"], "2100-02-03T00:00:00Z");
}

#[tokio::test]
async fn malformed_updates_are_bad_requests() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, task_form("A", "B", "2099-01-01")).await;
    let url = format!("{}/tasks/{}", base, created["_id"].as_str().unwrap());

    let bad_status = client
        .put(&url)
        .json(&json!({"status": "ARCHIVED"}))
        .send()
        .await
        .expect("update request");
    assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);

    let bad_deadline = client
        .put(&url)
        .json(&json!({"deadline": "whenever"}))
        .send()
        .await
        .expect("update request");
    assert_eq!(bad_deadline.status(), StatusCode::BAD_REQUEST);

    let bad_json = client
        .put(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("update request");
    assert_eq!(bad_json.status(), StatusCode::BAD_REQUEST);

    let plain_text = client
        .put(&url)
        .header("content-type", "text/plain")
        .body("status=DONE")
        .send()
        .await
        .expect("update request");
    assert_eq!(plain_text.status(), StatusCode::BAD_REQUEST);

    let tasks = list(&client, &base).await;
    assert_eq!(tasks[0]["status"], "PENDING");
}

#[tokio::test]
async fn update_on_unknown_id_is_not_found() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let resp = client
        .put(format!("{}/tasks/does-not-exist", base))
        .json(&json!({"status": "DONE"}))
        .send()
        .await
        .expect("update request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["message"], "Task not found");

    let bad_status = client
        .put(format!("{}/tasks/does-not-exist", base))
        .json(&json!({"status": "BOGUS"}))
        .send()
        .await
        .expect("update request");
    assert_eq!(bad_status.status(), StatusCode::NOT_FOUND);

    let plain_text = client
        .put(format!("{}/tasks/does-not-exist", base))
        .header("content-type", "text/plain")
        .body("status=DONE")
        .send()
        .await
        .expect("update request");
    assert_eq!(plain_text.status(), StatusCode::NOT_FOUND);
    let body: Value = plain_text.json().await.expect("error body");
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn delete_removes_task_permanently() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let missing = client
        .delete(format!("{}/tasks/nope", base))
        .send()
        .await
        .expect("delete request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let part = Part::bytes(b"payload".to_vec()).file_name("p.txt");
    let created = create(
        &client,
        &base,
        task_form("A", "B", "2099-01-01").part("linkedFile", part),
    )
    .await;
    let id = created["_id"].as_str().unwrap();

    let resp = client
        .delete(format!("{}/tasks/{}", base, id))
        .send()
        .await
        .expect("delete request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("delete body");
    assert_eq!(body["message"], "Task deleted");

    let again = client
        .delete(format!("{}/tasks/{}", base, id))
        .send()
        .await
        .expect("delete request");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let download = client
        .get(format!("{}/tasks/{}/download", base, id))
        .send()
        .await
        .expect("download request");
    assert_eq!(download.status(), StatusCode::NOT_FOUND);
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("health request")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["status"], "ok");

    let resp = client
        .get(format!("{}/nowhere", base))
        .send()
        .await
        .expect("fallback request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("fallback body");
    assert_eq!(body["message"], "Not found");
}

#[tokio::test]
async fn file_backed_server_keeps_tasks_across_restarts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig {
        data_file: Some(dir.path().join("tasks.json")),
        ..ServerConfig::default()
    };
    let client = reqwest::Client::new();

    let first = spawn_server(TaskServer::new(config.clone()).expect("open store")).await;
    let part = Part::bytes(b"kept".to_vec())
        .file_name("kept.txt")
        .mime_str("text/plain")
        .expect("mime");
    let created = create(
        &client,
        &first,
        task_form("A", "B", "2099-01-01").part("linkedFile", part),
    )
    .await;

    let second = spawn_server(TaskServer::new(config).expect("reopen store")).await;
    let tasks = list(&client, &second).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["_id"], created["_id"]);

    let bytes = client
        .get(format!("{}/tasks/{}/download", second, created["_id"].as_str().unwrap()))
        .send()
        .await
        .expect("download request")
        .bytes()
        .await
        .expect("download body");
    assert_eq!(bytes.as_ref(), b"kept");
}
