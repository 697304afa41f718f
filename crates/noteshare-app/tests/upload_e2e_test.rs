//! End-to-end upload scenarios through the router.

use std::sync::Arc;

use noteshare_app::{build_router, AppState};
use noteshare_core::ServiceConfig;
use noteshare_remote::mock::{MockAuthBackend, MockDataBackend, MockStorageBackend};

fn config() -> ServiceConfig {
    ServiceConfig {
        base_url: "https://xyz.example.co".into(),
        anon_key: "anon-public-key-12345".into(),
        site_url: None,
        max_upload_mb: 50,
        bucket: "notes".into(),
    }
}

struct TestApp {
    base: String,
    client: reqwest::Client,
    storage: MockStorageBackend,
    data: MockDataBackend,
}

async fn spawn(storage: MockStorageBackend, data: MockDataBackend) -> TestApp {
    let auth = MockAuthBackend::new().with_user("a@example.com", "abcd1234");
    let state = AppState::new(
        config(),
        Arc::new(auth),
        Arc::new(storage.clone()),
        Arc::new(data.clone()),
        "http://localhost:3000".into(),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    TestApp {
        base: format!("http://{}", addr),
        client: reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap(),
        storage,
        data,
    }
}

async fn sign_in(app: &TestApp) {
    let response = app
        .client
        .post(format!("{}/login", app.base))
        .form(&[("email", "a@example.com"), ("password", "abcd1234")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
}

fn pdf_bytes(size: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4 ".to_vec();
    bytes.resize(size, b'a');
    bytes
}

fn upload_form(title: &str, category: &str, file_name: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("description", "Lecture notes".to_string())
        .text("author", "A. Student".to_string())
        .text("category", category.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name.to_string())
                .mime_str("application/pdf")
                .unwrap(),
        )
}

#[tokio::test]
async fn test_authenticated_upload_then_catalog_shows_it_first() {
    let app = spawn(MockStorageBackend::new(), MockDataBackend::new()).await;
    sign_in(&app).await;

    // Submit a valid 1 MiB PDF titled "Algebra" in category math.
    let response = app
        .client
        .post(format!("{}/upload", app.base))
        .multipart(upload_form("Algebra", "math", "algebra.pdf", pdf_bytes(1024 * 1024)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["note"]["title"], "Algebra");
    assert_eq!(body["note"]["category"], "math");
    assert!(body["message"].as_str().unwrap().contains("Upload complete"));

    // The storage object exists under the user-scoped key.
    assert_eq!(app.storage.object_count(), 1);
    let file_path = app.storage.calls()[0].detail.clone();
    assert!(app.storage.contains(&file_path));

    // The metadata row was inserted.
    assert_eq!(app.data.row_count(), 1);

    // The refreshed catalog shows the new entry first.
    let catalog: serde_json::Value = app
        .client
        .get(format!("{}/", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let notes = catalog["notes"].as_array().unwrap();
    assert_eq!(notes[0]["title"], "Algebra");
    assert_eq!(catalog["refresh_epoch"], 1);
}

#[tokio::test]
async fn test_upload_without_session_is_rejected_before_storage() {
    let app = spawn(MockStorageBackend::new(), MockDataBackend::new()).await;
    // no sign-in

    let response = app
        .client
        .post(format!("{}/upload", app.base))
        .multipart(upload_form("Algebra", "math", "algebra.pdf", pdf_bytes(1024)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["phase"], "authorizing");
    assert!(body["error"].as_str().unwrap().contains("sign in"));
    assert_eq!(app.storage.upload_call_count(), 0, "no storage write");
}

#[tokio::test]
async fn test_non_pdf_upload_is_rejected_without_network() {
    let app = spawn(MockStorageBackend::new(), MockDataBackend::new()).await;
    sign_in(&app).await;

    let form = reqwest::multipart::Form::new()
        .text("title", "Notes".to_string())
        .text("category", "other".to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"hello".to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        );

    let response = app
        .client
        .post(format!("{}/upload", app.base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["phase"], "validating");
    assert!(body["error"].as_str().unwrap().contains("Only PDF files"));
    assert!(app.storage.calls().is_empty());
    assert!(app.data.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_reports_overage() {
    let app = spawn(MockStorageBackend::new(), MockDataBackend::new()).await;
    sign_in(&app).await;

    let response = app
        .client
        .post(format!("{}/upload", app.base))
        .multipart(upload_form(
            "Big",
            "other",
            "big.pdf",
            pdf_bytes(52 * 1024 * 1024),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["error"].as_str().unwrap().contains("over by 2.00 MB"),
        "{}",
        body["error"]
    );
    assert_eq!(app.storage.upload_call_count(), 0);
}

#[tokio::test]
async fn test_private_bucket_upload_succeeds_with_warning() {
    let app = spawn(
        MockStorageBackend::new().with_private_bucket(),
        MockDataBackend::new(),
    )
    .await;
    sign_in(&app).await;

    let response = app
        .client
        .post(format!("{}/upload", app.base))
        .multipart(upload_form("Algebra", "math", "algebra.pdf", pdf_bytes(1024)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["warning"].as_str().unwrap().contains("not public"));
    assert_eq!(app.data.row_count(), 1);
}

#[tokio::test]
async fn test_failed_insert_cleans_up_storage_object() {
    let app = spawn(
        MockStorageBackend::new(),
        MockDataBackend::new().with_insert_failure("new row violates row-level security policy"),
    )
    .await;
    sign_in(&app).await;

    let response = app
        .client
        .post(format!("{}/upload", app.base))
        .multipart(upload_form("Algebra", "math", "algebra.pdf", pdf_bytes(1024)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["phase"], "inserting");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("row-level security"));
    assert_eq!(app.storage.object_count(), 0, "orphaned object removed");
}

#[tokio::test]
async fn test_upload_refresh_signal_invalidates_catalog_cache() {
    let app = spawn(MockStorageBackend::new(), MockDataBackend::new()).await;
    sign_in(&app).await;

    // Prime the catalog cache at epoch 0.
    let catalog: serde_json::Value = app
        .client
        .get(format!("{}/", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog["notes"].as_array().unwrap().len(), 0);
    assert_eq!(catalog["refresh_epoch"], 0);

    app.client
        .post(format!("{}/upload", app.base))
        .multipart(upload_form("Algebra", "math", "algebra.pdf", pdf_bytes(1024)))
        .send()
        .await
        .unwrap();

    // The bumped epoch forces a refetch; the new note appears.
    let catalog: serde_json::Value = app
        .client
        .get(format!("{}/", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog["refresh_epoch"], 1);
    assert_eq!(catalog["notes"].as_array().unwrap().len(), 1);
}
