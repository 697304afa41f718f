//! Integration tests for the REST data client against a mock server.

use noteshare_core::{
    Category, CategoryFilter, Error, FilterState, NewNote, ServiceConfig,
};
use noteshare_remote::{DataBackend, RestDataBackend};
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ServiceConfig {
    ServiceConfig {
        base_url: server.uri(),
        anon_key: "anon-key".to_string(),
        site_url: None,
        max_upload_mb: 50,
        bucket: "notes".to_string(),
    }
}

fn note_row(id: &str, title: &str, category: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "desc",
        "author": "someone",
        "category": category,
        "file_path": "u/2026/03/1_doc.pdf",
        "file_size": 1048576,
        "public_url": "https://cdn.example/notes/u/2026/03/1_doc.pdf",
        "created_at": "2026-03-01T12:00:00Z",
        "owner": null
    })
}

#[tokio::test]
async fn test_list_notes_unfiltered_orders_and_caps() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "200"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            note_row("1e2d3c4b-0000-0000-0000-000000000001", "Newest", "math"),
            note_row("1e2d3c4b-0000-0000-0000-000000000002", "Older", "cs"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let notes = backend
        .list_notes(None, &FilterState::default(), 200)
        .await
        .unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "Newest");
    assert_eq!(notes[0].category, Category::Math);
}

#[tokio::test]
async fn test_list_notes_category_filter_uses_eq() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .and(query_param("category", "eq.math"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let filter = FilterState::new("", CategoryFilter::Only(Category::Math));
    backend.list_notes(None, &filter, 200).await.unwrap();
}

#[tokio::test]
async fn test_list_notes_query_uses_ilike_disjunction() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .and(query_param(
            "or",
            "(title.ilike.*linear*,description.ilike.*linear*,author.ilike.*linear*)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([note_row(
            "1e2d3c4b-0000-0000-0000-000000000001",
            "Linear Algebra Notes",
            "math"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let filter = FilterState::new("linear", CategoryFilter::All);
    let notes = backend.list_notes(None, &filter, 200).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Linear Algebra Notes");
}

#[tokio::test]
async fn test_list_notes_sends_user_token_when_present() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .and(header("Authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    backend
        .list_notes(Some("user-jwt"), &FilterState::default(), 200)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_insert_note_returns_representation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notes"))
        .and(header("Prefer", "return=representation"))
        .and(header("Authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([note_row(
            "1e2d3c4b-0000-0000-0000-000000000003",
            "Algebra",
            "math"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let new_note = NewNote {
        title: "Algebra".into(),
        description: String::new(),
        author: String::new(),
        category: Category::Math,
        file_path: "u/2026/03/1_algebra.pdf".into(),
        file_size: 1048576,
        public_url: None,
    };
    let note = backend.insert_note("user-jwt", &new_note).await.unwrap();
    assert_eq!(note.title, "Algebra");
    assert_eq!(note.category, Category::Math);
}

#[tokio::test]
async fn test_insert_rls_rejection_maps_to_row_policy() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notes"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "message": "new row violates row-level security policy for table \"notes\""
        })))
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let new_note = NewNote {
        title: "Algebra".into(),
        description: String::new(),
        author: String::new(),
        category: Category::Math,
        file_path: "p".into(),
        file_size: 1,
        public_url: None,
    };
    let err = backend.insert_note("user-jwt", &new_note).await.unwrap_err();
    assert!(matches!(err, Error::RowPolicy(_)), "{:?}", err);
}

#[tokio::test]
async fn test_fetch_note_by_id() {
    let server = MockServer::start().await;
    let id = "1e2d3c4b-0000-0000-0000-000000000004";

    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([note_row(id, "Single", "physics")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let note = backend
        .fetch_note(None, id.parse::<Uuid>().unwrap())
        .await
        .unwrap();
    assert_eq!(note.title, "Single");
}

#[tokio::test]
async fn test_fetch_note_missing_row_is_note_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let backend = RestDataBackend::new(&config_for(&server));
    let id = Uuid::new_v4();
    let err = backend.fetch_note(None, id).await.unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(got) if got == id));
}
