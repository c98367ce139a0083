//! HttpImporter against a live HTTP server on a local port

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use pathway_common::models::{Question, QuestionType};
use pathway_import::{run_import, HttpImporter, ImportError, QuestionImporter};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const TOKEN: &str = "session-token";

/// Slug and body of every authorized request
#[derive(Clone, Default)]
struct Received {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Received {
    fn all(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn import(
    State(received): State<Received>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let bearer = format!("Bearer {}", TOKEN);
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(bearer.as_str()) {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired session");
    }
    received
        .requests
        .lock()
        .unwrap()
        .push((slug.clone(), body.clone()));

    let Some(questions) = body["questions"].as_array() else {
        return error(StatusCode::BAD_REQUEST, "Questions array is required");
    };

    match slug.as_str() {
        "locked" => error(
            StatusCode::FORBIDDEN,
            "You do not have permission to modify this assessment",
        ),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "intro" | "a/b" => Json(json!({
            "message": format!("Successfully imported {} question(s)", questions.len()),
            "assessment": {
                "id": "a1",
                "userId": "u1",
                "slug": slug,
                "title": "Intro",
                "questions": questions,
                "createdAt": "2024-03-09T08:30:00Z",
                "updatedAt": "2024-03-09T08:30:00Z"
            }
        }))
        .into_response(),
        _ => error(StatusCode::NOT_FOUND, "Assessment not found"),
    }
}

/// Serve the stub on an ephemeral port; returns its base URL
async fn spawn_server(received: Received) -> String {
    let app = Router::new()
        .route("/api/assessments/:slug/import", post(import))
        .with_state(received);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

fn question(id: i64, text: &str) -> Question {
    Question {
        id,
        kind: QuestionType::Rating,
        question: text.to_string(),
        voice_script: "Rate it".to_string(),
        options: Vec::new(),
        audio: None,
    }
}

// ========================================
// Responses
// ========================================

#[tokio::test]
async fn test_success_returns_server_message() {
    let received = Received::default();
    let base = spawn_server(received.clone()).await;
    let importer = HttpImporter::new(&base, TOKEN).unwrap();

    let message = importer
        .import_questions("intro", &[question(1, "One"), question(2, "Two")])
        .await
        .unwrap();
    assert_eq!(message, "Successfully imported 2 question(s)");

    let requests = received.all();
    assert_eq!(requests.len(), 1);
    let (slug, body) = &requests[0];
    assert_eq!(slug, "intro");
    assert_eq!(body["slug"], "intro");
    assert_eq!(
        body["questions"],
        json!([
            {"id": 1, "type": "rating", "question": "One", "voiceScript": "Rate it", "options": []},
            {"id": 2, "type": "rating", "question": "Two", "voiceScript": "Rate it", "options": []}
        ])
    );
}

#[tokio::test]
async fn test_forbidden_maps_to_remote_error() {
    let base = spawn_server(Received::default()).await;
    let importer = HttpImporter::new(&base, TOKEN).unwrap();

    let err = importer
        .import_questions("locked", &[question(1, "One")])
        .await
        .unwrap_err();

    assert!(err.is_forbidden());
    match err {
        ImportError::Remote { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "You do not have permission to modify this assessment");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_slug_maps_to_not_found() {
    let base = spawn_server(Received::default()).await;
    let importer = HttpImporter::new(&base, TOKEN).unwrap();

    let err = importer
        .import_questions("missing", &[question(1, "One")])
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Server returned 404: Assessment not found");
}

#[tokio::test]
async fn test_non_json_error_uses_status_reason() {
    let base = spawn_server(Received::default()).await;
    let importer = HttpImporter::new(&base, TOKEN).unwrap();

    let err = importer
        .import_questions("broken", &[question(1, "One")])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Remote { status: 500, ref message } if message == "Internal Server Error"
    ));
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let received = Received::default();
    let base = spawn_server(received.clone()).await;
    let importer = HttpImporter::new(&base, "stale-token").unwrap();

    let err = importer
        .import_questions("intro", &[question(1, "One")])
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Remote { status: 401, .. }));
    assert!(received.all().is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let importer = HttpImporter::new(&format!("http://{}", addr), TOKEN).unwrap();
    let err = importer
        .import_questions("intro", &[question(1, "One")])
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Transport(_)));
}

// ========================================
// Slug Encoding And Full Flow
// ========================================

#[tokio::test]
async fn test_slug_travels_as_one_segment() {
    let received = Received::default();
    let base = spawn_server(received.clone()).await;
    let importer = HttpImporter::new(&base, TOKEN).unwrap();

    importer
        .import_questions("a/b", &[question(1, "One")])
        .await
        .unwrap();

    assert_eq!(received.all()[0].0, "a/b");
}

#[tokio::test]
async fn test_run_import_over_http() {
    let received = Received::default();
    let base = spawn_server(received.clone()).await;
    let importer = HttpImporter::new(&base, TOKEN).unwrap();

    let csv = "Assessment Slug,Question Order,Question Text,Question Type\n\
               intro,1,First,rating\n\
               intro,2,Second,rating\n\
               locked,1,Nope,rating\n";
    let summary = run_import(csv, &importer).await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.failures[0].slug, "locked");
    assert!(summary.failures[0].error.is_forbidden());

    let intro = received
        .all()
        .into_iter()
        .find(|(slug, _)| slug == "intro")
        .unwrap();
    assert_eq!(intro.1["questions"].as_array().unwrap().len(), 2);
}
