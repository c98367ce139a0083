//! Shared helpers for pathway-api integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use pathway_api::{build_router, AppState, UploadStore};
use pathway_common::db::init_database;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "pathway-test-boundary";

/// Router over a fresh database and upload folder
pub struct TestApp {
    pub router: Router,
    pub uploads_dir: PathBuf,
    _root: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_body_limit(pathway_api::DEFAULT_MAX_UPLOAD_BYTES).await
    }

    pub async fn with_body_limit(max_upload_bytes: usize) -> Self {
        let root = TempDir::new().unwrap();
        let uploads_dir = root.path().join("uploads");
        std::fs::create_dir_all(&uploads_dir).unwrap();

        let db = init_database(&root.path().join("pathway.db")).await.unwrap();
        let state = AppState::new(db, UploadStore::new(&uploads_dir))
            .with_max_upload_bytes(max_upload_bytes);

        Self {
            router: build_router(state),
            uploads_dir,
            _root: root,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(request).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Sign up and log in, returning the bearer token
    pub async fn login_as(&self, email: &str) -> String {
        let credentials = serde_json::json!({ "email": email, "password": "hunter22" });

        let (status, _) = self
            .send_json(json_request("POST", "/api/auth/signup", None, &credentials))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .send_json(json_request("POST", "/api/auth/login", None, &credentials))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Create an assessment from text fields only
    pub async fn create_assessment(&self, token: &str, fields: &[(&str, &str)]) -> Value {
        let (status, body) = self
            .send_json(multipart_request(
                "POST",
                "/api/assessments",
                token,
                fields,
                &[],
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }

    /// Whether a served `/uploads/...` path exists on disk
    pub fn upload_exists(&self, served: &str) -> bool {
        let relative = served.trim_start_matches("/uploads/");
        self.uploads_dir.join(relative).exists()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A file part: (field name, file name, content)
pub type FilePart<'a> = (&'a str, &'a str, &'a [u8]);

pub fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[FilePart<'_>],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, content) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}
