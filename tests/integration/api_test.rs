// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use axum_test::TestServer;
use pagepress::presentation::routes;
use serde_json::{json, Value};

use super::helpers::{page_texts, Harness, Script};

fn server(harness: &Harness, generators: &[&str]) -> TestServer {
    TestServer::new(routes::app(harness.components(generators))).unwrap()
}

#[tokio::test]
async fn convert_then_download() {
    let harness = Harness::new(vec![Script::Pages(2)]);
    let server = server(&harness, &["*"]);

    let response = server
        .post("/v1/convert")
        .add_header("X-User-Id", "42")
        .json(&json!({
            "url": "https://lms.example.com/mod/page/view.php?id=7",
            "options": { "landscape": true, "unknownFlag": 1 },
            "cookie": { "name": "MoodleSession", "value": "abc" }
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "view.pdf");

    let job = harness.renderer.jobs.lock().unwrap()[0].clone();
    assert_eq!(job.cookie.unwrap().name, "MoodleSession");
    assert!(job.options.contains_key("landscape"));

    let download = server
        .get("/v1/documents/view.pdf")
        .add_header("X-User-Id", "42")
        .await;
    assert_eq!(download.status_code(), StatusCode::OK);
    assert_eq!(download.header("content-type"), "application/pdf");
    assert_eq!(page_texts(download.as_bytes()).len(), 2);
}

#[tokio::test]
async fn documents_are_scoped_to_their_owner() {
    let harness = Harness::new(vec![]);
    let server = server(&harness, &["*"]);

    server
        .post("/v1/convert")
        .add_header("X-User-Id", "42")
        .json(&json!({ "url": "https://example.com/private" }))
        .await;

    let response = server
        .get("/v1/documents/private.pdf")
        .add_header("X-User-Id", "43")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn convert_requires_user_header() {
    let harness = Harness::new(vec![]);
    let server = server(&harness, &["*"]);

    let response = server
        .post("/v1/convert")
        .json(&json!({ "url": "https://example.com/a" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.renderer.calls(), 0);
}

#[tokio::test]
async fn convert_requires_pdf_capability() {
    let harness = Harness::new(vec![]);
    let server = server(&harness, &["alice"]);

    let response = server
        .post("/v1/convert")
        .add_header("X-User-Id", "mallory")
        .json(&json!({ "url": "https://example.com/a" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["success"], false);
    assert_eq!(harness.renderer.calls(), 0);
}

#[tokio::test]
async fn convert_rejects_invalid_url() {
    let harness = Harness::new(vec![]);
    let server = server(&harness, &["*"]);

    let response = server
        .post("/v1/convert")
        .add_header("X-User-Id", "42")
        .json(&json!({ "url": "not a url" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.renderer.calls(), 0);
}

#[tokio::test]
async fn convert_failure_is_reported() {
    let harness = Harness::new(vec![Script::Fail]);
    let server = server(&harness, &["*"]);

    let response = server
        .post("/v1/convert")
        .add_header("X-User-Id", "42")
        .json(&json!({ "url": "https://example.com/slow" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Conversion failed:"), "{}", error);
}

#[tokio::test]
async fn batch_convert_merges_pages() {
    let harness = Harness::new(vec![Script::Pages(1), Script::Pages(1), Script::Pages(1)]);
    let server = server(&harness, &["*"]);

    let response = server
        .post("/v1/convert/batch")
        .add_header("X-User-Id", "42")
        .json(&json!({
            "urls": [
                "https://example.com/week/1",
                "https://example.com/week/2",
                "https://example.com/week/3"
            ],
            "filename": "course",
            "page_numbers": true
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["filename"], "course.pdf");

    let download = server
        .get("/v1/documents/course.pdf")
        .add_header("X-User-Id", "42")
        .await;
    let texts = page_texts(download.as_bytes());
    assert_eq!(texts.len(), 3);
    assert!(texts[2].contains("(Page 3 of 3)"));
}

#[tokio::test]
async fn batch_convert_rejects_bad_input() {
    let harness = Harness::new(vec![]);
    let server = server(&harness, &["*"]);

    let empty = server
        .post("/v1/convert/batch")
        .add_header("X-User-Id", "42")
        .json(&json!({ "urls": [], "filename": "course" }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    let malformed = server
        .post("/v1/convert/batch")
        .add_header("X-User-Id", "42")
        .json(&json!({
            "urls": ["https://example.com/1", "javascript:alert(1)"],
            "filename": "course"
        }))
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
    assert!(malformed.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid input"));
    assert_eq!(harness.renderer.calls(), 0);
}
