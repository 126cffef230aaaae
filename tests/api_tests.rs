//! API integration tests, driven in-process against the in-memory backend

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use catalog_server::{api, repository::Repository, AppState};

fn app() -> Router {
    api::router(AppState::new(Repository::memory()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => Request::builder().method(method).uri(uri).body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

/// Create a record and return its id
async fn create(app: &Router, uri: &str, body: Value) -> i64 {
    let (status, created) = post(app, uri, body).await;
    assert_eq!(status, StatusCode::CREATED, "{uri}: {created}");
    created["id"].as_i64().expect("No id in response")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_create_author() {
    let app = app();

    let (status, body) = post(
        &app,
        "/api/authors",
        json!({ "name": "Tolstoy", "biography": "Russian novelist" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_i64());
    assert_eq!(body["name"], "Tolstoy");

    let (status, body) = get(&app, "/api/authors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_update_author_and_genre() {
    let app = app();
    let author_id = create(&app, "/api/authors", json!({ "name": "Tolstoy" })).await;
    let genre_id = create(&app, "/api/genres", json!({ "name": "Clasic" })).await;

    let (status, author) = put(
        &app,
        &format!("/api/authors/{author_id}"),
        json!({ "biography": "Russian novelist" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(author["name"], "Tolstoy");
    assert_eq!(author["biography"], "Russian novelist");

    let (status, genre) = put(
        &app,
        &format!("/api/genres/{genre_id}"),
        json!({ "name": "Classic" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genre["name"], "Classic");

    let (_, genre) = get(&app, &format!("/api/genres/{genre_id}")).await;
    assert_eq!(genre["name"], "Classic");

    let uri = format!("/api/genres/{genre_id}");
    let (status, body) = put(&app, &uri, json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_blank_name_is_bad_request() {
    let app = app();

    let (status, body) = post(&app, "/api/authors", json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = post(&app, "/api/genres", json!({ "title": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlong_title_is_bad_request() {
    let app = app();
    let author_id = create(&app, "/api/authors", json!({ "name": "Tolstoy" })).await;

    let (status, body) = post(
        &app,
        &format!("/api/authors/{author_id}/books"),
        json!({ "title": "x".repeat(256), "isbn": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (_, books) = get(&app, "/api/books").await;
    assert_eq!(books, json!([]));
}

#[tokio::test]
async fn test_malformed_path_and_query_are_bad_request() {
    let app = app();

    for uri in [
        "/api/books/abc",
        "/api/authors/1.5",
        "/api/books/1/genres/x",
        "/api/books/search",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "BadValue", "{uri}");
        assert_eq!(body["code"], 18, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }

    let (status, body) = delete(&app, "/api/genres/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = app();

    for (uri, error) in [
        ("/api/authors/99", "NoSuchAuthor"),
        ("/api/authors/99/books", "NoSuchAuthor"),
        ("/api/books/99", "NoSuchBook"),
        ("/api/genres/99", "NoSuchGenre"),
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], error, "{uri}");
    }

    let (status, _) = delete(&app, "/api/books/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_lifecycle() {
    let app = app();
    let author_id = create(&app, "/api/authors", json!({ "name": "Tolstoy" })).await;

    let (status, book) = post(
        &app,
        &format!("/api/authors/{author_id}/books"),
        json!({ "title": "War and Peace", "isbn": "123", "page_count": 1225 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["author_id"], author_id);
    let book_id = book["id"].as_i64().expect("book id");

    // Same isbn through the top-level endpoint
    let (status, _) = post(
        &app,
        "/api/books",
        json!({ "author_id": author_id, "title": "Copy", "isbn": "123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let genre_id = create(&app, "/api/genres", json!({ "name": "Classic" })).await;

    let link = format!("/api/books/{book_id}/genres/{genre_id}");
    let (status, book) = post(&app, &link, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["genre_ids"], json!([genre_id]));

    let (_, genre) = get(&app, &format!("/api/genres/{genre_id}")).await;
    assert_eq!(genre["book_ids"], json!([book_id]));

    let (status, found) = get(&app, "/api/books/search?title=peace").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found[0]["id"], book_id);

    let (status, book) = put(
        &app,
        &format!("/api/books/{book_id}"),
        json!({ "page_count": 1300 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["page_count"], 1300);
    assert_eq!(book["title"], "War and Peace");

    let (status, _) = delete(&app, &format!("/api/authors/{author_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/api/books/{book_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, genre) = get(&app, &format!("/api/genres/{genre_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genre["book_ids"], json!([]));
}

#[tokio::test]
async fn test_detach_genre() {
    let app = app();
    let author_id = create(&app, "/api/authors", json!({ "name": "Homer" })).await;
    let book_id = create(
        &app,
        "/api/books",
        json!({ "author_id": author_id, "title": "Odyssey", "isbn": "9", "page_count": 400 }),
    )
    .await;
    let genre_id = create(&app, "/api/genres", json!({ "name": "Epic" })).await;

    let link = format!("/api/books/{book_id}/genres/{genre_id}");
    post(&app, &link, json!({})).await;

    let (status, book) = delete(&app, &link).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["genre_ids"], json!([]));

    let (status, body) = delete(&app, &format!("/api/books/{book_id}/genres/77")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchGenre");
}
