use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    error::ErrorVerbosity,
    middleware::cors_headers::{ALLOW_HEADERS, ALLOW_METHODS},
    server::{app, ServerConfig},
    state::ApiState,
    store::{InMemoryBookStore, NewBook},
};

#[tokio::test]
async fn example_config_is_valid() {
    ServerConfig::from_config_file("config.example.yaml")
        .await
        .expect("Example config is not parsable");
}

fn book(n: i64) -> NewBook {
    NewBook {
        title: Some(format!("Book {n}")),
        author: Some(format!("Author {n}")),
        rating: Some(n % 5 + 1),
    }
}

fn shelf_with(count: i64, verbosity: ErrorVerbosity) -> Router {
    let store = InMemoryBookStore::with_books((1..=count).map(book)).unwrap();

    app(ApiState::new(verbosity, Arc::new(store)), false)
}

fn shelf(count: i64) -> Router {
    shelf_with(count, ErrorVerbosity::Message)
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);

    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

fn ids(body: &Value) -> Vec<i64> {
    body["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_i64().unwrap())
        .collect()
}

fn assert_failure(response: &TestResponse, status: StatusCode, message: &str) {
    assert_eq!(response.status, status);
    assert_eq!(
        response.body,
        json!({ "success": false, "error": status.as_u16(), "message": message })
    );
}

#[tokio::test]
async fn lists_the_first_page_by_default() {
    let app = shelf(12);

    let response = get(&app, "/books").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["total_books"], json!(12));
    assert_eq!(ids(&response.body), (1..=8).collect::<Vec<_>>());
    assert_eq!(
        response.body["books"][0],
        json!({ "id": 1, "title": "Book 1", "author": "Author 1", "rating": 2 })
    );
}

#[tokio::test]
async fn second_page_holds_the_remainder() {
    let app = shelf(9);

    let response = get(&app, "/books?page=2").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec![9]);
    assert_eq!(response.body["total_books"], json!(9));
}

#[tokio::test]
async fn empty_catalog_is_not_found() {
    let app = shelf(0);

    let response = get(&app, "/books").await;

    assert_failure(&response, StatusCode::NOT_FOUND, "resource not found");
}

#[tokio::test]
async fn out_of_range_pages_are_not_found() {
    let app = shelf(8);

    for uri in ["/books?page=2", "/books?page=0", "/books?page=-3"] {
        let response = get(&app, uri).await;

        assert_failure(&response, StatusCode::NOT_FOUND, "resource not found");
    }
}

#[tokio::test]
async fn non_integer_page_is_a_bad_request() {
    let app = shelf(3);

    let response = get(&app, "/books?page=abc").await;

    assert_failure(&response, StatusCode::BAD_REQUEST, "bad request");
}

#[tokio::test]
async fn creates_a_book_with_a_coerced_rating() {
    let app = shelf(3);

    let response = send(
        &app,
        Method::POST,
        "/books",
        Some(r#"{"title":"Neverwhere","author":"Neil Gaiman","rating":"5"}"#),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["created"], json!(4));
    assert_eq!(response.body["total_books"], json!(4));
    assert_eq!(
        response.body["books"][3],
        json!({ "id": 4, "title": "Neverwhere", "author": "Neil Gaiman", "rating": 5 })
    );

    let listed = get(&app, "/books").await;

    assert_eq!(listed.body["total_books"], json!(4));
    assert!(ids(&listed.body).contains(&4));
}

#[tokio::test]
async fn creates_a_book_from_an_empty_object() {
    let app = shelf(0);

    let response = send(&app, Method::POST, "/books", Some("{}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["created"], json!(1));
    assert_eq!(
        response.body["books"],
        json!([{ "id": 1, "title": null, "author": null, "rating": null }])
    );
}

#[tokio::test]
async fn create_returns_the_requested_page() {
    let app = shelf(8);

    let response = send(&app, Method::POST, "/books?page=2", Some(r#"{"title":"Emma"}"#)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec![9]);
    assert_eq!(response.body["total_books"], json!(9));
}

#[tokio::test]
async fn create_with_an_unconvertible_rating_is_unprocessable() {
    let app = shelf(2);

    let response = send(&app, Method::POST, "/books", Some(r#"{"rating":"abc"}"#)).await;

    assert_failure(&response, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    assert_eq!(get(&app, "/books").await.body["total_books"], json!(2));
}

#[tokio::test]
async fn create_with_a_boolean_rating_is_unprocessable() {
    let app = shelf(2);

    let response = send(&app, Method::POST, "/books", Some(r#"{"rating":true}"#)).await;

    assert_failure(&response, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    assert_eq!(get(&app, "/books").await.body["total_books"], json!(2));
}

#[tokio::test]
async fn undecodable_bodies_are_unsupported_media() {
    let app = shelf(2);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_ENCODING, "br")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_cors_headers(response.headers());

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(
        body,
        json!({ "success": false, "error": 415, "message": "unsupported media type" })
    );
    assert_eq!(get(&app, "/books").await.body["total_books"], json!(2));
}

#[tokio::test]
async fn create_with_a_malformed_body_is_unprocessable() {
    let app = shelf(2);

    let not_json = send(&app, Method::POST, "/books", Some("{title")).await;
    let missing = send(&app, Method::POST, "/books", None).await;
    let wrong_type = send(&app, Method::POST, "/books", Some(r#"{"title":42}"#)).await;

    assert_failure(&not_json, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    assert_failure(&missing, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
    assert_failure(&wrong_type, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable");
}

#[tokio::test]
async fn updates_the_rating() {
    let app = shelf(9);

    let response = send(&app, Method::PATCH, "/books/8", Some(r#"{"rating":"1"}"#)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true, "book_id": 8 }));

    let listed = get(&app, "/books").await;

    assert_eq!(listed.body["books"][7]["id"], json!(8));
    assert_eq!(listed.body["books"][7]["rating"], json!(1));
}

#[tokio::test]
async fn update_without_rating_changes_nothing() {
    let app = shelf(2);
    let before = get(&app, "/books").await.body;

    let response = send(&app, Method::PATCH, "/books/2", Some(r#"{"title":"Other"}"#)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true, "book_id": 2 }));
    assert_eq!(get(&app, "/books").await.body, before);
}

#[tokio::test]
async fn update_converts_boolean_ratings() {
    let app = shelf(2);

    let set = send(&app, Method::PATCH, "/books/1", Some(r#"{"rating":true}"#)).await;

    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(set.body, json!({ "success": true, "book_id": 1 }));
    assert_eq!(get(&app, "/books").await.body["books"][0]["rating"], json!(1));

    let cleared = send(&app, Method::PATCH, "/books/2", Some(r#"{"rating":false}"#)).await;

    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(get(&app, "/books").await.body["books"][1]["rating"], json!(0));
}

#[tokio::test]
async fn update_of_a_missing_book_is_not_found() {
    let app = shelf(2);

    let response = send(&app, Method::PATCH, "/books/999", Some(r#"{"rating":3}"#)).await;

    assert_failure(&response, StatusCode::NOT_FOUND, "resource not found");
}

#[tokio::test]
async fn update_with_an_invalid_rating_is_a_bad_request() {
    let app = shelf(2);

    for body in [
        r#"{"rating":"abc"}"#,
        r#"{"rating":null}"#,
        "not json",
        "42",
    ] {
        let response = send(&app, Method::PATCH, "/books/1", Some(body)).await;

        assert_failure(&response, StatusCode::BAD_REQUEST, "bad request");
    }

    let missing = send(&app, Method::PATCH, "/books/1", None).await;

    assert_failure(&missing, StatusCode::BAD_REQUEST, "bad request");
    assert_eq!(get(&app, "/books").await.body["books"][0]["rating"], json!(2));
}

#[tokio::test]
async fn deletes_a_book() {
    let app = shelf(10);

    let response = send(&app, Method::DELETE, "/books/3", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["deleted"], json!(3));
    assert_eq!(response.body["total_books"], json!(9));
    assert_eq!(ids(&response.body), vec![1, 2, 4, 5, 6, 7, 8, 9]);

    let second_page = get(&app, "/books?page=2").await;

    assert_eq!(ids(&second_page.body), vec![10]);
    assert_eq!(second_page.body["total_books"], json!(9));
}

#[tokio::test]
async fn delete_of_a_missing_book_is_not_found() {
    let app = shelf(2);

    let response = send(&app, Method::DELETE, "/books/999", None).await;

    assert_failure(&response, StatusCode::NOT_FOUND, "resource not found");
}

#[tokio::test]
async fn delete_of_the_last_book_returns_an_empty_page() {
    let app = shelf(1);

    let response = send(&app, Method::DELETE, "/books/1", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["books"], json!([]));
    assert_eq!(response.body["total_books"], json!(0));
}

#[tokio::test]
async fn non_integer_ids_are_not_found() {
    let app = shelf(2);

    let response = send(&app, Method::DELETE, "/books/abc", None).await;

    assert_failure(&response, StatusCode::NOT_FOUND, "resource not found");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = shelf(2);

    let response = get(&app, "/shelves").await;

    assert_failure(&response, StatusCode::NOT_FOUND, "resource not found");
}

#[tokio::test]
async fn wrong_methods_are_not_allowed() {
    let app = shelf(2);

    let response = send(&app, Method::PUT, "/books/1", Some(r#"{"rating":1}"#)).await;

    assert_failure(&response, StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    assert!(response.headers.contains_key(header::ALLOW));
}

fn assert_cors_headers(headers: &HeaderMap) {
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
}

#[tokio::test]
async fn every_response_carries_cors_headers() {
    let app = shelf(2);

    assert_cors_headers(&get(&app, "/books").await.headers);
    assert_cors_headers(&get(&app, "/books?page=7").await.headers);
    assert_cors_headers(&get(&app, "/nowhere").await.headers);
    assert_cors_headers(&send(&app, Method::DELETE, "/books/1", None).await.headers);
    assert_cors_headers(&send(&app, Method::POST, "/books", Some("{")).await.headers);
}

#[tokio::test]
async fn preflight_requests_carry_cors_headers() {
    let app = shelf(2);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/books")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(response.headers());
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn full_verbosity_explains_failures() {
    let app = shelf_with(2, ErrorVerbosity::Full);

    let response = send(&app, Method::PATCH, "/books/1", Some(r#"{"rating":"abc"}"#)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], json!(false));
    assert_eq!(response.body["error"], json!(400));
    assert_eq!(response.body["error_type"], json!("InvalidRating"));
    assert_eq!(
        response.body["context"]["reason"],
        json!(r#"Rating "abc" is not an integer"#)
    );
}

#[tokio::test]
async fn type_verbosity_names_the_failure_only() {
    let app = shelf_with(2, ErrorVerbosity::Type);

    let response = get(&app, "/books?page=5").await;

    assert_eq!(
        response.body,
        json!({
            "success": false,
            "error": 404,
            "message": "resource not found",
            "error_type": "PageNotFound",
        })
    );
}

#[tokio::test]
async fn response_body_tracing_keeps_the_body() {
    let store = InMemoryBookStore::with_books((1..=3).map(book)).unwrap();
    let app = app(ApiState::new(ErrorVerbosity::Message, Arc::new(store)), true);

    let response = get(&app, "/books").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec![1, 2, 3]);
}
