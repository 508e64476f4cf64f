//! In-process router tests
//!
//! The pool connects lazily, so only requests rejected before any query runs
//! are exercised here. Tests that seed rows need PostgreSQL at DATABASE_URL and
//! are ignored by default.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Days, Utc};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

use library_service::{
    api,
    config::AppConfig,
    models::{enums::PaymentStatus, user::UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

fn router(pool: PgPool, config: &AppConfig) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(Services::new(Repository::new(pool), config)),
    };
    api::create_router(state)
}

fn app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    (router(pool, &config), config)
}

fn token(config: &AppConfig, is_staff: bool) -> String {
    token_for(config, 7, is_staff)
}

fn token_for(config: &AppConfig, user_id: i32, is_staff: bool) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "reader@test.com".to_string(),
        user_id,
        is_staff,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&config.auth.jwt_secret)
    .unwrap()
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_token() {
    let (app, _) = app();

    let response = app
        .oneshot(request(Method::GET, "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _) = app();

    let response = app
        .oneshot(request(Method::GET, "/api/v1/books", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "NotAuthenticated");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_unauthorized() {
    let (app, config) = app();
    let mut other = config.clone();
    other.auth.jwt_secret = "not-the-server-secret".to_string();

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/v1/borrowings",
            Some(&token(&other, true)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn readers_cannot_create_books() {
    let (app, config) = app();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/books",
            Some(&token(&config, false)),
            Some(json!({
                "title": "Dune",
                "author": "Frank Herbert",
                "cover": "Hard",
                "inventory": 3,
                "daily_fee": "0.50"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn readers_cannot_delete_books() {
    let (app, config) = app();

    let response = app
        .oneshot(request(
            Method::DELETE,
            "/api/v1/books/1",
            Some(&token(&config, false)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn readers_cannot_return_books() {
    let (app, config) = app();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/borrowings/1/return",
            Some(&token(&config, false)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "NotAuthorized");
}

#[tokio::test]
async fn readers_cannot_grant_staff_rights() {
    let (app, config) = app();

    let response = app
        .oneshot(request(
            Method::PUT,
            "/api/v1/users/7/staff",
            Some(&token(&config, false)),
            Some(json!({ "is_staff": true })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = app();

    let response = app
        .oneshot(request(Method::GET, "/api-docs/openapi.json", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/borrowings"].is_object());
}

async fn database() -> PgPool {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| AppConfig::default().database.url);
    let pool = PgPoolOptions::new().connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn insert_book(pool: &PgPool, inventory: i32) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO books (title, author, cover, inventory, daily_fee)
        VALUES ('Dune', 'Frank Herbert', 'Soft', $1, 1.00)
        RETURNING id
        "#,
    )
    .bind(inventory)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Reader with a returned borrowing whose fee is still owed
async fn reader_owing(pool: &PgPool, status: PaymentStatus) -> i32 {
    let email = format!("owing{}@test.com", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let user_id: i32 =
        sqlx::query_scalar("INSERT INTO users (email, password) VALUES ($1, 'unused') RETURNING id")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap();

    let today = Utc::now().date_naive();
    let borrowed = today.checked_sub_days(Days::new(5)).unwrap();
    let borrowing_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO borrowings (borrow_date, expected_return_date, actual_return_date, book_id, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(borrowed)
    .bind(today.checked_add_days(Days::new(1)).unwrap())
    .bind(today)
    .bind(insert_book(pool, 1).await)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO payments (status, borrowing_id, payment_amount) VALUES ($1, $2, 500)")
        .bind(status)
        .bind(borrowing_id)
        .execute(pool)
        .await
        .unwrap();

    user_id
}

#[tokio::test]
#[ignore] // Needs PostgreSQL at DATABASE_URL
async fn outstanding_payment_blocks_the_next_borrowing() {
    let pool = database().await;
    let config = AppConfig::default();

    for status in [PaymentStatus::Pending, PaymentStatus::InProcess] {
        let user_id = reader_owing(&pool, status).await;
        let book_id = insert_book(&pool, 1).await;
        let expected = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(3))
            .unwrap();

        let response = router(pool.clone(), &config)
            .oneshot(request(
                Method::POST,
                "/api/v1/borrowings",
                Some(&token_for(&config, user_id, false)),
                Some(json!({ "book": book_id, "expected_return_date": expected })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["field"], "payments");
        assert_eq!(body["message"], "You have to settle your existing payments first.");

        let inventory: i32 = sqlx::query_scalar("SELECT inventory FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(inventory, 1);
    }
}
