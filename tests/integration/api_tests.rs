//! API integration tests against a running server
//!
//! Start the server with `RUN_MODE=development` (bootstraps the staff account
//! below), then run: cargo test --test api_tests -- --ignored

use chrono::{Days, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_EMAIL: &str = "admin@library.local";
const ADMIN_PASSWORD: &str = "admin12345";

async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh reader and return its token
async fn reader_token(client: &Client) -> String {
    let email = format!("reader{}@test.com", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({ "email": email, "password": "reader-password" }))
        .send()
        .await
        .expect("Failed to register reader");
    assert_eq!(response.status(), 201);

    login(client, &email, "reader-password").await
}

async fn create_book(client: &Client, token: &str, inventory: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "Integration Testing",
            "author": "A. Tester",
            "cover": "Soft",
            "inventory": inventory,
            "daily_fee": "1.00"
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse book")
}

async fn get_book(client: &Client, token: &str, id: i64) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse book")
}

async fn borrow(client: &Client, token: &str, book_id: i64, days: u64) -> reqwest::Response {
    let expected = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .unwrap();
    client
        .post(format!("{}/borrowings", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book": book_id, "expected_return_date": expected }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_readers_cannot_manage_books() {
    let client = Client::new();
    let token = reader_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Forbidden",
            "author": "Nobody",
            "cover": "Hard",
            "inventory": 1,
            "daily_fee": "0.50"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_single_copy() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let reader = reader_token(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = borrow(&client, &reader, book_id, 3).await;
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.unwrap();
    assert_eq!(borrowing["is_active"], true);
    assert_eq!(get_book(&client, &reader, book_id).await["inventory"], 0);

    // The only copy is out
    let response = borrow(&client, &admin, book_id, 3).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "book");
    assert_eq!(body["message"], "Book is not available for borrowing.");

    let return_url = format!("{}/borrowings/{}/return", BASE_URL, borrowing["id"]);

    // Readers cannot return books themselves
    let response = client
        .post(&return_url)
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client
        .post(&return_url)
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Book was successfully returned");
    assert_eq!(
        body["borrowing"]["actual_return_date"],
        Utc::now().date_naive().to_string()
    );
    // Returned the same day: nothing to pay
    assert_eq!(body["payment"]["payment_amount"], 0);
    assert_eq!(body["payment"]["status"], "Paid");
    assert_eq!(get_book(&client, &reader, book_id).await["inventory"], 1);

    let response = client
        .post(&return_url)
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "This borrowing is closed already.");
}

#[tokio::test]
#[ignore]
async fn test_return_date_must_be_in_the_future() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let reader = reader_token(&client).await;
    let book = create_book(&client, &admin, 2).await;

    let response = borrow(&client, &reader, book["id"].as_i64().unwrap(), 0).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "expected_return_date");
}

#[tokio::test]
#[ignore]
async fn test_unknown_book_is_rejected() {
    let client = Client::new();
    let reader = reader_token(&client).await;

    let response = borrow(&client, &reader, i32::MAX as i64, 3).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid book id.");
}

#[tokio::test]
#[ignore]
async fn test_readers_only_see_their_own_borrowings() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let first = reader_token(&client).await;
    let second = reader_token(&client).await;
    let book = create_book(&client, &admin, 5).await;

    let response = borrow(&client, &first, book["id"].as_i64().unwrap(), 5).await;
    let borrowing: Value = response.json().await.unwrap();

    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing["id"]))
        .bearer_auth(&second)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let list: Value = client
        .get(format!("{}/borrowings?user_id={}", BASE_URL, borrowing["user_id"]))
        .bearer_auth(&second)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().map(|a| a.len()), Some(0));

    let details: Value = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing["id"]))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["book"]["id"], book["id"]);
    assert_eq!(details["total_amount"], 0);
}
