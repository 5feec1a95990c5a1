//! End-to-end tests against a running server (`BOOKSHELF_URL`, default
//! http://localhost:8080) backed by a migrated database.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::Value;

fn base_url() -> String {
    std::env::var("BOOKSHELF_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// A 13-digit ISBN that no other run will use
fn fresh_isbn() -> String {
    format!("{:013}", unique_suffix() % 10_000_000_000_000)
}

/// Cookie-keeping client that does not follow redirects
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Sign up and log in a fresh user, returning a client holding the session
async fn logged_in_client() -> Client {
    let client = client();
    let username = format!("reader{}", unique_suffix());
    let form = [("username", username.as_str()), ("password", "s3cret")];

    let response = client
        .post(format!("{}/signup", base_url()))
        .form(&form)
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client
        .post(format!("{}/login", base_url()))
        .form(&form)
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/home");

    // Drain the signup message
    get_json(&client, "/home").await;
    client
}

async fn add_book(client: &Client, isbn: &str, title: &str) -> reqwest::Response {
    client
        .post(format!("{}/books/add", base_url()))
        .form(&[("isbn", isbn), ("title", title), ("author", "Frank Herbert")])
        .send()
        .await
        .expect("Failed to send add book request")
}

async fn get_json(client: &Client, path: &str) -> Value {
    client
        .get(format!("{}{}", base_url(), path))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

/// Unreturned loans on `isbn`, across all borrowers
async fn active_loans_on(client: &Client, isbn: &str) -> usize {
    let active = get_json(client, "/loans/active").await;
    active["loans"]
        .as_array()
        .expect("loans")
        .iter()
        .filter(|l| l["book"]["isbn"] == isbn)
        .count()
}

fn selection(isbns: &[&str]) -> [(&'static str, String); 1] {
    [("selected_isbns", serde_json::to_string(isbns).expect("serializable"))]
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let body = get_json(&Client::new(), "/health").await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/login", base_url()))
        .form(&[("username", "nobody-at-all"), ("password", "wrong")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_signup_is_rejected() {
    let client = client();
    let username = format!("dup{}", unique_suffix());
    let form = [("username", username.as_str()), ("password", "s3cret")];

    for expected in [StatusCode::SEE_OTHER, StatusCode::CONFLICT] {
        let response = client
            .post(format!("{}/signup", base_url()))
            .form(&form)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_register_book_twice_is_informational() {
    let client = client();
    let isbn = fresh_isbn();

    assert_eq!(add_book(&client, &isbn, "Dune").await.status(), StatusCode::SEE_OTHER);
    assert_eq!(add_book(&client, &isbn, "Dune").await.status(), StatusCode::SEE_OTHER);

    let form = get_json(&client, "/books/add").await;
    let levels: Vec<&str> = form["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .filter_map(|m| m["level"].as_str())
        .collect();
    assert_eq!(levels, vec!["success", "info"]);
}

#[tokio::test]
#[ignore]
async fn test_invalid_book_is_rejected() {
    let response = add_book(&client(), "12345", "Dune").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_borrow_requires_login() {
    let response = client()
        .post(format!("{}/borrow", base_url()))
        .form(&selection(&["4003994155"]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_lifecycle() {
    let alice = logged_in_client().await;
    let bob = logged_in_client().await;
    let isbn = fresh_isbn();
    let title = format!("Lifecycle {}", isbn);
    assert_eq!(add_book(&alice, &isbn, &title).await.status(), StatusCode::SEE_OTHER);

    // The new book is in the catalog
    let catalog = get_json(&bob, &format!("/books?q={}", title)).await;
    assert_eq!(catalog["total"], 1);
    assert_eq!(catalog["items"][0]["isbn"], isbn.as_str());

    // Alice borrows; the book leaves the borrowable list
    let response = alice
        .post(format!("{}/borrow?q={}", base_url(), isbn))
        .form(&selection(&[isbn.as_str()]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let borrowable = get_json(&bob, &format!("/borrow?q={}", title)).await;
    assert_eq!(borrowable["total"], 0);

    // Bob's attempt is skipped with a warning
    bob.post(format!("{}/borrow", base_url()))
        .form(&selection(&[isbn.as_str()]))
        .send()
        .await
        .expect("Failed to send request");
    let page = get_json(&bob, "/borrow").await;
    assert_eq!(page["messages"][0]["level"], "warning");

    assert_eq!(active_loans_on(&bob, &isbn).await, 1);

    // Bob cannot return Alice's loan
    bob.post(format!("{}/return", base_url()))
        .form(&selection(&[isbn.as_str()]))
        .send()
        .await
        .expect("Failed to send request");
    let page = get_json(&bob, "/return").await;
    assert_eq!(page["messages"][0]["level"], "info");

    // Alice returns; the book is borrowable again and history keeps the loan
    alice
        .post(format!("{}/return", base_url()))
        .form(&selection(&[isbn.as_str()]))
        .send()
        .await
        .expect("Failed to send request");
    let page = get_json(&alice, "/return").await;
    let texts: Vec<&str> = page["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .filter_map(|m| m["text"].as_str())
        .collect();
    assert!(texts.contains(&"Returned 1 book(s)."));
    assert_eq!(page["total"], 0);
    assert_eq!(active_loans_on(&bob, &isbn).await, 0);

    let borrowable = get_json(&bob, &format!("/borrow?q={}", title)).await;
    assert_eq!(borrowable["total"], 1);

    let home = get_json(&alice, "/home").await;
    assert_eq!(home["total"], 1);
    assert!(home["items"][0]["returned_at"].is_string());
}
