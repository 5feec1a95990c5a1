//! Ledger tests against a migrated database (`DATABASE_URL`)

use std::time::{SystemTime, UNIX_EPOCH};

use bookshelf_server::{
    models::book::NewBook,
    repository::{BookStore, LoanLedger, Repository, UserStore},
    AppError,
};
use sqlx::postgres::PgPoolOptions;

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

/// A fresh borrower and book for one test run
async fn fixture(repo: &Repository) -> (i32, String) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let isbn = format!("{:013}", nanos % 10_000_000_000_000);

    let user = repo
        .users
        .create(&format!("ledger{}", nanos), "not-a-real-hash")
        .await
        .expect("Failed to create user");
    repo.books
        .create(&NewBook {
            isbn: isbn.clone(),
            title: "Concurrency".to_string(),
            author: "Test".to_string(),
        })
        .await
        .expect("Failed to create book");

    (user.id, isbn)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_concurrent_borrows_open_one_loan() {
    let repo = repository().await;
    let (borrower, isbn) = fixture(&repo).await;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let loans = repo.loans.clone();
            let isbn = isbn.clone();
            tokio::spawn(async move { loans.open(&isbn, borrower).await })
        })
        .collect();

    let mut opened = 0;
    for attempt in attempts {
        match attempt.await.expect("task panicked") {
            Ok(loan) => {
                assert!(loan.is_active());
                opened += 1;
            }
            Err(AppError::ConstraintViolation(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(repo.loans.count_active_for_book(&isbn).await.unwrap(), 1);
    assert!(repo.loans.is_on_loan(&isbn).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_second_return_is_a_no_op() {
    let repo = repository().await;
    let (borrower, isbn) = fixture(&repo).await;

    let loan = repo.loans.open(&isbn, borrower).await.unwrap();
    let isbns = vec![isbn.clone()];

    assert_eq!(repo.loans.close_for_borrower(borrower, &isbns).await.unwrap(), 1);
    assert_eq!(repo.loans.close_for_borrower(borrower, &isbns).await.unwrap(), 0);

    let closed = repo.loans.get_by_id(loan.id).await.unwrap();
    assert!(closed.returned_at.is_some());
    assert!(!repo.loans.is_on_loan(&isbn).await.unwrap());

    // The book can be borrowed again once returned
    assert!(repo.loans.open(&isbn, borrower).await.is_ok());
}
