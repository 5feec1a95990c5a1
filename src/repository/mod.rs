//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookFilter, NewBook},
        loan::{Loan, LoanDetails, LoanFilter},
        page::PageWindow,
        user::User,
    },
};

/// Catalog store, keyed by ISBN
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Round-trip to the database
    async fn ping(&self) -> AppResult<()>;

    async fn get(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn exists(&self, isbn: &str) -> AppResult<bool>;

    /// Insert a book. A primary-key conflict yields `ConstraintViolation`.
    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    async fn count(&self, filter: &BookFilter) -> AppResult<i64>;

    /// Books matching `filter`, ordered by ISBN
    async fn list(&self, filter: &BookFilter, window: PageWindow) -> AppResult<Vec<Book>>;
}

/// Loan ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// Whether the book has an unreturned loan
    async fn is_on_loan(&self, isbn: &str) -> AppResult<bool>;

    /// Open a loan in its own transaction. A concurrent active loan on the
    /// same book yields `ConstraintViolation` and leaves nothing behind.
    async fn open(&self, isbn: &str, borrower_id: i32) -> AppResult<Loan>;

    /// Mark the borrower's unreturned loans for `isbns` as returned now.
    /// Returns the number of loans updated.
    async fn close_for_borrower(&self, borrower_id: i32, isbns: &[String]) -> AppResult<u64>;

    /// Every unreturned loan, all borrowers
    async fn list_active(&self) -> AppResult<Vec<LoanDetails>>;

    async fn count_for_borrower(&self, filter: &LoanFilter) -> AppResult<i64>;

    async fn list_for_borrower(&self, filter: &LoanFilter, window: PageWindow) -> AppResult<Vec<LoanDetails>>;
}

/// Patron accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a user. A taken username yields `Conflict`.
    async fn create(&self, username: &str, password_hash: &str) -> AppResult<User>;
}

/// `ILIKE` pattern matching `term` as a literal substring
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool),
        }
    }
}
