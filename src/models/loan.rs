//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::Book;
use super::user::UserShort;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i64,
    pub book_isbn: String,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Internal row structure for loan listings joined with book and borrower
#[derive(Debug, Clone, FromRow)]
pub struct LoanDetailsRow {
    id: i64,
    borrowed_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
    isbn: String,
    title: String,
    author: String,
    borrower_id: i32,
    borrower_username: String,
}

impl From<LoanDetailsRow> for LoanDetails {
    fn from(row: LoanDetailsRow) -> Self {
        LoanDetails {
            id: row.id,
            book: Book {
                isbn: row.isbn,
                title: row.title,
                author: row.author,
            },
            borrower: UserShort {
                id: row.borrower_id,
                username: row.borrower_username,
            },
            borrowed_at: row.borrowed_at,
            returned_at: row.returned_at,
        }
    }
}

/// Loan with book and borrower for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i64,
    pub book: Book,
    pub borrower: UserShort,
    pub borrowed_at: DateTime<Utc>,
    /// Absent while the book is on loan
    pub returned_at: Option<DateTime<Utc>>,
}

/// Which of a borrower's loans to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanFilter {
    pub borrower_id: i32,
    pub title: Option<String>,
    /// Only unreturned loans, oldest first. Otherwise the full history with
    /// unreturned loans first.
    pub active_only: bool,
}

/// Result of a batch borrow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BorrowOutcome {
    /// Titles now on loan to the caller
    pub borrowed: Vec<String>,
    /// Titles already on loan to someone
    pub skipped: Vec<String>,
    /// Requested ISBNs with no catalog entry
    pub unknown: Vec<String>,
}

/// Turn the raw `selected_isbns` list into the ISBNs to process: trimmed,
/// blanks dropped, duplicates removed keeping the first occurrence.
pub fn normalize_isbns<I, S>(isbns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result: Vec<String> = Vec::new();
    for isbn in isbns {
        let isbn = isbn.as_ref().trim();
        if !isbn.is_empty() && !result.iter().any(|seen| seen == isbn) {
            result.push(isbn.to_string());
        }
    }
    result
}
