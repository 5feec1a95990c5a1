//! Loans repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanDetails, LoanDetailsRow, LoanFilter},
        page::PageWindow,
    },
};

use super::{contains_pattern, LoanLedger};

const LOAN_DETAILS_SELECT: &str = r#"
    SELECT l.id, l.borrowed_at, l.returned_at,
           b.isbn, b.title, b.author,
           u.id AS borrower_id, u.username AS borrower_username
    FROM loans l
    JOIN books b ON b.isbn = l.book_isbn
    JOIN users u ON u.id = l.borrower_id
"#;

/// $1 borrower, $2 optional ILIKE pattern, $3 unreturned only
const BORROWER_FILTER: &str = r#"
    l.borrower_id = $1
    AND ($2::text IS NULL OR b.title ILIKE $2 ESCAPE '\')
    AND (NOT $3 OR l.returned_at IS NULL)
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            "SELECT id, book_isbn, borrower_id, borrowed_at, returned_at FROM loans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Count unreturned loans on a book. Never more than one.
    pub async fn count_active_for_book(&self, isbn: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_isbn = $1 AND returned_at IS NULL",
        )
        .bind(isbn)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl LoanLedger for LoansRepository {
    async fn is_on_loan(&self, isbn: &str) -> AppResult<bool> {
        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_isbn = $1 AND returned_at IS NULL)",
        )
        .bind(isbn)
        .fetch_one(&self.pool)
        .await?;
        Ok(on_loan)
    }

    async fn open(&self, isbn: &str, borrower_id: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_isbn, borrower_id, borrowed_at)
            VALUES ($1, $2, $3)
            RETURNING id, book_isbn, borrower_id, borrowed_at, returned_at
            "#,
        )
        .bind(isbn)
        .bind(borrower_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(loan) => {
                tx.commit().await?;
                Ok(loan)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(AppError::from_write(e, &format!("Loan of {}", isbn)))
            }
        }
    }

    async fn close_for_borrower(&self, borrower_id: i32, isbns: &[String]) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $1
            WHERE borrower_id = $2
              AND book_isbn = ANY($3)
              AND returned_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(borrower_id)
        .bind(isbns)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_active(&self) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.returned_at IS NULL ORDER BY l.borrowed_at, b.isbn",
            LOAN_DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    async fn count_for_borrower(&self, filter: &LoanFilter) -> AppResult<i64> {
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM loans l
            JOIN books b ON b.isbn = l.book_isbn
            WHERE {}
            "#,
            BORROWER_FILTER
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.borrower_id)
            .bind(filter.title.as_deref().map(contains_pattern))
            .bind(filter.active_only)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_for_borrower(&self, filter: &LoanFilter, window: PageWindow) -> AppResult<Vec<LoanDetails>> {
        let order = if filter.active_only {
            "l.borrowed_at, b.isbn"
        } else {
            "l.returned_at ASC NULLS FIRST, b.isbn"
        };
        let sql = format!(
            "{} WHERE {} ORDER BY {} LIMIT $4 OFFSET $5",
            LOAN_DETAILS_SELECT, BORROWER_FILTER, order
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(filter.borrower_id)
            .bind(filter.title.as_deref().map(contains_pattern))
            .bind(filter.active_only)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }
}
