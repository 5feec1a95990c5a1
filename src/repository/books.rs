//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, NewBook},
        page::PageWindow,
    },
};

use super::{contains_pattern, BookStore};

/// Shared WHERE clause: $1 is an optional ILIKE pattern, $2 restricts to
/// books without an unreturned loan.
const BOOK_FILTER: &str = r#"
    ($1::text IS NULL OR b.title ILIKE $1 ESCAPE '\')
    AND (NOT $2 OR NOT EXISTS (
        SELECT 1 FROM loans l
        WHERE l.book_isbn = b.isbn AND l.returned_at IS NULL
    ))
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get book by ISBN
    async fn get(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT isbn, title, author FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn exists(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a new book
    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, title, author)
            VALUES ($1, $2, $3)
            RETURNING isbn, title, author
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, &format!("Book {}", book.isbn)))
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM books b WHERE {}", BOOK_FILTER);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.title.as_deref().map(contains_pattern))
            .bind(filter.borrowable_only)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, filter: &BookFilter, window: PageWindow) -> AppResult<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT b.isbn, b.title, b.author
            FROM books b
            WHERE {}
            ORDER BY b.isbn
            LIMIT $3 OFFSET $4
            "#,
            BOOK_FILTER
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(filter.title.as_deref().map(contains_pattern))
            .bind(filter.borrowable_only)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }
}
