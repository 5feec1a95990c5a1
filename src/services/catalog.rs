//! Catalog management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, NewBook},
        page::{resolve_page, ListQuery, Page},
    },
    repository::BookStore,
};

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
    page_size: i64,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookStore>, page_size: i64) -> Self {
        Self { books, page_size }
    }

    /// Database connectivity check
    pub async fn ping(&self) -> AppResult<()> {
        self.books.ping().await
    }

    /// List books ordered by ISBN, optionally filtered by title
    pub async fn list_books(&self, query: &ListQuery) -> AppResult<Page<Book>> {
        let filter = BookFilter {
            title: query.search_term(),
            borrowable_only: false,
        };
        book_page(self.books.as_ref(), &filter, query, self.page_size).await
    }

    /// Register a book.
    ///
    /// The existence pre-check turns the common duplicate into `DuplicateIsbn`;
    /// the primary key still rejects a concurrent identical insert, which
    /// surfaces as `ConstraintViolation`.
    pub async fn register_book(&self, book: NewBook) -> AppResult<Book> {
        if self.books.exists(&book.isbn).await? {
            tracing::info!("Catalog register: ISBN {} already registered", book.isbn);
            return Err(AppError::DuplicateIsbn(book.title));
        }

        let created = self.books.create(&book).await?;
        tracing::info!("Catalog register: created {} ({})", created.isbn, created.title);
        Ok(created)
    }
}

/// Count, resolve the requested page, then fetch it
pub(crate) async fn book_page(
    books: &dyn BookStore,
    filter: &BookFilter,
    query: &ListQuery,
    page_size: i64,
) -> AppResult<Page<Book>> {
    let total = books.count(filter).await?;
    let window = resolve_page(query.page.as_deref(), total, page_size);
    let items = books.list(filter, window).await?;
    Ok(Page::new(items, total, window, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::page::PageWindow, repository::MockBookStore};

    fn title_a() -> NewBook {
        NewBook {
            title: "Title A".to_string(),
            author: "Author A".to_string(),
            isbn: "1111111111111".to_string(),
        }
    }

    fn as_book(b: &NewBook) -> Book {
        Book {
            isbn: b.isbn.clone(),
            title: b.title.clone(),
            author: b.author.clone(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_new_book() {
        let mut books = MockBookStore::new();
        books.expect_exists().returning(|_| Ok(false));
        books.expect_create().times(1).returning(|b| Ok(as_book(b)));

        let service = CatalogService::new(Arc::new(books), 15);
        let created = service.register_book(title_a()).await.unwrap();
        assert_eq!(created.isbn, "1111111111111");
    }

    #[tokio::test]
    async fn test_register_duplicate_is_noop() {
        let mut books = MockBookStore::new();
        books.expect_exists().returning(|_| Ok(true));
        books.expect_create().never();

        let service = CatalogService::new(Arc::new(books), 15);
        let err = service.register_book(title_a()).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIsbn(ref t) if t == "Title A"));
    }

    #[tokio::test]
    async fn test_register_race_reports_constraint_violation() {
        let mut books = MockBookStore::new();
        books.expect_exists().returning(|_| Ok(false));
        books
            .expect_create()
            .returning(|_| Err(AppError::ConstraintViolation("books_pkey".to_string())));

        let service = CatalogService::new(Arc::new(books), 15);
        let err = service.register_book(title_a()).await.unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_page_lists_first_page() {
        let mut books = MockBookStore::new();
        books.expect_count().returning(|_| Ok(2));
        books
            .expect_list()
            .withf(|filter, window| {
                filter.title.is_none() && *window == PageWindow { page: 1, per_page: 15 }
            })
            .returning(|_, _| Ok(vec![as_book(&title_a())]));

        let service = CatalogService::new(Arc::new(books), 15);
        for page in ["abc", "999"] {
            let query = ListQuery {
                q: None,
                page: Some(page.to_string()),
            };
            let result = service.list_books(&query).await.unwrap();
            assert_eq!(result.page, 1);
            assert_eq!(result.items.len(), 1);
        }
    }
}
