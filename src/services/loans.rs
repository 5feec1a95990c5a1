//! Loan management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter},
        loan::{normalize_isbns, BorrowOutcome, LoanDetails, LoanFilter},
        page::{resolve_page, ListQuery, Page},
    },
    repository::{BookStore, LoanLedger},
};

use super::catalog::book_page;

#[derive(Clone)]
pub struct LoansService {
    books: Arc<dyn BookStore>,
    loans: Arc<dyn LoanLedger>,
    page_size: i64,
}

impl LoansService {
    pub fn new(books: Arc<dyn BookStore>, loans: Arc<dyn LoanLedger>, page_size: i64) -> Self {
        Self {
            books,
            loans,
            page_size,
        }
    }

    /// Books with zero active loans
    pub async fn list_borrowable(&self, query: &ListQuery) -> AppResult<Page<Book>> {
        let filter = BookFilter {
            title: query.search_term(),
            borrowable_only: true,
        };
        book_page(self.books.as_ref(), &filter, query, self.page_size).await
    }

    /// Every unreturned loan, across all borrowers
    pub async fn list_active_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.loans.list_active().await
    }

    /// The borrower's loan history, unreturned loans first
    pub async fn list_my_loans(&self, borrower_id: i32, query: &ListQuery) -> AppResult<Page<LoanDetails>> {
        let filter = LoanFilter {
            borrower_id,
            title: query.search_term(),
            active_only: false,
        };
        self.loan_page(&filter, query).await
    }

    /// The borrower's unreturned loans, oldest first
    pub async fn list_returnable(&self, borrower_id: i32, query: &ListQuery) -> AppResult<Page<LoanDetails>> {
        let filter = LoanFilter {
            borrower_id,
            title: query.search_term(),
            active_only: true,
        };
        self.loan_page(&filter, query).await
    }

    async fn loan_page(&self, filter: &LoanFilter, query: &ListQuery) -> AppResult<Page<LoanDetails>> {
        let total = self.loans.count_for_borrower(filter).await?;
        let window = resolve_page(query.page.as_deref(), total, self.page_size);
        let loans = self.loans.list_for_borrower(filter, window).await?;
        Ok(Page::new(loans, total, window, query))
    }

    /// Borrow each requested book independently.
    ///
    /// A book already on loan is skipped up front. Otherwise the loan is opened
    /// in its own transaction; losing a race on the active-loan constraint
    /// only skips that one book.
    pub async fn borrow(&self, borrower_id: i32, isbns: &[String]) -> AppResult<BorrowOutcome> {
        let isbns = normalize_isbns(isbns);
        if isbns.is_empty() {
            return Err(AppError::NoSelection);
        }

        let mut outcome = BorrowOutcome::default();
        for isbn in isbns {
            let Some(book) = self.books.get(&isbn).await? else {
                tracing::warn!("Borrow: user {} requested unknown ISBN {}", borrower_id, isbn);
                outcome.unknown.push(isbn);
                continue;
            };

            if self.loans.is_on_loan(&book.isbn).await? {
                outcome.skipped.push(book.title);
                continue;
            }

            match self.loans.open(&book.isbn, borrower_id).await {
                Ok(loan) => {
                    tracing::info!("Borrow: loan {} opened on {} for user {}", loan.id, book.isbn, borrower_id);
                    outcome.borrowed.push(book.title);
                }
                Err(AppError::ConstraintViolation(msg)) => {
                    tracing::warn!("Borrow: {} lost a concurrent borrow ({})", book.isbn, msg);
                    outcome.skipped.push(book.title);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    /// Return the borrower's unreturned loans on the given books in one
    /// bulk update. Returns the number of loans closed.
    pub async fn return_books(&self, borrower_id: i32, isbns: &[String]) -> AppResult<u64> {
        let isbns = normalize_isbns(isbns);
        if isbns.is_empty() {
            return Err(AppError::NoSelection);
        }

        let updated = self.loans.close_for_borrower(borrower_id, &isbns).await?;
        if updated == 0 {
            return Err(AppError::NothingToReturn);
        }

        tracing::info!("Return: user {} returned {} loan(s)", borrower_id, updated);
        Ok(updated)
    }
}
