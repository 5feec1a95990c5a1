//! Data models for Bookshelf

pub mod book;
pub mod loan;
pub mod message;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookFilter, NewBook};
pub use loan::{BorrowOutcome, Loan, LoanDetails, LoanFilter};
pub use message::{FlashMessage, MessageLevel};
pub use page::{ListQuery, Page, PageWindow};
pub use user::{Credentials, User, UserClaims, UserShort};
