//! Bookshelf Server
//!
//! A small library checkout tracker: a catalog of books keyed by ISBN,
//! borrowing and returning with at most one active loan per book, and
//! account sessions carried in a cookie.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
