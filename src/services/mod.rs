//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    repository::{BookStore, LoanLedger, Repository, UserStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services backed by the Postgres repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self::from_stores(
            Arc::new(repository.books),
            Arc::new(repository.loans),
            Arc::new(repository.users),
            config,
        )
    }

    /// Create all services over arbitrary store implementations
    pub fn from_stores(
        books: Arc<dyn BookStore>,
        loans: Arc<dyn LoanLedger>,
        users: Arc<dyn UserStore>,
        config: &AppConfig,
    ) -> Self {
        let page_size = config.catalog.page_size;
        Self {
            auth: auth::AuthService::new(users, config.auth.clone()),
            catalog: catalog::CatalogService::new(books.clone(), page_size),
            loans: loans::LoansService::new(books, loans, page_size),
        }
    }
}
