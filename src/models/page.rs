//! Search and pagination shared by every list view

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{book::Book, loan::LoanDetails, message::FlashMessage};

/// `?q=&page=` query parameters.
///
/// Both fields are kept as raw strings so that malformed input never rejects
/// the request; see [`resolve_page`].
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive title search
    pub q: Option<String>,
    /// Page number, starting at 1
    pub page: Option<String>,
}

impl ListQuery {
    /// Trimmed search term, `None` when absent or blank
    pub fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Query string to carry over a redirect (`q` and `page` only)
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("q", q));
        }
        if let Some(page) = self.page.as_deref().filter(|p| !p.is_empty()) {
            pairs.push(("page", page));
        }
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

/// LIMIT/OFFSET window for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Number of pages for `total` rows. An empty result still has one page.
pub fn num_pages(total: i64, per_page: i64) -> i64 {
    let per_page = per_page.max(1);
    ((total + per_page - 1) / per_page).max(1)
}

/// Resolve the requested page. Anything that is not an integer within
/// `1..=num_pages` falls back to page 1.
pub fn resolve_page(raw: Option<&str>, total: i64, per_page: i64) -> PageWindow {
    let last = num_pages(total, per_page);
    let page = raw
        .and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| (1..=last).contains(p))
        .unwrap_or(1);

    PageWindow {
        page,
        per_page: per_page.max(1),
    }
}

/// One page of a list view
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(BookPage = Page<Book>, LoanPage = Page<LoanDetails>)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter across all pages
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
    /// Search query as submitted
    pub q: String,
    /// Pending flash messages for the caller
    pub messages: Vec<FlashMessage>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, window: PageWindow, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            num_pages: num_pages(total, window.per_page),
            q: query.q.clone().unwrap_or_default(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<FlashMessage>) -> Self {
        self.messages = messages;
        self
    }
}
