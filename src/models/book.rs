//! Book (catalog) model and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// ISBN-10 or ISBN-13, digits only
static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}(\d{3})?$").unwrap());

/// Book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,
}

/// Book registration form (`POST /books/add`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewBook {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    #[serde(default)]
    pub title: String,
    #[validate(length(min = 1, max = 50, message = "Author must be 1 to 50 characters"))]
    #[serde(default)]
    pub author: String,
    #[validate(regex(path = *ISBN_RE, message = "ISBN must be 10 or 13 digits"))]
    #[serde(default)]
    pub isbn: String,
}

impl NewBook {
    /// Strip surrounding whitespace from every field
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
        }
    }
}

/// Catalog filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Only books without an active loan
    pub borrowable_only: bool,
}
