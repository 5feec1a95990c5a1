//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "0.3.0",
        description = "Library checkout tracker: catalog, borrowing and returns"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login_form,
        auth::login,
        auth::signup_form,
        auth::signup,
        auth::logout,
        // Catalog
        books::list_books,
        books::add_book_form,
        books::add_book,
        // Loans
        loans::list_active_loans,
        loans::home,
        loans::list_borrowable,
        loans::borrow,
        loans::list_returnable,
        loans::return_books,
    ),
    components(
        schemas(
            // Auth
            auth::AccountForm,
            crate::models::user::Credentials,
            crate::models::user::UserShort,
            // Catalog
            books::BookForm,
            crate::models::book::Book,
            crate::models::book::NewBook,
            crate::models::page::BookPage,
            // Loans
            loans::LoanStatus,
            crate::models::loan::LoanDetails,
            crate::models::loan::BorrowOutcome,
            crate::models::page::LoanPage,
            // Messages
            crate::models::message::FlashMessage,
            crate::models::message::MessageLevel,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "books", description = "Catalog"),
        (name = "loans", description = "Borrowing and returns")
    )
)]
pub struct ApiDoc;

/// Declares the `session` cookie scheme referenced by protected paths
struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
