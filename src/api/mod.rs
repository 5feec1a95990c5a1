//! HTTP handlers for Bookshelf endpoints

pub mod auth;
pub mod books;
pub mod flash;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Caller identity, from the session cookie or a Bearer token
pub struct AuthenticatedUser(pub UserClaims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = &state.services.auth;
        let jar = CookieJar::from_headers(&parts.headers);
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        // A stale session cookie must not hide a valid Bearer token
        let from_cookie = jar
            .get(&auth.config().session_cookie)
            .map(|cookie| auth.verify_token(cookie.value()));

        match (from_cookie, bearer) {
            (Some(Ok(claims)), _) => Ok(AuthenticatedUser(claims)),
            (_, Some(token)) => auth.verify_token(token).map(AuthenticatedUser),
            (Some(Err(e)), None) => Err(e),
            (None, None) => Err(AppError::Authentication("Login required".to_string())),
        }
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Sessions
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/logout", get(auth::logout).post(auth::logout))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/add", get(books::add_book_form).post(books::add_book))
        // Loans
        .route("/loans/active", get(loans::list_active_loans))
        .route("/home", get(loans::home).post(loans::home))
        .route("/borrow", get(loans::list_borrowable).post(loans::borrow))
        .route("/return", get(loans::list_returnable).post(loans::return_books))
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
}
