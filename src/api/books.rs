//! Catalog endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::NewBook,
        message::FlashMessage,
        page::ListQuery,
    },
    AppState,
};

use super::flash;

/// Book registration form, with the values to re-display
#[derive(Serialize, ToSchema)]
pub struct BookForm {
    pub values: NewBook,
    /// Inline error for the submitted values
    pub error: Option<String>,
    pub messages: Vec<FlashMessage>,
}

/// List the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of books ordered by ISBN", body = crate::models::page::BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.services.catalog.list_books(&query).await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(page.with_messages(messages))))
}

/// Empty registration form
#[utoipa::path(
    get,
    path = "/books/add",
    tag = "books",
    responses(
        (status = 200, description = "Registration form", body = BookForm)
    )
)]
pub async fn add_book_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, messages) = flash::take(jar);
    (
        jar,
        Json(BookForm {
            values: NewBook::default(),
            error: None,
            messages,
        }),
    )
}

/// Register a book
#[utoipa::path(
    post,
    path = "/books/add",
    tag = "books",
    request_body(content = NewBook, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered, or already registered; see flash messages"),
        (status = 400, description = "Invalid input", body = BookForm),
        (status = 409, description = "Rejected by a concurrent registration", body = BookForm)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NewBook>,
) -> AppResult<Response> {
    let book = form.trimmed();
    let secure = state.config.auth.secure_cookies;

    if let Err(errors) = book.validate() {
        let error = match AppError::from(errors) {
            AppError::Validation(msg) => msg,
            other => other.to_string(),
        };
        return Ok(form_page(StatusCode::BAD_REQUEST, book, Some(error), Vec::new()));
    }

    let title = book.title.clone();
    match state.services.catalog.register_book(book.clone()).await {
        Ok(created) => {
            let jar = flash::push(
                jar,
                vec![FlashMessage::success(format!("Registered \"{}\".", created.title))],
                secure,
            );
            Ok((jar, Redirect::to("/books/add")).into_response())
        }
        Err(AppError::ConstraintViolation(_)) => Ok(form_page(
            StatusCode::CONFLICT,
            book,
            None,
            vec![FlashMessage::warning(format!("Failed to register \"{}\".", title))],
        )),
        Err(e) => match e.notice() {
            Some(notice) => {
                let jar = flash::push(jar, vec![notice], secure);
                Ok((jar, Redirect::to("/books/add")).into_response())
            }
            None => Err(e),
        },
    }
}

fn form_page(status: StatusCode, values: NewBook, error: Option<String>, messages: Vec<FlashMessage>) -> Response {
    (
        status,
        Json(BookForm {
            values,
            error,
            messages,
        }),
    )
        .into_response()
}
