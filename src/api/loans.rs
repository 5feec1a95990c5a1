//! Loan lifecycle endpoints

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{BorrowOutcome, LoanDetails},
        message::FlashMessage,
        page::ListQuery,
    },
    AppState,
};

use super::{flash, AuthenticatedUser};

/// Form field carrying the JSON-encoded ISBN array
pub const SELECTED_ISBNS_FIELD: &str = "selected_isbns";

/// Administrative view of unreturned loans
#[derive(Serialize, ToSchema)]
pub struct LoanStatus {
    pub loans: Vec<LoanDetails>,
    pub messages: Vec<FlashMessage>,
}

/// Collect ISBNs from every `selected_isbns` field. Each value is a JSON
/// array of strings (numbers are accepted too); blank values are ignored.
pub fn selected_isbns(fields: &[(String, String)]) -> AppResult<Vec<String>> {
    let invalid = || AppError::BadRequest("Invalid book selection.".to_string());

    let mut isbns = Vec::new();
    for (_, raw) in fields.iter().filter(|(name, _)| name == SELECTED_ISBNS_FIELD) {
        if raw.trim().is_empty() {
            continue;
        }
        let values: Vec<Value> = serde_json::from_str(raw).map_err(|_| invalid())?;
        for value in values {
            match value {
                Value::String(s) => isbns.push(s),
                Value::Number(n) => isbns.push(n.to_string()),
                _ => return Err(invalid()),
            }
        }
    }
    Ok(isbns)
}

/// Titles listed by name in one message before the rest are counted
const LISTED_TITLES: usize = 5;

/// `"A", "B" and 3 more`
fn title_list(titles: &[String]) -> String {
    let shown = titles.iter().take(LISTED_TITLES).map(|t| format!("\"{}\"", t)).collect::<Vec<_>>();
    match titles.len().saturating_sub(LISTED_TITLES) {
        0 => shown.join(", "),
        rest => format!("{} and {} more", shown.join(", "), rest),
    }
}

/// Messages summarising a batch borrow
pub fn borrow_messages(outcome: &BorrowOutcome) -> Vec<FlashMessage> {
    let mut messages = Vec::new();
    if !outcome.borrowed.is_empty() {
        messages.push(FlashMessage::success(format!("Borrowed {}.", title_list(&outcome.borrowed))));
    }
    if !outcome.skipped.is_empty() {
        messages.push(FlashMessage::warning(format!("{} already on loan.", title_list(&outcome.skipped))));
    }
    if !outcome.unknown.is_empty() {
        let unknown = match outcome.unknown.len().saturating_sub(LISTED_TITLES) {
            0 => outcome.unknown.join(", "),
            rest => format!("{} and {} more", outcome.unknown[..LISTED_TITLES].join(", "), rest),
        };
        messages.push(FlashMessage::warning(format!("Not in the catalog: {}.", unknown)));
    }
    messages
}

/// PRG target: the same view with `q` and `page` preserved
fn back_to(path: &str, query: &ListQuery) -> String {
    let qs = query.to_query_string();
    if qs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, qs)
    }
}

fn into_notice(err: AppError) -> AppResult<FlashMessage> {
    match err.notice() {
        Some(notice) => Ok(notice),
        None => Err(err),
    }
}

/// List every unreturned loan
#[utoipa::path(
    get,
    path = "/loans/active",
    tag = "loans",
    responses(
        (status = 200, description = "Unreturned loans, all borrowers", body = LoanStatus)
    )
)]
pub async fn list_active_loans(State(state): State<AppState>, jar: CookieJar) -> AppResult<impl IntoResponse> {
    let loans = state.services.loans.list_active_loans().await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(LoanStatus { loans, messages })))
}

/// The caller's loan history
#[utoipa::path(
    get,
    path = "/home",
    tag = "loans",
    security(("session" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Caller's loans, unreturned first", body = crate::models::page::LoanPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn home(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.services.loans.list_my_loans(user.user_id(), &query).await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(page.with_messages(messages))))
}

/// Books available to borrow
#[utoipa::path(
    get,
    path = "/borrow",
    tag = "loans",
    security(("session" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Books with no active loan", body = crate::models::page::BookPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrowable(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.services.loans.list_borrowable(&query).await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(page.with_messages(messages))))
}

/// Borrow the selected books
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "loans",
    security(("session" = [])),
    params(ListQuery),
    request_body(
        content = String,
        content_type = "application/x-www-form-urlencoded",
        description = "`selected_isbns`: JSON array of ISBNs"
    ),
    responses(
        (status = 303, description = "Back to the borrow view; outcome in flash messages"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn borrow(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let messages = match selected_isbns(&fields) {
        Ok(isbns) => match state.services.loans.borrow(user.user_id(), &isbns).await {
            Ok(outcome) => borrow_messages(&outcome),
            Err(e) => vec![into_notice(e)?],
        },
        Err(e) => vec![into_notice(e)?],
    };

    let jar = flash::push(jar, messages, state.config.auth.secure_cookies);
    Ok((jar, Redirect::to(&back_to("/borrow", &query))).into_response())
}

/// The caller's unreturned loans
#[utoipa::path(
    get,
    path = "/return",
    tag = "loans",
    security(("session" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Caller's unreturned loans, oldest first", body = crate::models::page::LoanPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_returnable(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.services.loans.list_returnable(user.user_id(), &query).await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(page.with_messages(messages))))
}

/// Return the selected books
#[utoipa::path(
    post,
    path = "/return",
    tag = "loans",
    security(("session" = [])),
    params(ListQuery),
    request_body(
        content = String,
        content_type = "application/x-www-form-urlencoded",
        description = "`selected_isbns`: JSON array of ISBNs"
    ),
    responses(
        (status = 303, description = "Back to the return view; outcome in flash messages"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn return_books(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let message = match selected_isbns(&fields) {
        Ok(isbns) => match state.services.loans.return_books(user.user_id(), &isbns).await {
            Ok(count) => FlashMessage::success(format!("Returned {} book(s).", count)),
            Err(e) => into_notice(e)?,
        },
        Err(e) => into_notice(e)?,
    };

    let jar = flash::push(jar, vec![message], state.config.auth.secure_cookies);
    Ok((jar, Redirect::to(&back_to("/return", &query))).into_response())
}
