//! Login, signup and logout endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{message::FlashMessage, user::Credentials},
    AppState,
};

use super::{flash, AuthenticatedUser};

/// Login or signup form document
#[derive(Serialize, ToSchema)]
pub struct AccountForm {
    /// Username as submitted, never the password
    pub username: String,
    /// Inline error for the submitted values
    pub error: Option<String>,
    pub messages: Vec<FlashMessage>,
}

fn form_page(status: StatusCode, jar: CookieJar, username: String, error: Option<String>) -> Response {
    let (jar, messages) = flash::take(jar);
    (
        status,
        jar,
        Json(AccountForm {
            username,
            error,
            messages,
        }),
    )
        .into_response()
}

fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .build()
}

/// Empty login form
#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    responses(
        (status = 200, description = "Login form", body = AccountForm)
    )
)]
pub async fn login_form(jar: CookieJar) -> Response {
    form_page(StatusCode::OK, jar, String::new(), None)
}

/// Open a session
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirect to /home"),
        (status = 401, description = "Wrong username or password", body = AccountForm)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> AppResult<Response> {
    let auth = &state.services.auth;
    match auth.authenticate(&credentials).await {
        Ok((token, _user)) => {
            let jar = jar.add(session_cookie(auth.config(), token));
            Ok((jar, Redirect::to("/home")).into_response())
        }
        Err(AppError::Authentication(_)) => Ok(form_page(
            StatusCode::UNAUTHORIZED,
            jar,
            credentials.username,
            Some("Invalid username or password.".to_string()),
        )),
        Err(e) => Err(e),
    }
}

/// Empty signup form
#[utoipa::path(
    get,
    path = "/signup",
    tag = "auth",
    responses(
        (status = 200, description = "Signup form", body = AccountForm)
    )
)]
pub async fn signup_form(jar: CookieJar) -> Response {
    form_page(StatusCode::OK, jar, String::new(), None)
}

/// Create an account
#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created, redirect to /login"),
        (status = 400, description = "Invalid input", body = AccountForm),
        (status = 409, description = "Username taken", body = AccountForm)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut credentials): Form<Credentials>,
) -> AppResult<Response> {
    credentials.username = credentials.username.trim().to_string();

    if let Err(errors) = credentials.validate() {
        let error = match AppError::from(errors) {
            AppError::Validation(msg) => msg,
            other => other.to_string(),
        };
        return Ok(form_page(StatusCode::BAD_REQUEST, jar, credentials.username, Some(error)));
    }

    match state.services.auth.signup(&credentials).await {
        Ok(user) => {
            let jar = flash::push(
                jar,
                vec![FlashMessage::success(format!("Account \"{}\" created. Please log in.", user.username))],
                state.config.auth.secure_cookies,
            );
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(AppError::Conflict(msg)) => Ok(form_page(StatusCode::CONFLICT, jar, credentials.username, Some(msg))),
        Err(e) => Err(e),
    }
}

/// Close the session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    security(("session" = [])),
    responses(
        (status = 303, description = "Session cookie cleared, redirect to /login")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    jar: CookieJar,
) -> impl IntoResponse {
    let name = state.services.auth.config().session_cookie.clone();
    if let Some(user) = user {
        tracing::info!("Auth: user {} logged out", user.user_id());
    }
    (jar.remove(Cookie::build(name).path("/").build()), Redirect::to("/login"))
}
