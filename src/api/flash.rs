//! Flash messages stored in a cookie across the PRG redirect

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::models::message::FlashMessage;

pub const FLASH_COOKIE: &str = "flash";

/// Browsers silently drop cookies larger than this (name, value and attributes)
pub const MAX_COOKIE_SIZE: usize = 4096;

fn encode(messages: &[FlashMessage]) -> Option<String> {
    serde_json::to_vec(messages)
        .ok()
        .map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
}

fn decode(value: &str) -> Vec<FlashMessage> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn build(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Encode `messages` into a cookie within [`MAX_COOKIE_SIZE`]. The oldest
/// messages are dropped first; a lone oversized message is shortened.
fn fitted(mut messages: Vec<FlashMessage>, secure: bool) -> Option<Cookie<'static>> {
    loop {
        let cookie = build(encode(&messages)?, secure);
        if cookie.to_string().len() <= MAX_COOKIE_SIZE {
            return Some(cookie);
        }

        if messages.len() > 1 {
            messages.remove(0);
        } else {
            let last = messages.last_mut()?;
            let keep = last.text.chars().count() / 2;
            if keep == 0 {
                return None;
            }
            last.text = last.text.chars().take(keep).chain(std::iter::once('…')).collect();
        }
    }
}

fn removal() -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, "")).path("/").build()
}

/// Queue messages for the next page view, after any still pending
pub fn push(jar: CookieJar, messages: Vec<FlashMessage>, secure: bool) -> CookieJar {
    if messages.is_empty() {
        return jar;
    }

    let mut pending = jar.get(FLASH_COOKIE).map(|c| decode(c.value())).unwrap_or_default();
    pending.extend(messages);

    match fitted(pending, secure) {
        Some(cookie) => jar.add(cookie),
        None => jar,
    }
}

/// Drain pending messages. A malformed cookie yields no messages.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    match jar.get(FLASH_COOKIE).map(|c| decode(c.value())) {
        Some(messages) => (jar.remove(removal()), messages),
        None => (jar, Vec::new()),
    }
}
