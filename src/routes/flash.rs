//! One-shot messages carried across a redirect in an encrypted cookie.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};

const FLASH_COOKIE: &str = "trip_flash";

pub fn set(jar: PrivateCookieJar, message: impl Into<String>) -> PrivateCookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, message.into()))
            .path("/")
            .http_only(true),
    )
}

/// Reads the pending message, if any, and clears it.
pub fn take(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<String>) {
    let message = jar.get(FLASH_COOKIE).map(|cookie| cookie.value().to_string());
    if message.is_none() {
        return (jar, None);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), message)
}
