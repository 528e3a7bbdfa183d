//! Defines functions for storing the session token in a private cookie.
//!
//! The token is created by the remote service at log in and is treated as
//! opaque: it is stored, attached to authenticated API calls, and removed at
//! log out or when the remote service rejects it. No validation of its format
//! or expiry happens on this side.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::Error;

pub(crate) const COOKIE_TOKEN: &str = "token";

/// How long the browser keeps the token cookie. The remote service expires
/// sessions on its own schedule regardless of this value.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(1);

/// An opaque session credential issued by the remote service at log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string received from the remote service.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as it should appear in the request header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Add the session token cookie to the cookie jar, indicating that a user is
/// logged in.
///
/// Sets the expiry of the cookie to `duration` from the current time. You can
/// use [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    token: &SessionToken,
    duration: Duration,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, token.as_str().to_owned()))
            .expires(OffsetDateTime::now_utc() + duration)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the token cookie to an invalid value and set its max age to zero, which
/// should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the session token from the cookie jar.
///
/// Presence is the only thing checked; the value "deleted" marks a cookie
/// that [invalidate_auth_cookie] has already expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<SessionToken, Error> {
    match jar.get(COOKIE_TOKEN) {
        Some(cookie) if cookie.value() != "deleted" => Ok(SessionToken::new(cookie.value())),
        _ => Err(Error::SessionMissing),
    }
}
