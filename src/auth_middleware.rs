//! Middleware that guards pages behind the presence of a session token.
//!
//! The token itself is never validated here; the remote API is the authority
//! and rejects stale tokens with a 401 when they are used.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;

use crate::{AppState, auth_cookie::get_token_from_cookies, endpoints};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Keep only redirect targets that stay within this app: absolute paths that
/// are not protocol-relative URLs.
pub(crate) fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    if raw_url.starts_with('/') && !raw_url.starts_with("//") {
        Some(raw_url.to_owned())
    } else {
        None
    }
}

/// Extract an app-local path from the full URL HTMX reports in its
/// `HX-Current-URL` header.
fn current_url_path(header_value: &str) -> Option<String> {
    let uri: Uri = header_value.parse().ok()?;
    let path = uri.path_and_query()?.to_string();

    normalize_redirect_url(&path)
}

/// Build the log in page URL, preserving the URL the user was trying to reach
/// in a `redirect_url` query parameter so that logging in can return there.
fn build_log_in_redirect_url(request: &Request) -> String {
    let redirect_url = request
        .headers()
        .get("hx-current-url")
        .and_then(|value| value.to_str().ok())
        .and_then(current_url_path)
        .or_else(|| {
            request
                .uri()
                .path_and_query()
                .map(|path_and_query| path_and_query.to_string())
                .and_then(|path| normalize_redirect_url(&path))
        })
        // API paths are not pages, so they make no sense as a post-log-in
        // destination. Logging in falls back to the dashboard instead.
        .filter(|url| !url.starts_with("/api/"));

    match redirect_url {
        Some(url) => {
            let query =
                serde_urlencoded::to_string([("redirect_url", url.as_str())]).unwrap_or_default();

            if query.is_empty() {
                endpoints::LOG_IN_VIEW.to_owned()
            } else {
                format!("{}?{}", endpoints::LOG_IN_VIEW, query)
            }
        }
        None => endpoints::LOG_IN_VIEW.to_owned(),
    }
}

/// Middleware function that checks for the session token cookie.
/// The token is placed into the request and then the request executed normally
/// if the cookie is present, otherwise a redirect to the log-in page is
/// returned using `get_redirect`.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(token): Extension<SessionToken>` to receive the token.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request);

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };

    parts.extensions.insert(token);

    next.run(Request::from_parts(parts, body)).await
}

/// Middleware function that checks for the session token cookie, redirecting
/// to the log-in page via a `Location` header when it is missing.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware function that checks for the session token cookie, redirecting
/// to the log-in page via an `HX-Redirect` header so that HTMX-initiated
/// requests navigate properly.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}
