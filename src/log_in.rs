//! This file defines the routes for displaying the log-in page and handling
//! log-in requests. Credentials are forwarded to the remote API, which issues
//! the session token stored by the cookie layer.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState,
    api::{ApiClient, ApiError},
    auth_cookie::set_auth_cookie,
    auth_middleware::normalize_redirect_url,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, log_in_register, password_input, text_input},
};

/// Shown when the remote API could not be reached or sent back something that
/// was not JSON.
pub(crate) const SERVICE_ERROR_MSG: &str =
    "Could not reach the money tracker service. Try again later.";

fn log_in_form(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("Username", "username", username, None))
            (password_input("Password", "password", 0, error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

/// The query string of the log-in page.
#[derive(Deserialize)]
pub struct RedirectQuery {
    /// The app-local URL to return to after logging in.
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = query.redirect_url.as_deref().and_then(normalize_redirect_url);
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);

    base("Log In", &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which the session token cookie is valid.
    pub cookie_duration: Duration,
    /// The client for the remote money tracker API.
    pub api: ApiClient,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            api: state.api.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// Neither field is validated here: the remote API compares the credentials
/// against its own store and reports the outcome.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,

    /// Password entered during log-in.
    pub password: String,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in the token returned by the remote API is stored in
/// the cookie jar and the client is redirected to the dashboard page (or the
/// preserved `redirect_url`). Otherwise, the form is returned with an error
/// message explaining the problem and no cookie is set.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = user_data
        .redirect_url
        .as_deref()
        .and_then(normalize_redirect_url);
    let redirect_url = redirect_url.as_deref();

    let token = match state
        .api
        .log_in(&user_data.username, &user_data.password)
        .await
    {
        Ok(token) => token,
        Err(ApiError::Unauthorized { message }) | Err(ApiError::Api { message, .. }) => {
            return log_in_form(&user_data.username, Some(message.as_str()), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Could not log in via the records service: {error}");

            return log_in_form(&user_data.username, Some(SERVICE_ERROR_MSG), redirect_url)
                .into_response();
        }
    };

    let jar = set_auth_cookie(jar, &token, state.cookie_duration);
    let redirect_url = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    (
        StatusCode::SEE_OTHER,
        HxRedirect(redirect_url.to_owned()),
        jar,
    )
        .into_response()
}
