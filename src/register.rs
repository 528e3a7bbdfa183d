//! The registration page for creating an account with the money tracker
//! service.
//!
//! Field checks run before any request so that obviously bad input never
//! leaves the page; the remote API applies its own rules on top.

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    api::{ApiClient, ApiError},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, log_in_register, password_input, text_input},
    log_in::SERVICE_ERROR_MSG,
};

/// The longest username the remote service accepts.
pub(crate) const MAX_USERNAME_LENGTH: usize = 50;

/// The minimum number of characters a password must have.
pub(crate) const MIN_PASSWORD_LENGTH: usize = 6;

/// The error messages to display inside the registration form.
#[derive(Default)]
struct RegistrationErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
    /// An error that is not tied to a single field, e.g. a failure reported
    /// by the remote service.
    form: Option<&'a str>,
}

fn registration_form(username: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            class="space-y-4 md:space-y-6"
        {
            (text_input("Username", "username", username, errors.username))
            (password_input(
                "Password",
                "password",
                MIN_PASSWORD_LENGTH as u8,
                errors.password,
            ))
            (password_input(
                "Confirm Password",
                "confirm_password",
                MIN_PASSWORD_LENGTH as u8,
                errors.confirm_password,
            ))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Account"
            }

            @if let Some(error_message) = errors.form
            {
                p class="text-red-500 text-base" { (error_message) }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create an account", &registration_form);

    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The client for the remote money tracker API.
    pub api: ApiClient,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
        }
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name for the new account.
    pub username: String,
    /// The password for the new account.
    pub password: String,
    /// A repeat of `password` to catch typos.
    pub confirm_password: String,
}

/// Handler for registration requests via the POST method.
///
/// On success the client is redirected to the log-in page. Invalid input is
/// reported by re-rendering the form with inline errors before any request is
/// made to the remote API.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if user_data.username.is_empty() {
        return registration_form(
            &user_data.username,
            RegistrationErrors {
                username: Some("Username must not be empty."),
                ..Default::default()
            },
        )
        .into_response();
    }

    if user_data.username.chars().count() > MAX_USERNAME_LENGTH {
        return registration_form(
            &user_data.username,
            RegistrationErrors {
                username: Some("Username must be at most 50 characters."),
                ..Default::default()
            },
        )
        .into_response();
    }

    if user_data.password.is_empty() {
        return registration_form(
            &user_data.username,
            RegistrationErrors {
                password: Some("Password must not be empty."),
                ..Default::default()
            },
        )
        .into_response();
    }

    if user_data.password.chars().count() < MIN_PASSWORD_LENGTH {
        return registration_form(
            &user_data.username,
            RegistrationErrors {
                password: Some("Password must be at least 6 characters."),
                ..Default::default()
            },
        )
        .into_response();
    }

    if user_data.password != user_data.confirm_password {
        return registration_form(
            &user_data.username,
            RegistrationErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    match state
        .api
        .register(&user_data.username, &user_data.password)
        .await
    {
        Ok(()) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            (),
        )
            .into_response(),
        Err(ApiError::Unauthorized { message }) | Err(ApiError::Api { message, .. }) => {
            registration_form(
                &user_data.username,
                RegistrationErrors {
                    form: Some(message.as_str()),
                    ..Default::default()
                },
            )
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not register via the records service: {error}");

            registration_form(
                &user_data.username,
                RegistrationErrors {
                    form: Some(SERVICE_ERROR_MSG),
                    ..Default::default()
                },
            )
            .into_response()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use crate::{
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        let hx_post = form.value().attr("hx-post");
        assert_eq!(
            hx_post,
            Some(endpoints::USERS),
            "want form with attribute hx-post=\"{}\", got {:?}",
            endpoints::USERS,
            hx_post
        );

        for selector_string in [
            "input[type=text]#username",
            "input[type=password]#password",
            "input[type=password]#confirm_password",
        ] {
            let input_selector = scraper::Selector::parse(selector_string).unwrap();
            let inputs = form.select(&input_selector).collect::<Vec<_>>();
            assert_eq!(
                inputs.len(),
                1,
                "want 1 input matching {selector_string}, got {}",
                inputs.len()
            );
        }

        let log_in_link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&log_in_link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(
            links.first().unwrap().value().attr("href"),
            Some(endpoints::LOG_IN_VIEW),
        );
    }
}
