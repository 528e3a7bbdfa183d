//! Adding and deleting records.
//!
//! Both operations forward to the remote API and then send the browser back
//! to the dashboard, so the visible list always reflects a fresh fetch rather
//! than an optimistic local update.

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    alert::{alert_error, render},
    api::{ApiClient, ApiError, NewRecord},
    auth_cookie::{SessionToken, invalidate_auth_cookie},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    log_in::SERVICE_ERROR_MSG,
};

/// The form for adding a record, displayed on the dashboard page.
pub(crate) fn record_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::RECORDS_API)
            hx-target-error="#alert-container"
            hx-swap="innerHTML"
            class="w-full space-y-4"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    step="0.01"
                    name="amount"
                    id="amount"
                    placeholder="-4.50"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;

                p class="text-sm font-light text-gray-500 dark:text-gray-400"
                {
                    "Positive for income, negative for expenses."
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                input
                    type="text"
                    name="category"
                    id="category"
                    placeholder="Groceries"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    type="text"
                    name="description"
                    id="description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Add Record"
            }
        }
    }
}

/// The state needed to add or delete a record.
#[derive(Debug, Clone)]
pub struct RecordActionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The client for the remote money tracker API.
    pub api: ApiClient,
}

impl FromRef<AppState> for RecordActionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            api: state.api.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RecordActionState> for Key {
    fn from_ref(state: &RecordActionState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the add-record form.
///
/// The amount arrives as text so that a non-numeric value can be rejected
/// with an alert instead of a silent deserialization failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordForm {
    /// The value of the record as entered by the user.
    pub amount: String,
    /// The category to file the record under.
    pub category: String,
    /// Text detailing the record.
    pub description: String,
}

/// A route handler for adding a record.
///
/// The amount is checked here; nothing is sent to the remote API unless it
/// parses as a number. On success the client is redirected to the dashboard
/// so the list is re-fetched, which also clears the form.
pub async fn create_record_endpoint(
    State(state): State<RecordActionState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<RecordForm>,
) -> Response {
    let amount = match form.amount.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            return render(
                StatusCode::BAD_REQUEST,
                alert_error(
                    "Could not add record",
                    "Enter a valid number for the amount.",
                ),
            );
        }
    };

    let record = NewRecord {
        amount,
        category: form.category,
        description: form.description,
    };

    match state.api.create_record(&token, &record).await {
        Ok(()) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            (),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not add record: {error}");
            let (status, message) = alert_content(&error);

            render(status, alert_error("Could not add record", &message))
        }
    }
}

/// A route handler for deleting a record.
///
/// Mirrors the dashboard's handling of a rejected session: a 401 from the
/// remote API expires the token cookie and sends the client to the log-in
/// page. On success the client is redirected to the dashboard so the list is
/// re-fetched.
pub async fn delete_record_endpoint(
    State(state): State<RecordActionState>,
    Extension(token): Extension<SessionToken>,
    jar: PrivateCookieJar,
    Path(record_id): Path<i64>,
) -> Response {
    match state.api.delete_record(&token, record_id).await {
        Ok(()) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            (),
        )
            .into_response(),
        Err(ApiError::Unauthorized { .. }) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            invalidate_auth_cookie(jar),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not delete record {record_id}: {error}");
            let (status, message) = alert_content(&error);

            render(status, alert_error("Could not delete record", &message))
        }
    }
}

/// The status code and user-facing message for an alert reporting `error`.
fn alert_content(error: &ApiError) -> (StatusCode, String) {
    match error {
        ApiError::Api { status, message } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message.clone(),
        ),
        ApiError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message.clone()),
        ApiError::Unreachable(_) | ApiError::InvalidResponse => (
            StatusCode::INTERNAL_SERVER_ERROR,
            SERVICE_ERROR_MSG.to_owned(),
        ),
    }
}

#[cfg(test)]
mod record_form_tests {
    use crate::endpoints;

    use super::record_form;

    #[test]
    fn form_posts_to_records_endpoint() {
        let fragment = scraper::Html::parse_fragment(&record_form().into_string());

        let form_selector = scraper::Selector::parse("form").unwrap();
        let form = fragment
            .select(&form_selector)
            .next()
            .expect("expected a form");
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::RECORDS_API));

        for selector_string in [
            "input[type=number]#amount",
            "input[type=text]#category",
            "input[type=text]#description",
        ] {
            let input_selector = scraper::Selector::parse(selector_string).unwrap();
            assert_eq!(
                form.select(&input_selector).count(),
                1,
                "want 1 input matching {selector_string}"
            );
        }
    }
}
