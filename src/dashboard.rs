//! The dashboard page: the user's records, their running total, and the form
//! for adding a new record.
//!
//! Records are fetched from the remote API on every page load. Nothing is
//! cached between loads, so whatever the table shows is whatever the remote
//! service answered moments ago.

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use time::UtcOffset;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    alert::alert_error,
    api::{ApiClient, ApiError, Record},
    auth_cookie::{SessionToken, invalidate_auth_cookie},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, amount_class, base, format_amount, format_total,
    },
    log_in::SERVICE_ERROR_MSG,
    navigation::NavBar,
    record::record_form,
    timezone::{format_local_date, get_local_offset},
};

/// The max number of graphemes to display in the record table rows before
/// truncating and displaying ellipses.
const MAX_DESCRIPTION_GRAPHEMES: usize = 32;

/// The state needed to display the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The client for the remote money tracker API.
    pub api: ApiClient,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            api: state.api.clone(),
        }
    }
}

/// A route handler for displaying the dashboard page.
///
/// A 401 from the remote API means the stored token is no longer good for
/// anything: the cookie is expired and the client sent back to the log-in
/// page. Any other failure is reported on the page, which stays usable.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(token): Extension<SessionToken>,
    jar: PrivateCookieJar,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezone(state.local_timezone).into_response();
    };

    match state.api.records(&token).await {
        Ok(records) => {
            let rows = build_rows(&records, local_offset);
            let total = records.iter().map(|record| record.amount).sum();

            dashboard_view(&rows, total, None).into_response()
        }
        Err(ApiError::Unauthorized { .. }) => (
            invalidate_auth_cookie(jar),
            Redirect::to(endpoints::LOG_IN_VIEW),
        )
            .into_response(),
        Err(ApiError::Api { status, message }) => {
            tracing::error!("Could not load records: API returned status {status}: {message}");

            dashboard_view(&[], 0.0, Some(message.as_str())).into_response()
        }
        Err(error) => {
            tracing::error!("Could not load records: {error}");

            dashboard_view(&[], 0.0, Some(SERVICE_ERROR_MSG)).into_response()
        }
    }
}

/// One row of the records table, ready for display.
struct RecordRow {
    date_label: String,
    category_label: String,
    amount: f64,
    description: String,
    delete_url: String,
}

fn build_rows(records: &[Record], local_offset: UtcOffset) -> Vec<RecordRow> {
    records
        .iter()
        .map(|record| RecordRow {
            date_label: record
                .date
                .as_deref()
                .and_then(|raw| format_local_date(raw, local_offset))
                .unwrap_or_else(|| "Unknown date".to_owned()),
            category_label: record
                .category
                .clone()
                .filter(|category| !category.is_empty())
                .unwrap_or_else(|| "Uncategorized".to_owned()),
            amount: record.amount,
            description: record.description.clone(),
            delete_url: format_endpoint(endpoints::DELETE_RECORD, record.id),
        })
        .collect()
}

fn dashboard_view(rows: &[RecordRow], total: f64, error_message: Option<&str>) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Records" }
                }

                @if let Some(error_message) = error_message {
                    (alert_error("Could not load records", error_message))
                } @else {
                    section class="rounded bg-gray-50 dark:bg-gray-800 overflow-hidden"
                    {
                        (records_table(rows))

                        div
                            class="flex justify-end gap-2 px-6 py-4 text-sm font-bold
                                text-gray-900 dark:text-white border-t border-gray-200
                                dark:border-gray-700"
                        {
                            span { "Total" }

                            span data-total="true" class=(amount_class(total))
                            {
                                (format_total(total))
                            }
                        }
                    }
                }

                aside class="rounded bg-gray-50 dark:bg-gray-800 p-6"
                {
                    h2 class="text-lg font-bold mb-4" { "Add Record" }

                    (record_form())
                }
            }
        }
    };

    base("Dashboard", &content)
}

fn records_table(rows: &[RecordRow]) -> Markup {
    html! {
        table class="w-full my-2 text-sm text-left rtl:text-right
            text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class="px-6 py-3 text-right" { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for row in rows {
                    (record_row_view(row))
                }

                @if rows.is_empty() {
                    tr
                    {
                        td
                            colspan="5"
                            data-empty-state="true"
                            class="px-6 py-4 text-center"
                        {
                            "No records yet. Add your first one below."
                        }
                    }
                }
            }
        }
    }
}

fn record_row_view(row: &RecordRow) -> Markup {
    let amount_str = format_amount(row.amount);
    let amount_class = amount_class(row.amount);
    let (description, tooltip) = format_description(&row.description);

    html! {
        tr class=(TABLE_ROW_STYLE) data-record-row="true"
        {
            td class=(TABLE_CELL_STYLE) { (row.date_label) }
            td class=(TABLE_CELL_STYLE) { (row.category_label) }
            td class={ "px-6 py-4 text-right " (amount_class) } { (amount_str) }
            td class=(TABLE_CELL_STYLE) title=[tooltip] { (description) }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(row.delete_url)
                    hx-confirm="Are you sure you want to delete this record? This cannot be undone."
                    hx-target-error="#alert-container"
                    hx-swap="innerHTML"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

/// Truncate long descriptions for table rows, returning the display text and
/// an optional tooltip holding the full text.
fn format_description(description: &str) -> (String, Option<String>) {
    let graphemes = description.graphemes(true).collect::<Vec<_>>();

    if graphemes.len() <= MAX_DESCRIPTION_GRAPHEMES {
        (description.to_owned(), None)
    } else {
        let truncated = graphemes[..MAX_DESCRIPTION_GRAPHEMES].concat();

        (format!("{truncated}…"), Some(description.to_owned()))
    }
}
