//! Error alerts swapped into the page's alert container via the
//! response-targets HTMX extension.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// An error alert to display at the bottom of the current page.
pub fn alert_error(title: &str, message: &str) -> Markup {
    html! {
        div
            role="alert"
            class="rounded border border-red-300 bg-red-50 px-4 py-3 text-sm \
                text-red-800 shadow dark:border-red-800 dark:bg-gray-800 dark:text-red-300"
        {
            p class="font-semibold" { (title) }
            p { (message) }
        }
    }
}

/// Render `markup` as an HTML response with the given status code.
pub fn render(status_code: StatusCode, markup: Markup) -> Response {
    (status_code, markup).into_response()
}

#[cfg(test)]
mod alert_tests {
    use axum::http::StatusCode;

    use super::{alert_error, render};

    #[tokio::test]
    async fn alert_keeps_status_and_message() {
        let response = render(
            StatusCode::BAD_REQUEST,
            alert_error("Could not add record", "Enter a valid number for the amount."),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(
            text.contains("Enter a valid number for the amount."),
            "alert body should contain the message, got {text}"
        );
    }
}
