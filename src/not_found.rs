//! The shared 404 page, served for any route this app does not know.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Display the 404 page.
pub async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Sorry, this page does not exist.",
            "Check the URL or head back to the dashboard.",
        ),
    )
        .into_response()
}

#[cfg(test)]
mod not_found_tests {
    use axum::http::StatusCode;

    use crate::test_utils::{assert_valid_html, parse_html_document};

    use super::get_404_not_found;

    #[tokio::test]
    async fn renders_404_page() {
        let response = get_404_not_found().await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let heading_selector = scraper::Selector::parse("h1").unwrap();
        let heading_text = document
            .select(&heading_selector)
            .next()
            .expect("expected a heading")
            .text()
            .collect::<String>();
        assert_eq!(heading_text.trim(), "404");
    }
}
