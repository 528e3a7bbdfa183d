//! Helpers shared by the HTML-rendering tests.

use axum::response::Response;
use scraper::Html;

async fn response_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read the response body");

    String::from_utf8_lossy(&body).to_string()
}

/// Parse a response body as a full HTML document.
pub async fn parse_html_document(response: Response) -> Html {
    Html::parse_document(&response_text(response).await)
}

/// Parse a response body as an HTML fragment, e.g. a re-rendered form.
pub async fn parse_html_fragment(response: Response) -> Html {
    Html::parse_fragment(&response_text(response).await)
}

#[track_caller]
pub fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}
