//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    auth_middleware::{auth_guard, auth_guard_hx},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    record::{create_record_endpoint, delete_record_endpoint},
    register::{get_register_page, register_user},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-Redirect header for auth redirects to
    // work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::RECORDS_API, post(create_record_endpoint))
            .route(endpoints::DELETE_RECORD, delete(delete_record_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::{
        Json, Router,
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{AppState, api::ApiClient, endpoints, log_in::LogInData};

    use super::build_router;

    /// A stub of the remote money tracker API that accepts one set of
    /// credentials and owns a couple of records.
    async fn spawn_stub_service() -> ApiClient {
        let router = Router::new()
            .route(
                "/api/login",
                post(|Json(body): Json<serde_json::Value>| async move {
                    if body["username"] == "alice" && body["password"] == "hunter2min" {
                        Json(json!({"token": "a-real-token"})).into_response()
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"message": "Incorrect username or password"})),
                        )
                            .into_response()
                    }
                }),
            )
            .route(
                "/api/records",
                get(|| async {
                    Json(json!({"records": [
                        {"id": 1, "amount": 10.0, "category": "Salary",
                         "description": "October pay", "date": "2025-10-01T09:00:00"},
                        {"id": 2, "amount": -3.0, "category": "Coffee",
                         "description": "Flat white", "date": "2025-10-02T08:15:00"},
                    ]}))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind a port for the stub API");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        ApiClient::new(&format!("http://{addr}"))
    }

    async fn get_test_server() -> TestServer {
        let api = spawn_stub_service().await;
        let state = AppState::new(api, "foobar", "Etc/UTC");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn dashboard_requires_log_in() {
        let server = get_test_server().await;

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status_see_other();
        let location = response.header("location");
        let location = location.to_str().unwrap();
        assert!(
            location.starts_with(endpoints::LOG_IN_VIEW),
            "want a redirect to the log in page, got {location}"
        );
    }

    #[tokio::test]
    async fn log_in_and_register_pages_do_not_require_log_in() {
        let server = get_test_server().await;

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
        server.get(endpoints::REGISTER_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn logging_in_unlocks_the_dashboard() {
        let server = get_test_server().await;

        let log_in_response = server
            .post(endpoints::LOG_IN_API)
            .form(&LogInData {
                username: "alice".to_string(),
                password: "hunter2min".to_string(),
                redirect_url: None,
            })
            .await;
        log_in_response.assert_status_see_other();

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookies(log_in_response.cookies())
            .await;

        response.assert_status_ok();
        let text = response.text();
        assert!(
            text.contains("October pay"),
            "the dashboard should list the fetched records"
        );
        assert!(
            text.contains("7.00"),
            "the dashboard should display the records total"
        );
    }

    #[tokio::test]
    async fn unknown_routes_get_the_404_page() {
        let server = get_test_server().await;

        let response = server.get("/no/such/page").await;

        response.assert_status_not_found();
    }
}
