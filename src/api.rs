//! Typed client for the remote money tracker API.
//!
//! Every operation is a single request/response round trip over JSON. The
//! remote service owns all records and sessions; this client only forwards
//! requests and maps failures onto [ApiError] so route handlers can decide
//! what the user sees.

use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::auth_cookie::SessionToken;

/// The header carrying the session token on authenticated requests.
pub const TOKEN_HEADER: &str = "x-access-token";

/// One ledger entry, owned by the remote service.
///
/// The client holds a transient copy for a single render and re-fetches after
/// every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// The identifier assigned by the remote service.
    pub id: i64,
    /// The value of the record: positive for income, negative for expenses.
    pub amount: f64,
    /// The category the user filed the record under.
    #[serde(default)]
    pub category: Option<String>,
    /// Text detailing the record.
    #[serde(default)]
    pub description: String,
    /// When the record was created, as an ISO-8601 date-time in UTC.
    #[serde(default)]
    pub date: Option<String>,
}

/// The fields the user fills in to add a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    /// The value of the record: positive for income, negative for expenses.
    pub amount: f64,
    /// The category to file the record under.
    pub category: String,
    /// Text detailing the record.
    pub description: String,
}

/// The errors that may occur while talking to the remote API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API server could not be reached.
    #[error("could not reach the records service: {0}")]
    Unreachable(String),

    /// The API responded with something other than JSON, or with JSON that
    /// does not match the documented schema.
    #[error("the records service sent a response that could not be parsed")]
    InvalidResponse,

    /// The API rejected the credentials or the session token.
    #[error("the records service rejected the session: {message}")]
    Unauthorized {
        /// The reason given by the remote service.
        message: String,
    },

    /// The API reported a failure for the request.
    #[error("the records service returned status {status}: {message}")]
    Api {
        /// The HTTP status code of the response.
        status: u16,
        /// The `message` field of the response body, or a generic fallback.
        message: String,
    },
}

/// The client for the remote money tracker API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API served at `base_url`,
    /// e.g. "http://localhost:5000".
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Exchange a username and password for a session token.
    ///
    /// # Errors
    ///
    /// Returns [ApiError::Unauthorized] when the credentials are rejected,
    /// with the reason given by the remote service.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<SessionToken, ApiError> {
        let url = format!("{}/api/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&Credentials { username, password })
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let body: TokenBody = decode_json(response).await?;

        Ok(SessionToken::new(body.token))
    }

    /// Create a new user account.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/register", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&Credentials { username, password })
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        decode_json::<serde_json::Value>(response).await?;

        Ok(())
    }

    /// Fetch all records for the session's user.
    ///
    /// # Errors
    ///
    /// Returns [ApiError::Unauthorized] when the remote service no longer
    /// accepts `token`, in which case the caller should discard it.
    pub async fn records(&self, token: &SessionToken) -> Result<Vec<Record>, ApiError> {
        let url = format!("{}/api/records", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, token.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        let body: RecordsBody = decode_json(response).await?;

        Ok(body.records)
    }

    /// Add a record for the session's user.
    pub async fn create_record(
        &self,
        token: &SessionToken,
        record: &NewRecord,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/record", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, token.as_str())
            .json(record)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        decode_json::<serde_json::Value>(response).await?;

        Ok(())
    }

    /// Delete the record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [ApiError::Unauthorized] when the remote service no longer
    /// accepts `token`, in which case the caller should discard it.
    pub async fn delete_record(
        &self,
        token: &SessionToken,
        record_id: i64,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/record/{record_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header(TOKEN_HEADER, token.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        decode_json::<serde_json::Value>(response).await?;

        Ok(())
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Default, Deserialize)]
struct RecordsBody {
    #[serde(default)]
    records: Vec<Record>,
}

const GENERIC_FAILURE_MESSAGE: &str = "an unknown error occurred";

fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_connect() {
        ApiError::Unreachable("could not connect to the server".to_owned())
    } else {
        ApiError::Unreachable(error.to_string())
    }
}

/// Map a non-2xx response to an [ApiError], extracting the JSON `message`
/// field when the body carries one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<MessageBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| GENERIC_FAILURE_MESSAGE.to_owned());

    if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::Unauthorized { message })
    } else {
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Decode a 2xx response body as JSON.
///
/// A body without a JSON content type is reported as [ApiError::InvalidResponse]
/// and its text is logged for debugging, never shown to the user.
async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let content_type_is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));

    if !content_type_is_json {
        let text = response.text().await.unwrap_or_default();
        tracing::error!("expected a JSON response from the records service, got: {text}");

        return Err(ApiError::InvalidResponse);
    }

    response.json().await.map_err(|error| {
        tracing::error!("could not decode a response from the records service: {error}");

        ApiError::InvalidResponse
    })
}

#[cfg(test)]
mod api_client_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::Html,
        routing::{delete, get, post},
    };
    use serde_json::json;

    use crate::auth_cookie::SessionToken;

    use super::{ApiClient, ApiError, NewRecord, TOKEN_HEADER};

    async fn spawn_api(router: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind a port for the stub API");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        ApiClient::new(&format!("http://{addr}"))
    }

    fn test_token() -> SessionToken {
        SessionToken::new("opaque-test-token")
    }

    #[tokio::test]
    async fn log_in_returns_token() {
        let api = spawn_api(Router::new().route(
            "/api/login",
            post(|| async { Json(json!({"token": "fresh-token"})) }),
        ))
        .await;

        let token = api.log_in("alice", "hunter2min").await.unwrap();

        assert_eq!(token.as_str(), "fresh-token");
    }

    #[tokio::test]
    async fn log_in_passes_through_error_message() {
        let api = spawn_api(Router::new().route(
            "/api/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Incorrect username or password"})),
                )
            }),
        ))
        .await;

        let error = api.log_in("alice", "wrong").await.unwrap_err();

        match error {
            ApiError::Unauthorized { message } => {
                assert_eq!(message, "Incorrect username or password")
            }
            other => panic!("want ApiError::Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_message_falls_back_to_generic_text() {
        let api = spawn_api(Router::new().route(
            "/api/records",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))) }),
        ))
        .await;

        let error = api.records(&test_token()).await.unwrap_err();

        match error {
            ApiError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "an unknown error occurred");
            }
            other => panic!("want ApiError::Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_response_is_an_error() {
        let api = spawn_api(Router::new().route(
            "/api/login",
            post(|| async { Html("<h1>It works!</h1>") }),
        ))
        .await;

        let error = api.log_in("alice", "hunter2min").await.unwrap_err();

        assert!(
            matches!(error, ApiError::InvalidResponse),
            "want ApiError::InvalidResponse, got {error:?}"
        );
    }

    #[tokio::test]
    async fn records_attaches_token_header() {
        let seen_token = Arc::new(Mutex::new(None));
        let seen_token_clone = seen_token.clone();

        let api = spawn_api(Router::new().route(
            "/api/records",
            get(move |headers: HeaderMap| async move {
                let token = headers
                    .get(TOKEN_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned);
                *seen_token_clone.lock().unwrap() = token;

                Json(json!({"records": [
                    {"id": 1, "amount": 10.0, "category": "Salary",
                     "description": "October", "date": "2025-10-01T09:00:00"},
                    {"id": 2, "amount": -3.0, "category": null,
                     "description": "", "date": null},
                ]}))
            }),
        ))
        .await;

        let records = api.records(&test_token()).await.unwrap();

        assert_eq!(
            seen_token.lock().unwrap().as_deref(),
            Some("opaque-test-token")
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, 10.0);
        assert_eq!(records[1].category, None);
        assert_eq!(records[1].date, None);
    }

    #[tokio::test]
    async fn records_maps_401_to_unauthorized() {
        let api = spawn_api(Router::new().route(
            "/api/records",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Token is invalid!"})),
                )
            }),
        ))
        .await;

        let error = api.records(&test_token()).await.unwrap_err();

        assert!(
            matches!(error, ApiError::Unauthorized { .. }),
            "want ApiError::Unauthorized, got {error:?}"
        );
    }

    #[tokio::test]
    async fn create_record_posts_json_body() {
        let seen_record = Arc::new(Mutex::new(None));
        let seen_record_clone = seen_record.clone();

        let api = spawn_api(Router::new().route(
            "/api/record",
            post(move |Json(record): Json<NewRecord>| async move {
                *seen_record_clone.lock().unwrap() = Some(record);

                Json(json!({"message": "Record added"}))
            }),
        ))
        .await;

        api.create_record(
            &test_token(),
            &NewRecord {
                amount: -12.5,
                category: "Groceries".to_owned(),
                description: "Weekly shop".to_owned(),
            },
        )
        .await
        .unwrap();

        let record = seen_record.lock().unwrap().take().unwrap();
        assert_eq!(record.amount, -12.5);
        assert_eq!(record.category, "Groceries");
        assert_eq!(record.description, "Weekly shop");
    }

    #[tokio::test]
    async fn delete_record_targets_the_record() {
        let seen_id = Arc::new(Mutex::new(None));
        let seen_id_clone = seen_id.clone();

        let api = spawn_api(Router::new().route(
            "/api/record/{record_id}",
            delete(move |Path(record_id): Path<i64>| async move {
                *seen_id_clone.lock().unwrap() = Some(record_id);

                Json(json!({"message": "Record deleted"}))
            }),
        ))
        .await;

        api.delete_record(&test_token(), 42).await.unwrap();

        assert_eq!(*seen_id.lock().unwrap(), Some(42));
    }

    #[tokio::test]
    async fn delete_missing_record_reports_message() {
        let api = spawn_api(Router::new().route(
            "/api/record/{record_id}",
            delete(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"message": "Record not found"})),
                )
            }),
        ))
        .await;

        let error = api.delete_record(&test_token(), 7).await.unwrap_err();

        match error {
            ApiError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Record not found");
            }
            other => panic!("want ApiError::Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_reported() {
        // Bind a port and drop the listener so nothing is listening on it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = ApiClient::new(&format!("http://{addr}"));

        let error = api.log_in("alice", "hunter2min").await.unwrap_err();

        assert!(
            matches!(error, ApiError::Unreachable(_)),
            "want ApiError::Unreachable, got {error:?}"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = ApiClient::new("http://localhost:5000/");

        assert_eq!(api.base_url, "http://localhost:5000");
    }
}
