//! Pocketbook is a web app for tracking income and expenses against a remote
//! money tracker service.
//!
//! This library serves HTML pages and forwards every user action (log in,
//! register, load records, add, delete) to the remote service's JSON API. It
//! stores nothing itself beyond the session token, which lives in a private
//! cookie and is attached to authenticated API calls.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Response};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod api;
mod app_state;
mod auth_cookie;
mod auth_middleware;
mod dashboard;
mod endpoints;
mod html;
mod internal_server_error;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod record;
mod register;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;

pub use api::{ApiClient, ApiError, NewRecord, Record};
pub use app_state::AppState;
pub use auth_cookie::SessionToken;
pub use logging::logging_middleware;
pub use routing::build_router;

use crate::internal_server_error::{InternalServerErrorPage, render_internal_server_error};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the app itself.
///
/// Failures reported by the remote API are a separate concern and are handled
/// where they occur; see [ApiError].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// There is no session token in the cookie jar.
    #[error("no session token in the cookie jar")]
    SessionMissing,

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidTimezone(timezone) => {
                render_internal_server_error(InternalServerErrorPage {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings \
                        and ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                })
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                render_internal_server_error(Default::default())
            }
        }
    }
}
