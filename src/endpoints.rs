//! The route URIs served by this app.
//!
//! For routes that take a parameter, e.g., '/api/records/{record_id}', use
//! [format_endpoint].

/// The root route which redirects to the dashboard page.
pub const ROOT: &str = "/";
/// The landing page for logged in users, listing their records.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for adding a record.
pub const RECORDS_API: &str = "/api/records";
/// The route for deleting a single record.
pub const DELETE_RECORD: &str = "/api/records/{record_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string delimited by braces, e.g. '{record_id}' in
/// '/api/records/{record_id}'. Endpoint paths are assumed to contain ASCII
/// characters and at most one parameter.
///
/// If `endpoint_path` has no parameter, it is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{}{}", &endpoint_path[..start], id, &endpoint_path[end..])
}
