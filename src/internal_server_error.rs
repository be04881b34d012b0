//! Defines the template and route handler for the internal server error page.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// The contents of the internal server error page.
pub struct InternalServerError<'a> {
    /// A short description of what went wrong.
    pub description: &'a str,
    /// What the user can do about it.
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

/// Render `error` as a full page with a 500 status code.
pub fn render_internal_server_error(error: InternalServerError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_view("Internal Server Error", "500", error.description, error.fix),
    )
        .into_response()
}

/// A route handler for displaying the generic internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(InternalServerError::default())
}

/// An HTMX redirect to the internal server error page, for handlers that
/// respond to HTMX requests.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
