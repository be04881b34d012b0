//! Defines the template and route handler for the 404 not found page.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// A route handler for displaying the 404 not found page.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Render the 404 not found page as a response.
pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Sorry, we could not find that page.",
            "Check the URL for typos or head back to the homepage.",
        ),
    )
        .into_response()
}
