//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    landing::get_landing_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    logging::logging_middleware,
    not_found::get_404_not_found,
    register_user::{get_register_page, register_user},
    reports::get_reports_page,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_new_transaction_page,
        get_transaction_detail_page, get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_landing_page))
        .route(endpoints::COFFEE, get(get_coffee))
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
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(
            endpoints::TRANSACTION_DETAIL_VIEW,
            get(get_transaction_detail_page),
        )
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/DELETE routes need to use the HX-Redirect header for auth
    // redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::DELETE_TRANSACTION,
                delete(delete_transaction_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

#[cfg(test)]
mod router_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, endpoints, routing::build_router};

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(db_connection, "42", "Etc/UTC")
            .expect("Could not create app state");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let server = get_test_server();

        let response = server.get(endpoints::COFFEE).await;

        assert_eq!(response.status_code(), 418);
    }

    #[tokio::test]
    async fn root_shows_landing_page_when_logged_out() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        let body = response.text();
        assert!(
            body.contains(endpoints::LOG_IN_VIEW),
            "want the landing page to link to the log in page"
        );
    }

    #[tokio::test]
    async fn transactions_page_requires_auth() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS_VIEW).await;

        response.assert_status_see_other();
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = get_test_server();

        let response = server.get("/not-a-real-page").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn log_in_page_is_unprotected() {
        let server = get_test_server();

        let response = server.get(endpoints::LOG_IN_VIEW).await;

        response.assert_status_ok();
    }
}
