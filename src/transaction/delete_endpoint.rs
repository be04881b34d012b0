//! Defines the endpoint for deleting a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID, alert::AlertView, database_id::TransactionId, shared::render,
    transaction::core::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the user's transactions.
///
/// On success, responds with an empty fragment that HTMX swaps in place of the
/// deleted table row. On failure, responds with an alert.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingTransaction.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(_) => render(StatusCode::OK, html! {}),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertView::error(
                    "Could not delete transaction",
                    "An unexpected error occurred. Try again later or check the logs on the server.",
                )
                .into_markup(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash, UserID,
        db::initialize,
        transaction::{
            Transaction, TransactionType, count_transactions, create_transaction,
            delete_endpoint::{DeleteTransactionState, delete_transaction_endpoint},
        },
        user::create_user,
    };

    fn get_test_state() -> (DeleteTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (
            DeleteTransactionState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn deletes_transaction_and_responds_with_ok() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    1.23,
                    date!(2024 - 10 - 26),
                    user_id,
                ),
                &connection,
            )
            .unwrap()
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn responds_with_not_found_for_missing_transaction() {
        let (state, user_id) = get_test_state();

        let response = delete_transaction_endpoint(State(state), Extension(user_id), Path(999))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn does_not_delete_another_users_transaction() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            let other_user = create_user(
                "other@example.com",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap();

            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    1.23,
                    date!(2024 - 10 - 26),
                    other_user.id,
                ),
                &connection,
            )
            .unwrap()
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(1));
    }
}
