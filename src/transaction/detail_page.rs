//! Defines the route handler for the page that displays a single transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    aggregation::UNCATEGORIZED_LABEL,
    database_id::TransactionId,
    endpoints,
    endpoints::format_endpoint,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base,
        confirm_dialog, format_currency,
    },
    navigation::NavBar,
    transaction::{Transaction, TransactionType, core::get_transaction},
};

/// The state needed for the transaction detail page.
#[derive(Debug, Clone)]
pub struct TransactionDetailState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the detail page for one of the user's transactions.
///
/// Responds with the 404 page when the transaction does not exist or belongs
/// to another user.
pub async fn get_transaction_detail_page(
    State(state): State<TransactionDetailState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(transaction_detail_view(&transaction).into_response())
}

fn transaction_detail_view(transaction: &Transaction) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);
    let dialog_id = format!("confirm-delete-{}", transaction.id);
    let amount_class = match transaction.transaction_type {
        TransactionType::Income => "text-green-700 dark:text-green-300",
        TransactionType::Expense => "text-red-700 dark:text-red-300",
    };
    let category = if transaction.category.is_empty() {
        UNCATEGORIZED_LABEL
    } else {
        transaction.category.as_str()
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-md space-y-4"
            {
                header class="flex justify-between items-end"
                {
                    h1 class="text-xl font-bold" { "Transaction" }

                    a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE)
                    {
                        "Back to Transactions"
                    }
                }

                div class="rounded bg-gray-50 dark:bg-gray-800 px-4 py-3 shadow-sm"
                {
                    dl class="divide-y divide-gray-200 dark:divide-gray-700"
                    {
                        (detail_row("Amount", html! {
                            span class={ "tabular-nums " (amount_class) } data-detail="amount"
                            {
                                (format_currency(transaction.amount))
                            }
                        }))
                        (detail_row("Type", html! {
                            span data-detail="type" { (transaction.transaction_type) }
                        }))
                        (detail_row("Date", html! {
                            time datetime=(transaction.date) data-detail="date"
                            {
                                (transaction.date)
                            }
                        }))
                        (detail_row("Category", html! {
                            span data-detail="category" { (category) }
                        }))
                        (detail_row("Description", html! {
                            span data-detail="description"
                            {
                                @if transaction.description.is_empty() {
                                    span class="text-gray-400 dark:text-gray-500" { "-" }
                                } @else {
                                    (transaction.description)
                                }
                            }
                        }))
                    }
                }

                button
                    type="button"
                    class=(BUTTON_DELETE_STYLE)
                    data-dialog-target=(dialog_id)
                {
                    "Delete Transaction"
                }

                (confirm_dialog(
                    &dialog_id,
                    "Delete transaction",
                    "Are you sure you want to delete this transaction? This cannot be undone.",
                    html! {
                        button
                            type="button"
                            class=(BUTTON_PRIMARY_STYLE)
                            hx-delete=(delete_url)
                            // After a delete there is nothing left to show here.
                            hx-push-url="false"
                            hx-target="body"
                            hx-swap="none"
                            hx-on--after-request="window.location = '/transactions'"
                        {
                            "Delete"
                        }
                    },
                ))
            }
        }
    };

    base("Transaction", &[], &content)
}

fn detail_row(label: &str, value: Markup) -> Markup {
    html! {
        div class="flex justify-between gap-4 py-2"
        {
            dt class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            dd class="text-sm text-right" { (value) }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        response::{IntoResponse, Response},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        Error, PasswordHash, UserID,
        db::initialize,
        transaction::{Transaction, TransactionType, create_transaction},
        user::create_user,
    };

    use super::{TransactionDetailState, get_transaction_detail_page};

    fn get_test_state() -> (TransactionDetailState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (
            TransactionDetailState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    async fn parse_html(response: Response) -> Html {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        let html = Html::parse_document(&text);

        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );

        html
    }

    #[track_caller]
    fn assert_detail(html: &Html, key: &str, want: &str) {
        let selector = Selector::parse(&format!("[data-detail=\"{key}\"]")).unwrap();
        let element = html
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No detail found for {key}"));
        let text = element.text().collect::<String>();

        assert_eq!(text.trim(), want, "detail {key}");
    }

    #[tokio::test]
    async fn displays_transaction_fields() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    12.3,
                    date!(2024 - 10 - 05),
                    user_id,
                )
                .category("food")
                .description("groceries"),
                &connection,
            )
            .unwrap()
        };

        let response = get_transaction_detail_page(
            State(state),
            Extension(user_id),
            Path(transaction.id),
        )
        .await
        .expect("Could not get transaction detail page");

        let html = parse_html(response).await;
        assert_detail(&html, "amount", "$12.30");
        assert_detail(&html, "type", "expense");
        assert_detail(&html, "date", "2024-10-05");
        assert_detail(&html, "category", "food");
        assert_detail(&html, "description", "groceries");
    }

    #[tokio::test]
    async fn blank_category_displays_as_uncategorized() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    TransactionType::Income,
                    100.0,
                    date!(2024 - 10 - 05),
                    user_id,
                ),
                &connection,
            )
            .unwrap()
        };

        let response = get_transaction_detail_page(
            State(state),
            Extension(user_id),
            Path(transaction.id),
        )
        .await
        .expect("Could not get transaction detail page");

        let html = parse_html(response).await;
        assert_detail(&html, "category", "uncategorized");
    }

    #[tokio::test]
    async fn responds_with_not_found_for_missing_transaction() {
        let (state, user_id) = get_test_state();

        let result =
            get_transaction_detail_page(State(state), Extension(user_id), Path(999)).await;

        let error = result.expect_err("want error for missing transaction");
        assert_eq!(error, Error::NotFound);
        let response = error.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn does_not_show_other_users_transaction() {
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

        let result =
            get_transaction_detail_page(State(state), Extension(user_id), Path(transaction.id))
                .await;

        assert_eq!(result.expect_err("want error"), Error::NotFound);
    }
}
