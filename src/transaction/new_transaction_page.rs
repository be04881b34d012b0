//! Defines the route handler for the page with the new transaction form.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::core::get_categories_for_user,
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The database connection for looking up category suggestions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
///
/// The date input is capped at today in the configured local timezone, which
/// matches the server-side future date check in the create endpoint.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Err(Error::InvalidTimezoneError(state.local_timezone));
    };
    let max_date = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category_suggestions = get_categories_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    Ok(new_transaction_view(max_date, &category_suggestions).into_response())
}

fn new_transaction_view(max_date: Date, category_suggestions: &[String]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "New Transaction" }

            form
                class="flex flex-col gap-4 w-full"
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-indicator="#indicator"
            {
                fieldset class=(FORM_RADIO_GROUP_STYLE)
                {
                    legend class=(FORM_LABEL_STYLE) { "Type" }

                    div class="flex gap-2"
                    {
                        div class="flex items-center flex-1"
                        {
                            input
                                type="radio"
                                name="transaction_type"
                                id="type-expense"
                                value="expense"
                                class=(FORM_RADIO_INPUT_STYLE)
                                checked;
                            label for="type-expense" class=(FORM_RADIO_LABEL_STYLE) { "Expense" }
                        }

                        div class="flex items-center flex-1"
                        {
                            input
                                type="radio"
                                name="transaction_type"
                                id="type-income"
                                value="income"
                                class=(FORM_RADIO_INPUT_STYLE);
                            label for="type-income" class=(FORM_RADIO_LABEL_STYLE) { "Income" }
                        }
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    div class="input-wrapper w-full"
                    {
                        input
                            type="number"
                            name="amount"
                            id="amount"
                            min="0"
                            step="0.01"
                            placeholder="0.00"
                            class=(FORM_TEXT_INPUT_STYLE)
                            required;
                    }
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        type="date"
                        name="date"
                        id="date"
                        value=(max_date)
                        max=(max_date)
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                    input
                        type="text"
                        name="category"
                        id="category"
                        placeholder="e.g. food"
                        list="category-suggestions"
                        class=(FORM_TEXT_INPUT_STYLE);

                    datalist id="category-suggestions"
                    {
                        @for category in category_suggestions {
                            option value=(category) {}
                        }
                    }
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        type="text"
                        name="description"
                        id="description"
                        placeholder="What was it for?"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button
                    type="submit"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="htmx-indicator" { (loading_spinner()) }
                    "Create Transaction"
                }
            }
        }
    };

    base("New Transaction", &[dollar_input_styles()], &content)
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, response::Response};
    use rusqlite::Connection;
    use scraper::{ElementRef, Html, Selector};
    use time::macros::date;

    use crate::{
        PasswordHash, UserID,
        db::initialize,
        endpoints,
        transaction::{Transaction, TransactionType, create_transaction},
        user::create_user,
    };

    use super::{NewTransactionPageState, get_new_transaction_page};

    fn get_test_state() -> (NewTransactionPageState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (
            NewTransactionPageState {
                db_connection: Arc::new(Mutex::new(conn)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
        )
    }

    async fn get_page(state: NewTransactionPageState, user_id: UserID) -> Html {
        let response = get_new_transaction_page(State(state), Extension(user_id))
            .await
            .expect("Could not get new transaction page");

        parse_html(response).await
    }

    async fn parse_html(response: Response) -> Html {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body);
        let html = Html::parse_document(&text);

        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );

        html
    }

    fn must_get_form(html: &Html) -> ElementRef<'_> {
        let form_selector = Selector::parse("form").unwrap();
        let forms: Vec<_> = html.select(&form_selector).collect();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());

        forms[0]
    }

    #[tokio::test]
    async fn form_posts_to_transactions_api() {
        let (state, user_id) = get_test_state();

        let html = get_page(state, user_id).await;

        let form = must_get_form(&html);
        assert_eq!(
            form.value().attr("hx-post"),
            Some(endpoints::TRANSACTIONS_API)
        );
    }

    #[tokio::test]
    async fn form_has_expected_inputs() {
        let (state, user_id) = get_test_state();

        let html = get_page(state, user_id).await;
        let form = must_get_form(&html);

        for (name, type_, required) in [
            ("amount", "number", true),
            ("date", "date", true),
            ("category", "text", false),
            ("description", "text", false),
        ] {
            let selector = Selector::parse(&format!("input[name=\"{name}\"]")).unwrap();
            let input = form
                .select(&selector)
                .next()
                .unwrap_or_else(|| panic!("No input found with name {name}"));

            assert_eq!(input.value().attr("type"), Some(type_), "input {name}");
            assert_eq!(
                input.value().attr("required").is_some(),
                required,
                "input {name} required attribute"
            );
        }

        let radio_selector = Selector::parse("input[type=\"radio\"]").unwrap();
        let radios: Vec<_> = form.select(&radio_selector).collect();
        assert_eq!(radios.len(), 2, "want 2 type radios, got {}", radios.len());
        for radio in &radios {
            assert_eq!(radio.value().attr("name"), Some("transaction_type"));
        }
        let values: Vec<_> = radios
            .iter()
            .map(|radio| radio.value().attr("value").unwrap_or_default())
            .collect();
        assert_eq!(values, vec!["expense", "income"]);
    }

    #[tokio::test]
    async fn amount_input_rejects_negative_values() {
        let (state, user_id) = get_test_state();

        let html = get_page(state, user_id).await;
        let form = must_get_form(&html);

        let selector = Selector::parse("input[name=\"amount\"]").unwrap();
        let amount = form.select(&selector).next().expect("No amount input");

        assert_eq!(amount.value().attr("min"), Some("0"));
        assert_eq!(amount.value().attr("step"), Some("0.01"));
    }

    #[tokio::test]
    async fn date_input_is_capped_at_today() {
        let (state, user_id) = get_test_state();

        let html = get_page(state, user_id).await;
        let form = must_get_form(&html);

        let selector = Selector::parse("input[name=\"date\"]").unwrap();
        let date_input = form.select(&selector).next().expect("No date input");
        let today = time::OffsetDateTime::now_utc().date().to_string();

        assert_eq!(date_input.value().attr("max"), Some(today.as_str()));
        assert_eq!(date_input.value().attr("value"), Some(today.as_str()));
    }

    #[tokio::test]
    async fn category_datalist_suggests_existing_categories() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            for category in ["food", "rent", "food"] {
                create_transaction(
                    Transaction::build(
                        TransactionType::Expense,
                        1.0,
                        date!(2024 - 01 - 15),
                        user_id,
                    )
                    .category(category),
                    &connection,
                )
                .unwrap();
            }
        }

        let html = get_page(state, user_id).await;

        let selector = Selector::parse("datalist#category-suggestions option").unwrap();
        let suggestions: Vec<_> = html
            .select(&selector)
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect();
        assert_eq!(suggestions, vec!["food", "rent"]);
    }

    #[tokio::test]
    async fn form_has_submit_button() {
        let (state, user_id) = get_test_state();

        let html = get_page(state, user_id).await;
        let form = must_get_form(&html);

        let selector = Selector::parse("button[type=\"submit\"]").unwrap();
        assert_eq!(form.select(&selector).count(), 1);
    }
}
