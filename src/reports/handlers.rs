//! Reports HTTP handler and view rendering.
//!
//! The page narrows the totals, category breakdown and narrative to a single
//! calendar month when one is selected, while the monthly chart always spans
//! the full transaction history.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    aggregation::{CategorySummary, Totals, aggregate_by_category, aggregate_totals},
    endpoints,
    filter::{MonthFilter, TransactionFilter, filter_transactions, month_key},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    reports::{
        charts::{ReportChart, category_chart, charts_script, charts_view, monthly_chart},
        narrative::narrative_summary,
    },
    transaction::{Transaction, get_transactions_for_user},
};

/// The raw query parameters accepted by the reports page.
#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    /// "all" or a month in "YYYY-MM" form.
    month: Option<String>,
}

/// The state needed for displaying the reports page.
#[derive(Debug, Clone)]
pub struct ReportsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with aggregate reports over the user's transactions.
pub async fn get_reports_page(
    State(state): State<ReportsState>,
    Extension(user_id): Extension<UserID>,
    Query(query_params): Query<ReportsQuery>,
) -> Result<Response, Error> {
    let month_filter = query_params
        .month
        .as_deref()
        .map(MonthFilter::parse)
        .unwrap_or_default();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let all_transactions = get_transactions_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    if all_transactions.is_empty() {
        return Ok(reports_no_data_view().into_response());
    }

    let filter = TransactionFilter {
        month_filter: month_filter.clone(),
        ..Default::default()
    };
    let filtered = filter_transactions(&all_transactions, &filter);
    let totals = aggregate_totals(&filtered);
    let categories = aggregate_by_category(&filtered);

    let selected_month = match &month_filter {
        MonthFilter::All => None,
        MonthFilter::Month(month) => Some(month.as_str()),
    };
    let narrative = narrative_summary(selected_month, &totals, &categories);
    let month_options = collect_month_options(&all_transactions);

    let charts = [
        ReportChart {
            id: "monthly-chart",
            options: monthly_chart(&all_transactions).to_string(),
        },
        ReportChart {
            id: "category-chart",
            options: category_chart(&categories).to_string(),
        },
    ];

    Ok(reports_view(
        &narrative,
        &totals,
        &categories,
        &charts,
        &month_options,
        &month_filter,
    )
    .into_response())
}

/// The distinct months appearing in `transactions`, newest first.
fn collect_month_options(transactions: &[Transaction]) -> Vec<String> {
    let mut months: Vec<String> = transactions
        .iter()
        .map(|transaction| month_key(transaction.date))
        .collect();

    months.sort();
    months.dedup();
    months.reverse();
    months
}

/// Renders the reports page when no transaction data exists.
fn reports_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "add some transactions");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Reports will show up here once you " (new_transaction_link) "."
            }
        }
    );

    base("Reports", &[], &content)
}

fn reports_view(
    narrative: &str,
    totals: &Totals,
    categories: &[CategorySummary],
    charts: &[ReportChart],
    month_options: &[String],
    month_filter: &MonthFilter,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let selected_month = month_filter.as_query_value();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full max-w-screen-xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Reports" }

                    form
                        method="get"
                        action=(endpoints::REPORTS_VIEW)
                        class="flex items-end gap-2"
                    {
                        select name="month" class=(FORM_TEXT_INPUT_STYLE) style="max-width: 10rem"
                        {
                            option value="all" selected[selected_month == "all"] { "All months" }

                            @for month in month_options {
                                option value=(month) selected[month == selected_month] { (month) }
                            }
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) style="max-width: 6rem"
                        {
                            "Apply"
                        }
                    }
                }

                p
                    class="text-base text-gray-700 dark:text-gray-300"
                    data-narrative="true"
                {
                    (narrative)
                }

                (totals_view(totals))

                (charts_view(charts))

                (category_table_view(categories))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Reports", &scripts, &content)
}

fn totals_view(totals: &Totals) -> Markup {
    html!(
        section class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            (totals_card("Income", "income", totals.income))
            (totals_card("Expenses", "expense", totals.expense))
            (totals_card("Balance", "balance", totals.balance))
        }
    )
}

fn totals_card(label: &str, key: &str, amount: f64) -> Markup {
    html!(
        div class="rounded bg-gray-50 dark:bg-gray-800 px-4 py-3 shadow-sm"
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-lg font-semibold tabular-nums" data-total=(key)
            {
                (format_currency(amount))
            }
        }
    )
}

fn category_table_view(categories: &[CategorySummary]) -> Markup {
    html!(
        section class="rounded bg-gray-50 dark:bg-gray-800 overflow-x-auto"
        {
            table class="w-full my-2 text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-3 text-right" { "Income" }
                        th scope="col" class="px-6 py-3 text-right" { "Expenses" }
                        th scope="col" class="px-6 py-3 text-right" { "Net" }
                    }
                }

                tbody
                {
                    @for summary in categories {
                        tr class=(TABLE_ROW_STYLE) data-category-row=(summary.category)
                        {
                            td class=(TABLE_CELL_STYLE) { (summary.category) }
                            td class="px-6 py-4 text-right tabular-nums"
                            {
                                (format_currency(summary.income))
                            }
                            td class="px-6 py-4 text-right tabular-nums"
                            {
                                (format_currency(summary.expense))
                            }
                            td class="px-6 py-4 text-right tabular-nums"
                            {
                                (format_currency(summary.net))
                            }
                        }
                    }

                    @if categories.is_empty() {
                        tr
                        {
                            td
                                colspan="4"
                                data-empty-state="true"
                                class="px-6 py-4 text-center"
                            {
                                "No transactions in this month."
                            }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        response::Response,
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        PasswordHash, UserID,
        db::initialize,
        transaction::{Transaction, TransactionType, create_transaction},
        user::create_user,
    };

    use super::{ReportsQuery, ReportsState, get_reports_page};

    fn get_test_state() -> (ReportsState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (
            ReportsState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    /// Inserts a salary of $5,600 and expenses of $3,400 split over rent and
    /// food, all in March 2024, plus one small February expense.
    fn insert_sample_transactions(state: &ReportsState, user_id: UserID) {
        let connection = state.db_connection.lock().unwrap();

        let transactions = [
            (TransactionType::Income, "salary", 5600.0, date!(2024 - 03 - 01)),
            (TransactionType::Expense, "rent", 1800.0, date!(2024 - 03 - 03)),
            (TransactionType::Expense, "food", 1600.0, date!(2024 - 03 - 10)),
            (TransactionType::Expense, "coffee", 25.0, date!(2024 - 02 - 14)),
        ];

        for (transaction_type, category, amount, date) in transactions {
            create_transaction(
                Transaction::build(transaction_type, amount, date, user_id).category(category),
                &connection,
            )
            .unwrap();
        }
    }

    async fn get_page(state: ReportsState, user_id: UserID, query: ReportsQuery) -> Html {
        let response = get_reports_page(State(state), Extension(user_id), Query(query))
            .await
            .expect("Could not get reports page");

        parse_html(response).await
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
    fn assert_total(html: &Html, key: &str, want: &str) {
        let selector = Selector::parse(&format!("[data-total=\"{key}\"]")).unwrap();
        let element = html
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No total found for {key}"));
        let text = element.text().collect::<String>();

        assert_eq!(text.trim(), want, "total {key}");
    }

    fn narrative_text(html: &Html) -> String {
        let selector = Selector::parse("[data-narrative]").unwrap();
        let element = html.select(&selector).next().expect("No narrative found");

        element.text().collect::<String>().trim().to_owned()
    }

    #[track_caller]
    fn assert_chart_exists(html: &Html, chart_id: &str) {
        let selector = Selector::parse(&format!("#{chart_id}")).unwrap();
        assert!(
            html.select(&selector).next().is_some(),
            "Chart with id '{chart_id}' not found"
        );
    }

    #[tokio::test]
    async fn reports_page_shows_overall_totals_and_charts() {
        let (state, user_id) = get_test_state();
        insert_sample_transactions(&state, user_id);

        let html = get_page(state, user_id, ReportsQuery::default()).await;

        assert_total(&html, "income", "$5,600.00");
        assert_total(&html, "expense", "$3,425.00");
        assert_total(&html, "balance", "$2,175.00");
        assert_chart_exists(&html, "monthly-chart");
        assert_chart_exists(&html, "category-chart");
    }

    #[tokio::test]
    async fn narrative_describes_the_selected_month() {
        let (state, user_id) = get_test_state();
        insert_sample_transactions(&state, user_id);

        let html = get_page(
            state,
            user_id,
            ReportsQuery {
                month: Some("2024-03".to_owned()),
            },
        )
        .await;

        let narrative = narrative_text(&html);
        assert_eq!(
            narrative,
            "2024-03 snapshot: you earned $5,600 and spent $3,400, resulting in a surplus \
             of $2,200. Categories with the biggest impact are salary, rent, food."
        );
    }

    #[tokio::test]
    async fn month_filter_narrows_totals_and_categories() {
        let (state, user_id) = get_test_state();
        insert_sample_transactions(&state, user_id);

        let html = get_page(
            state,
            user_id,
            ReportsQuery {
                month: Some("2024-02".to_owned()),
            },
        )
        .await;

        assert_total(&html, "income", "$0.00");
        assert_total(&html, "expense", "$25.00");

        let selector = Selector::parse("tr[data-category-row]").unwrap();
        let categories: Vec<_> = html
            .select(&selector)
            .map(|row| row.value().attr("data-category-row").unwrap_or_default())
            .collect();
        assert_eq!(categories, vec!["coffee"]);
    }

    #[tokio::test]
    async fn category_table_orders_by_absolute_net() {
        let (state, user_id) = get_test_state();
        insert_sample_transactions(&state, user_id);

        let html = get_page(state, user_id, ReportsQuery::default()).await;

        let selector = Selector::parse("tr[data-category-row]").unwrap();
        let categories: Vec<_> = html
            .select(&selector)
            .map(|row| row.value().attr("data-category-row").unwrap_or_default())
            .collect();
        assert_eq!(categories, vec!["salary", "rent", "food", "coffee"]);
    }

    #[tokio::test]
    async fn month_dropdown_lists_months_newest_first() {
        let (state, user_id) = get_test_state();
        insert_sample_transactions(&state, user_id);

        let html = get_page(state, user_id, ReportsQuery::default()).await;

        let selector = Selector::parse("select[name=\"month\"] option").unwrap();
        let options: Vec<String> = html
            .select(&selector)
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect();
        assert_eq!(options, vec!["all", "2024-03", "2024-02"]);
    }

    #[tokio::test]
    async fn shows_prompt_when_user_has_no_transactions() {
        let (state, user_id) = get_test_state();

        let html = get_page(state, user_id, ReportsQuery::default()).await;

        let selector = Selector::parse("h2").unwrap();
        let heading = html.select(&selector).next().expect("No heading found");
        let text = heading.text().collect::<String>();
        assert!(text.contains("Nothing here yet"), "got {text:?}");
    }

    #[tokio::test]
    async fn does_not_include_other_users_transactions() {
        let (state, user_id) = get_test_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "other@example.com",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap()
        };
        insert_sample_transactions(&state, other_user.id);

        let html = get_page(state, user_id, ReportsQuery::default()).await;

        let selector = Selector::parse("h2").unwrap();
        let heading = html.select(&selector).next().expect("No heading found");
        assert!(
            heading.text().collect::<String>().contains("Nothing here yet"),
        );
    }
}
