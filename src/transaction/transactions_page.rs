//! Defines the route handler for the page that displays transactions as a
//! filterable, sortable table with income/expense/balance totals.
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

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
    aggregation::{Totals, UNCATEGORIZED_LABEL, aggregate_totals},
    endpoints,
    endpoints::format_endpoint,
    filter::{MonthFilter, TransactionFilter, TypeFilter, filter_transactions, month_key},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        confirm_dialog, format_currency,
    },
    navigation::NavBar,
    sort::{SortDirection, SortField, SortSelection, sort_transactions, toggle_sort},
    transaction::{Transaction, TransactionType, core::get_transactions_for_user},
};

/// The raw query parameters accepted by the transactions page.
///
/// Every field is optional and unknown values fall back to defaults during
/// normalization, so a hand-edited URL still renders a sensible page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// "all", "income" or "expense".
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    /// "all" or a month in "YYYY-MM" form.
    month: Option<String>,
    /// Free-text search over category, description and amount.
    q: Option<String>,
    /// "date" or "amount".
    sort: Option<String>,
    /// "asc" or "desc".
    order: Option<String>,
}

/// URL encoding helper for the transactions page query params.
///
/// Links built from this struct always carry the full filter and sort state,
/// so toggling one control never discards the others.
#[derive(Debug, Clone)]
struct ListQuery {
    filter: TransactionFilter,
    sort: SortSelection,
}

impl ListQuery {
    fn to_query_string(&self) -> String {
        let mut pairs = vec![
            ("type", self.filter.type_filter.as_query_value().to_owned()),
            ("month", self.filter.month_filter.as_query_value().to_owned()),
        ];

        if !self.filter.search_text.is_empty() {
            pairs.push(("q", self.filter.search_text.clone()));
        }

        pairs.push(("sort", self.sort.field.as_query_value().to_owned()));
        pairs.push(("order", self.sort.direction.as_query_value().to_owned()));

        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }

    fn to_url(&self, route: &str) -> String {
        format!("{route}?{}", self.to_query_string())
    }
}

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render an overview of the user's transactions.
///
/// The page queries the user's full transaction list once, then the pure
/// filter, sort and aggregation functions run over that snapshot. Totals are
/// computed from the filtered set, before sorting, so the numbers always match
/// the rows on screen.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query_params): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let (filter, sort) = normalize_query(query_params);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let all_transactions = get_transactions_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let month_options = collect_month_options(&all_transactions);
    let filtered = filter_transactions(&all_transactions, &filter);
    let totals = aggregate_totals(&filtered);
    let sorted = sort_transactions(&filtered, sort);

    Ok(transactions_view(
        &sorted,
        &totals,
        &month_options,
        &filter,
        sort,
        all_transactions.is_empty(),
    )
    .into_response())
}

/// Apply defaults and fall-backs to the raw query params.
fn normalize_query(query: TransactionsQuery) -> (TransactionFilter, SortSelection) {
    let type_filter = query
        .transaction_type
        .as_deref()
        .map(TypeFilter::parse)
        .unwrap_or_default();
    let month_filter = query
        .month
        .as_deref()
        .map(MonthFilter::parse)
        .unwrap_or_default();
    let search_text = query.q.unwrap_or_default().trim().to_owned();

    let field = query.sort.as_deref().map(SortField::parse).unwrap_or_default();
    let direction = query
        .order
        .as_deref()
        .map(SortDirection::parse)
        .unwrap_or_default();

    (
        TransactionFilter {
            type_filter,
            month_filter,
            search_text,
        },
        SortSelection { field, direction },
    )
}

/// The distinct months appearing in `transactions`, newest first.
fn collect_month_options(transactions: &[Transaction]) -> Vec<String> {
    let months: BTreeSet<String> = transactions
        .iter()
        .map(|transaction| month_key(transaction.date))
        .collect();

    // "YYYY-MM" sorts chronologically, so reversing yields newest first.
    months.into_iter().rev().collect()
}

fn transactions_view(
    transactions: &[Transaction],
    totals: &Totals,
    month_options: &[String],
    filter: &TransactionFilter,
    sort: SortSelection,
    has_no_transactions_at_all: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let empty_message = if has_no_transactions_at_all {
        "No transactions yet. Create your first transaction to get started."
    } else {
        "No transactions match the current filters."
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "New Transaction"
                    }
                }

                (totals_view(totals))

                (filter_form_view(month_options, filter, sort))

                section class="rounded bg-gray-50 dark:bg-gray-800 overflow-x-auto"
                {
                    table class="w-full my-2 text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    (sort_header_link("Date", SortField::Date, filter, sort))
                                }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-3 text-right"
                                {
                                    (sort_header_link("Amount", SortField::Amount, filter, sort))
                                }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (transaction_row_view(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        data-empty-state="true"
                                        class="px-6 py-4 text-center"
                                    {
                                        (empty_message)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

fn totals_view(totals: &Totals) -> Markup {
    let balance_class = if totals.balance < 0.0 {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    };

    html! {
        section class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            (totals_card("Income", "income", "text-green-700 dark:text-green-300", totals.income))
            (totals_card("Expenses", "expense", "text-red-700 dark:text-red-300", totals.expense))
            (totals_card("Balance", "balance", balance_class, totals.balance))
        }
    }
}

fn totals_card(label: &str, key: &str, amount_class: &str, amount: f64) -> Markup {
    html! {
        div class="rounded bg-gray-50 dark:bg-gray-800 px-4 py-3 shadow-sm"
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p
                class={ "text-lg font-semibold tabular-nums " (amount_class) }
                data-total=(key)
            {
                (format_currency(amount))
            }
        }
    }
}

fn filter_form_view(
    month_options: &[String],
    filter: &TransactionFilter,
    sort: SortSelection,
) -> Markup {
    let type_options = [
        ("all", "All types"),
        ("income", "Income"),
        ("expense", "Expenses"),
    ];
    let selected_type = filter.type_filter.as_query_value();
    let selected_month = filter.month_filter.as_query_value();

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="flex flex-wrap items-end gap-2 w-full"
        {
            // Submitting the form keeps the current sort order.
            input type="hidden" name="sort" value=(sort.field.as_query_value());
            input type="hidden" name="order" value=(sort.direction.as_query_value());

            select name="type" class=(FORM_TEXT_INPUT_STYLE) style="max-width: 10rem"
            {
                @for (value, label) in type_options {
                    option value=(value) selected[value == selected_type] { (label) }
                }
            }

            select name="month" class=(FORM_TEXT_INPUT_STYLE) style="max-width: 10rem"
            {
                option value="all" selected[selected_month == "all"] { "All months" }

                @for month in month_options {
                    option value=(month) selected[month == selected_month] { (month) }
                }
            }

            input
                type="search"
                name="q"
                placeholder="Search transactions"
                class=(FORM_TEXT_INPUT_STYLE)
                style="max-width: 14rem"
                value=(filter.search_text);

            button type="submit" class=(BUTTON_PRIMARY_STYLE) style="max-width: 6rem"
            {
                "Apply"
            }
        }
    }
}

/// A column header link that re-sorts the table.
///
/// Clicking a header always flips the sort direction, even when it names a
/// different field than the current sort. Filter params are carried along so
/// re-sorting never resets the filters.
fn sort_header_link(
    label: &str,
    field: SortField,
    filter: &TransactionFilter,
    current: SortSelection,
) -> Markup {
    let next = ListQuery {
        filter: filter.clone(),
        sort: toggle_sort(current, field),
    };
    let href = next.to_url(endpoints::TRANSACTIONS_VIEW);
    let indicator = if current.field == field {
        match current.direction {
            SortDirection::Ascending => Some("▲"),
            SortDirection::Descending => Some("▼"),
        }
    } else {
        None
    };

    html! {
        a
            href=(href)
            class="hover:underline"
            data-sort-link=(field.as_query_value())
        {
            (label)

            @if let Some(indicator) = indicator {
                " " (indicator)
            }
        }
    }
}

fn transaction_row_view(transaction: &Transaction) -> Markup {
    let detail_url = format_endpoint(endpoints::TRANSACTION_DETAIL_VIEW, transaction.id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);
    let dialog_id = format!("confirm-delete-{}", transaction.id);
    let amount_class = match transaction.transaction_type {
        TransactionType::Income => "text-green-700 dark:text-green-300",
        TransactionType::Expense => "text-red-700 dark:text-red-300",
    };

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE) { time datetime=(transaction.date) { (transaction.date) } }
            td class=(TABLE_CELL_STYLE) { (transaction.transaction_type) }
            td class=(TABLE_CELL_STYLE)
            {
                @if transaction.category.is_empty() {
                    span class="text-gray-400 dark:text-gray-500" { (UNCATEGORIZED_LABEL) }
                } @else {
                    (transaction.category)
                }
            }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class={ "px-6 py-4 text-right tabular-nums " (amount_class) }
            {
                (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(detail_url) class=(LINK_STYLE) { "View" }

                    button
                        type="button"
                        class=(BUTTON_DELETE_STYLE)
                        data-dialog-target=(dialog_id)
                    {
                        "Delete"
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
                                hx-target="closest tr"
                                hx-swap="outerHTML"
                            {
                                "Delete"
                            }
                        },
                    ))
                }
            }
        }
    }
}
