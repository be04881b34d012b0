//! Pure reductions over a transaction list: overall totals, a per-category
//! breakdown and a per-month breakdown.
//!
//! Every function here is total (empty input yields empty or zero results)
//! and leaves its input untouched, so re-running an aggregation over the same
//! data always produces the same output.

use std::collections::HashMap;

use time::Date;

use crate::transaction::{Transaction, TransactionType};

/// The label that transactions with a blank category are grouped under.
pub const UNCATEGORIZED_LABEL: &str = "uncategorized";

/// Overall income and expense totals for a set of transactions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Totals {
    /// Sum of the amounts of all income transactions.
    pub income: f64,
    /// Sum of the amounts of all expense transactions.
    pub expense: f64,
    /// Income minus expense.
    pub balance: f64,
}

/// Sum up `transactions` into income, expense and balance totals.
///
/// Amounts are non-negative; whether an amount adds to the income or expense
/// total is decided solely by the transaction type.
pub fn aggregate_totals(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals::default();

    for transaction in transactions {
        match transaction.transaction_type {
            TransactionType::Income => totals.income += transaction.amount,
            TransactionType::Expense => totals.expense += transaction.amount,
        }
    }

    totals.balance = totals.income - totals.expense;
    totals
}

/// Income, expense and net totals for a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// The category label, or [UNCATEGORIZED_LABEL] for blank categories.
    pub category: String,
    /// Sum of the amounts of income transactions in this category.
    pub income: f64,
    /// Sum of the amounts of expense transactions in this category.
    pub expense: f64,
    /// Income minus expense for this category.
    pub net: f64,
}

/// Group `transactions` by category and compute income/expense/net per group.
///
/// Blank categories are grouped under [UNCATEGORIZED_LABEL]. The output is
/// ordered by descending absolute net; categories with equal absolute net
/// keep the order in which they were first encountered.
pub fn aggregate_by_category(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut index_by_category: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<CategorySummary> = Vec::new();

    for transaction in transactions {
        let category = if transaction.category.trim().is_empty() {
            UNCATEGORIZED_LABEL
        } else {
            transaction.category.as_str()
        };

        let index = *index_by_category.entry(category).or_insert_with(|| {
            summaries.push(CategorySummary {
                category: category.to_owned(),
                income: 0.0,
                expense: 0.0,
                net: 0.0,
            });
            summaries.len() - 1
        });

        match transaction.transaction_type {
            TransactionType::Income => summaries[index].income += transaction.amount,
            TransactionType::Expense => summaries[index].expense += transaction.amount,
        }
    }

    for summary in &mut summaries {
        summary.net = summary.income - summary.expense;
    }

    // Stable sort keeps first-encounter order for ties on absolute net.
    summaries.sort_by(|a, b| {
        b.net
            .abs()
            .partial_cmp(&a.net.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    summaries
}

/// Income and expense totals for a single calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    /// The month, represented as its first day so it sorts chronologically.
    pub month: Date,
    /// Sum of the amounts of income transactions in this month.
    pub income: f64,
    /// Sum of the amounts of expense transactions in this month.
    pub expense: f64,
}

/// Group `transactions` by calendar month and compute income/expense pairs.
///
/// The output is ordered chronologically. Months with no transactions do not
/// appear.
pub fn aggregate_by_month(transactions: &[Transaction]) -> Vec<MonthlySummary> {
    let mut totals_by_month: HashMap<Date, (f64, f64)> = HashMap::new();

    for transaction in transactions {
        let month = transaction
            .date
            .replace_day(1)
            .expect("every month has a first day");
        let entry = totals_by_month.entry(month).or_insert((0.0, 0.0));

        match transaction.transaction_type {
            TransactionType::Income => entry.0 += transaction.amount,
            TransactionType::Expense => entry.1 += transaction.amount,
        }
    }

    let mut summaries: Vec<MonthlySummary> = totals_by_month
        .into_iter()
        .map(|(month, (income, expense))| MonthlySummary {
            month,
            income,
            expense,
        })
        .collect();

    summaries.sort_by_key(|summary| summary.month);
    summaries
}
