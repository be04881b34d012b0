//! Pure functions for narrowing a transaction list by type, calendar month
//! and free-text search.
//!
//! Filtering always preserves the input order and never mutates the input, so
//! applying the same criteria twice yields the same result.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::transaction::{Transaction, TransactionType};

/// Format for a calendar month truncated from a date, e.g. "2024-01".
const MONTH_KEY_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]");

/// A date truncated to its year and month, e.g. "2024-01".
///
/// The string form sorts chronologically, which is relied upon when building
/// month drop-down options.
pub fn month_key(date: Date) -> String {
    date.format(MONTH_KEY_FORMAT)
        .expect("year-month format cannot fail for a valid date")
}

/// Which transaction types a filter lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// Match every transaction regardless of type.
    #[default]
    All,
    /// Match only transactions of the given type.
    Only(TransactionType),
}

impl TypeFilter {
    /// Parse a filter from its query-string form ("all", "income" or
    /// "expense"). Unknown values fall back to [TypeFilter::All].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "income" => TypeFilter::Only(TransactionType::Income),
            "expense" => TypeFilter::Only(TransactionType::Expense),
            _ => TypeFilter::All,
        }
    }

    /// The value used for this filter in query strings and form controls.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Only(TransactionType::Income) => "income",
            TypeFilter::Only(TransactionType::Expense) => "expense",
        }
    }
}

/// Which calendar month a filter lets through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MonthFilter {
    /// Match every transaction regardless of date.
    #[default]
    All,
    /// Match only transactions whose date falls in the given "YYYY-MM" month.
    Month(String),
}

impl MonthFilter {
    /// Parse a filter from its query-string form ("all" or "YYYY-MM").
    ///
    /// Malformed month strings fall back to [MonthFilter::All] rather than
    /// erroring, so a hand-edited URL degrades to the unfiltered view.
    pub fn parse(raw: &str) -> Self {
        if is_valid_month_key(raw) {
            MonthFilter::Month(raw.to_owned())
        } else {
            MonthFilter::All
        }
    }

    /// The value used for this filter in query strings and form controls.
    pub fn as_query_value(&self) -> &str {
        match self {
            MonthFilter::All => "all",
            MonthFilter::Month(month) => month,
        }
    }
}

fn is_valid_month_key(raw: &str) -> bool {
    let Some((year, month)) = raw.split_once('-') else {
        return false;
    };

    let year_ok = year.len() == 4 && year.bytes().all(|byte| byte.is_ascii_digit());
    let month_ok = month.len() == 2 && matches!(month.parse::<u8>(), Ok(1..=12));

    year_ok && month_ok
}

/// The criteria for narrowing a transaction list.
///
/// All three predicates must hold for a transaction to pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionFilter {
    /// Which transaction types to keep.
    pub type_filter: TypeFilter,
    /// Which calendar month to keep.
    pub month_filter: MonthFilter,
    /// Case-insensitive text that must appear in the category, description or
    /// amount. The empty string matches everything.
    pub search_text: String,
}

impl TransactionFilter {
    fn matches(&self, transaction: &Transaction) -> bool {
        if let TypeFilter::Only(transaction_type) = self.type_filter
            && transaction.transaction_type != transaction_type
        {
            return false;
        }

        if let MonthFilter::Month(month) = &self.month_filter
            && &month_key(transaction.date) != month
        {
            return false;
        }

        if !self.search_text.is_empty() {
            let haystack = format!(
                "{} {} {}",
                transaction.category, transaction.description, transaction.amount
            )
            .to_lowercase();

            if !haystack.contains(&self.search_text.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

/// The subsequence of `transactions` matching `filter`, in the original order.
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction))
        .cloned()
        .collect()
}
