//! Pure functions for ordering a transaction list by date or amount.
//!
//! Sorting is stable: transactions with equal keys keep their original
//! relative order.

use std::cmp::Ordering;

use crate::transaction::Transaction;

/// The field a transaction list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Chronological order.
    #[default]
    Date,
    /// Numeric order on the transaction amount.
    Amount,
}

impl SortField {
    /// Parse a field from its query-string form. Unknown values fall back to
    /// [SortField::Date].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "amount" => SortField::Amount,
            _ => SortField::Date,
        }
    }

    /// The value used for this field in query strings.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount",
        }
    }
}

/// The direction a transaction list is ordered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest or earliest first.
    Ascending,
    /// Largest or latest first.
    #[default]
    Descending,
}

impl SortDirection {
    /// Parse a direction from its query-string form. Unknown values fall back
    /// to [SortDirection::Descending].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "asc" => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    /// The value used for this direction in query strings.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    /// The opposite direction.
    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The active sort order of a transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSelection {
    /// The field to order by.
    pub field: SortField,
    /// The direction to order in.
    pub direction: SortDirection,
}

/// The sort order after clicking the button for `clicked`.
///
/// Clicking a sort button always flips the direction, even when the clicked
/// field differs from the current one. The direction is shared between the
/// two fields rather than remembered per field, so switching fields continues
/// from wherever the direction last was instead of resetting to a default.
pub fn toggle_sort(current: SortSelection, clicked: SortField) -> SortSelection {
    SortSelection {
        field: clicked,
        direction: current.direction.flipped(),
    }
}

/// A copy of `transactions` ordered by `selection`.
///
/// Ties preserve the original relative order and the input is left untouched.
pub fn sort_transactions(
    transactions: &[Transaction],
    selection: SortSelection,
) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();

    sorted.sort_by(|a, b| {
        let ordering = match selection.field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Amount => a
                .amount
                .partial_cmp(&b.amount)
                // Amounts are non-negative reals, so NaN cannot occur.
                .unwrap_or(Ordering::Equal),
        };

        match selection.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    sorted
}

#[cfg(test)]
mod sort_tests {
    use time::macros::date;

    use crate::{
        UserID,
        transaction::{Transaction, TransactionType},
    };

    use super::{
        SortDirection, SortField, SortSelection, sort_transactions, toggle_sort,
    };

    fn transaction_with(id: i64, amount: f64, date: time::Date) -> Transaction {
        Transaction {
            id,
            transaction_type: TransactionType::Expense,
            category: "misc".to_owned(),
            amount,
            date,
            description: String::new(),
            user_id: UserID::new(1),
        }
    }

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            transaction_with(1, 5.0, date!(2024 - 03 - 01)),
            transaction_with(2, 1.0, date!(2024 - 01 - 01)),
            transaction_with(3, 3.0, date!(2024 - 02 - 01)),
        ]
    }

    #[test]
    fn sorts_by_amount_in_both_directions() {
        let transactions = sample_transactions();

        let ascending = sort_transactions(
            &transactions,
            SortSelection {
                field: SortField::Amount,
                direction: SortDirection::Ascending,
            },
        );
        let descending = sort_transactions(
            &transactions,
            SortSelection {
                field: SortField::Amount,
                direction: SortDirection::Descending,
            },
        );

        let amounts = |sorted: &[Transaction]| sorted.iter().map(|t| t.amount).collect::<Vec<_>>();
        assert_eq!(amounts(&ascending), vec![1.0, 3.0, 5.0]);
        assert_eq!(amounts(&descending), vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn sorts_by_date() {
        let transactions = sample_transactions();

        let sorted = sort_transactions(
            &transactions,
            SortSelection {
                field: SortField::Date,
                direction: SortDirection::Ascending,
            },
        );

        assert_eq!(sorted.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn equal_keys_preserve_original_order() {
        let same_date = date!(2024 - 01 - 01);
        let transactions = vec![
            transaction_with(1, 10.0, same_date),
            transaction_with(2, 10.0, same_date),
            transaction_with(3, 10.0, same_date),
        ];

        for field in [SortField::Date, SortField::Amount] {
            let sorted = sort_transactions(
                &transactions,
                SortSelection {
                    field,
                    direction: SortDirection::Ascending,
                },
            );

            assert_eq!(
                sorted.iter().map(|t| t.id).collect::<Vec<_>>(),
                vec![1, 2, 3],
                "field: {field:?}"
            );
        }
    }

    #[test]
    fn does_not_mutate_the_input() {
        let transactions = sample_transactions();
        let before = transactions.clone();

        let _ = sort_transactions(
            &transactions,
            SortSelection {
                field: SortField::Amount,
                direction: SortDirection::Ascending,
            },
        );

        assert_eq!(transactions, before);
    }

    #[test]
    fn toggling_the_same_field_flips_direction() {
        let current = SortSelection {
            field: SortField::Date,
            direction: SortDirection::Descending,
        };

        let next = toggle_sort(current, SortField::Date);

        assert_eq!(next.field, SortField::Date);
        assert_eq!(next.direction, SortDirection::Ascending);
    }

    #[test]
    fn toggling_a_different_field_also_flips_direction() {
        // The direction is shared between fields rather than remembered per
        // field, so switching fields flips it too.
        let current = SortSelection {
            field: SortField::Date,
            direction: SortDirection::Ascending,
        };

        let next = toggle_sort(current, SortField::Amount);

        assert_eq!(next.field, SortField::Amount);
        assert_eq!(next.direction, SortDirection::Descending);
    }
}
