//! Defines the core data model and database queries for transactions.

use std::fmt::Display;
use std::str::FromStr;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, UserID, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction records money being earned or spent.
///
/// Amounts are always non-negative; this type carries the direction instead
/// of the sign of the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase string form stored in the database and used in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("\"{other}\" is not a valid transaction type")),
        }
    }
}

/// An income or expense record belonging to a single user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// A lowercase free-text label, e.g. "salary" or "food".
    ///
    /// Categories are open strings: arbitrary labels from stored data are
    /// accepted and never validated against a fixed list.
    pub category: String,
    /// The non-negative amount of money earned or spent.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Optional free text detailing the transaction.
    pub description: String,
    /// The user that created the transaction.
    pub user_id: UserID,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: f64,
        date: Date,
        user_id: UserID,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date,
            category: String::new(),
            description: String::new(),
            user_id,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Category and description default to the empty string. Pass the builder to
/// [create_transaction] to validate and insert the transaction.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The non-negative amount of money earned or spent.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A lowercase free-text label, e.g. "salary" or "food".
    pub category: String,
    /// Optional free text detailing the transaction.
    pub description: String,
    /// The user that created the transaction.
    pub user_id: UserID,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    ///
    /// The label is lowercased so that "Food" and "food" aggregate into the
    /// same group.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.trim().to_lowercase();
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if builder.amount < 0.0 {
        return Err(Error::NegativeAmount(builder.amount));
    }

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (type, category, amount, date, description, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, type, category, amount, date, description, user_id",
        )?
        .query_one(
            (
                builder.transaction_type.as_str(),
                builder.category,
                builder.amount,
                builder.date,
                builder.description,
                builder.user_id.as_i64(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve one of `user_id`'s transactions from the database by its `id`.
///
/// Asking for another user's transaction behaves the same as asking for one
/// that does not exist.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, type, category, amount, date, description, user_id
             FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all of `user_id`'s transactions in insertion order.
///
/// Each page queries exactly one user's transactions; the pure filter, sort
/// and aggregation functions then run over the returned snapshot in memory.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, type, category, amount, date, description, user_id
             FROM \"transaction\" WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// The distinct categories `user_id` has used before, alphabetically.
///
/// Blank categories are skipped. Used to suggest labels on the new
/// transaction form.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_categories_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT category FROM \"transaction\"
             WHERE user_id = :user_id AND category <> '' ORDER BY category ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .collect::<Result<Vec<String>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

type RowsAffected = usize;

/// Delete one of `user_id`'s transactions by its `id`.
///
/// Returns the number of rows removed, which is zero when `id` does not refer
/// to one of the user's transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id.as_i64())],
        )
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL CHECK(type IN ('income', 'expense')),
                category TEXT NOT NULL,
                amount REAL NOT NULL CHECK(amount >= 0),
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Index used by the per-user list queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user ON \"transaction\"(user_id, id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let type_string: String = row.get(1)?;
    let transaction_type = TransactionType::from_str(&type_string).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, error.into())
    })?;
    let category = row.get(2)?;
    let amount = row.get(3)?;
    let date = row.get(4)?;
    let description = row.get(5)?;
    let user_id = UserID::new(row.get(6)?);

    Ok(Transaction {
        id,
        transaction_type,
        category,
        amount,
        date,
        description,
        user_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash, UserID,
        db::initialize,
        transaction::{
            Transaction, TransactionType, count_transactions, create_transaction,
            get_transaction, get_transactions_for_user,
        },
        user::create_user,
    };

    use super::delete_transaction;

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            Transaction::build(
                TransactionType::Expense,
                amount,
                date!(2024 - 10 - 05),
                user_id,
            )
            .category("Food")
            .description("groceries"),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.transaction_type, TransactionType::Expense);
                // Categories are normalized to lowercase on the way in.
                assert_eq!(transaction.category, "food");
                assert_eq!(transaction.description, "groceries");
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let (conn, user_id) = get_test_connection();

        let result = create_transaction(
            Transaction::build(
                TransactionType::Expense,
                -12.3,
                date!(2024 - 10 - 05),
                user_id,
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-12.3)));
    }

    #[test]
    fn get_returns_only_the_owners_transaction() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            "other@example.com",
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        let transaction = create_transaction(
            Transaction::build(
                TransactionType::Income,
                100.0,
                date!(2024 - 10 - 05),
                user_id,
            ),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, user_id, &conn),
            Ok(transaction.clone())
        );
        assert_eq!(
            get_transaction(transaction.id, other_user.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_returns_transactions_in_insertion_order() {
        let (conn, user_id) = get_test_connection();
        for amount in [3.0, 1.0, 2.0] {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    amount,
                    date!(2024 - 10 - 05),
                    user_id,
                ),
                &conn,
            )
            .unwrap();
        }

        let transactions = get_transactions_for_user(user_id, &conn).unwrap();

        let amounts: Vec<_> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn delete_removes_transaction() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(
                TransactionType::Expense,
                1.23,
                date!(2024 - 10 - 26),
                user_id,
            ),
            &conn,
        )
        .unwrap();

        let rows_affected = delete_transaction(transaction.id, user_id, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn delete_ignores_other_users_transactions() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user(
            "other@example.com",
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        let transaction = create_transaction(
            Transaction::build(
                TransactionType::Expense,
                1.23,
                date!(2024 - 10 - 26),
                user_id,
            ),
            &conn,
        )
        .unwrap();

        let rows_affected = delete_transaction(transaction.id, other_user.id, &conn).unwrap();

        assert_eq!(rows_affected, 0);
        assert_eq!(count_transactions(&conn), Ok(1));
    }
}
