//! Creates a test database with a test user and sample transactions.
//!
//! The test user's email is `test@test.com` and their password is `test`.

use std::{path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use fintrack::{
    PasswordHash, Transaction, TransactionType, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

/// Create a SQLite database for testing.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The file path where the SQLite database file should be created.
    #[arg(long)]
    output_path: String,
}

fn main() {
    let args = Args::parse();
    let path = Path::new(&args.output_path);

    match path.extension() {
        Some(extension) if extension == "db" => {}
        _ => {
            eprintln!(
                "The output path must end with the extension '.db', got {}",
                args.output_path
            );
            exit(1);
        }
    }

    if path.exists() {
        eprintln!("The file {} already exists.", args.output_path);
        exit(1);
    }

    let conn = Connection::open(path).expect("Could not create database file");
    initialize_db(&conn).expect("Could not initialize database");

    // The password does not pass the strength check, so skip validation. This
    // is fine since this database should only be used for local testing.
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )
    .expect("Could not hash password");

    let user = create_user("test@test.com", password_hash, &conn)
        .expect("Could not create test user");

    let today = OffsetDateTime::now_utc().date();

    let samples = [
        (TransactionType::Income, 5_000.0, 20, "salary", "Monthly pay"),
        (TransactionType::Expense, 1_800.0, 18, "rent", ""),
        (TransactionType::Expense, 250.75, 12, "food", "Groceries"),
        (TransactionType::Expense, 60.0, 5, "transport", "Fuel"),
        (TransactionType::Income, 120.0, 2, "", "Sold old desk"),
    ];

    for (transaction_type, amount, days_ago, category, description) in samples {
        let date = today - Duration::days(days_ago);
        create_transaction(
            Transaction::build(transaction_type, amount, date, user.id)
                .category(category)
                .description(description),
            &conn,
        )
        .expect("Could not insert sample transaction");
    }

    println!("Created test database at {}", args.output_path);
}
