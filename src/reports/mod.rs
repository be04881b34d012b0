//! Reports module
//!
//! Provides a page with aggregate totals, a category breakdown, charts and a
//! plain-language summary of the user's transactions, optionally narrowed to
//! a single calendar month.

mod charts;
mod handlers;
mod narrative;

pub use handlers::get_reports_page;
