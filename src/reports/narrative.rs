//! The plain-language summary shown at the top of the reports page.

use crate::{
    aggregation::{CategorySummary, Totals},
    html::format_currency_rounded,
};

/// How many categories the summary sentence names.
const NARRATIVE_CATEGORY_COUNT: usize = 3;

/// A one-paragraph summary of `totals` and the top categories.
///
/// A positive or zero balance reads as a surplus, a negative balance as a
/// deficit, always stated as a positive dollar amount. `month` switches the
/// opening between an overall summary and a single-month snapshot.
pub(super) fn narrative_summary(
    month: Option<&str>,
    totals: &Totals,
    categories: &[CategorySummary],
) -> String {
    let opening = match month {
        Some(month) => format!("{month} snapshot: "),
        None => "Overall, ".to_owned(),
    };
    let outcome = if totals.balance < 0.0 {
        "deficit"
    } else {
        "surplus"
    };

    let mut summary = format!(
        "{opening}you earned {} and spent {}, resulting in a {outcome} of {}.",
        format_currency_rounded(totals.income),
        format_currency_rounded(totals.expense),
        format_currency_rounded(totals.balance.abs()),
    );

    if categories.is_empty() {
        summary.push_str(" Categories with the biggest impact are not yet available.");
    } else {
        let top_categories: Vec<&str> = categories
            .iter()
            .take(NARRATIVE_CATEGORY_COUNT)
            .map(|summary| summary.category.as_str())
            .collect();

        summary.push_str(&format!(
            " Categories with the biggest impact are {}.",
            top_categories.join(", ")
        ));
    }

    summary
}
