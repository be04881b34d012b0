//! Alert messages for displaying success and error feedback to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the alert
//! container out-of-band, so any endpoint can surface a message without
//! re-rendering the page.

use maud::{Markup, html};

/// A success or error message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertView {
    /// The operation succeeded.
    Success {
        /// A short headline for the alert.
        message: String,
        /// Further detail shown below the headline.
        details: String,
    },
    /// The operation failed.
    Error {
        /// A short headline for the alert.
        message: String,
        /// Further detail shown below the headline.
        details: String,
    },
}

impl AlertView {
    /// Create a new success alert.
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert.
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Render the alert as an out-of-band fragment targeting the alert
    /// container rendered by the base page template.
    pub fn into_markup(self) -> Markup {
        let (message, details, container_style, icon) = match self {
            AlertView::Success { message, details } => (
                message,
                details,
                "flex items-start p-4 mb-4 text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 border border-green-300 \
                dark:border-green-800 shadow-lg",
                "✓",
            ),
            AlertView::Error { message, details } => (
                message,
                details,
                "flex items-start p-4 mb-4 text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 border border-red-300 \
                dark:border-red-800 shadow-lg",
                "!",
            ),
        };

        html! {
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    span class="shrink-0 w-5 h-5 me-2 text-center font-bold" aria-hidden="true" { (icon) }

                    div class="text-sm"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex items-center \
                            justify-center h-8 w-8 hover:bg-gray-200 dark:hover:bg-gray-700"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}
