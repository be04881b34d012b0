//! The public landing page served at the root route.
//!
//! Visitors with a valid session skip straight to the transactions page.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};

use crate::{
    auth::get_token_from_cookies,
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
};

/// Render the landing page, or redirect signed-in visitors to their
/// transactions.
pub async fn get_landing_page(jar: PrivateCookieJar) -> Response {
    if get_token_from_cookies(&jar).is_ok() {
        return Redirect::to(endpoints::TRANSACTIONS_VIEW).into_response();
    }

    landing_view().into_response()
}

fn landing_view() -> Markup {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="max-w-screen-sm text-center py-16"
            {
                img class="w-16 h-16 mx-auto mb-6" src="/static/favicon-32x32.png" alt="logo";

                h1 class="mb-4 text-4xl font-extrabold tracking-tight text-gray-900 dark:text-white"
                {
                    "Take control of your finances with FinTrack"
                }

                p class="mb-8 text-lg text-gray-700 dark:text-gray-300"
                {
                    "Record your income and expenses, browse them with filters and \
                    sorting, and see where your money goes with monthly reports."
                }

                div class="flex justify-center gap-4"
                {
                    a
                        href=(endpoints::LOG_IN_VIEW)
                        class="px-6 py-3 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600 \
                            hover:dark:bg-blue-700 text-white rounded"
                    {
                        "Log in"
                    }

                    a
                        href=(endpoints::REGISTER_VIEW)
                        class="px-6 py-3 rounded border border-gray-300 dark:border-gray-600 \
                            text-gray-800 dark:text-gray-200 hover:bg-gray-100 \
                            hover:dark:bg-white/10"
                    {
                        "Create an account"
                    }
                }
            }
        }
    };

    base("Welcome", &[], &content)
}

#[cfg(test)]
mod landing_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use scraper::{Html, Selector};
    use sha2::{Digest, Sha512};
    use time::UtcOffset;

    use crate::{
        UserID,
        auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
        endpoints,
    };

    use super::{get_landing_page, landing_view};

    fn get_jar() -> PrivateCookieJar {
        let key = Key::from(&Sha512::digest("42"));
        PrivateCookieJar::new(key)
    }

    #[tokio::test]
    async fn signed_out_visitor_sees_landing_page() {
        let response = get_landing_page(get_jar()).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signed_in_visitor_is_redirected_to_transactions() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::new(1),
            DEFAULT_COOKIE_DURATION,
            UtcOffset::UTC,
        )
        .unwrap();

        let response = get_landing_page(jar).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::TRANSACTIONS_VIEW
        );
    }

    #[test]
    fn landing_page_links_to_log_in_and_register() {
        let html = Html::parse_document(&landing_view().into_string());

        for href in [endpoints::LOG_IN_VIEW, endpoints::REGISTER_VIEW] {
            let selector = Selector::parse(&format!("a[href=\"{href}\"]")).unwrap();
            assert!(
                html.select(&selector).next().is_some(),
                "want a link to {href}"
            );
        }
    }
}
