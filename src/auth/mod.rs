//! Cookie-based authentication: session tokens, the auth middleware and
//! redirect helpers for the log in flow.

pub(crate) mod cookie;
mod middleware;
mod redirect;
mod token;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie,
};
pub(crate) use cookie::get_token_from_cookies;
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::normalize_redirect_url;
pub(super) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
