//! Authentication against the auth cookie set by the external identity provider.

mod cookie;
mod middleware;
mod redirect;
mod token;

pub use cookie::{COOKIE_TOKEN, authenticate, get_token_from_cookies};
#[cfg(test)]
pub(crate) use cookie::set_auth_cookie;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use token::Token;
