//! Reading the auth cookie set by the identity provider.

use axum_extra::extract::PrivateCookieJar;
use time::OffsetDateTime;

use crate::{Error, UserID, auth::Token};

/// The name of the private cookie holding the JSON encoded [Token].
pub const COOKIE_TOKEN: &str = "auth_token";

/// Decode the token in the auth cookie.
///
/// # Errors
///
/// Returns [Error::CookieMissing] if there is no auth cookie, or
/// [Error::InvalidToken] if its value is not a token.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidToken(error.to_string()))
}

/// The signed in user, if the auth cookie holds a token that is valid at `now`.
///
/// # Errors
///
/// Returns [Error::SessionExpired] for expired tokens, otherwise the errors of
/// [get_token_from_cookies].
pub fn authenticate(jar: &PrivateCookieJar, now: OffsetDateTime) -> Result<UserID, Error> {
    let token = get_token_from_cookies(jar)?;

    if token.is_expired(now) {
        return Err(Error::SessionExpired);
    }

    Ok(token.user_id)
}

/// Add an auth cookie holding `token`, as the identity provider does.
#[cfg(test)]
pub(crate) fn set_auth_cookie(jar: PrivateCookieJar, token: &Token) -> PrivateCookieJar {
    use axum_extra::extract::cookie::{Cookie, SameSite};

    let value = serde_json::to_string(token).expect("Could not serialize token");

    jar.add(
        Cookie::build((COOKIE_TOKEN, value))
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}
