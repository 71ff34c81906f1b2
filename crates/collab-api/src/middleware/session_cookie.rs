//! Refresh-token cookie
//!
//! The refresh token only ever travels in this cookie: HttpOnly, SameSite=Lax,
//! Path=/, Secure unless configured off for local HTTP.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use collab_common::CookieConfig;

use crate::response::ApiError;

fn with_attributes(mut cookie: Cookie<'static>, config: &CookieConfig) -> Cookie<'static> {
    cookie.set_http_only(true);
    cookie.set_secure(config.secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie
}

/// Cookie carrying `token` for `max_age_secs`
///
/// # Errors
/// Returns an internal error if the token cannot form a cookie value
pub fn refresh_cookie(
    config: &CookieConfig,
    token: &str,
    max_age_secs: i64,
) -> Result<Cookie<'static>, ApiError> {
    let cookie = Cookie::parse(format!("{}={token}; Max-Age={max_age_secs}", config.name))
        .map_err(ApiError::internal)?;
    Ok(with_attributes(cookie, config))
}

/// Add the refresh cookie to `jar`
///
/// # Errors
/// See [`refresh_cookie`]
pub fn set_refresh_cookie(
    jar: CookieJar,
    config: &CookieConfig,
    token: &str,
    max_age_secs: i64,
) -> Result<CookieJar, ApiError> {
    Ok(jar.add(refresh_cookie(config, token, max_age_secs)?))
}

/// Expire the refresh cookie, with the attributes it was set with.
/// Emitted whether or not the request carried the cookie.
pub fn clear_refresh_cookie(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    let mut cookie = with_attributes(Cookie::new(config.name.clone(), ""), config);
    cookie.make_removal();
    jar.add(cookie)
}

/// Refresh token presented by the client, if any
pub fn read_refresh_cookie<'a>(jar: &'a CookieJar, config: &CookieConfig) -> Option<&'a str> {
    jar.get(&config.name)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
}
