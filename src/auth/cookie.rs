//! The session cookie: how the session token travels to and from the client.

use axum_extra::extract::{
    cookie::{Cookie, Key, SameSite},
    SignedCookieJar,
};
use sha2::{Digest, Sha512};
use time::Duration;

pub(crate) const SESSION_COOKIE: &str = "sid";

/// Derive the cookie signing key from the deployment secret.
pub fn cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret.as_bytes()))
}

/// Add the session cookie holding `token` to `jar`.
pub(crate) fn set_session_cookie(
    jar: SignedCookieJar,
    token: String,
    max_age: Duration,
    secure: bool,
) -> SignedCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .max_age(max_age)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure),
    )
}

/// Tell the client to drop the session cookie.
pub(crate) fn remove_session_cookie(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// The session token from `jar`, if the client sent a validly signed one.
pub(crate) fn session_token(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_owned())
}
