use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::{cookie::Key, SignedCookieJar};

use super::{cookie::session_token, services::current_session, session::SessionUser};
use crate::{error::AppError, state::AppState};

/// Resolves the session cookie to the logged-in user, rejecting with 401
/// when there is no live session.
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match SignedCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        let token = session_token(&jar);

        let user = current_session(&state.sessions, token.as_deref())?;
        Ok(AuthUser(user))
    }
}
