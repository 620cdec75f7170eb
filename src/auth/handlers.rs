use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::SignedCookieJar;
use tracing::instrument;

use crate::{
    auth::{
        cookie::{remove_session_cookie, session_token, set_session_cookie},
        dto::{LoginRequest, LoginResponse, RegisterRequest, SessionResponse},
        services::{self, AuthError},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/register", post(register))
        .route("/api/user/login", post(login))
        .route("/api/user/logout", post(logout))
        .route("/api/user/session", get(session))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Json(payload) = payload?;
    services::register(state.users.as_ref(), payload).await?;
    Ok(Json("User created successfully"))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(SignedCookieJar, Json<LoginResponse>), AppError> {
    let Json(payload) = payload?;
    let (token, user) = services::login(state.users.as_ref(), &state.sessions, payload).await?;

    let jar = set_session_cookie(
        jar,
        token,
        state.sessions.ttl(),
        state.config.session.cookie_secure,
    );
    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful",
            user,
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<&'static str>), AppError> {
    let token = session_token(&jar);
    services::logout(&state.sessions, token.as_deref())?;
    Ok((remove_session_cookie(jar), Json("Logged out successfully")))
}

#[instrument(skip(state, jar))]
pub async fn session(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let token = session_token(&jar);
    match services::current_session(&state.sessions, token.as_deref()) {
        Ok(user) => Json(SessionResponse {
            logged_in: true,
            user: Some(user),
        })
        .into_response(),
        Err(AuthError::Unauthenticated) => (
            StatusCode::UNAUTHORIZED,
            Json(SessionResponse {
                logged_in: false,
                user: None,
            }),
        )
            .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
