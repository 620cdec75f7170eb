use tracing::{debug, info, warn};

use crate::auth::{
    dto::{LoginRequest, RegisterRequest},
    password::{hash_password_blocking, verify_password_blocking, HashError},
    repo::CredentialStore,
    repo_types::User,
    session::{SessionError, SessionManager, SessionUser},
};
use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email, username and password are required")]
    MissingFields,
    #[error("email already registered")]
    EmailTaken,
    #[error("store rejected new account: {0}")]
    Rejected(StoreError),
    #[error("unknown username")]
    UnknownUser,
    #[error("wrong password")]
    WrongPassword,
    #[error("no active session")]
    Unauthenticated,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Create an account. Does not log the new user in.
pub async fn register(users: &dyn CredentialStore, req: RegisterRequest) -> Result<User, AuthError> {
    let email = req.email.trim().to_lowercase();
    let username = req.username.trim();
    if email.is_empty() || username.is_empty() || req.password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!("registration refused, email already registered");
        return Err(AuthError::EmailTaken);
    }

    let hash = hash_password_blocking(req.password).await?;

    let user = users
        .insert(&email, username, &hash)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) | StoreError::Rejected(_) => AuthError::Rejected(e),
            StoreError::Unavailable(_) => AuthError::Store(e),
        })?;

    info!(user_id = %user.id, %username, "user registered");
    Ok(user)
}

/// Check credentials and open a session. Returns the session token and the
/// user it belongs to.
pub async fn login(
    users: &dyn CredentialStore,
    sessions: &SessionManager,
    req: LoginRequest,
) -> Result<(String, SessionUser), AuthError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AuthError::UnknownUser);
    }

    let Some(user) = users.find_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(AuthError::UnknownUser);
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AuthError::WrongPassword);
    }

    let session_user = SessionUser::from(&user);
    let token = sessions.create(session_user.clone())?;

    info!(user_id = %user.id, %username, "user logged in");
    Ok((token, session_user))
}

/// End the session behind `token`, if there is one.
pub fn logout(sessions: &SessionManager, token: Option<&str>) -> Result<(), AuthError> {
    match token {
        Some(token) => sessions.destroy(token)?,
        None => debug!("logout without session cookie"),
    }
    Ok(())
}

/// The user behind `token`, if the session is still live.
pub fn current_session(
    sessions: &SessionManager,
    token: Option<&str>,
) -> Result<SessionUser, AuthError> {
    let token = token.ok_or(AuthError::Unauthenticated)?;
    sessions.resolve(token)?.ok_or(AuthError::Unauthenticated)
}
