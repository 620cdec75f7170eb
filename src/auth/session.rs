//! Server-side session table.
//!
//! A session maps an opaque random token to the logged-in user. Sessions have
//! a fixed lifetime from creation; an expired session is treated exactly like
//! a missing one and is evicted either lazily on lookup or by the reaper task.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::repo_types::{User, UserId};

/// Number of random bytes in a session token.
const TOKEN_BYTES: usize = 32;

/// The account fields a session carries and returns to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session table lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    created_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

/// Shared handle to the in-memory session table. Clones share the same table.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// How long a session lives after creation.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user` and return its token.
    pub fn create(&self, user: SessionUser) -> Result<String, SessionError> {
        self.create_at(user, OffsetDateTime::now_utc())
    }

    fn create_at(&self, user: SessionUser, now: OffsetDateTime) -> Result<String, SessionError> {
        let token = new_token();
        let entry = SessionEntry {
            user,
            created_at: now,
            expires_at: now + self.ttl,
        };
        debug!(user_id = %entry.user.id, expires_at = %entry.expires_at, "session created");
        self.sessions
            .write()
            .map_err(|_| SessionError::Poisoned)?
            .insert(token.clone(), entry);
        Ok(token)
    }

    /// Look up a live session. Expired sessions resolve to `None`.
    pub fn resolve(&self, token: &str) -> Result<Option<SessionUser>, SessionError> {
        self.resolve_at(token, OffsetDateTime::now_utc())
    }

    fn resolve_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SessionUser>, SessionError> {
        let created_at = {
            let sessions = self.sessions.read().map_err(|_| SessionError::Poisoned)?;
            let Some(entry) = sessions.get(token) else {
                return Ok(None);
            };
            if now < entry.expires_at {
                return Ok(Some(entry.user.clone()));
            }
            entry.created_at
        };

        debug!(%created_at, "evicting expired session");
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        // recheck: another request may have replaced or dropped it meanwhile
        if sessions.get(token).is_some_and(|e| now >= e.expires_at) {
            sessions.remove(token);
        }
        Ok(None)
    }

    /// End a session. Unknown tokens are ignored.
    pub fn destroy(&self, token: &str) -> Result<(), SessionError> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| SessionError::Poisoned)?
            .remove(token);
        if let Some(entry) = removed {
            debug!(user_id = %entry.user.id, "session destroyed");
        }
        Ok(())
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize, SessionError> {
        self.purge_expired_at(OffsetDateTime::now_utc())
    }

    fn purge_expired_at(&self, now: OffsetDateTime) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        let before = sessions.len();
        sessions.retain(|_, entry| now < entry.expires_at);
        Ok(before - sessions.len())
    }

    /// Number of sessions currently held, live or not yet purged.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Spawn a task that purges expired sessions every `every`.
    pub fn spawn_reaper(&self, every: std::time::Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match manager.purge_expired() {
                    Ok(0) => {}
                    Ok(n) => info!(purged = n, live = manager.len(), "expired sessions purged"),
                    Err(e) => {
                        warn!(error = %e, "session reaper stopping");
                        return;
                    }
                }
            }
        })
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SessionUser {
        SessionUser {
            id: UserId(1),
            username: "alice".into(),
            email: "a@x.com".into(),
        }
    }

    #[test]
    fn created_session_resolves_to_its_user() {
        let sessions = SessionManager::new(Duration::hours(1));
        let token = sessions.create(alice()).unwrap();

        assert_eq!(sessions.resolve(&token).unwrap(), Some(alice()));
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let sessions = SessionManager::new(Duration::hours(1));
        let a = sessions.create(alice()).unwrap();
        let b = sessions.create(alice()).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let sessions = SessionManager::new(Duration::hours(1));
        assert_eq!(sessions.resolve("nope").unwrap(), None);
    }

    #[test]
    fn expired_session_behaves_as_absent_and_is_evicted() {
        let sessions = SessionManager::new(Duration::hours(1));
        let start = OffsetDateTime::now_utc();
        let token = sessions.create_at(alice(), start).unwrap();

        let just_before = start + Duration::minutes(59);
        assert_eq!(sessions.resolve_at(&token, just_before).unwrap(), Some(alice()));

        let at_expiry = start + Duration::hours(1);
        assert_eq!(sessions.resolve_at(&token, at_expiry).unwrap(), None);
        assert_eq!(sessions.len(), 0);
    }

    #[test]
    fn destroy_is_idempotent() {
        let sessions = SessionManager::new(Duration::hours(1));
        let token = sessions.create(alice()).unwrap();

        sessions.destroy(&token).unwrap();
        sessions.destroy(&token).unwrap();
        sessions.destroy("never-existed").unwrap();

        assert_eq!(sessions.resolve(&token).unwrap(), None);
    }

    #[test]
    fn destroying_one_session_leaves_others() {
        let sessions = SessionManager::new(Duration::hours(1));
        let a = sessions.create(alice()).unwrap();
        let b = sessions.create(alice()).unwrap();

        sessions.destroy(&a).unwrap();

        assert_eq!(sessions.resolve(&b).unwrap(), Some(alice()));
    }

    #[test]
    fn purge_removes_only_expired_sessions() {
        let sessions = SessionManager::new(Duration::hours(1));
        let start = OffsetDateTime::now_utc();
        sessions.create_at(alice(), start - Duration::hours(2)).unwrap();
        let live = sessions.create_at(alice(), start).unwrap();

        assert_eq!(sessions.purge_expired_at(start).unwrap(), 1);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.resolve_at(&live, start).unwrap(), Some(alice()));
    }

    #[test]
    fn evicting_an_expired_session_keeps_the_rest() {
        let sessions = SessionManager::new(Duration::hours(1));
        let start = OffsetDateTime::now_utc();
        let stale = sessions.create_at(alice(), start - Duration::hours(2)).unwrap();
        let other_stale = sessions.create_at(alice(), start - Duration::hours(2)).unwrap();
        let live = sessions.create_at(alice(), start).unwrap();

        assert_eq!(sessions.resolve_at(&stale, start).unwrap(), None);

        // only the looked-up token is evicted; the reaper handles the rest
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions.resolve_at(&live, start).unwrap(), Some(alice()));
        assert_eq!(sessions.purge_expired_at(start).unwrap(), 1);
        assert_eq!(sessions.resolve_at(&other_stale, start).unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_do_not_interfere() {
        let sessions = SessionManager::new(Duration::hours(1));

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let sessions = sessions.clone();
                tokio::spawn(async move {
                    let user = SessionUser {
                        id: UserId(i),
                        username: format!("user{i}"),
                        email: format!("user{i}@x.com"),
                    };
                    let token = sessions.create(user.clone()).unwrap();
                    tokio::task::yield_now().await;
                    let resolved = sessions.resolve(&token).unwrap();
                    sessions.destroy(&token).unwrap();
                    (user, resolved, sessions.resolve(&token).unwrap())
                })
            })
            .collect();

        for task in tasks {
            let (user, resolved, after_destroy) = task.await.unwrap();
            assert_eq!(resolved, Some(user));
            assert_eq!(after_destroy, None);
        }
        assert_eq!(sessions.len(), 0);
    }

    #[tokio::test]
    async fn reaper_purges_in_background() {
        let sessions = SessionManager::new(Duration::ZERO);
        sessions.create(alice()).unwrap();

        let handle = sessions.spawn_reaper(std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(sessions.len(), 0);
    }
}
