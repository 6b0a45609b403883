//! Demo authentication gate.
//!
//! [`AuthProvider`] checks credentials against a table supplied at
//! process start (from config) and issues opaque session tokens kept in a
//! [`SessionStore`]. This is a demo gate, not a security boundary:
//! passwords are compared in plain text.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use uuid::Uuid;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "markflow_session";

/// A login the provider accepts.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Public view of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

/// An issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Storage for issued sessions.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session);
    fn get(&self, token: &str) -> Option<Session>;
    fn remove(&self, token: &str);
}

/// Process-local session store.
///
/// Expired sessions are pruned on every insert. A poisoned lock is
/// recovered rather than dropping the operation.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of sessions currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) {
        let now = Utc::now();
        let mut sessions = self.write();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session.token.clone(), session);
    }

    fn get(&self, token: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .cloned()
    }

    fn remove(&self, token: &str) {
        self.write().remove(token);
    }
}

/// Why a login attempt was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginError {
    MissingFields,
    InvalidCredentials,
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::MissingFields => write!(f, "Email and password are required"),
            LoginError::InvalidCredentials => write!(f, "Invalid email or password"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Credential check plus session issuance.
pub struct AuthProvider {
    users: Vec<Credential>,
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl AuthProvider {
    pub fn new(users: Vec<Credential>, sessions: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            ttl,
        }
    }

    /// The two demo accounts used when config supplies none.
    pub fn demo_users() -> Vec<Credential> {
        vec![
            Credential {
                email: "demo@markflow.com".to_string(),
                password: "demo123".to_string(),
                name: "Demo User".to_string(),
            },
            Credential {
                email: "user@markflow.com".to_string(),
                password: "password123".to_string(),
                name: "Markflow User".to_string(),
            },
        ]
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verifies credentials and issues a session.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(LoginError::MissingFields);
        }
        let cred = self
            .users
            .iter()
            .find(|u| u.email == email.trim() && u.password == password)
            .ok_or(LoginError::InvalidCredentials)?;

        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            user: User {
                email: cred.email.clone(),
                name: cred.name.clone(),
            },
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(session.clone());
        Ok(session)
    }

    /// The user behind `token`, if the session exists and has not expired.
    /// Expired sessions are removed.
    pub fn session_user(&self, token: &str) -> Option<User> {
        let session = self.sessions.get(token)?;
        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(session.user)
    }

    pub fn logout(&self, token: &str) {
        self.sessions.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(ttl: Duration) -> AuthProvider {
        AuthProvider::new(
            AuthProvider::demo_users(),
            Arc::new(InMemorySessionStore::new()),
            ttl,
        )
    }

    #[test]
    fn test_login_and_session() {
        let auth = provider(Duration::days(7));
        let session = auth.login("demo@markflow.com", "demo123").unwrap();
        assert_eq!(session.user.name, "Demo User");
        assert_eq!(
            auth.session_user(&session.token),
            Some(User {
                email: "demo@markflow.com".to_string(),
                name: "Demo User".to_string()
            })
        );
    }

    #[test]
    fn test_login_rejections() {
        let auth = provider(Duration::days(7));
        assert_eq!(auth.login("", "demo123").unwrap_err(), LoginError::MissingFields);
        assert_eq!(
            auth.login("demo@markflow.com", "wrong").unwrap_err(),
            LoginError::InvalidCredentials
        );
    }

    #[test]
    fn test_logout_ends_session() {
        let auth = provider(Duration::days(7));
        let session = auth.login("user@markflow.com", "password123").unwrap();
        auth.logout(&session.token);
        assert_eq!(auth.session_user(&session.token), None);
    }

    #[test]
    fn test_expired_session_rejected() {
        let auth = provider(Duration::seconds(-1));
        let session = auth.login("demo@markflow.com", "demo123").unwrap();
        assert_eq!(auth.session_user(&session.token), None);
    }

    fn session(token: &str, ttl: Duration) -> Session {
        Session {
            token: token.to_string(),
            user: User {
                email: "demo@markflow.com".to_string(),
                name: "Demo User".to_string(),
            },
            expires_at: Utc::now() + ttl,
        }
    }

    #[test]
    fn test_insert_prunes_expired_sessions() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty());
        store.insert(session("stale-1", Duration::seconds(-5)));
        store.insert(session("stale-2", Duration::seconds(-1)));
        assert_eq!(store.len(), 1);

        store.insert(session("fresh", Duration::days(1)));
        assert_eq!(store.len(), 1);
        assert!(store.get("stale-2").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_login_prunes_abandoned_sessions() {
        let store = Arc::new(InMemorySessionStore::new());
        let expired = AuthProvider::new(
            AuthProvider::demo_users(),
            store.clone(),
            Duration::seconds(-1),
        );
        expired.login("demo@markflow.com", "demo123").unwrap();
        expired.login("user@markflow.com", "password123").unwrap();

        let auth = AuthProvider::new(AuthProvider::demo_users(), store.clone(), Duration::days(7));
        let live = auth.login("demo@markflow.com", "demo123").unwrap();
        assert_eq!(store.len(), 1);
        assert!(auth.session_user(&live.token).is_some());
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let store = Arc::new(InMemorySessionStore::new());
        store.insert(session("before", Duration::days(1)));

        let poisoner = store.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.sessions.write().unwrap();
            panic!("poison the session lock");
        })
        .join();
        assert!(result.is_err());
        assert!(store.sessions.is_poisoned());

        store.insert(session("after", Duration::days(1)));
        assert!(store.get("before").is_some());
        assert!(store.get("after").is_some());
        store.remove("before");
        assert!(store.get("before").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_token() {
        let auth = provider(Duration::days(7));
        assert_eq!(auth.session_user("dummy_token_123"), None);
    }
}
