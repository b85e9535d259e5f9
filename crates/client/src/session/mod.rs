//! Session store.
//!
//! The single source of truth for "who is logged in". One store is opened at
//! start-up, handed to every consumer, and torn down on logout.
//!
//! # Architecture
//!
//! - An in-memory snapshot guarded by a lock, read without touching storage
//! - A [`SessionBackend`] written through on every change
//! - Writes replace all four fields at once; last write wins

mod backend;
mod error;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use agent_portal_core::{AccessToken, Role, Session, UserId};

pub use backend::{FileBackend, MemoryBackend, SessionBackend};
pub use error::SessionError;

/// Shared handle to the current session.
///
/// Cloning is cheap; clones observe the same session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    backend: Box<dyn SessionBackend>,
    current: RwLock<Session>,
}

impl SessionStore {
    /// Open a store, reading whatever the backend has persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has a session that cannot be read.
    pub fn open(backend: impl SessionBackend + 'static) -> Result<Self, SessionError> {
        let current = backend.load()?.unwrap_or_default();
        debug!(
            authenticated = current.is_authenticated(),
            "Opened session store"
        );

        Ok(Self {
            inner: Arc::new(SessionStoreInner {
                backend: Box::new(backend),
                current: RwLock::new(current),
            }),
        })
    }

    /// A store that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                backend: Box::new(MemoryBackend::new()),
                current: RwLock::new(Session::anonymous()),
            }),
        }
    }

    /// Replace the session with a fully populated one.
    ///
    /// Storage is written before the in-memory snapshot, so a failed write
    /// leaves the previous session in place.
    ///
    /// Storage I/O runs on the calling thread while the lock is held. With
    /// [`FileBackend`] that is a synchronous file write and `fsync`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn set_session(
        &self,
        token: AccessToken,
        role: Role,
        user_id: UserId,
        username: impl Into<String>,
    ) -> Result<Session, SessionError> {
        let session = Session::authenticated(token, role, user_id, username);

        let mut current = self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.backend.save(&session)?;
        current.clone_from(&session);
        drop(current);

        debug!(role = %role, "Session stored");
        Ok(session)
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn get_session(&self) -> Session {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<AccessToken> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    /// Remove every session field.
    ///
    /// The in-memory session is cleared even when storage cannot be; the
    /// storage error is still returned. Like [`Self::set_session`], storage
    /// I/O runs on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be cleared.
    pub fn clear_session(&self) -> Result<(), SessionError> {
        let mut current = self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Session::anonymous();
        let result = self.inner.backend.clear();
        drop(current);

        debug!("Session cleared");
        result
    }

    /// Clear the session after the API rejected `rejected`.
    ///
    /// Only clears if the session still holds that token; a rejection for a
    /// request sent with an older token leaves a newer session in place.
    /// Storage failures are logged, not returned, since the caller is already
    /// reporting the rejection. Returns whether the session was cleared.
    pub fn invalidate_if(&self, rejected: &AccessToken) -> bool {
        let mut current = self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if current.token.as_ref() != Some(rejected) {
            debug!("Rejected token is no longer current; session kept");
            return false;
        }

        *current = Session::anonymous();
        if let Err(e) = self.inner.backend.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        drop(current);

        debug!("Session invalidated");
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(store: &SessionStore) -> Session {
        store
            .set_session(
                AccessToken::new("t1"),
                Role::Employee,
                UserId::new("u1"),
                "bob",
            )
            .unwrap()
    }

    #[test]
    fn test_set_then_get_returns_written_values() {
        let store = SessionStore::in_memory();
        let written = write(&store);

        let session = store.get_session();
        assert_eq!(session, written);
        assert_eq!(session.token, Some(AccessToken::new("t1")));
        assert_eq!(session.role, Some(Role::Employee));
        assert_eq!(session.user_id, Some(UserId::new("u1")));
        assert_eq!(session.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_clear_then_get_returns_empty_session() {
        let store = SessionStore::in_memory();
        write(&store);
        store.clear_session().unwrap();

        let session = store.get_session();
        assert!(session.is_empty());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let store = SessionStore::in_memory();
        write(&store);
        store
            .set_session(AccessToken::new("t2"), Role::Admin, UserId::new("u2"), "ann")
            .unwrap();

        let session = store.get_session();
        assert_eq!(session.token, Some(AccessToken::new("t2")));
        assert_eq!(session.username.as_deref(), Some("ann"));
    }

    #[test]
    fn test_clones_share_the_session() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        write(&store);
        assert!(other.get_session().is_authenticated());
        other.invalidate_if(&AccessToken::new("t1"));
        assert!(!store.get_session().is_authenticated());
    }

    #[test]
    fn test_invalidate_if_clears_matching_token() {
        let backend = MemoryBackend::new();
        let store = SessionStore::open(backend.clone()).unwrap();
        write(&store);

        assert!(store.invalidate_if(&AccessToken::new("t1")));
        assert!(store.get_session().is_empty());
        assert!(backend.stored().is_none());
    }

    #[test]
    fn test_invalidate_if_keeps_newer_session() {
        let backend = MemoryBackend::new();
        let store = SessionStore::open(backend.clone()).unwrap();
        write(&store);
        let newer = store
            .set_session(AccessToken::new("t2"), Role::Admin, UserId::new("u2"), "ann")
            .unwrap();

        assert!(!store.invalidate_if(&AccessToken::new("t1")));
        assert_eq!(store.get_session(), newer);
        assert_eq!(backend.stored(), Some(newer));
    }

    #[test]
    fn test_reopen_restores_persisted_session() {
        let backend = MemoryBackend::new();
        let store = SessionStore::open(backend.clone()).unwrap();
        let written = write(&store);

        let reopened = SessionStore::open(backend.clone()).unwrap();
        assert_eq!(reopened.get_session(), written);

        reopened.clear_session().unwrap();
        assert!(backend.stored().is_none());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(FileBackend::new(&path)).unwrap();
        let written = write(&store);
        drop(store);

        let reopened = SessionStore::open(FileBackend::new(&path)).unwrap();
        assert_eq!(reopened.get_session(), written);
    }

    #[derive(Debug)]
    struct ReadOnlyBackend;

    impl SessionBackend for ReadOnlyBackend {
        fn load(&self) -> Result<Option<Session>, SessionError> {
            Ok(None)
        }

        fn save(&self, _session: &Session) -> Result<(), SessionError> {
            Err(SessionError::io(
                "session.json",
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        }

        fn clear(&self) -> Result<(), SessionError> {
            Err(SessionError::io(
                "session.json",
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        }
    }

    #[test]
    fn test_failed_write_keeps_previous_session() {
        let store = SessionStore::open(ReadOnlyBackend).unwrap();
        assert!(matches!(
            store.set_session(AccessToken::new("t1"), Role::Admin, UserId::new("u1"), "ann"),
            Err(SessionError::Io { .. })
        ));
        assert!(store.get_session().is_empty());
    }

    #[test]
    fn test_failed_clear_still_clears_memory() {
        let store = SessionStore::open(ReadOnlyBackend).unwrap();
        store.inner.current.write().unwrap().token = Some(AccessToken::new("t1"));

        assert!(store.clear_session().is_err());
        assert!(store.get_session().is_empty());
    }
}
