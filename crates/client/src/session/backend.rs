//! Session persistence backends.
//!
//! The store reads its backend once at start-up and writes through it on
//! every change, so the session survives process restarts.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use agent_portal_core::{AccessToken, Role, Session, UserId};

use super::error::SessionError;

/// Durable storage for the session.
///
/// Implementations replace the stored session wholesale on `save`; there is
/// no partial update.
pub trait SessionBackend: Send + Sync + std::fmt::Debug {
    /// Read the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage exists but cannot be read.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage exists but cannot be removed.
    fn clear(&self) -> Result<(), SessionError>;
}

/// On-disk session format.
#[derive(Debug, Serialize, Deserialize, Default)]
struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

impl PersistedSession {
    fn from_session(session: &Session) -> Self {
        Self {
            access_token: session.token.as_ref().map(|t| t.expose().to_owned()),
            role: session.role.map(|r| r.as_str().to_owned()),
            user_id: session.user_id.as_ref().map(|id| id.as_str().to_owned()),
            username: session.username.clone(),
            saved_at: Some(Utc::now()),
        }
    }

    fn into_session(self) -> Session {
        // A role this client does not recognize loads as absent; the route
        // guard then treats the session as a member of no role set.
        let role = self.role.and_then(|raw| match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!(error = %e, "Ignoring stored session role");
                None
            }
        });

        Session {
            token: self.access_token.map(AccessToken::new),
            role,
            user_id: self.user_id.map(UserId::new),
            username: self.username,
        }
    }
}

/// JSON file backend.
///
/// Each write goes to its own uniquely named sibling temp file which is then
/// renamed over the target, so a concurrent reader sees either the old or the
/// new session, never a mix.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Back the session with the file at `path`. The file need not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the session file lives in.
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::io(&self.path, e)),
        };

        let persisted: PersistedSession = serde_json::from_str(&content)?;
        let session = persisted.into_session();
        debug!(path = %self.path.display(), "Loaded session file");

        Ok((!session.is_empty()).then_some(session))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|e| SessionError::io(dir, e))?;

        let json = serde_json::to_vec_pretty(&PersistedSession::from_session(session))?;

        // Each write gets its own temp file, so concurrent writers never
        // share one; the last rename wins.
        let mut file = private_temp_file()
            .tempfile_in(dir)
            .map_err(|e| SessionError::io(dir, e))?;
        file.write_all(&json)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| SessionError::io(file.path(), e))?;

        file.persist(&self.path)
            .map_err(|e| SessionError::io(&self.path, e.error))?;
        debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::io(&self.path, e)),
        }
    }
}

/// Temp file settings: readable only by the current user.
fn private_temp_file() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".session-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o600));
    }
    builder
}

/// In-process backend.
///
/// Clones share the same slot, so two stores opened on clones of one
/// backend behave like two runs sharing a session file.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemoryBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-loaded with `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(session))),
        }
    }

    /// The currently stored session.
    #[must_use]
    pub fn stored(&self) -> Option<Session> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.stored())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session::authenticated(
            AccessToken::new("t1"),
            Role::Customer,
            UserId::new("u1"),
            "carol",
        )
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("session.json"));
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("session.json"));

        backend.save(&sample()).unwrap();
        assert_eq!(backend.load().unwrap(), Some(sample()));

        let entries: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, ["session.json"]);
    }

    #[test]
    fn test_concurrent_writers_never_tear_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let backend = FileBackend::new(&path);
        backend.save(&sample()).unwrap();

        let done = std::sync::atomic::AtomicBool::new(false);
        std::thread::scope(|scope| {
            let writers: Vec<_> = (0..4)
                .map(|writer| {
                    let backend = FileBackend::new(&path);
                    scope.spawn(move || {
                        for round in 0..100 {
                            let session = Session::authenticated(
                                AccessToken::new(format!("t{writer}-{round}")),
                                Role::Employee,
                                UserId::new(format!("u{writer}")),
                                format!("writer-{writer}"),
                            );
                            backend.save(&session).unwrap();
                        }
                    })
                })
                .collect();

            let reader = scope.spawn(|| {
                let backend = FileBackend::new(&path);
                while !done.load(std::sync::atomic::Ordering::Relaxed) {
                    let session = backend.load().unwrap().unwrap();
                    assert!(session.is_authenticated());
                }
            });

            for writer in writers {
                writer.join().unwrap();
            }
            done.store(true, std::sync::atomic::Ordering::Relaxed);
            reader.join().unwrap();
        });

        let last = backend.load().unwrap().unwrap();
        assert!(last.username.unwrap().starts_with("writer-"));
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_clear_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("session.json"));

        backend.save(&sample()).unwrap();
        backend.clear().unwrap();
        assert!(!backend.path().exists());
        backend.clear().unwrap();
    }

    #[test]
    fn test_unknown_role_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(
            &path,
            r#"{"access_token":"t1","role":"superuser","user_id":"u1","username":"mallory"}"#,
        )
        .unwrap();

        let session = FileBackend::new(&path).load().unwrap().unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.role, None);
        assert_eq!(session.username.as_deref(), Some("mallory"));
    }

    #[test]
    fn test_partial_file_is_loaded_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"role":"admin"}"#).unwrap();

        let session = FileBackend::new(&path).load().unwrap().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.role, Some(Role::Admin));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileBackend::new(&path).load(),
            Err(SessionError::Malformed(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("session.json"));
        backend.save(&sample()).unwrap();

        let mode = fs::metadata(backend.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_backend_clones_share_state() {
        let backend = MemoryBackend::new();
        let other = backend.clone();
        backend.save(&sample()).unwrap();
        assert_eq!(other.load().unwrap(), Some(sample()));
        other.clear().unwrap();
        assert!(backend.stored().is_none());
    }
}
