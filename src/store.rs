use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::{Result, SessionError};
use crate::models::session::PersistedSession;
use crate::models::user::UserProfile;
use crate::token;

/// Durable session storage: one JSON document on disk, mirrored in memory.
///
/// The file survives process restarts, playing the role a same-origin
/// localStorage plays in a browser. All mutations go through a single
/// write lock so session replacement is atomic from the caller's
/// perspective. The lock is never held across an await point.
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    state: Arc<RwLock<PersistedSession>>,
}

impl SessionStore {
    /// Opens the store at `path`, hydrating from disk when a previous
    /// session exists. A missing or unreadable file degrades to an empty
    /// session, never an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => match sonic_rs::from_slice::<PersistedSession>(&bytes) {
                Ok(session) => {
                    tracing::debug!("🔑 Session file loaded from {}", path.display());
                    session
                }
                Err(e) => {
                    tracing::warn!("❌ Corrupt session file, starting empty: {}", e);
                    PersistedSession::default()
                }
            },
            Err(_) => PersistedSession::default(),
        };

        Self {
            path,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Persists a new session, replacing any previous one.
    ///
    /// The expiry cache is derived from the token here so readers avoid
    /// re-decoding on every check.
    ///
    /// # Arguments
    ///
    /// * `token` - The bearer token.
    /// * `user` - The profile returned by the login endpoint, if any.
    /// * `expires_in` - Advisory expiry duration in seconds, display only.
    pub fn save(
        &self,
        token: String,
        user: Option<UserProfile>,
        expires_in: Option<i64>,
    ) -> Result<()> {
        let token_expiry = token::get_expiry(&token);
        let session = PersistedSession {
            token: Some(token),
            user,
            token_expiry,
            expires_in,
        };

        {
            let mut state = self
                .state
                .write()
                .map_err(|_| SessionError::Internal("session store lock poisoned".to_string()))?;
            *state = session.clone();
        }

        self.persist(&session)?;
        tracing::debug!("✅ Session saved (expiry: {:?})", token_expiry);
        Ok(())
    }

    /// Returns a snapshot of the current session.
    pub fn load(&self) -> PersistedSession {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Fast read of the current token.
    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.token.clone())
    }

    /// Wipes the session and deletes the file.
    ///
    /// Returns `true` when a token was actually present. Idempotent: the
    /// second and later calls return `false`, which is what lets a 401
    /// redirect fire exactly once across overlapping in-flight requests.
    pub fn clear(&self) -> bool {
        let had_token = match self.state.write() {
            Ok(mut state) => {
                let had = state.token.is_some();
                *state = PersistedSession::default();
                had
            }
            Err(_) => false,
        };

        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("❌ Failed to remove session file: {}", e);
            }
        }

        if had_token {
            tracing::info!("🧹 Session cleared");
        }
        had_token
    }

    fn persist(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = sonic_rs::to_string(session)
            .map_err(|e| SessionError::Serialization(format!("session encode failed: {}", e)))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
