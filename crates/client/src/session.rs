//! Authentication state shared by every request of a client.
//!
//! The bearer token is the only client state that survives a restart: it is
//! written to the token file on login, removed on logout and read back when
//! a session is opened.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pfehub_core::roles::Role;
use pfehub_core::users::User;
use tokio::sync::RwLock;

/// File-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no token has been saved.
    pub async fn load(&self) -> std::io::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, token).await
    }

    pub async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// The signed-in identity, cloned cheaply into every service.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    store: TokenStore,
}

impl Session {
    /// Open a session, restoring a previously saved token.
    pub async fn open(store: TokenStore) -> std::io::Result<Self> {
        let token = store.load().await?;
        if token.is_some() {
            tracing::debug!(path = %store.path().display(), "Restored saved token");
        }
        Ok(Self {
            state: Arc::new(RwLock::new(SessionState { token, user: None })),
            store,
        })
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn role(&self) -> Option<Role> {
        self.state.read().await.user.as_ref().map(User::role)
    }

    /// Record a fresh login and persist its token.
    pub async fn sign_in(&self, token: String, user: User) -> std::io::Result<()> {
        self.store.save(&token).await?;
        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = Some(user);
        Ok(())
    }

    /// Attach the profile fetched for a restored token.
    pub async fn set_user(&self, user: User) {
        self.state.write().await.user = Some(user);
    }

    pub async fn sign_out(&self) -> std::io::Result<()> {
        {
            let mut state = self.state.write().await;
            state.token = None;
            state.user = None;
        }
        self.store.clear().await
    }
}
