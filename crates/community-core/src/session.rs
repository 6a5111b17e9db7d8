//! Session state: access token, signed-in user and backend cookies.
//!
//! The token lives in memory and is optionally mirrored to
//! `<base>/session.json` with restricted permissions (0600). Tokens are never
//! logged in full.
//!
//! The store doubles as the HTTP client's cookie jar, which is where the
//! refresh cookie and the `XSRF-TOKEN` cookie live.

use std::convert::Infallible;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use community_types::User;
use cookie_store::CookieStore as CookieJar;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use url::Url;

/// Cookie carrying the anti-forgery token.
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// A cookie as kept in the jar, with its domain, path and expiry.
pub type StoredCookie = cookie_store::Cookie<'static>;

/// Authentication state observed by front-ends.
///
/// `Expired` is the "go back to the login screen" signal raised when a token
/// refresh fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
    Expired,
}

/// Persisted form of the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Unexpired cookies, session cookies included.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<StoredCookie>,
}

impl SessionSnapshot {
    /// Loads a snapshot from disk, empty if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", path.display()))
    }

    /// Saves the snapshot with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }
}

#[derive(Default)]
struct Credentials {
    access_token: Option<String>,
    user: Option<User>,
}

/// Shared session store.
///
/// Shared between the API client and front-ends behind an `Arc`.
pub struct SessionStore {
    state: RwLock<Credentials>,
    jar: RwLock<CookieJar>,
    file: Option<PathBuf>,
    auth: watch::Sender<AuthState>,
}

impl SessionStore {
    /// A session that only lives in memory.
    pub fn in_memory() -> Self {
        Self::with_file(None)
    }

    /// A session mirrored to `path`. Call [`SessionStore::hydrate`] to load it.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self::with_file(Some(path.into()))
    }

    fn with_file(file: Option<PathBuf>) -> Self {
        let (auth, _) = watch::channel(AuthState::Anonymous);
        Self {
            state: RwLock::new(Credentials::default()),
            jar: RwLock::new(CookieJar::default()),
            file,
            auth,
        }
    }

    /// Restores the session from disk unless a token is already in memory.
    ///
    /// Stored cookies are only restored into an empty jar. Returns the access
    /// token in effect afterwards.
    ///
    /// # Errors
    /// Returns an error if the session file exists but cannot be read.
    pub fn hydrate(&self) -> Result<Option<String>> {
        if let Some(token) = self.access_token() {
            return Ok(Some(token));
        }
        let Some(path) = &self.file else {
            return Ok(None);
        };

        let stored = SessionSnapshot::load(path)?;
        let token = {
            let mut state = self.write();
            state.access_token.clone_from(&stored.access_token);
            if state.user.is_none() {
                state.user = stored.user;
            }
            state.access_token.clone()
        };
        {
            let mut jar = self.jar_mut();
            if jar.iter_any().next().is_none() {
                let cookies = stored.cookies.into_iter().map(Ok::<_, Infallible>);
                *jar = CookieJar::from_cookies(cookies, false).unwrap_or_default();
            }
        }

        if token.is_some() {
            self.auth.send_replace(AuthState::Authenticated);
        }
        tracing::debug!(restored = token.is_some(), path = %path.display(), "session hydrated");
        Ok(token)
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    /// Stores (or with `None`, removes) the access token.
    pub fn set_access_token(&self, token: Option<String>) {
        let signed_in = token.is_some();
        self.update(|state| state.access_token = token);
        self.auth.send_replace(if signed_in {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        });
    }

    /// Stores the token and the user it belongs to.
    pub fn login(&self, user: Option<User>, token: String) {
        self.update(|state| {
            state.access_token = Some(token);
            if user.is_some() {
                state.user = user;
            }
        });
        self.auth.send_replace(AuthState::Authenticated);
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// Replaces the cached user (after a profile edit).
    pub fn set_user(&self, user: User) {
        self.update(|state| state.user = Some(user));
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token.is_some()
    }

    /// Forgets the token and user. Backend-managed cookies are kept.
    pub fn clear(&self) {
        self.update(|state| {
            state.access_token = None;
            state.user = None;
        });
        self.auth.send_replace(AuthState::Anonymous);
    }

    /// Clears the session after a failed refresh and signals `Expired`.
    pub fn expire(&self) {
        self.update(|state| {
            state.access_token = None;
            state.user = None;
        });
        self.auth.send_replace(AuthState::Expired);
    }

    pub fn auth_state(&self) -> AuthState {
        *self.auth.borrow()
    }

    /// Subscribes to authentication state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }

    /// Value of the first unexpired cookie called `name`, whatever its scope.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar()
            .iter_unexpired()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Anti-forgery token from the `XSRF-TOKEN` cookie.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie(CSRF_COOKIE).filter(|token| !token.is_empty())
    }

    /// Stores cookies from `Set-Cookie` header values received for `url`.
    ///
    /// Attributes are honored: an `Expires` in the past or `Max-Age=0`
    /// removes the cookie, and `Path`/`Domain` limit where it is sent.
    pub fn store_set_cookies<'a>(&self, url: &Url, headers: impl IntoIterator<Item = &'a str>) {
        let parsed: Vec<_> = headers
            .into_iter()
            .filter_map(|header| match cookie::Cookie::parse(header.to_owned()) {
                Ok(cookie) => Some(cookie),
                Err(err) => {
                    tracing::debug!(error = %err, "ignoring malformed Set-Cookie header");
                    None
                }
            })
            .collect();
        if parsed.is_empty() {
            return;
        }

        self.jar_mut().store_response_cookies(parsed.into_iter(), url);
        self.persist();
    }

    /// Current snapshot of the whole session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read();
        SessionSnapshot {
            access_token: state.access_token.clone(),
            user: state.user.clone(),
            cookies: self.jar().iter_unexpired().cloned().collect(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut Credentials)) {
        f(&mut self.write());
        self.persist();
    }

    fn persist(&self) {
        let Some(path) = &self.file else {
            return;
        };
        let snapshot = self.snapshot();
        // Storage failures degrade to an in-memory session.
        if let Err(err) = snapshot.save(path) {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist session");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Credentials> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Credentials> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn jar(&self) -> RwLockReadGuard<'_, CookieJar> {
        self.jar.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn jar_mut(&self) -> RwLockWriteGuard<'_, CookieJar> {
        self.jar.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let cookies: Vec<String> = self
            .jar()
            .iter_unexpired()
            .map(|cookie| cookie.name().to_string())
            .collect();
        f.debug_struct("SessionStore")
            .field("access_token", &state.access_token.as_deref().map(mask_token))
            .field("user", &state.user.as_ref().map(|u| u.id))
            .field("cookies", &cookies)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl reqwest::cookie::CookieStore for SessionStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.store_set_cookies(url, cookie_headers.filter_map(|value| value.to_str().ok()));
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .jar()
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

/// Masks a token for display.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}
