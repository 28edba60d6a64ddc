// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable session credentials: the access/refresh token pair plus the
//! cached profile record.
//!
//! The store is a dumb persistence boundary: no token validation, no expiry
//! bookkeeping. The pair is written and cleared as a unit so no reader can
//! observe one fresh token next to one stale token.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File name of the session snapshot under the state directory.
const SESSION_FILE: &str = "session.json";

/// Which half of the credential pair to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Access,
    Refresh,
}

/// Signed-in user record cached alongside the token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Storage interface for the credential pair. Injected into the pipeline so
/// the single-flight machinery is unit-testable without a real filesystem.
pub trait CredentialStore: Send + Sync {
    /// Read one credential, or `None` if never set (or cleared).
    fn get(&self, kind: CredentialKind) -> Option<String>;
    /// Overwrite both credentials as a unit.
    fn set_pair(&self, access: &str, refresh: &str);
    /// Remove both credentials and the cached profile. Idempotent.
    fn clear(&self);
    /// Cached profile record, if a session is present.
    fn profile(&self) -> Option<Profile>;
    /// Replace the cached profile record.
    fn set_profile(&self, profile: &Profile);
}

/// On-disk session snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSession {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
}

impl PersistedSession {
    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.profile.is_none()
    }
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// Durable store backed by a single JSON file.
///
/// Writes go through a tmp-then-rename cycle so a crash mid-write never
/// leaves a torn pair on disk. Write failures are logged, not propagated;
/// the in-memory state stays authoritative for the process lifetime.
pub struct FileCredentialStore {
    path: PathBuf,
    state: Mutex<PersistedSession>,
}

impl FileCredentialStore {
    /// Open the store at `dir/session.json`, loading any persisted session.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(SESSION_FILE);
        let state = load_session(&path);
        Self { path, state: Mutex::new(state) }
    }

    /// Path of the backing file (primarily for diagnostics).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a snapshot to disk (atomic write). Caller holds the lock.
    fn persist(&self, state: &PersistedSession) {
        if state.is_empty() {
            self.remove_file();
            return;
        }

        let json = match serde_json::to_string_pretty(state) {
            Ok(j) => j,
            Err(e) => {
                warn!("failed to serialize session: {e}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let tmp = self.path.with_extension("tmp");
        if let Err(e) = std::fs::write(&tmp, &json) {
            warn!(path = %tmp.display(), "failed to write session: {e}");
            return;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            warn!(path = %self.path.display(), "failed to rename session file: {e}");
            return;
        }

        debug!(path = %self.path.display(), "session persisted");
    }

    fn remove_file(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), "failed to remove session file: {e}");
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, kind: CredentialKind) -> Option<String> {
        let state = self.state.lock();
        match kind {
            CredentialKind::Access => state.access_token.clone(),
            CredentialKind::Refresh => state.refresh_token.clone(),
        }
    }

    fn set_pair(&self, access: &str, refresh: &str) {
        let mut state = self.state.lock();
        state.access_token = Some(access.to_owned());
        state.refresh_token = Some(refresh.to_owned());
        self.persist(&state);
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        *state = PersistedSession::default();
        self.remove_file();
    }

    fn profile(&self) -> Option<Profile> {
        self.state.lock().profile.clone()
    }

    fn set_profile(&self, profile: &Profile) {
        let mut state = self.state.lock();
        state.profile = Some(profile.clone());
        self.persist(&state);
    }
}

/// Load a persisted session, treating a missing or corrupt file as absent.
fn load_session(path: &Path) -> PersistedSession {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            debug!(path = %path.display(), "no persisted session: {e}");
            return PersistedSession::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), "failed to parse persisted session: {e}");
            PersistedSession::default()
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: Mutex<PersistedSession>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with a credential pair.
    pub fn seeded(access: &str, refresh: &str) -> Self {
        let store = Self::default();
        store.set_pair(access, refresh);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, kind: CredentialKind) -> Option<String> {
        let state = self.state.lock();
        match kind {
            CredentialKind::Access => state.access_token.clone(),
            CredentialKind::Refresh => state.refresh_token.clone(),
        }
    }

    fn set_pair(&self, access: &str, refresh: &str) {
        let mut state = self.state.lock();
        state.access_token = Some(access.to_owned());
        state.refresh_token = Some(refresh.to_owned());
    }

    fn clear(&self) {
        *self.state.lock() = PersistedSession::default();
    }

    fn profile(&self) -> Option<Profile> {
        self.state.lock().profile.clone()
    }

    fn set_profile(&self, profile: &Profile) {
        self.state.lock().profile = Some(profile.clone());
    }
}

/// Resolve the state directory for session data.
///
/// Checks `CAMPUS_STATE_DIR`, then `$XDG_STATE_HOME/campus`,
/// then `$HOME/.local/state/campus`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CAMPUS_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("campus");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/campus");
    }
    PathBuf::from(".campus")
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
