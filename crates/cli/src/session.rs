// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session teardown. When the refresh path concludes the session is
//! unrecoverable, the terminator wipes stored credentials and announces the
//! sign-out so callers can route back to login.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::credential::CredentialStore;

/// Notification emitted when the session ends.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Credentials were wiped; subscribers should route to sign-in.
    Terminated { reason: String },
}

/// Teardown hook invoked by the refresh path on unrecoverable failures.
///
/// Clearing credentials happens here and nowhere else on the failure path,
/// so a burst of concurrent 401s still wipes the store exactly once.
pub trait SessionTerminator: Send + Sync {
    fn terminate(&self, reason: &str);
}

/// Default terminator: clears the credential store and broadcasts
/// [`SessionEvent::Terminated`] to every subscriber.
pub struct SessionExit {
    store: Arc<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionExit {
    /// Create the terminator and the event stream subscribers listen on.
    pub fn new(store: Arc<dyn CredentialStore>) -> (Arc<Self>, broadcast::Receiver<SessionEvent>) {
        let (events, rx) = broadcast::channel(16);
        (Arc::new(Self { store, events }), rx)
    }

    /// Subscribe to termination events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

impl SessionTerminator for SessionExit {
    fn terminate(&self, reason: &str) {
        warn!(reason, "terminating session");
        self.store.clear();
        let _ = self.events.send(SessionEvent::Terminated { reason: reason.to_owned() });
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
