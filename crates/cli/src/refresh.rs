// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight credential refresh.
//!
//! Any number of requests can hit a 401 at once; exactly one of them drives
//! the network exchange while the rest park on a waiter queue. The queue is
//! drained exactly once per flight, with the fresh access token on success
//! and with the refresh error on failure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::credential::{CredentialKind, CredentialStore};
use crate::error::{self, ApiError};
use crate::session::SessionTerminator;

/// Route used to exchange a refresh credential for a fresh pair.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    data: RefreshData,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    tokens: TokenPair,
}

/// Access/refresh pair as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Refreshing,
}

/// Mutex-guarded flight record. The state transition and the waiter queue
/// move together or not at all.
struct Flight {
    state: RefreshState,
    waiters: Vec<oneshot::Sender<Result<String, ApiError>>>,
}

/// Serializes credential refreshes across concurrent requests.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    terminator: Arc<dyn SessionTerminator>,
    flight: Mutex<Flight>,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        terminator: Arc<dyn SessionTerminator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            store,
            terminator,
            flight: Mutex::new(Flight { state: RefreshState::Idle, waiters: Vec::new() }),
        }
    }

    /// Obtain an access token fresher than the one that just got a 401.
    ///
    /// The first caller in becomes the leader and drives the exchange;
    /// callers arriving while a flight is up wait for its outcome. On a
    /// failed exchange the waiters receive the refresh error and the leader,
    /// whose request triggered the teardown, gets [`ApiError::Cancelled`].
    pub async fn fresh_access_token(&self) -> Result<String, ApiError> {
        let rx = {
            let mut flight = self.flight.lock().await;
            match flight.state {
                RefreshState::Refreshing => {
                    let (tx, rx) = oneshot::channel();
                    flight.waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    flight.state = RefreshState::Refreshing;
                    None
                }
            }
        };

        if let Some(rx) = rx {
            debug!("refresh in flight, waiting for outcome");
            return match rx.await {
                Ok(outcome) => outcome,
                // Leader dropped without settling the queue.
                Err(_) => Err(ApiError::Cancelled("refresh abandoned".to_owned())),
            };
        }

        match self.exchange().await {
            Ok(pair) => {
                self.store.set_pair(&pair.access_token, &pair.refresh_token);
                let waiters = self.settle().await;
                info!(waiters = waiters.len(), "credentials refreshed");
                for tx in waiters {
                    let _ = tx.send(Ok(pair.access_token.clone()));
                }
                Ok(pair.access_token)
            }
            Err(err) => {
                warn!(code = err.as_str(), "credential refresh failed: {err}");
                let reason = err.to_string();
                self.terminator.terminate(&reason);
                let waiters = self.settle().await;
                for tx in waiters {
                    let _ = tx.send(Err(err.clone()));
                }
                Err(ApiError::Cancelled(reason))
            }
        }
    }

    /// Reset to idle and hand back the queued waiters. The swap happens
    /// under the lock so each waiter is settled exactly once.
    async fn settle(&self) -> Vec<oneshot::Sender<Result<String, ApiError>>> {
        let mut flight = self.flight.lock().await;
        flight.state = RefreshState::Idle;
        std::mem::take(&mut flight.waiters)
    }

    /// Run the credential exchange against the backend.
    ///
    /// An absent refresh credential fails without touching the network.
    async fn exchange(&self) -> Result<TokenPair, ApiError> {
        let refresh = self
            .store
            .get(CredentialKind::Refresh)
            .ok_or(ApiError::CredentialMissing)?;

        let url = format!("{}{REFRESH_PATH}", self.base_url);
        debug!(url = %url, "requesting fresh credential pair");
        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh_token: &refresh })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = error::response_detail(response).await;
            return Err(ApiError::RefreshRejected(detail));
        }

        let envelope: RefreshEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshRejected(format!("malformed refresh response: {e}")))?;
        Ok(envelope.data.tokens)
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
