// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated request dispatch.
//!
//! Every outgoing request carries the stored access token as a bearer
//! header. A 401 on a non-exempt route triggers one coordinated refresh and
//! one replay; a second 401 on the same request propagates as
//! [`ApiError::RetryExhausted`]. The auth routes are exempt: a 401 there is
//! a real credential rejection and must never recurse into the refresh
//! machinery.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::credential::{CredentialKind, CredentialStore};
use crate::error::{self, ApiError};
use crate::refresh::{RefreshCoordinator, REFRESH_PATH};

/// Routes that authenticate by their own payload rather than the bearer
/// header.
const EXEMPT_PATHS: &[&str] = &["/api/auth/login", REFRESH_PATH, "/api/auth/signup"];

/// HTTP dispatcher wrapping every backend call.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            store,
            coordinator,
        }
    }

    /// Build the HTTP client shared by the dispatcher and the refresh
    /// coordinator.
    pub fn default_http(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder().timeout(timeout).build().unwrap_or_default()
    }

    pub async fn get(&self, path: &str) -> Result<Response, ApiError> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ApiError> {
        self.execute(Method::DELETE, path, None::<&()>).await
    }

    /// Dispatch one request through the full pipeline.
    ///
    /// Responses other than 401 come back unchanged, whatever their status;
    /// interpreting them is the caller's business.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut retried = false;
        let mut bearer_override: Option<String> = None;

        loop {
            let mut req = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                req = req.json(body);
            }
            let token = match &bearer_override {
                Some(t) => Some(t.clone()),
                None => self.store.get(CredentialKind::Access),
            };
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }

            let response = req.send().await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            // 401 routing, in order: replayed already, exempt route, refresh.
            if retried {
                warn!(path, "replayed request got another 401");
                return Err(ApiError::RetryExhausted { path: path.to_owned() });
            }
            if is_exempt(path) {
                let detail = error::response_detail(response).await;
                return Err(ApiError::ExemptEndpointAuth { path: path.to_owned(), detail });
            }

            debug!(path, "access token rejected, entering refresh");
            let fresh = self.coordinator.fresh_access_token().await?;
            bearer_override = Some(fresh);
            retried = true;
        }
    }
}

/// Is this path one of the self-authenticating auth routes?
fn is_exempt(path: &str) -> bool {
    let bare = path.split('?').next().unwrap_or(path);
    EXEMPT_PATHS.iter().any(|p| bare == *p)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
