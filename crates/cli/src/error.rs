// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the authenticated request pipeline.
//!
//! Only 401s from non-exempt, not-yet-replayed requests are absorbed by the
//! refresh machinery; every other class here passes straight through to the
//! call site.

use std::fmt;

use serde::Deserialize;

/// Errors surfaced by [`ApiClient`](crate::client::ApiClient) and the
/// refresh coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No refresh credential was stored when a refresh became necessary.
    CredentialMissing,
    /// The refresh endpoint rejected the stored refresh credential.
    RefreshRejected(String),
    /// Network or timeout failure unrelated to authentication.
    Transport(String),
    /// 401 from one of the exempt auth endpoints (login, refresh, sign-up).
    /// These are real credential rejections, not expiry.
    ExemptEndpointAuth { path: String, detail: String },
    /// A request that was already replayed once failed with 401 again.
    RetryExhausted { path: String },
    /// The session was terminated while this request awaited recovery.
    /// Carries the refresh failure that forced the logout.
    Cancelled(String),
}

impl ApiError {
    /// Machine-readable code, stable across releases.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "CREDENTIAL_MISSING",
            Self::RefreshRejected(_) => "REFRESH_REJECTED",
            Self::Transport(_) => "TRANSPORT",
            Self::ExemptEndpointAuth { .. } => "EXEMPT_ENDPOINT_AUTH",
            Self::RetryExhausted { .. } => "RETRY_EXHAUSTED",
            Self::Cancelled(_) => "CANCELLED",
        }
    }

    /// Whether this error means the session was force-terminated (credentials
    /// are already cleared; the user has to log in again).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CredentialMissing | Self::RefreshRejected(_) | Self::Cancelled(_))
    }

    /// Process exit code for the CLI: `3` when the session was terminated,
    /// `1` for everything else.
    pub fn exit_code(&self) -> i32 {
        if self.is_terminal() {
            3
        } else {
            1
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialMissing => f.write_str("no refresh credential stored"),
            Self::RefreshRejected(detail) => write!(f, "refresh rejected: {detail}"),
            Self::Transport(detail) => write!(f, "transport error: {detail}"),
            Self::ExemptEndpointAuth { path, detail } => {
                write!(f, "authentication rejected by {path}: {detail}")
            }
            Self::RetryExhausted { path } => {
                write!(f, "request to {path} failed again after credential refresh")
            }
            Self::Cancelled(reason) => write!(f, "session terminated: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("timeout: {e}"))
        } else if e.is_connect() {
            Self::Transport(format!("connect: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Error body shape the backend uses for rejections.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Pull a human-readable detail out of an error response.
///
/// Falls back to the status line when the body is empty or unreadable.
pub(crate) async fn response_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if !parsed.message.is_empty() => format!("{status}: {}", parsed.message),
        _ if body.trim().is_empty() => status.to_string(),
        _ => format!("{status}: {body}"),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
