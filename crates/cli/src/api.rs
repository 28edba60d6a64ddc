// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed surface over the campus backend.
//!
//! Every payload rides the `{ "data": ... }` envelope. Auth operations keep
//! the credential store in sync; everything else is a thin decode layer over
//! the dispatcher.

use std::sync::Arc;

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ApiClient;
use crate::credential::{CredentialStore, Profile};
use crate::error;
use crate::refresh::TokenPair;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    user: Profile,
    tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
struct AttendanceReceipt {
    recorded: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub batches: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: u64,
    pub name: String,
    pub college_id: u64,
    #[serde(default)]
    pub students: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub batch_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub batch_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: u64,
    pub title: String,
    pub course_id: u64,
    pub max_score: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Overview {
    pub colleges: u64,
    pub batches: u64,
    pub students: u64,
    pub courses: u64,
    pub assessments: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: u64,
    pub present: bool,
}

pub struct CampusApi {
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
}

impl CampusApi {
    pub fn new(client: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self { client, store }
    }

    /// Exchange email and password for a session; stores the pair and the
    /// profile on success.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<Profile> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self.client.post("/api/auth/login", &body).await?;
        let auth: AuthData = decode(response).await?;
        self.store.set_pair(&auth.tokens.access_token, &auth.tokens.refresh_token);
        self.store.set_profile(&auth.user);
        info!(email, "signed in");
        Ok(auth.user)
    }

    /// Register a new account; signs in on success.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> anyhow::Result<Profile> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        let response = self.client.post("/api/auth/signup", &body).await?;
        let auth: AuthData = decode(response).await?;
        self.store.set_pair(&auth.tokens.access_token, &auth.tokens.refresh_token);
        self.store.set_profile(&auth.user);
        info!(email, "account created");
        Ok(auth.user)
    }

    /// Fetch the live profile and refresh the cached copy.
    pub async fn me(&self) -> anyhow::Result<Profile> {
        let response = self.client.get("/api/auth/me").await?;
        let profile: Profile = decode(response).await?;
        self.store.set_profile(&profile);
        Ok(profile)
    }

    /// Profile cached at sign-in, if any. No network.
    pub fn cached_profile(&self) -> Option<Profile> {
        self.store.profile()
    }

    /// Drop the local session. The backend holds no server-side session
    /// state worth revoking here.
    pub fn logout(&self) {
        self.store.clear();
        info!("signed out");
    }

    pub async fn colleges(&self) -> anyhow::Result<Vec<College>> {
        self.fetch("/api/colleges").await
    }

    pub async fn batches(&self, college: Option<u64>) -> anyhow::Result<Vec<Batch>> {
        self.fetch(&scoped("/api/batches", "college", college)).await
    }

    pub async fn students(&self, batch: Option<u64>) -> anyhow::Result<Vec<Student>> {
        self.fetch(&scoped("/api/students", "batch", batch)).await
    }

    pub async fn student(&self, id: u64) -> anyhow::Result<Student> {
        self.fetch(&format!("/api/students/{id}")).await
    }

    pub async fn courses(&self, batch: Option<u64>) -> anyhow::Result<Vec<Course>> {
        self.fetch(&scoped("/api/courses", "batch", batch)).await
    }

    pub async fn assessments(&self, course: Option<u64>) -> anyhow::Result<Vec<Assessment>> {
        self.fetch(&scoped("/api/assessments", "course", course)).await
    }

    /// Record one attendance sheet; returns how many entries the backend
    /// accepted.
    pub async fn mark_attendance(
        &self,
        batch: u64,
        course: u64,
        date: &str,
        records: &[AttendanceRecord],
    ) -> anyhow::Result<u64> {
        let body = serde_json::json!({
            "batchId": batch,
            "courseId": course,
            "date": date,
            "records": records,
        });
        let response = self.client.post("/api/attendance", &body).await?;
        let receipt: AttendanceReceipt = decode(response).await?;
        Ok(receipt.recorded)
    }

    pub async fn report_overview(&self) -> anyhow::Result<Overview> {
        self.fetch("/api/reports/overview").await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let response = self.client.get(path).await?;
        decode(response).await
    }
}

/// Append a scope query parameter when a filter id is given.
fn scoped(path: &str, key: &str, id: Option<u64>) -> String {
    match id {
        Some(id) => format!("{path}?{key}={id}"),
        None => path.to_owned(),
    }
}

/// Unwrap the `data` envelope, turning non-2xx statuses into errors.
async fn decode<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    if !status.is_success() {
        let detail = error::response_detail(response).await;
        anyhow::bail!("{detail}");
    }
    let envelope: Envelope<T> = response.json().await?;
    Ok(envelope.data)
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
