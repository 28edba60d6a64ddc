// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands over the campus API.

pub mod attendance;
pub mod auth;
pub mod listings;
pub mod reports;

use std::sync::Arc;

use crate::api::CampusApi;
use crate::client::ApiClient;
use crate::config::{AttendanceAction, Command, Config, ReportsAction, StudentsAction};
use crate::credential::{CredentialStore, FileCredentialStore};
use crate::error::ApiError;
use crate::refresh::RefreshCoordinator;
use crate::session::SessionExit;

/// Shared wiring handed to every subcommand.
pub struct Context {
    pub api: CampusApi,
    pub json: bool,
}

impl Context {
    /// Wire the full request pipeline from the parsed configuration.
    pub fn build(config: &Config) -> Self {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::open(&config.resolved_state_dir()));
        let (terminator, _events) = SessionExit::new(Arc::clone(&store));
        let http = ApiClient::default_http(config.timeout());
        let coordinator = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &config.api_url,
            Arc::clone(&store),
            terminator,
        ));
        let client = ApiClient::new(http, &config.api_url, Arc::clone(&store), coordinator);
        Self { api: CampusApi::new(client, store), json: config.json }
    }
}

/// Dispatch the parsed subcommand. Returns the process exit code.
pub async fn run(config: Config) -> i32 {
    let ctx = Context::build(&config);
    match &config.command {
        Command::Login { email, password } => auth::login(&ctx, email, password).await,
        Command::Signup { name, email, password } => {
            auth::signup(&ctx, name, email, password).await
        }
        Command::Logout => auth::logout(&ctx),
        Command::Whoami { refresh } => auth::whoami(&ctx, *refresh).await,
        Command::Colleges => listings::colleges(&ctx).await,
        Command::Batches { college } => listings::batches(&ctx, *college).await,
        Command::Students { batch, action } => match action {
            Some(StudentsAction::Show { id }) => listings::student(&ctx, *id).await,
            None => listings::students(&ctx, *batch).await,
        },
        Command::Courses { batch } => listings::courses(&ctx, *batch).await,
        Command::Assessments { course } => listings::assessments(&ctx, *course).await,
        Command::Attendance { action } => match action {
            AttendanceAction::Mark { batch, course, date, entries } => {
                attendance::mark(&ctx, *batch, *course, date, entries).await
            }
        },
        Command::Reports { action } => match action {
            ReportsAction::Overview => reports::overview(&ctx).await,
        },
    }
}

/// Print a command failure and map it to an exit code.
///
/// Terminal auth failures exit 3 so wrappers can tell "sign in again" apart
/// from transient faults.
pub(crate) fn fail(err: &anyhow::Error) -> i32 {
    eprintln!("error: {err}");
    match err.downcast_ref::<ApiError>() {
        Some(api) => api.exit_code(),
        None => 1,
    }
}

/// Print a payload as pretty JSON (the `--json` output mode).
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
