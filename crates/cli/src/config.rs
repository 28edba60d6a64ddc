// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::credential;

/// Management console for the campus training program.
#[derive(Debug, Parser)]
#[command(name = "campus", version, about)]
pub struct Config {
    /// Base URL of the campus backend.
    #[arg(long, env = "CAMPUS_API_URL", default_value = "http://127.0.0.1:4000")]
    pub api_url: String,

    /// Directory holding the persisted session.
    #[arg(long, env = "CAMPUS_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, env = "CAMPUS_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Log format (json or text).
    #[arg(long, env = "CAMPUS_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "CAMPUS_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Print raw JSON payloads instead of tables.
    #[arg(long, env = "CAMPUS_JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        /// Password (falls back to $CAMPUS_PASSWORD).
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Register a new account and sign in.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Password (falls back to $CAMPUS_PASSWORD).
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the local session.
    Logout,
    /// Show the signed-in profile.
    Whoami {
        /// Fetch the live profile instead of the cached copy.
        #[arg(long)]
        refresh: bool,
    },
    /// List colleges.
    Colleges,
    /// List batches, optionally scoped to a college.
    Batches {
        #[arg(long)]
        college: Option<u64>,
    },
    /// List students, or show one.
    Students {
        #[arg(long)]
        batch: Option<u64>,
        #[command(subcommand)]
        action: Option<StudentsAction>,
    },
    /// List courses, optionally scoped to a batch.
    Courses {
        #[arg(long)]
        batch: Option<u64>,
    },
    /// List assessments, optionally scoped to a course.
    Assessments {
        #[arg(long)]
        course: Option<u64>,
    },
    /// Attendance operations.
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },
    /// Program-wide reports.
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum StudentsAction {
    /// Show one student by id.
    Show { id: u64 },
}

#[derive(Debug, Subcommand)]
pub enum AttendanceAction {
    /// Record one attendance sheet.
    Mark {
        #[arg(long)]
        batch: u64,
        #[arg(long)]
        course: u64,
        /// Sheet date (YYYY-MM-DD).
        #[arg(long)]
        date: String,
        /// Entries as `student:flag` pairs, e.g. `101:1 102:0`.
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportsAction {
    /// Headline counts across the program.
    Overview,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("--api-url must start with http:// or https://");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("--timeout-secs must be at least 1");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the state directory: explicit override, then the XDG chain.
    pub fn resolved_state_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => dir.clone(),
            None => credential::state_dir(),
        }
    }

    /// Build a minimal `Config` for tests.
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            api_url: "http://127.0.0.1:0".into(),
            state_dir: None,
            timeout_secs: 5,
            log_format: "text".into(),
            log_level: "debug".into(),
            json: false,
            command: Command::Colleges,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
