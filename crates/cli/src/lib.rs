// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod api;
pub mod client;
pub mod command;
pub mod config;
pub mod credential;
pub mod error;
pub mod refresh;
pub mod session;

#[cfg(test)]
pub mod test_support;
