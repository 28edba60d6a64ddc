// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `campus login`, `signup`, `logout`, and `whoami`.

use crate::credential::Profile;

use super::{fail, print_json, Context};

pub async fn login(ctx: &Context, email: &str, password: &str) -> i32 {
    match ctx.api.login(email, password).await {
        Ok(profile) => {
            println!("Signed in as {} <{}>.", profile.name, profile.email);
            0
        }
        Err(e) => fail(&e),
    }
}

pub async fn signup(ctx: &Context, name: &str, email: &str, password: &str) -> i32 {
    match ctx.api.signup(name, email, password).await {
        Ok(profile) => {
            println!("Account created for {} <{}>.", profile.name, profile.email);
            0
        }
        Err(e) => fail(&e),
    }
}

pub fn logout(ctx: &Context) -> i32 {
    ctx.api.logout();
    println!("Signed out.");
    0
}

/// Show the signed-in profile. Serves the cached copy unless `--refresh`
/// forces a live fetch; with nothing cached it falls back to the network.
pub async fn whoami(ctx: &Context, refresh: bool) -> i32 {
    if !refresh {
        if let Some(profile) = ctx.api.cached_profile() {
            return print_profile(ctx, &profile);
        }
    }
    match ctx.api.me().await {
        Ok(profile) => print_profile(ctx, &profile),
        Err(e) => fail(&e),
    }
}

fn print_profile(ctx: &Context, profile: &Profile) -> i32 {
    if ctx.json {
        return print_json(profile);
    }
    println!("{} <{}>", profile.name, profile.email);
    if let Some(role) = &profile.role {
        println!("  role: {role}");
    }
    println!("  id:   {}", profile.id);
    0
}
