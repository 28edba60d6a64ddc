// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `campus reports overview`: headline counts across the program.

use super::{fail, print_json, Context};

pub async fn overview(ctx: &Context) -> i32 {
    match ctx.api.report_overview().await {
        Ok(overview) if ctx.json => print_json(&overview),
        Ok(overview) => {
            println!("{:<12} {:>8}", "ENTITY", "COUNT");
            println!("{}", "-".repeat(21));
            println!("{:<12} {:>8}", "colleges", overview.colleges);
            println!("{:<12} {:>8}", "batches", overview.batches);
            println!("{:<12} {:>8}", "students", overview.students);
            println!("{:<12} {:>8}", "courses", overview.courses);
            println!("{:<12} {:>8}", "assessments", overview.assessments);
            0
        }
        Err(e) => fail(&e),
    }
}
