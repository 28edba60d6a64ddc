// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `campus attendance mark`: record one attendance sheet.

use crate::api::AttendanceRecord;

use super::{fail, Context};

pub async fn mark(
    ctx: &Context,
    batch: u64,
    course: u64,
    date: &str,
    entries: &[String],
) -> i32 {
    if !valid_date(date) {
        eprintln!("error: invalid date {date:?}, expected YYYY-MM-DD");
        return 2;
    }
    let records = match parse_entries(entries) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    match ctx.api.mark_attendance(batch, course, date, &records).await {
        Ok(recorded) => {
            println!("Recorded {recorded} attendance entries for batch {batch}.");
            0
        }
        Err(e) => fail(&e),
    }
}

/// Parse `student:flag` pairs (`101:1`, `102:0`, also `p`/`a`).
fn parse_entries(entries: &[String]) -> anyhow::Result<Vec<AttendanceRecord>> {
    entries
        .iter()
        .map(|entry| {
            let (student, flag) = entry
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("malformed entry {entry:?}, expected student:flag"))?;
            let student_id: u64 = student
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid student id in {entry:?}"))?;
            let present = match flag {
                "1" | "p" | "present" => true,
                "0" | "a" | "absent" => false,
                other => anyhow::bail!("invalid flag {other:?} in {entry:?}, expected 1 or 0"),
            };
            Ok(AttendanceRecord { student_id, present })
        })
        .collect()
}

fn valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && date.chars().enumerate().all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

#[cfg(test)]
#[path = "attendance_tests.rs"]
mod tests;
