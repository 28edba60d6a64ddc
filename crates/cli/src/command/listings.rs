// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity listings: colleges, batches, students, courses, assessments.

use super::{fail, print_json, Context};

pub async fn colleges(ctx: &Context) -> i32 {
    match ctx.api.colleges().await {
        Ok(colleges) if ctx.json => print_json(&colleges),
        Ok(colleges) => {
            if colleges.is_empty() {
                println!("No colleges found.");
                return 0;
            }
            println!("{:<6} {:<28} {:<16} {:>8}", "ID", "NAME", "CITY", "BATCHES");
            println!("{}", "-".repeat(61));
            for college in &colleges {
                println!(
                    "{:<6} {:<28} {:<16} {:>8}",
                    college.id,
                    college.name,
                    college.city.as_deref().unwrap_or("-"),
                    college.batches.map_or("-".to_owned(), |n| n.to_string()),
                );
            }
            0
        }
        Err(e) => fail(&e),
    }
}

pub async fn batches(ctx: &Context, college: Option<u64>) -> i32 {
    match ctx.api.batches(college).await {
        Ok(batches) if ctx.json => print_json(&batches),
        Ok(batches) => {
            if batches.is_empty() {
                println!("No batches found.");
                return 0;
            }
            println!("{:<6} {:<20} {:>8} {:>9}", "ID", "NAME", "COLLEGE", "STUDENTS");
            println!("{}", "-".repeat(46));
            for batch in &batches {
                println!(
                    "{:<6} {:<20} {:>8} {:>9}",
                    batch.id,
                    batch.name,
                    batch.college_id,
                    batch.students.map_or("-".to_owned(), |n| n.to_string()),
                );
            }
            0
        }
        Err(e) => fail(&e),
    }
}

pub async fn students(ctx: &Context, batch: Option<u64>) -> i32 {
    match ctx.api.students(batch).await {
        Ok(students) if ctx.json => print_json(&students),
        Ok(students) => {
            if students.is_empty() {
                println!("No students found.");
                return 0;
            }
            println!("{:<6} {:<24} {:<28} {:>6}", "ID", "NAME", "EMAIL", "BATCH");
            println!("{}", "-".repeat(67));
            for student in &students {
                println!(
                    "{:<6} {:<24} {:<28} {:>6}",
                    student.id, student.name, student.email, student.batch_id,
                );
            }
            0
        }
        Err(e) => fail(&e),
    }
}

pub async fn student(ctx: &Context, id: u64) -> i32 {
    match ctx.api.student(id).await {
        Ok(student) if ctx.json => print_json(&student),
        Ok(student) => {
            println!("Student {}", student.id);
            println!("  name:  {}", student.name);
            println!("  email: {}", student.email);
            println!("  batch: {}", student.batch_id);
            0
        }
        Err(e) => fail(&e),
    }
}

pub async fn courses(ctx: &Context, batch: Option<u64>) -> i32 {
    match ctx.api.courses(batch).await {
        Ok(courses) if ctx.json => print_json(&courses),
        Ok(courses) => {
            if courses.is_empty() {
                println!("No courses found.");
                return 0;
            }
            println!("{:<6} {:<10} {:<28} {:>6}", "ID", "CODE", "NAME", "BATCH");
            println!("{}", "-".repeat(53));
            for course in &courses {
                println!(
                    "{:<6} {:<10} {:<28} {:>6}",
                    course.id, course.code, course.name, course.batch_id,
                );
            }
            0
        }
        Err(e) => fail(&e),
    }
}

pub async fn assessments(ctx: &Context, course: Option<u64>) -> i32 {
    match ctx.api.assessments(course).await {
        Ok(assessments) if ctx.json => print_json(&assessments),
        Ok(assessments) => {
            if assessments.is_empty() {
                println!("No assessments found.");
                return 0;
            }
            println!("{:<6} {:<28} {:>8} {:>10}", "ID", "TITLE", "COURSE", "MAX SCORE");
            println!("{}", "-".repeat(55));
            for assessment in &assessments {
                println!(
                    "{:<6} {:<28} {:>8} {:>10}",
                    assessment.id, assessment.title, assessment.course_id, assessment.max_score,
                );
            }
            0
        }
        Err(e) => fail(&e),
    }
}
