//! Weekly roster demo for ShiftForge
//!
//! Staffs a two-week front desk with five people, then prints the schedule
//! and each person's workload.
//!
//! Run with: cargo run -p weekly-roster

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use owo_colors::OwoColorize;
use shiftforge::prelude::*;

const DAYS: i64 = 14;

fn main() {
    shiftforge::console::init();

    let config = SolverConfig::load("shiftforge.toml").unwrap_or_default();
    let (roster, staff, leave) = match sample_tables() {
        Ok(tables) => tables,
        Err(err) => {
            eprintln!("{} {}", "✗".bright_red(), err);
            std::process::exit(1);
        }
    };

    let schedule = ShiftOptimizer::new(config).solve(&roster, &staff, &leave);
    if schedule.is_empty() {
        eprintln!("{} No schedule could be produced", "✗".bright_red());
        std::process::exit(1);
    }

    println!();
    let mut current = None;
    for row in schedule.rows() {
        if current != Some(row.date) {
            current = Some(row.date);
            print!("\n{} ", format!("{} {}", row.date, row.date.weekday()).bright_cyan());
        }
        print!("{} ", row.name.bright_white());
    }
    println!("\n");

    let members: Vec<_> = ["S1", "S2", "S3", "S4", "S5"]
        .iter()
        .map(|id| (id, schedule.dates_for(id).len()))
        .collect();
    for (id, days) in members {
        println!("{} {} works {} days", "▸".bright_green(), id, days);
    }
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap_or_default()
}

fn sample_tables() -> Result<(Table, Table, Table), ShiftForgeError> {
    let mut roster = Table::new(["date", "required_personnel"]);
    for n in 0..DAYS {
        let date = start() + Duration::days(n);
        let required = match date.weekday() {
            Weekday::Sat | Weekday::Sun => 1,
            Weekday::Fri => 3,
            _ => 2,
        };
        roster.push_row([Value::from(date), Value::from(required)])?;
    }

    let mut staff = Table::new(["staff_id", "name", "wage"]);
    for (id, name, wage) in [
        ("S1", "Amara", 21.0),
        ("S2", "Bruno", 18.5),
        ("S3", "Chen", 18.5),
        ("S4", "Dalia", 24.0),
        ("S5", "Emeka", 19.75),
    ] {
        staff.push_row([Value::from(id), Value::from(name), Value::from(wage)])?;
    }

    let mut leave = empty_leave_table();
    for (id, day) in [("S2", 2), ("S2", 3), ("S3", 9), ("S5", 12)] {
        leave.push_row([Value::from(id), Value::from(start() + Duration::days(day))])?;
    }

    Ok((roster, staff, leave))
}
