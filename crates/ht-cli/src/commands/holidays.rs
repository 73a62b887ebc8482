//! Holidays command listing US federal holidays.

use std::io::Write;

use anyhow::Result;
use chrono::Datelike;
use ht_core::holidays::federal_holidays;

/// Runs `ht holidays`.
pub fn run<W: Write>(writer: &mut W, year: i32) -> Result<()> {
    writeln!(writer, "Federal holidays {year}")?;
    for holiday in federal_holidays(year) {
        writeln!(
            writer,
            "  {}  {}  {}",
            holiday.date,
            holiday.date.weekday(),
            holiday.name
        )?;
    }
    Ok(())
}
