//! Start-date command for the training start date.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use ht_core::Clock;
use ht_db::Database;

/// Runs `ht start-date`.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    date: NaiveDate,
    clock: &impl Clock,
) -> Result<()> {
    db.set_training_start_date(date)?;
    writeln!(writer, "Training start date set to {date}")?;
    if date > clock.today() {
        writeln!(writer, "Note: {date} is in the future; elapsed time will count from then.")?;
    }
    Ok(())
}
