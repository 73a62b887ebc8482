//! Status command for showing what the database holds.

use std::io::Write;

use anyhow::Result;
use ht_core::Clock;
use ht_core::temporal::current_compliance_cycle;
use ht_db::Database;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, clock: &impl Clock) -> Result<()> {
    let counts = db.counts()?;
    let cycle = current_compliance_cycle(clock);

    writeln!(writer, "Hour tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(
        writer,
        "Entries: {} across {} days",
        counts.entries, counts.logged_days
    )?;
    writeln!(writer, "Unavailable days: {}", counts.unavailable_days)?;

    let unreadable = db.unreadable_rows()?;
    if !unreadable.is_empty() {
        writeln!(writer, "Unreadable rows: {} (remove with `ht purge <id>`)", unreadable.len())?;
        for row in &unreadable {
            writeln!(writer, "  #{} on {}: {}", row.id, row.entry_date, row.message)?;
        }
    }
    writeln!(writer, "CE cycle: {} to {}", cycle.start, cycle.end)?;

    match config.training_start_date {
        Some(date) => writeln!(writer, "Training start: {date} (from config)")?,
        None => match db.training_start_date()? {
            Some(date) => writeln!(writer, "Training start: {date}")?,
            None => writeln!(writer, "Training start: not set")?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ht_core::{Category, DayKey, EntryDraft, FixedClock, Mutation, UnavailabilityMarker};

    use insta::assert_snapshot;

    #[test]
    fn status_command_summarizes_database() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("ht.db");
        let mut db = Database::open(&db_path).unwrap();

        for (key, hours) in [("2024-01-10", 2.0), ("2024-01-10", 1.0), ("2024-01-11", 3.0)] {
            let mut draft = EntryDraft::new(Category::Clinical, "individual", Some(hours));
            draft.occurred_at = format!("{key}T09:00:00");
            db.apply(&Mutation::CreateEntry {
                day: key.parse::<DayKey>().unwrap(),
                draft,
                confirmed: false,
            })
            .unwrap();
        }
        db.apply(&Mutation::MarkUnavailable {
            day: "2024-01-12".parse().unwrap(),
            marker: UnavailabilityMarker::new("conference"),
        })
        .unwrap();

        let config = Config {
            database_path: db_path.clone(),
            training_start_date: None,
        };
        let clock = FixedClock::at_local(2024, 10, 1, 8, 0).unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &config, &clock).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/ht.db");
        assert_snapshot!(output, @r"
        Hour tracker status
        Database: [TEMP]/ht.db
        Entries: 3 across 2 days
        Unavailable days: 1
        CE cycle: 2024-10-01 to 2026-09-30
        Training start: not set
        ");
    }

    #[test]
    fn status_lists_unreadable_rows() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("ht.db");
        let db = Database::open(&db_path).unwrap();
        rusqlite::Connection::open(&db_path)
            .unwrap()
            .execute(
                "
                INSERT INTO hour_entries (entry_date, category, subtype, hours, occurred_at)
                VALUES ('2024-01-10', 'billing', 'intake', 1.0, '2024-01-10T09:00:00')
                ",
                [],
            )
            .unwrap();

        let config = Config {
            database_path: db_path.clone(),
            training_start_date: None,
        };
        let clock = FixedClock::at_local(2024, 10, 1, 8, 0).unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &config, &clock).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/ht.db");
        assert_snapshot!(output, @r"
        Hour tracker status
        Database: [TEMP]/ht.db
        Entries: 1 across 1 days
        Unavailable days: 0
        Unreadable rows: 1 (remove with `ht purge <id>`)
          #1 on 2024-01-10: invalid entry row 1: unknown category: billing
        CE cycle: 2024-10-01 to 2026-09-30
        Training start: not set
        ");
    }
}
