//! Log, edit, and delete commands for hour entries.

use std::io::Write;

use anyhow::{Context, Result};
use ht_core::{Clock, DayKey, EntryDraft, Mutation, ReviewMethod};
use ht_db::Database;

use crate::cli::{EntryArgs, EntryChanges};
use crate::commands::util::{occurred_at_on, submit};

impl EntryArgs {
    /// Builds a draft stamped with `day` at the current local time.
    pub fn into_draft(self, day: DayKey, clock: &impl Clock) -> EntryDraft {
        let mut draft = EntryDraft::new(self.category, self.subtype, Some(self.hours))
            .with_notes(self.notes.unwrap_or_default())
            .with_review(ReviewMethod {
                audio: self.audio,
                video: self.video,
            })
            .with_ce(self.ce_category, self.format);
        draft.occurred_at = occurred_at_on(day, clock);
        draft
    }
}

impl EntryChanges {
    /// Applies the requested changes on top of an existing draft.
    pub fn apply_to(self, mut draft: EntryDraft) -> EntryDraft {
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(subtype) = self.subtype {
            draft.subtype = subtype;
        }
        if let Some(hours) = self.hours {
            draft.hours = Some(hours);
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
        if let Some(audio) = self.audio {
            draft.review.audio = audio;
        }
        if let Some(video) = self.video {
            draft.review.video = video;
        }
        if let Some(ce_category) = self.ce_category {
            draft.ce_category = Some(ce_category);
        }
        if let Some(format) = self.format {
            draft.delivery_format = Some(format);
        }
        draft
    }
}

/// Runs `ht log`.
pub fn log<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: DayKey,
    args: EntryArgs,
    clock: &impl Clock,
    confirm: impl FnOnce(f64) -> Result<bool>,
) -> Result<()> {
    let draft = args.into_draft(day, clock);
    let summary = format!("{} h {} ({})", fmt_hours(draft.hours), draft.category, draft.subtype);
    let mutation = Mutation::CreateEntry {
        day,
        draft,
        confirmed: false,
    };
    if submit(db, mutation, confirm)? {
        let index = db.load_book()?.entries_on(day).len().saturating_sub(1);
        writeln!(writer, "Logged {summary} on {day} as #{index}")?;
    } else {
        writeln!(writer, "Aborted.")?;
    }
    Ok(())
}

/// Runs `ht edit`.
pub fn edit<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: DayKey,
    index: usize,
    changes: EntryChanges,
    confirm: impl FnOnce(f64) -> Result<bool>,
) -> Result<()> {
    let book = db.load_book()?;
    let existing = book
        .entries_on(day)
        .get(index)
        .with_context(|| format!("no entry #{index} on {day}"))?;
    let draft = changes.apply_to(EntryDraft::from(existing));
    let mutation = Mutation::UpdateEntry {
        day,
        index,
        draft,
        confirmed: false,
    };
    if submit(db, mutation, confirm)? {
        writeln!(writer, "Updated entry #{index} on {day}")?;
    } else {
        writeln!(writer, "Aborted.")?;
    }
    Ok(())
}

/// Runs `ht delete`.
pub fn delete<W: Write>(writer: &mut W, db: &mut Database, day: DayKey, index: usize) -> Result<()> {
    db.apply(&Mutation::DeleteEntry { day, index })?;
    writeln!(writer, "Deleted entry #{index} on {day}")?;
    Ok(())
}

/// Runs `ht purge`.
pub fn purge<W: Write>(writer: &mut W, db: &Database, id: i64) -> Result<()> {
    if db.delete_row(id)? {
        writeln!(writer, "Removed row #{id}")?;
    } else {
        writeln!(writer, "No entry row #{id}")?;
    }
    Ok(())
}

fn fmt_hours(hours: Option<f64>) -> String {
    hours.map_or_else(|| "?".to_string(), |h| format!("{h}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;
    use ht_core::{Category, CeCategory, FixedClock};

    use crate::{Cli, Commands};

    fn clock() -> FixedClock {
        FixedClock::at_local(2024, 1, 15, 9, 0).unwrap()
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn log_args(args: &[&str]) -> EntryArgs {
        let argv = ["ht", "log"].iter().chain(args);
        match Cli::parse_from(argv).command {
            Some(Commands::Log { entry, .. }) => entry,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn never(_: f64) -> Result<bool> {
        panic!("confirmation should not be requested")
    }

    #[test]
    fn test_log_writes_entry_and_reports_index() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        let args = log_args(&[
            "--category",
            "clinical",
            "--subtype",
            "family",
            "--hours",
            "1.5",
            "--notes",
            "intake",
        ]);
        log(&mut out, &mut db, day("2024-01-15"), args, &clock(), never).unwrap();

        let out = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(out, @"Logged 1.5 h clinical (family) on 2024-01-15 as #0");

        let book = db.load_book().unwrap();
        let entry = &book.entries_on(day("2024-01-15"))[0];
        assert_eq!(entry.notes, "intake");
        assert_eq!(entry.category, Category::Clinical);
    }

    #[test]
    fn test_log_accepts_legacy_category_and_ce_fields() {
        let mut db = Database::open_in_memory().unwrap();
        let args = log_args(&[
            "--category",
            "ce",
            "--subtype",
            "workshop",
            "--hours",
            "3",
            "--ce-category",
            "ethics-law-tech",
            "--format",
            "in-person",
        ]);
        log(&mut Vec::new(), &mut db, day("2024-01-15"), args, &clock(), never).unwrap();

        let book = db.load_book().unwrap();
        let entry = &book.entries_on(day("2024-01-15"))[0];
        assert_eq!(entry.ce_category, Some(CeCategory::EthicsLawTech));
    }

    #[test]
    fn test_log_ce_without_format_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let args = log_args(&[
            "--category",
            "continuing-education",
            "--subtype",
            "webinar",
            "--hours",
            "1",
            "--ce-category",
            "general",
        ]);
        let err = log(&mut Vec::new(), &mut db, day("2024-01-15"), args, &clock(), never)
            .unwrap_err();
        assert_eq!(err.to_string(), "a delivery format is required");
    }

    #[test]
    fn test_declined_long_entry_reports_abort() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        let args = log_args(&["--category", "clinical", "--subtype", "individual", "--hours", "18"]);
        log(&mut out, &mut db, day("2024-01-15"), args, &clock(), |_| Ok(false)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Aborted.\n");
        assert_eq!(db.counts().unwrap().entries, 0);

        let args = log_args(&["--category", "clinical", "--subtype", "individual", "--hours", "2"]);
        log(&mut Vec::new(), &mut db, day("2024-01-15"), args, &clock(), never).unwrap();
        let changes = EntryChanges {
            hours: Some(17.0),
            ..EntryChanges::default()
        };
        let mut out = Vec::new();
        edit(&mut out, &mut db, day("2024-01-15"), 0, changes, |_| Ok(false)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Aborted.\n");
        let book = db.load_book().unwrap();
        assert!((book.entries_on(day("2024-01-15"))[0].hours - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_purge_removes_rows_by_id() {
        let mut db = Database::open_in_memory().unwrap();
        let args = log_args(&["--category", "clinical", "--subtype", "individual", "--hours", "1"]);
        log(&mut Vec::new(), &mut db, day("2024-01-15"), args, &clock(), never).unwrap();

        let mut out = Vec::new();
        purge(&mut out, &db, 1).unwrap();
        purge(&mut out, &db, 1).unwrap();
        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Removed row #1
        No entry row #1
        ");
        assert_eq!(db.counts().unwrap().entries, 0);
    }

    #[test]
    fn test_edit_keeps_unchanged_fields() {
        let mut db = Database::open_in_memory().unwrap();
        let args = log_args(&[
            "--category",
            "supervision",
            "--subtype",
            "group",
            "--hours",
            "2",
            "--audio",
        ]);
        log(&mut Vec::new(), &mut db, day("2024-01-14"), args, &clock(), never).unwrap();
        let before = db.load_book().unwrap().entries_on(day("2024-01-14"))[0].clone();

        let changes = EntryChanges {
            hours: Some(2.5),
            video: Some(true),
            ..EntryChanges::default()
        };
        let mut out = Vec::new();
        edit(&mut out, &mut db, day("2024-01-14"), 0, changes, never).unwrap();

        let after = db.load_book().unwrap().entries_on(day("2024-01-14"))[0].clone();
        assert!((after.hours - 2.5).abs() < f64::EPSILON);
        assert!(after.review.audio && after.review.video);
        assert_eq!(after.occurred_at, before.occurred_at);
        assert_eq!(String::from_utf8(out).unwrap(), "Updated entry #0 on 2024-01-14\n");
    }

    #[test]
    fn test_edit_and_delete_missing_entry_fail() {
        let mut db = Database::open_in_memory().unwrap();
        let err = edit(
            &mut Vec::new(),
            &mut db,
            day("2024-01-14"),
            0,
            EntryChanges::default(),
            never,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "no entry #0 on 2024-01-14");

        let err = delete(&mut Vec::new(), &mut db, day("2024-01-14"), 3).unwrap_err();
        assert_eq!(err.to_string(), "no entry #3 on 2024-01-14");
    }
}
