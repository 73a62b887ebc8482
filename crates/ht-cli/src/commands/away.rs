//! Away and back commands for unavailability markers.

use std::io::Write;

use anyhow::Result;
use ht_core::{DayKey, Mutation, UnavailabilityMarker};
use ht_db::Database;

/// Runs `ht away`.
pub fn away<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: DayKey,
    reason: String,
    notes: Option<String>,
) -> Result<()> {
    let marker = UnavailabilityMarker {
        reason: reason.trim().to_string(),
        notes: notes.filter(|n| !n.trim().is_empty()),
    };
    let label = marker.reason.clone();
    db.apply(&Mutation::MarkUnavailable { day, marker })?;
    writeln!(writer, "Marked {day} unavailable: {label}")?;
    Ok(())
}

/// Runs `ht back`.
pub fn back<W: Write>(writer: &mut W, db: &mut Database, day: DayKey) -> Result<()> {
    let was_marked = db.load_book()?.marker(day).is_some();
    db.apply(&Mutation::ClearUnavailable { day })?;
    if was_marked {
        writeln!(writer, "{day} is available again")?;
    } else {
        writeln!(writer, "{day} was not marked unavailable")?;
    }
    Ok(())
}
