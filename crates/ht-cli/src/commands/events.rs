//! Event commands for personal calendar events.

use std::io::Write;

use anyhow::Result;
use ht_core::{DayKey, PersonalEvent, Recurrence};
use ht_db::{Database, StoredEvent};

fn describe_repeat(event: &PersonalEvent) -> String {
    let unit = match event.recurrence {
        Recurrence::Once => return "one-time".to_string(),
        Recurrence::Yearly => return "yearly".to_string(),
        Recurrence::Daily => "day",
        Recurrence::Weekly => "week",
        Recurrence::Monthly => "month",
    };
    match event.interval {
        0 | 1 => format!("every {unit}"),
        n => format!("every {n} {unit}s"),
    }
}

fn format_event(id: i64, event: &PersonalEvent) -> String {
    let mut line = format!(
        "  #{id}  {}  {} ({}, {})",
        event.date,
        event.title,
        event.kind,
        describe_repeat(event)
    );
    if let Some(description) = &event.description {
        line.push_str(&format!("  {description}"));
    }
    line
}

/// Runs `ht event add`.
pub fn add<W: Write>(writer: &mut W, db: &Database, event: &PersonalEvent) -> Result<()> {
    let id = db.add_event(event)?;
    writeln!(
        writer,
        "Added event #{id}: {} on {} ({})",
        event.title.trim(),
        event.date,
        describe_repeat(event)
    )?;
    Ok(())
}

/// Runs `ht event list`, optionally limited to events falling on `day`.
pub fn list<W: Write>(writer: &mut W, db: &Database, day: Option<DayKey>) -> Result<()> {
    let stored = db.load_events()?;
    let shown: Vec<&StoredEvent> = stored
        .iter()
        .filter(|s| day.is_none_or(|day| s.event.occurs_on(day.date())))
        .collect();

    if shown.is_empty() {
        match day {
            Some(day) => writeln!(writer, "No events on {day}.")?,
            None => writeln!(writer, "No events.")?,
        }
        return Ok(());
    }
    match day {
        Some(day) => writeln!(writer, "Events on {day}")?,
        None => writeln!(writer, "Personal events")?,
    }
    for stored in shown {
        writeln!(writer, "{}", format_event(stored.id, &stored.event))?;
    }
    Ok(())
}

/// Runs `ht event remove`.
pub fn remove<W: Write>(writer: &mut W, db: &Database, id: i64) -> Result<()> {
    if db.remove_event(id)? {
        writeln!(writer, "Removed event #{id}")?;
    } else {
        anyhow::bail!("no event #{id}");
    }
    Ok(())
}
