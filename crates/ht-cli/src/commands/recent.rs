//! Recent command: the latest entries across all days.

use std::io::Write;

use anyhow::Result;
use ht_core::RecentEntry;
use ht_db::Database;

use crate::commands::day::format_entry;

/// Formats recent entries, newest first.
pub fn format_recent(recent: &[RecentEntry<'_>]) -> String {
    if recent.is_empty() {
        return "No recent activity.\n".to_string();
    }
    let mut output = String::new();
    for item in recent {
        output.push_str(&format!("{} {}\n", item.day, format_entry(item.index, item.entry)));
    }
    output
}

/// Runs `ht recent`.
pub fn run<W: Write>(writer: &mut W, db: &Database, limit: usize, json: bool) -> Result<()> {
    let book = db.load_book()?;
    let recent = book.recent(limit);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&recent)?)?;
    } else {
        write!(writer, "{}", format_recent(&recent))?;
    }
    Ok(())
}
