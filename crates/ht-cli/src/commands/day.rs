//! Day command: what a single day holds.

use std::io::Write;

use anyhow::Result;
use chrono::Datelike;
use ht_core::holidays::holiday_name;
use ht_core::{
    Category, DayBook, DayKey, DayState, Entry, PersonalEvent, UnavailabilityMarker, events_on,
};
use ht_db::Database;
use serde::Serialize;

/// JSON view of a day.
#[derive(Debug, Serialize)]
pub struct JsonDay<'a> {
    pub day: DayKey,
    pub state: &'static str,
    pub holiday: Option<&'static str>,
    pub events: Vec<&'a PersonalEvent>,
    pub entries: Vec<JsonEntry<'a>>,
    pub unavailable: Option<&'a UnavailabilityMarker>,
    pub total_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct JsonEntry<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub entry: &'a Entry,
}

impl<'a> JsonDay<'a> {
    fn new(book: &'a DayBook, day: DayKey, events: &[&'a PersonalEvent]) -> Self {
        let (state, entries, unavailable) = match book.state(day) {
            DayState::Empty => ("empty", &[][..], None),
            DayState::Logged(entries) => ("logged", entries, None),
            DayState::Unavailable(marker) => ("unavailable", &[][..], Some(marker)),
        };
        Self {
            day,
            state,
            holiday: holiday_name(day.date()),
            events: events.to_vec(),
            entries: entries
                .iter()
                .enumerate()
                .map(|(index, entry)| JsonEntry { index, entry })
                .collect(),
            unavailable,
            total_hours: entries.iter().map(|e| e.hours).sum(),
        }
    }
}

/// Formats a day for the terminal.
pub fn format_day(book: &DayBook, day: DayKey, events: &[&PersonalEvent]) -> String {
    let view = JsonDay::new(book, day, events);
    let mut lines = vec![format!("{} {day}", day.date().weekday())];
    if let Some(holiday) = view.holiday {
        lines.push(format!("Holiday: {holiday}"));
    }
    for event in events {
        lines.push(format!("Event: {} ({})", event.title, event.kind));
    }
    lines.push(String::new());

    match book.state(day) {
        DayState::Empty => lines.push("No hours logged.".to_string()),
        DayState::Unavailable(marker) => {
            lines.push(format!("Unavailable: {}", marker.reason));
            if let Some(notes) = &marker.notes {
                lines.push(format!("  {notes}"));
            }
        }
        DayState::Logged(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                lines.push(format_entry(index, entry));
            }
            lines.push(String::new());
            lines.push(format!("Total: {:.2}h", view.total_hours));
        }
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

pub(crate) fn format_entry(index: usize, entry: &Entry) -> String {
    let mut line = format!(
        "  #{index}  {:>5.2}h  {}: {}",
        entry.hours, entry.category, entry.subtype
    );
    match entry.category {
        Category::Supervision if entry.review.any() => {
            let method = match (entry.review.audio, entry.review.video) {
                (true, true) => "audio+video",
                (true, false) => "audio",
                _ => "video",
            };
            line.push_str(&format!(" ({method} review)"));
        }
        Category::ContinuingEducation => {
            let ce = entry.ce_category.map_or("-", |c| c.as_str());
            let format = entry.delivery_format.map_or("-", |f| f.as_str());
            line.push_str(&format!(" [{ce}, {format}]"));
        }
        _ => {}
    }
    if !entry.notes.is_empty() {
        line.push_str(&format!("  {}", entry.notes));
    }
    line
}

/// Runs `ht day`.
pub fn run<W: Write>(writer: &mut W, db: &Database, day: DayKey, json: bool) -> Result<()> {
    let book = db.load_book()?;
    let stored = db.load_events()?;
    let events = events_on(stored.iter().map(|s| &s.event), day.date());
    if json {
        let view = JsonDay::new(&book, day, &events);
        writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
    } else {
        write!(writer, "{}", format_day(&book, day, &events))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ht_core::{
        CeCategory, DeliveryFormat, EntryDraft, EventKind, Mutation, Recurrence, ReviewMethod,
    };
    use insta::assert_snapshot;

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn create(book: &mut DayBook, key: &str, mut draft: EntryDraft) {
        draft.occurred_at = format!("{key}T10:00:00");
        book.apply(Mutation::CreateEntry {
            day: day(key),
            draft,
            confirmed: false,
        })
        .unwrap();
    }

    fn sample_book() -> DayBook {
        let mut book = DayBook::new();
        create(
            &mut book,
            "2024-01-15",
            EntryDraft::new(Category::Clinical, "family", Some(1.5)).with_notes("intake"),
        );
        create(
            &mut book,
            "2024-01-15",
            EntryDraft::new(Category::Supervision, "group", Some(1.0)).with_review(ReviewMethod {
                audio: true,
                video: false,
            }),
        );
        create(
            &mut book,
            "2024-01-15",
            EntryDraft::new(Category::ContinuingEducation, "webinar", Some(2.0)).with_ce(
                Some(CeCategory::SuicidePrevention),
                Some(DeliveryFormat::OnlineInteractive),
            ),
        );
        book.apply(Mutation::MarkUnavailable {
            day: day("2024-01-16"),
            marker: UnavailabilityMarker::new("sick").with_notes("flu"),
        })
        .unwrap();
        book
    }

    #[test]
    fn test_logged_day_on_holiday() {
        let output = format_day(&sample_book(), day("2024-01-15"), &[]);
        assert_snapshot!(output, @r"
        Mon 2024-01-15
        Holiday: Martin Luther King Jr. Day

          #0   1.50h  clinical: family  intake
          #1   1.00h  supervision: group (audio review)
          #2   2.00h  continuing-education: webinar [suicide-prevention, online-interactive]

        Total: 4.50h
        ");
    }

    #[test]
    fn test_unavailable_and_empty_days() {
        let book = sample_book();
        assert_snapshot!(format_day(&book, day("2024-01-16"), &[]), @r"
        Tue 2024-01-16

        Unavailable: sick
          flu
        ");
        assert_snapshot!(format_day(&book, day("2024-01-17"), &[]), @r"
        Wed 2024-01-17

        No hours logged.
        ");
    }

    #[test]
    fn test_day_json_lists_indexed_entries() {
        let book = sample_book();
        let json = serde_json::to_value(JsonDay::new(&book, day("2024-01-15"), &[])).unwrap();
        assert_eq!(json["state"], "logged");
        assert_eq!(json["holiday"], "Martin Luther King Jr. Day");
        assert_eq!(json["entries"][2]["index"], 2);
        assert_eq!(json["entries"][2]["ce_category"], "suicide-prevention");
        assert_eq!(json["entries"][1]["reviewed_audio"], true);
        assert_eq!(json["total_hours"], 4.5);

        let json = serde_json::to_value(JsonDay::new(&book, day("2024-01-16"), &[])).unwrap();
        assert_eq!(json["state"], "unavailable");
        assert_eq!(json["unavailable"]["reason"], "sick");
        assert_eq!(json["entries"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_day_shows_events_that_fall_on_it() {
        let mut db = Database::open_in_memory().unwrap();
        let birthday = day("1990-01-17").date();
        let dentist = day("2024-01-18").date();
        db.add_event(
            &PersonalEvent::new("Sam's birthday", EventKind::Birthday, birthday)
                .repeating(Recurrence::Yearly, 1),
        )
        .unwrap();
        db.add_event(&PersonalEvent::new("Dentist", EventKind::Appointment, dentist))
            .unwrap();

        let mut out = Vec::new();
        run(&mut out, &db, day("2024-01-17"), false).unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Wed 2024-01-17
        Event: Sam's birthday (birthday)

        No hours logged.
        ");

        let mut out = Vec::new();
        run(&mut out, &db, day("2024-01-17"), true).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["events"].as_array().unwrap().len(), 1);
        assert_eq!(json["events"][0]["title"], "Sam's birthday");
        assert_eq!(json["events"][0]["recurrence"], "yearly");
    }
}
