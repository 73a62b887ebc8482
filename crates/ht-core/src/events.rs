//! Personal calendar events and their recurrence.
//!
//! Like federal holidays, events are informational: they are shown beside a
//! day's hours and never block logging.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{EventKind, Recurrence, ValidationError};

/// A personal event, possibly repeating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: EventKind,
    /// The event's date; for repeating events, the first occurrence.
    pub date: NaiveDate,
    pub recurrence: Recurrence,
    /// Repeat every `interval` days, weeks or months. Zero counts as one.
    /// Yearly and one-time events ignore it.
    pub interval: u32,
}

impl PersonalEvent {
    /// A one-time event.
    pub fn new(title: impl Into<String>, kind: EventKind, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: None,
            kind,
            date,
            recurrence: Recurrence::Once,
            interval: 1,
        }
    }

    #[must_use]
    pub const fn repeating(mut self, recurrence: Recurrence, interval: u32) -> Self {
        self.recurrence = recurrence;
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }

    /// Every date the event falls on in `year`, in calendar order.
    ///
    /// Occurrences never precede the event's own date. A monthly event on a
    /// day a month lacks (the 31st, say) skips that month; a yearly event on
    /// February 29 falls on March 1 in common years.
    pub fn occurrences_in(&self, year: i32) -> Vec<NaiveDate> {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Vec::new();
        };
        let start = self.date;
        if start > last {
            return Vec::new();
        }
        let interval = self.interval.max(1);

        match self.recurrence {
            Recurrence::Once => {
                if start.year() == year {
                    vec![start]
                } else {
                    Vec::new()
                }
            }
            Recurrence::Daily => stepped(start, u64::from(interval), first, last),
            Recurrence::Weekly => stepped(start, 7 * u64::from(interval), first, last),
            Recurrence::Monthly => monthly(start, interval, year),
            Recurrence::Yearly => anniversary(start, year).into_iter().collect(),
        }
    }

    /// Whether the event falls on `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.occurrences_in(date.year()).contains(&date)
    }
}

fn stepped(start: NaiveDate, step: u64, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut current = if start >= first {
        Some(start)
    } else {
        let behind = (first - start).num_days().unsigned_abs();
        start.checked_add_days(Days::new(behind.div_ceil(step) * step))
    };

    let mut dates = Vec::new();
    while let Some(date) = current.filter(|date| *date <= last) {
        dates.push(date);
        current = date.checked_add_days(Days::new(step));
    }
    dates
}

fn monthly(start: NaiveDate, interval: u32, year: i32) -> Vec<NaiveDate> {
    let interval = i64::from(interval);
    (1..=12)
        .filter(|&month| {
            let since = (i64::from(year) - i64::from(start.year())) * 12 + i64::from(month)
                - i64::from(start.month());
            since >= 0 && since % interval == 0
        })
        .filter_map(|month| NaiveDate::from_ymd_opt(year, month, start.day()))
        .collect()
}

fn anniversary(start: NaiveDate, year: i32) -> Option<NaiveDate> {
    if year < start.year() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, start.month(), start.day()).or_else(|| {
        // February 29 in a common year.
        NaiveDate::from_ymd_opt(year, 3, 1)
    })
}

/// The events from `events` that fall on `date`, in the order given.
pub fn events_on<'a, I>(events: I, date: NaiveDate) -> Vec<&'a PersonalEvent>
where
    I: IntoIterator<Item = &'a PersonalEvent>,
{
    events.into_iter().filter(|event| event.occurs_on(date)).collect()
}
