//! The day book: every logged entry and unavailability marker, keyed by day.
//!
//! A day is in exactly one state at a time. Storage layers that keep entries
//! and markers in separate collections go through [`DayBook::from_parts`],
//! which resolves any overlap.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entry::{Entry, UnavailabilityMarker};
use crate::guard::{GuardError, Mutation, Verdict, validate_mutation};
use crate::progress::{ComplianceSnapshot, aggregate};
use crate::temporal::{Clock, local_datetime_of};
use crate::types::DayKey;

/// Entries grouped by day, in insertion order within each day.
pub type DayKeyedEntries = BTreeMap<DayKey, Vec<Entry>>;

/// Unavailability markers, at most one per day.
pub type UnavailabilitySet = BTreeMap<DayKey, UnavailabilityMarker>;

#[derive(Debug, Clone, PartialEq)]
enum Day {
    Logged(Vec<Entry>),
    Unavailable(UnavailabilityMarker),
}

/// What a single day holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayState<'a> {
    Empty,
    Logged(&'a [Entry]),
    Unavailable(&'a UnavailabilityMarker),
}

/// An entry together with where it lives in the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecentEntry<'a> {
    pub day: DayKey,
    pub index: usize,
    #[serde(flatten)]
    pub entry: &'a Entry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBook {
    days: BTreeMap<DayKey, Day>,
}

impl DayBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from separately stored entries and markers.
    ///
    /// Empty entry lists are ignored. A day present in both collections
    /// keeps its entries; the marker is dropped with a warning.
    pub fn from_parts(entries: DayKeyedEntries, markers: UnavailabilitySet) -> Self {
        let mut days: BTreeMap<DayKey, Day> = entries
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(day, list)| (day, Day::Logged(list)))
            .collect();

        for (day, marker) in markers {
            if days.contains_key(&day) {
                tracing::warn!(
                    %day,
                    reason = %marker.reason,
                    "day has both entries and an unavailability marker; ignoring marker"
                );
                continue;
            }
            days.insert(day, Day::Unavailable(marker));
        }

        Self { days }
    }

    pub fn state(&self, day: DayKey) -> DayState<'_> {
        match self.days.get(&day) {
            None => DayState::Empty,
            Some(Day::Logged(entries)) => DayState::Logged(entries),
            Some(Day::Unavailable(marker)) => DayState::Unavailable(marker),
        }
    }

    /// Entries logged on a day; empty unless the day is logged.
    pub fn entries_on(&self, day: DayKey) -> &[Entry] {
        match self.days.get(&day) {
            Some(Day::Logged(entries)) => entries,
            _ => &[],
        }
    }

    pub fn marker(&self, day: DayKey) -> Option<&UnavailabilityMarker> {
        match self.days.get(&day) {
            Some(Day::Unavailable(marker)) => Some(marker),
            _ => None,
        }
    }

    /// Every entry, ordered by day and then insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.logged_days().flat_map(|(_, entries)| entries.iter())
    }

    pub fn logged_days(&self) -> impl Iterator<Item = (DayKey, &[Entry])> {
        self.days.iter().filter_map(|(day, state)| match state {
            Day::Logged(entries) => Some((*day, entries.as_slice())),
            Day::Unavailable(_) => None,
        })
    }

    pub fn unavailable_days(&self) -> impl Iterator<Item = (DayKey, &UnavailabilityMarker)> {
        self.days.iter().filter_map(|(day, state)| match state {
            Day::Unavailable(marker) => Some((*day, marker)),
            Day::Logged(_) => None,
        })
    }

    /// Days in `from..=to` that hold entries or a marker. A reversed range
    /// yields nothing.
    pub fn days_between(
        &self,
        from: DayKey,
        to: DayKey,
    ) -> impl Iterator<Item = (DayKey, DayState<'_>)> {
        let range = if from <= to {
            self.days.range(from..=to)
        } else {
            self.days.range(from..from)
        };
        range.map(|(day, _)| (*day, self.state(*day)))
    }

    /// The `limit` most recent entries, newest first by timestamp.
    ///
    /// Entries whose timestamp does not parse come last. Ties fall back to
    /// the later day, then the later position within the day.
    pub fn recent(&self, limit: usize) -> Vec<RecentEntry<'_>> {
        let mut recent: Vec<_> = self
            .logged_days()
            .flat_map(|(day, entries)| {
                entries
                    .iter()
                    .enumerate()
                    .map(move |(index, entry)| RecentEntry { day, index, entry })
            })
            .map(|item| (local_datetime_of(&item.entry.occurred_at), item))
            .collect();
        recent.sort_by(|(a_at, a), (b_at, b)| {
            b_at.cmp(a_at)
                .then(b.day.cmp(&a.day))
                .then(b.index.cmp(&a.index))
        });
        recent.into_iter().take(limit).map(|(_, item)| item).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Runs the guard and, if it approves, applies the mutation.
    ///
    /// A [`Verdict::NeedsConfirmation`] leaves the book unchanged.
    pub fn apply(&mut self, mutation: Mutation) -> Result<Verdict, GuardError> {
        let verdict = validate_mutation(self, &mutation)?;
        if verdict != Verdict::Approved {
            return Ok(verdict);
        }

        match mutation {
            Mutation::CreateEntry { day, draft, .. } => {
                let entry = draft.into_entry()?;
                let slot = self
                    .days
                    .entry(day)
                    .or_insert_with(|| Day::Logged(Vec::new()));
                if let Day::Logged(entries) = slot {
                    entries.push(entry);
                }
            }
            Mutation::UpdateEntry {
                day, index, draft, ..
            } => {
                let entry = draft.into_entry()?;
                if let Some(Day::Logged(entries)) = self.days.get_mut(&day) {
                    entries[index] = entry;
                }
            }
            Mutation::DeleteEntry { day, index } => {
                if let Some(Day::Logged(entries)) = self.days.get_mut(&day) {
                    entries.remove(index);
                    if entries.is_empty() {
                        self.days.remove(&day);
                    }
                }
            }
            Mutation::MarkUnavailable { day, marker } => {
                self.days.insert(day, Day::Unavailable(marker));
            }
            Mutation::ClearUnavailable { day } => {
                if matches!(self.days.get(&day), Some(Day::Unavailable(_))) {
                    self.days.remove(&day);
                }
            }
        }
        Ok(Verdict::Approved)
    }

    /// Compliance snapshot over every entry in the book.
    pub fn snapshot(
        &self,
        training_start: Option<NaiveDate>,
        clock: &impl Clock,
    ) -> ComplianceSnapshot {
        aggregate(self.entries(), training_start, clock)
    }
}
