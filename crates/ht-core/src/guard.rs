//! Mutation guard: validation and conflict rules checked before persistence.
//!
//! The guard is stateless. Every call receives the current [`DayBook`] and a
//! proposed [`Mutation`] and answers whether the mutation may proceed. It
//! never changes state itself.
//!
//! # Check order
//!
//! 1. Field validation (hours, then subtype or CE type, CE category, format).
//! 2. Day conflicts between logged hours and unavailability.
//! 3. Entry existence for edits and deletes.
//! 4. The soft hour threshold, answered with [`Verdict::NeedsConfirmation`]
//!    unless the mutation is already confirmed.

use thiserror::Error;

use crate::book::{DayBook, DayState};
use crate::entry::{EntryDraft, UnavailabilityMarker};
use crate::targets::CONFIRM_THRESHOLD_HOURS;
use crate::types::{DayKey, ValidationError};

/// A proposed change to the day book.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Append an entry to a day.
    CreateEntry {
        day: DayKey,
        draft: EntryDraft,
        confirmed: bool,
    },
    /// Replace the entry at `index` within a day.
    UpdateEntry {
        day: DayKey,
        index: usize,
        draft: EntryDraft,
        confirmed: bool,
    },
    /// Remove the entry at `index` within a day.
    DeleteEntry { day: DayKey, index: usize },
    /// Mark a day unavailable, replacing any existing marker for it.
    MarkUnavailable {
        day: DayKey,
        marker: UnavailabilityMarker,
    },
    /// Remove a day's unavailability marker, if any.
    ClearUnavailable { day: DayKey },
}

impl Mutation {
    /// The day this mutation touches.
    pub const fn day(&self) -> DayKey {
        match self {
            Self::CreateEntry { day, .. }
            | Self::UpdateEntry { day, .. }
            | Self::DeleteEntry { day, .. }
            | Self::MarkUnavailable { day, .. }
            | Self::ClearUnavailable { day } => *day,
        }
    }

    /// Returns the mutation with the soft-threshold confirmation given.
    #[must_use]
    pub fn confirmed(mut self) -> Self {
        if let Self::CreateEntry { confirmed, .. } | Self::UpdateEntry { confirmed, .. } =
            &mut self
        {
            *confirmed = true;
        }
        self
    }
}

/// The guard's answer for a mutation that broke no rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The mutation may be applied.
    Approved,
    /// The entry exceeds the soft hour threshold; re-submit with
    /// [`Mutation::confirmed`] to proceed.
    NeedsConfirmation { hours: f64 },
}

/// Mutually exclusive day states that a mutation tried to combine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// Hours cannot be logged on a day marked unavailable.
    #[error("cannot log hours on {day}: day marked unavailable")]
    DayUnavailable { day: DayKey },

    /// A day with logged hours cannot be marked unavailable.
    #[error("cannot mark {day} unavailable: hours already logged")]
    HoursAlreadyLogged { day: DayKey },
}

/// Why the guard rejected a mutation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GuardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// An edit or delete named an entry that does not exist.
    #[error("no entry #{index} on {day}")]
    EntryNotFound { day: DayKey, index: usize },
}

/// Checks a proposed mutation against the current day book.
pub fn validate_mutation(book: &DayBook, mutation: &Mutation) -> Result<Verdict, GuardError> {
    match mutation {
        Mutation::CreateEntry {
            day,
            draft,
            confirmed,
        } => {
            draft.validate()?;
            ensure_loggable(book, *day)?;
            Ok(threshold_verdict(draft, *confirmed))
        }
        Mutation::UpdateEntry {
            day,
            index,
            draft,
            confirmed,
        } => {
            draft.validate()?;
            ensure_loggable(book, *day)?;
            ensure_entry_exists(book, *day, *index)?;
            Ok(threshold_verdict(draft, *confirmed))
        }
        Mutation::DeleteEntry { day, index } => {
            ensure_entry_exists(book, *day, *index)?;
            Ok(Verdict::Approved)
        }
        Mutation::MarkUnavailable { day, marker } => {
            marker.validate()?;
            if let DayState::Logged(_) = book.state(*day) {
                return Err(ConflictError::HoursAlreadyLogged { day: *day }.into());
            }
            Ok(Verdict::Approved)
        }
        Mutation::ClearUnavailable { .. } => Ok(Verdict::Approved),
    }
}

fn ensure_loggable(book: &DayBook, day: DayKey) -> Result<(), ConflictError> {
    match book.state(day) {
        DayState::Unavailable(_) => Err(ConflictError::DayUnavailable { day }),
        DayState::Empty | DayState::Logged(_) => Ok(()),
    }
}

fn ensure_entry_exists(book: &DayBook, day: DayKey, index: usize) -> Result<(), GuardError> {
    if index < book.entries_on(day).len() {
        Ok(())
    } else {
        Err(GuardError::EntryNotFound { day, index })
    }
}

fn threshold_verdict(draft: &EntryDraft, confirmed: bool) -> Verdict {
    match draft.hours {
        Some(hours) if hours > CONFIRM_THRESHOLD_HOURS && !confirmed => {
            Verdict::NeedsConfirmation { hours }
        }
        _ => Verdict::Approved,
    }
}
