//! Compliance engine for supervised therapist hour tracking.
//!
//! This crate contains the domain types and rules for:
//! - Entries: logged clinical, supervision and continuing-education time
//! - Classification: which regulatory buckets an entry counts toward
//! - Aggregation: hour totals and progress for a compliance snapshot
//! - The day book and its mutation guard: one state per calendar day
//! - Calendar helpers: local day keys, CE compliance cycles, federal holidays
//!   and recurring personal events

mod book;
mod classify;
mod entry;
pub mod events;
mod guard;
pub mod holidays;
mod progress;
pub mod targets;
pub mod temporal;
mod types;

pub use book::{DayBook, DayKeyedEntries, DayState, RecentEntry, UnavailabilitySet};
pub use classify::{
    Bucket, BucketSet, ClinicalKind, buckets, ce_bucket, clinical_kind, counts_as_clinical,
    general_ce_residual, has_review_method, is_direct_contact, is_non_interactive, is_relational,
};
pub use entry::{
    CE_SUBTYPES, Entry, EntryDraft, OTHER_CLINICAL_SUBTYPES, ReviewMethod, SUPERVISION_SUBTYPES,
    SubtypeOption, THERAPY_SUBTYPES, UnavailabilityMarker, subtype_options,
};
pub use events::{PersonalEvent, events_on};
pub use guard::{ConflictError, GuardError, Mutation, Verdict, validate_mutation};
pub use progress::{ComplianceSnapshot, Requirement, RequirementKind, aggregate};
pub use temporal::{Clock, ComplianceCycle, ElapsedProgress, FixedClock, SystemClock};
pub use types::{
    Category, CeCategory, DayKey, DeliveryFormat, EventKind, Recurrence, ValidationError,
};
