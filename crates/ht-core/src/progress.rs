//! Compliance snapshot aggregation.
//!
//! [`aggregate`] walks every entry once, routes its hours into buckets via
//! the classifier, and returns an immutable [`ComplianceSnapshot`]. Nothing is
//! cached: the snapshot is recomputed from the full entry set on every call.
//!
//! # Tolerance
//!
//! Aggregation never fails. An entry whose timestamp cannot be parsed is left
//! out of the cycle-bound CE buckets, and an entry with non-finite hours is
//! left out entirely. Both are logged at `debug`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::classify::{Bucket, buckets, general_ce_residual};
use crate::entry::Entry;
use crate::targets;
use crate::temporal::{Clock, ComplianceCycle, ElapsedProgress, training_progress};

/// Hour totals and progress toward every licensing and renewal requirement.
///
/// Percentages are derived on demand from the stored totals and are not
/// clamped, so a bucket past its target reports more than 100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceSnapshot {
    pub total_clinical_hours: f64,
    pub direct_contact_hours: f64,
    pub relational_hours: f64,
    pub total_supervision_hours: f64,
    pub review_method_hours: f64,
    pub ce_cycle_hours: f64,
    pub ethics_law_tech_hours: f64,
    pub suicide_prevention_hours: f64,
    pub mft_specific_hours: f64,
    pub non_interactive_hours: f64,
    /// The CE cycle the CE totals were filtered to.
    pub cycle: ComplianceCycle,
    pub elapsed: ElapsedProgress,
}

impl ComplianceSnapshot {
    pub fn clinical_progress(&self) -> f64 {
        targets::percent_of(self.total_clinical_hours, targets::CLINICAL_HOURS)
    }

    pub fn endorsement_progress(&self) -> f64 {
        targets::percent_of(
            self.total_clinical_hours,
            targets::ENDORSEMENT_CLINICAL_HOURS,
        )
    }

    pub fn direct_contact_progress(&self) -> f64 {
        targets::percent_of(self.direct_contact_hours, targets::DIRECT_CONTACT_HOURS)
    }

    pub fn relational_progress(&self) -> f64 {
        targets::percent_of(self.relational_hours, targets::RELATIONAL_HOURS)
    }

    pub fn supervision_progress(&self) -> f64 {
        targets::percent_of(self.total_supervision_hours, targets::SUPERVISION_HOURS)
    }

    pub fn review_method_progress(&self) -> f64 {
        targets::percent_of(self.review_method_hours, targets::REVIEW_METHOD_HOURS)
    }

    pub fn ce_progress(&self) -> f64 {
        targets::percent_of(self.ce_cycle_hours, targets::CE_CYCLE_HOURS)
    }

    pub fn ethics_law_tech_progress(&self) -> f64 {
        targets::percent_of(self.ethics_law_tech_hours, targets::CE_ETHICS_LAW_TECH_HOURS)
    }

    pub fn suicide_prevention_progress(&self) -> f64 {
        targets::percent_of(
            self.suicide_prevention_hours,
            targets::CE_SUICIDE_PREVENTION_HOURS,
        )
    }

    pub fn mft_specific_progress(&self) -> f64 {
        targets::percent_of(self.mft_specific_hours, targets::CE_MFT_SPECIFIC_HOURS)
    }

    pub fn non_interactive_progress(&self) -> f64 {
        targets::percent_of(
            self.non_interactive_hours,
            targets::CE_NON_INTERACTIVE_CAP_HOURS,
        )
    }

    /// Cycle CE hours not attributed to a named category.
    pub fn general_ce_hours(&self) -> f64 {
        general_ce_residual(
            self.ce_cycle_hours,
            self.ethics_law_tech_hours,
            self.suicide_prevention_hours,
            self.mft_specific_hours,
        )
    }

    pub fn general_ce_progress(&self) -> f64 {
        targets::percent_of(self.general_ce_hours(), targets::CE_GENERAL_HOURS)
    }

    /// MFT-specific hours within ethics/law/tech.
    ///
    /// Entries do not record this split, so the whole ethics/law/tech total is
    /// passed through.
    pub const fn ethics_law_tech_mft_hours(&self) -> f64 {
        self.ethics_law_tech_hours
    }

    /// Alias of [`Self::total_clinical_hours`] for older report consumers.
    pub const fn total_session_hours(&self) -> f64 {
        self.total_clinical_hours
    }

    /// Alias of [`Self::clinical_progress`] for older report consumers.
    pub fn session_progress(&self) -> f64 {
        self.clinical_progress()
    }

    /// Every requirement with its current standing, in report order.
    pub fn requirements(&self) -> Vec<Requirement> {
        use RequirementKind::{Cap, Minimum};
        vec![
            Requirement::new(
                "clinical",
                "Supervised clinical training",
                self.total_clinical_hours,
                targets::CLINICAL_HOURS,
                Minimum,
            ),
            Requirement::new(
                "endorsement",
                "Clinical hours (endorsement)",
                self.total_clinical_hours,
                targets::ENDORSEMENT_CLINICAL_HOURS,
                Minimum,
            ),
            Requirement::new(
                "direct_contact",
                "Mental health therapy",
                self.direct_contact_hours,
                targets::DIRECT_CONTACT_HOURS,
                Minimum,
            ),
            Requirement::new(
                "relational",
                "Relational therapy",
                self.relational_hours,
                targets::RELATIONAL_HOURS,
                Minimum,
            ),
            Requirement::new(
                "supervision",
                "Face-to-face supervision",
                self.total_supervision_hours,
                targets::SUPERVISION_HOURS,
                Minimum,
            ),
            Requirement::new(
                "review_method",
                "Supervision with audio/video review",
                self.review_method_hours,
                targets::REVIEW_METHOD_HOURS,
                Minimum,
            ),
            Requirement::new(
                "ce_total",
                "CE hours this cycle",
                self.ce_cycle_hours,
                targets::CE_CYCLE_HOURS,
                Minimum,
            ),
            Requirement::new(
                "ce_ethics_law_tech",
                "Ethics, law, or technology",
                self.ethics_law_tech_hours,
                targets::CE_ETHICS_LAW_TECH_HOURS,
                Minimum,
            ),
            Requirement::new(
                "ce_suicide_prevention",
                "Suicide prevention",
                self.suicide_prevention_hours,
                targets::CE_SUICIDE_PREVENTION_HOURS,
                Minimum,
            ),
            Requirement::new(
                "ce_mft_specific",
                "MFT-specific",
                self.mft_specific_hours,
                targets::CE_MFT_SPECIFIC_HOURS,
                Minimum,
            ),
            Requirement::new(
                "ce_general",
                "General CE",
                self.general_ce_hours(),
                targets::CE_GENERAL_HOURS,
                Minimum,
            ),
            Requirement::new(
                "ce_non_interactive",
                "Non-interactive CE (max)",
                self.non_interactive_hours,
                targets::CE_NON_INTERACTIVE_CAP_HOURS,
                Cap,
            ),
        ]
    }
}

/// Whether a target is a floor to reach or a ceiling to stay under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    Minimum,
    Cap,
}

/// One requirement's standing, derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requirement {
    pub key: &'static str,
    pub label: &'static str,
    pub hours: f64,
    pub target: f64,
    pub kind: RequirementKind,
}

impl Requirement {
    const fn new(
        key: &'static str,
        label: &'static str,
        hours: f64,
        target: f64,
        kind: RequirementKind,
    ) -> Self {
        Self {
            key,
            label,
            hours,
            target,
            kind,
        }
    }

    pub fn percent(&self) -> f64 {
        targets::percent_of(self.hours, self.target)
    }

    /// Hours still needed, never negative. Always 0 for caps.
    pub fn remaining(&self) -> f64 {
        match self.kind {
            RequirementKind::Minimum => (self.target - self.hours).max(0.0),
            RequirementKind::Cap => 0.0,
        }
    }

    /// A minimum is met once reached; a cap is met while not exceeded.
    pub fn is_met(&self) -> bool {
        match self.kind {
            RequirementKind::Minimum => self.hours >= self.target,
            RequirementKind::Cap => self.hours <= self.target,
        }
    }
}

/// Computes the compliance snapshot for a set of entries.
///
/// Entry order does not matter. CE entries are counted only if they occurred
/// within the cycle active on `clock`'s date.
pub fn aggregate<'a, I>(
    entries: I,
    training_start: Option<NaiveDate>,
    clock: &impl Clock,
) -> ComplianceSnapshot
where
    I: IntoIterator<Item = &'a Entry>,
{
    let cycle = ComplianceCycle::containing(clock.today());
    let mut totals = [0.0_f64; Bucket::COUNT];

    for entry in entries {
        if !entry.hours.is_finite() {
            tracing::debug!(hours = entry.hours, "skipping entry with non-finite hours");
            continue;
        }
        let set = buckets(entry);
        if set.is_empty() {
            continue;
        }

        let occurred_on = entry.occurred_on();
        let in_cycle = occurred_on.is_some_and(|date| cycle.contains(date));
        if occurred_on.is_none() && set.iter().any(Bucket::is_cycle_bound) {
            tracing::debug!(
                occurred_at = %entry.occurred_at,
                "entry timestamp unparseable; excluded from cycle totals"
            );
        }

        for bucket in set.iter() {
            if bucket.is_cycle_bound() && !in_cycle {
                continue;
            }
            totals[bucket.index()] += entry.hours;
        }
    }

    let total = |bucket: Bucket| totals[bucket.index()];
    ComplianceSnapshot {
        total_clinical_hours: total(Bucket::TotalClinical),
        direct_contact_hours: total(Bucket::DirectContact),
        relational_hours: total(Bucket::Relational),
        total_supervision_hours: total(Bucket::Supervision),
        review_method_hours: total(Bucket::ReviewMethod),
        ce_cycle_hours: total(Bucket::CeTotal),
        ethics_law_tech_hours: total(Bucket::CeEthicsLawTech),
        suicide_prevention_hours: total(Bucket::CeSuicidePrevention),
        mft_specific_hours: total(Bucket::CeMftSpecific),
        non_interactive_hours: total(Bucket::CeNonInteractive),
        cycle,
        elapsed: training_progress(training_start, clock),
    }
}
