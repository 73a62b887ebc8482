//! Entry classification into regulatory buckets.
//!
//! Pure predicates over a single [`Entry`]. Cycle-window filtering for CE
//! buckets is the aggregator's job; these functions only look at the entry.

use crate::entry::Entry;
use crate::types::{Category, CeCategory, DeliveryFormat};

/// How a clinical subtype counts toward clinical requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicalKind {
    /// Face-to-face therapy. Family and couple sessions are also relational.
    DirectContact { relational: bool },
    /// Counts toward total clinical hours but not direct contact.
    Indirect,
    /// Documentation and administrative work; not clinical hours at all.
    Excluded,
}

/// Classifies a clinical subtype. Matching ignores ASCII case and
/// surrounding whitespace.
pub fn clinical_kind(subtype: &str) -> ClinicalKind {
    let subtype = subtype.trim();
    let is = |name: &str| subtype.eq_ignore_ascii_case(name);

    if is("individual") {
        ClinicalKind::DirectContact { relational: false }
    } else if is("family") || is("couple") {
        ClinicalKind::DirectContact { relational: true }
    } else if is("assessment") || is("consultation") {
        ClinicalKind::Indirect
    } else {
        ClinicalKind::Excluded
    }
}

/// A bucket that entry hours are summed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    TotalClinical,
    DirectContact,
    Relational,
    Supervision,
    ReviewMethod,
    CeTotal,
    CeEthicsLawTech,
    CeSuicidePrevention,
    CeMftSpecific,
    CeNonInteractive,
}

impl Bucket {
    pub const COUNT: usize = 10;

    pub const ALL: [Self; Self::COUNT] = [
        Self::TotalClinical,
        Self::DirectContact,
        Self::Relational,
        Self::Supervision,
        Self::ReviewMethod,
        Self::CeTotal,
        Self::CeEthicsLawTech,
        Self::CeSuicidePrevention,
        Self::CeMftSpecific,
        Self::CeNonInteractive,
    ];

    /// Position of the bucket in [`Bucket::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// CE buckets only count entries inside the active compliance cycle.
    pub const fn is_cycle_bound(self) -> bool {
        matches!(
            self,
            Self::CeTotal
                | Self::CeEthicsLawTech
                | Self::CeSuicidePrevention
                | Self::CeMftSpecific
                | Self::CeNonInteractive
        )
    }

    const fn bit(self) -> u16 {
        1 << self.index()
    }
}

/// The set of buckets one entry contributes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketSet(u16);

impl BucketSet {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn with(self, bucket: Bucket) -> Self {
        Self(self.0 | bucket.bit())
    }

    pub const fn contains(self, bucket: Bucket) -> bool {
        self.0 & bucket.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Buckets in the set, in [`Bucket::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Bucket> {
        Bucket::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Bucket> for BucketSet {
    fn from_iter<I: IntoIterator<Item = Bucket>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Whether a clinical entry is direct client contact.
pub fn is_direct_contact(entry: &Entry) -> bool {
    entry.category == Category::Clinical
        && matches!(clinical_kind(&entry.subtype), ClinicalKind::DirectContact { .. })
}

/// Whether a clinical entry is family or couple therapy.
pub fn is_relational(entry: &Entry) -> bool {
    entry.category == Category::Clinical
        && clinical_kind(&entry.subtype) == ClinicalKind::DirectContact { relational: true }
}

/// Whether an entry's hours count toward total clinical hours.
pub fn counts_as_clinical(entry: &Entry) -> bool {
    entry.category == Category::Clinical
        && clinical_kind(&entry.subtype) != ClinicalKind::Excluded
}

/// Whether a supervision entry was backed by audio or video review.
pub fn has_review_method(entry: &Entry) -> bool {
    entry.category == Category::Supervision && entry.review.any()
}

/// The named CE category bucket for an entry, if any.
///
/// General CE has no bucket of its own; it is the residual computed by
/// [`general_ce_residual`].
pub fn ce_bucket(entry: &Entry) -> Option<Bucket> {
    if entry.category != Category::ContinuingEducation {
        return None;
    }
    match entry.ce_category? {
        CeCategory::General => None,
        CeCategory::EthicsLawTech => Some(Bucket::CeEthicsLawTech),
        CeCategory::SuicidePrevention => Some(Bucket::CeSuicidePrevention),
        CeCategory::MftSpecific => Some(Bucket::CeMftSpecific),
    }
}

/// Whether a CE entry was self-paced or recorded online content.
pub fn is_non_interactive(entry: &Entry) -> bool {
    entry.category == Category::ContinuingEducation
        && entry.delivery_format == Some(DeliveryFormat::OnlineNonInteractive)
}

/// Every bucket an entry's hours contribute to.
pub fn buckets(entry: &Entry) -> BucketSet {
    let mut set = BucketSet::EMPTY;
    match entry.category {
        Category::Clinical => {
            if counts_as_clinical(entry) {
                set = set.with(Bucket::TotalClinical);
            }
            if is_direct_contact(entry) {
                set = set.with(Bucket::DirectContact);
            }
            if is_relational(entry) {
                set = set.with(Bucket::Relational);
            }
        }
        Category::Supervision => {
            set = set.with(Bucket::Supervision);
            if has_review_method(entry) {
                set = set.with(Bucket::ReviewMethod);
            }
        }
        Category::ContinuingEducation => {
            set = set.with(Bucket::CeTotal);
            if let Some(bucket) = ce_bucket(entry) {
                set = set.with(bucket);
            }
            if is_non_interactive(entry) {
                set = set.with(Bucket::CeNonInteractive);
            }
        }
    }
    set
}

/// General CE hours: the cycle total less every named category, floored at 0.
pub fn general_ce_residual(
    total: f64,
    ethics_law_tech: f64,
    suicide_prevention: f64,
    mft_specific: f64,
) -> f64 {
    (total - ethics_law_tech - suicide_prevention - mft_specific).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryDraft, ReviewMethod};

    fn entry(category: Category, subtype: &str) -> Entry {
        EntryDraft::new(category, subtype, Some(1.0))
            .with_ce(Some(CeCategory::General), Some(DeliveryFormat::InPerson))
            .into_entry()
            .unwrap()
    }

    #[test]
    fn therapy_subtypes_are_direct_contact() {
        for subtype in ["individual", "family", "couple", "Family "] {
            let e = entry(Category::Clinical, subtype);
            let set = buckets(&e);
            assert!(set.contains(Bucket::TotalClinical), "{subtype}");
            assert!(set.contains(Bucket::DirectContact), "{subtype}");
        }
        assert!(!is_relational(&entry(Category::Clinical, "individual")));
        assert!(is_relational(&entry(Category::Clinical, "couple")));
    }

    #[test]
    fn assessment_is_clinical_but_not_direct() {
        let set = buckets(&entry(Category::Clinical, "assessment"));
        assert!(set.contains(Bucket::TotalClinical));
        assert!(!set.contains(Bucket::DirectContact));
    }

    #[test]
    fn documentation_and_admin_are_excluded() {
        for subtype in ["documentation", "other", "admin"] {
            assert!(buckets(&entry(Category::Clinical, subtype)).is_empty());
        }
    }

    #[test]
    fn supervision_subtype_names_do_not_leak_into_clinical() {
        let set = buckets(&entry(Category::Supervision, "individual"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Bucket::Supervision]);
    }

    #[test]
    fn either_review_flag_counts() {
        let mut e = entry(Category::Supervision, "group");
        assert!(!has_review_method(&e));
        e.review = ReviewMethod {
            audio: false,
            video: true,
        };
        assert!(has_review_method(&e));
        e.review = ReviewMethod {
            audio: true,
            video: true,
        };
        assert!(buckets(&e).contains(Bucket::ReviewMethod));
    }

    #[test]
    fn ce_buckets_follow_category_and_format() {
        let mut e = entry(Category::ContinuingEducation, "course");
        assert_eq!(ce_bucket(&e), None);
        e.ce_category = Some(CeCategory::SuicidePrevention);
        e.delivery_format = Some(DeliveryFormat::OnlineNonInteractive);
        let set = buckets(&e);
        assert!(set.contains(Bucket::CeTotal));
        assert!(set.contains(Bucket::CeSuicidePrevention));
        assert!(set.contains(Bucket::CeNonInteractive));
        assert!(Bucket::CeNonInteractive.is_cycle_bound());
        assert!(!Bucket::Supervision.is_cycle_bound());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact equality intended for residuals")]
    fn general_residual_is_floored() {
        assert_eq!(general_ce_residual(7.0, 2.0, 1.0, 0.0), 4.0);
        assert_eq!(general_ce_residual(3.0, 2.0, 1.0, 5.0), 0.0);
    }
}
