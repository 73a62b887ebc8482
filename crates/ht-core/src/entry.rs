//! Logged time entries, entry drafts, and unavailability markers.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::temporal::local_date_of;
use crate::types::{Category, CeCategory, DeliveryFormat, ValidationError};

/// Whether a supervision session was accompanied by a recording review.
///
/// The two flags are independent at the data level even though most callers
/// present them as a single choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewMethod {
    #[serde(rename = "reviewed_audio", default)]
    pub audio: bool,
    #[serde(rename = "reviewed_video", default)]
    pub video: bool,
}

impl ReviewMethod {
    /// True if either form of review took place.
    #[must_use]
    pub const fn any(self) -> bool {
        self.audio || self.video
    }
}

/// One unit of logged time.
///
/// Entries are immutable value records. They live in a day-keyed collection
/// where position within a day is insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub category: Category,
    /// Modality, supervision format or CE activity type, depending on category.
    pub subtype: String,
    pub hours: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub review: ReviewMethod,
    /// When the entry occurred, as stored (normally RFC 3339).
    ///
    /// Kept verbatim so a malformed value survives storage round trips; use
    /// [`Entry::occurred_on`] to interpret it.
    pub occurred_at: String,
    /// Present only on continuing-education entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ce_category: Option<CeCategory>,
    /// Present only on continuing-education entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_format: Option<DeliveryFormat>,
}

impl Entry {
    /// The local calendar date the entry occurred on, if its timestamp parses.
    pub fn occurred_on(&self) -> Option<NaiveDate> {
        local_date_of(&self.occurred_at)
    }
}

/// A proposed entry, as captured from a form or command line.
///
/// Fields that may legitimately be missing before validation are optional
/// here; [`EntryDraft::into_entry`] turns a valid draft into an [`Entry`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub category: Category,
    pub subtype: String,
    pub hours: Option<f64>,
    pub notes: String,
    pub review: ReviewMethod,
    pub ce_category: Option<CeCategory>,
    pub delivery_format: Option<DeliveryFormat>,
    pub occurred_at: String,
}

impl EntryDraft {
    /// Starts a draft with no notes, no review and no CE details.
    pub fn new(category: Category, subtype: impl Into<String>, hours: Option<f64>) -> Self {
        Self {
            category,
            subtype: subtype.into(),
            hours,
            notes: String::new(),
            review: ReviewMethod::default(),
            ce_category: None,
            delivery_format: None,
            occurred_at: String::new(),
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub const fn with_review(mut self, review: ReviewMethod) -> Self {
        self.review = review;
        self
    }

    #[must_use]
    pub const fn with_ce(
        mut self,
        ce_category: Option<CeCategory>,
        delivery_format: Option<DeliveryFormat>,
    ) -> Self {
        self.ce_category = ce_category;
        self.delivery_format = delivery_format;
        self
    }

    /// Stamps the draft with the instant it occurred.
    #[must_use]
    pub fn at<Tz: TimeZone>(mut self, instant: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        self.occurred_at = instant.to_rfc3339();
        self
    }

    /// Checks required fields, reporting the first failure.
    ///
    /// Order: hours, then for continuing education the CE type, category and
    /// delivery format; for every other category the subtype.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.hours {
            Some(hours) if hours.is_finite() && hours > 0.0 => {}
            value => return Err(ValidationError::InvalidHours { value }),
        }

        if self.category == Category::ContinuingEducation {
            if self.subtype.trim().is_empty() {
                return Err(ValidationError::MissingCeType);
            }
            if self.ce_category.is_none() {
                return Err(ValidationError::MissingCeCategory);
            }
            if self.delivery_format.is_none() {
                return Err(ValidationError::MissingDeliveryFormat);
            }
        } else if self.subtype.trim().is_empty() {
            return Err(ValidationError::MissingSubtype);
        }

        Ok(())
    }

    /// Validates the draft and converts it into an entry.
    ///
    /// CE details are dropped from entries outside continuing education.
    pub fn into_entry(self) -> Result<Entry, ValidationError> {
        self.validate()?;
        let is_ce = self.category == Category::ContinuingEducation;
        Ok(Entry {
            category: self.category,
            subtype: self.subtype,
            hours: self.hours.unwrap_or_default(),
            notes: self.notes,
            review: self.review,
            occurred_at: self.occurred_at,
            ce_category: self.ce_category.filter(|_| is_ce),
            delivery_format: self.delivery_format.filter(|_| is_ce),
        })
    }
}

impl From<&Entry> for EntryDraft {
    fn from(entry: &Entry) -> Self {
        Self {
            category: entry.category,
            subtype: entry.subtype.clone(),
            hours: Some(entry.hours),
            notes: entry.notes.clone(),
            review: entry.review,
            ce_category: entry.ce_category,
            delivery_format: entry.delivery_format,
            occurred_at: entry.occurred_at.clone(),
        }
    }
}

/// Marks a day as unavailable for logging (leave, illness, holiday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityMarker {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UnavailabilityMarker {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            notes: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reason.trim().is_empty() {
            return Err(ValidationError::MissingReason);
        }
        Ok(())
    }
}

/// A known subtype value with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtypeOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn option(value: &'static str, label: &'static str) -> SubtypeOption {
    SubtypeOption { value, label }
}

/// Therapy modalities; these are direct client contact.
pub const THERAPY_SUBTYPES: &[SubtypeOption] = &[
    option("individual", "Individual Therapy"),
    option("family", "Family Therapy"),
    option("couple", "Couple/Marriage Therapy"),
];

/// Clinical activities other than therapy.
pub const OTHER_CLINICAL_SUBTYPES: &[SubtypeOption] = &[
    option("assessment", "Assessment/Evaluation"),
    option("consultation", "Consultation"),
    option("documentation", "Documentation/Case Notes"),
    option("other", "Other Clinical Activities"),
];

pub const SUPERVISION_SUBTYPES: &[SubtypeOption] =
    &[option("individual", "Individual"), option("group", "Group")];

pub const CE_SUBTYPES: &[SubtypeOption] = &[
    option("workshop", "Workshop"),
    option("conference", "Conference"),
    option("webinar", "Webinar"),
    option("course", "Course"),
    option("other", "Other"),
];

/// Known subtypes for a category. The subtype field itself stays free-form.
pub fn subtype_options(category: Category) -> Vec<SubtypeOption> {
    match category {
        Category::Clinical => THERAPY_SUBTYPES
            .iter()
            .chain(OTHER_CLINICAL_SUBTYPES)
            .copied()
            .collect(),
        Category::Supervision => SUPERVISION_SUBTYPES.to_vec(),
        Category::ContinuingEducation => CE_SUBTYPES.to_vec(),
    }
}
