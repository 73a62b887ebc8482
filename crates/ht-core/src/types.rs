//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for entries, markers and the values they carry.
///
/// The entry variants are reported one at a time, in the order the guard
/// checks them, so callers can show a single actionable message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Hours were missing, zero, negative or not a finite number.
    #[error("hours must be a number greater than zero")]
    InvalidHours { value: Option<f64> },

    /// A clinical or supervision entry had an empty subtype.
    #[error("a subtype is required")]
    MissingSubtype,

    /// A continuing-education entry had an empty activity type.
    #[error("a CE type is required")]
    MissingCeType,

    /// A continuing-education entry had no CE category.
    #[error("a CE category is required")]
    MissingCeCategory,

    /// A continuing-education entry had no delivery format.
    #[error("a delivery format is required")]
    MissingDeliveryFormat,

    /// An unavailability marker had an empty reason.
    #[error("a reason is required to mark a day unavailable")]
    MissingReason,

    /// A personal event had an empty title.
    #[error("an event title is required")]
    MissingTitle,

    /// A day key was not a `YYYY-MM-DD` calendar date.
    #[error("invalid day key: {value} (expected YYYY-MM-DD)")]
    InvalidDayKey { value: String },

    /// A string did not name a known variant.
    #[error("unknown {field}: {value}")]
    UnknownValue { field: &'static str, value: String },
}

/// A canonical calendar-day key (`YYYY-MM-DD`) in the caller's local calendar.
///
/// Ordering follows the calendar, so a `BTreeMap<DayKey, _>` iterates days
/// chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    const FORMAT: &'static str = "%Y-%m-%d";

    /// Wraps a calendar date.
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Returns the calendar date this key names.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields; keys must be the zero-padded form.
        if s.len() != 10 {
            return Err(ValidationError::InvalidDayKey {
                value: s.to_string(),
            });
        }
        NaiveDate::parse_from_str(s, Self::FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDayKey {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for DayKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Generates a string-backed enum with canonical names, legacy aliases and
/// string-based serde.
macro_rules! define_str_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $canonical:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical string representation, used for storage and JSON.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $canonical,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($canonical $(| $alias)* => Ok(Self::$variant),)+
                    _ => Err(ValidationError::UnknownValue {
                        field: $field_name,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_str_enum!(
    /// The regulatory category an entry is logged under.
    Category, "category" {
        /// Clinical work: therapy, assessment, consultation, documentation.
        Clinical => "clinical" | "session",
        /// Supervision received from a qualified supervisor.
        Supervision => "supervision",
        /// Continuing-education activity.
        ContinuingEducation => "continuing-education" | "ce",
    }
);

define_str_enum!(
    /// Continuing-education content category.
    CeCategory, "CE category" {
        General => "general",
        EthicsLawTech => "ethics-law-tech",
        SuicidePrevention => "suicide-prevention",
        MftSpecific => "mft-specific",
    }
);

define_str_enum!(
    /// How a continuing-education activity was delivered.
    DeliveryFormat, "delivery format" {
        InPerson => "in-person",
        /// Live, real-time online participation.
        OnlineInteractive => "online-interactive",
        /// Self-paced or recorded online content.
        OnlineNonInteractive => "online-non-interactive",
    }
);

define_str_enum!(
    /// What a personal calendar event marks.
    EventKind, "event type" {
        Birthday => "birthday",
        Anniversary => "anniversary",
        Appointment => "appointment",
        Reminder => "reminder",
        Custom => "custom",
    }
);

define_str_enum!(
    /// How often a personal event repeats.
    Recurrence, "recurrence" {
        /// A one-time event.
        Once => "none" | "once",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
);

impl Category {
    /// Human-readable label for the subtype field of this category.
    #[must_use]
    pub const fn subtype_label(&self) -> &'static str {
        match self {
            Self::Clinical => "Session Type",
            Self::Supervision => "Supervision Type",
            Self::ContinuingEducation => "CE Type",
        }
    }
}

impl CeCategory {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::General => "General CE",
            Self::EthicsLawTech => "Ethics, Law, or Technology",
            Self::SuicidePrevention => "Suicide Prevention",
            Self::MftSpecific => "MFT-Specific",
        }
    }
}

impl DeliveryFormat {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InPerson => "In-Person",
            Self::OnlineInteractive => "Online Interactive (Live/Real-time)",
            Self::OnlineNonInteractive => "Online Non-Interactive (Self-paced/Recorded)",
        }
    }
}
