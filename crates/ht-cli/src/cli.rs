//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ht_core::{Category, CeCategory, DeliveryFormat, EventKind, Recurrence};

/// Hour tracker for therapists in supervised training.
///
/// Logs clinical, supervision and continuing-education hours per day and
/// reports progress toward licensure and CE renewal requirements.
#[derive(Debug, Parser)]
#[command(name = "ht", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log hours for a day.
    Log {
        #[command(flatten)]
        entry: EntryArgs,

        /// Day to log on: YYYY-MM-DD, today, yesterday, or "N days ago".
        #[arg(long, default_value = "today")]
        day: String,

        /// Skip the confirmation prompt for entries over 16 hours.
        #[arg(short, long)]
        yes: bool,
    },

    /// Change fields of a logged entry.
    Edit {
        /// Day the entry was logged on.
        #[arg(long)]
        day: String,

        /// Position of the entry within the day, as shown by `ht day`.
        #[arg(long)]
        index: usize,

        #[command(flatten)]
        changes: EntryChanges,

        /// Skip the confirmation prompt for entries over 16 hours.
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a logged entry.
    Delete {
        #[arg(long)]
        day: String,

        #[arg(long)]
        index: usize,
    },

    /// Remove a stored entry row that can no longer be read, by id.
    ///
    /// Unreadable rows are listed by `ht status`.
    Purge {
        /// Row id.
        id: i64,
    },

    /// Mark a day unavailable (leave, illness, holiday).
    Away {
        #[arg(long, default_value = "today")]
        day: String,

        /// Why the day is unavailable.
        #[arg(long)]
        reason: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a day's unavailability marker.
    Back {
        #[arg(long, default_value = "today")]
        day: String,
    },

    /// Show entries, unavailability and holiday for a day.
    Day {
        #[arg(long, default_value = "today")]
        day: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the most recently logged entries.
    Recent {
        /// How many entries to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show progress toward every requirement.
    Progress {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Store the date supervised training began.
    StartDate {
        /// Date in YYYY-MM-DD format.
        date: String,
    },

    /// List US federal holidays.
    Holidays {
        /// Calendar year; defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
    },

    /// Manage personal calendar events.
    Event {
        #[command(subcommand)]
        action: EventAction,
    },

    /// Show database location and what it holds.
    Status,
}

/// Personal event subcommands.
#[derive(Debug, Subcommand)]
pub enum EventAction {
    /// Add an event.
    Add {
        #[arg(long)]
        title: String,

        /// The event's date, or its first occurrence when it repeats.
        #[arg(long, default_value = "today")]
        date: String,

        /// birthday, anniversary, appointment, reminder, or custom.
        #[arg(long, default_value = "custom")]
        kind: EventKind,

        /// none, daily, weekly, monthly, or yearly.
        #[arg(long, default_value = "none")]
        repeat: Recurrence,

        /// Repeat every N days, weeks or months.
        #[arg(long, default_value_t = 1)]
        every: u32,

        #[arg(long)]
        description: Option<String>,
    },

    /// List events, or only those falling on one day.
    List {
        #[arg(long)]
        day: Option<String>,
    },

    /// Remove an event by id.
    Remove {
        id: i64,
    },
}

/// Fields of a new entry.
#[derive(Debug, Clone, Args)]
pub struct EntryArgs {
    /// clinical, supervision, or continuing-education.
    #[arg(long)]
    pub category: Category,

    /// Modality, supervision format, or CE activity type.
    #[arg(long)]
    pub subtype: String,

    #[arg(long)]
    pub hours: f64,

    #[arg(long)]
    pub notes: Option<String>,

    /// Supervision was backed by audio review.
    #[arg(long)]
    pub audio: bool,

    /// Supervision was backed by video review.
    #[arg(long)]
    pub video: bool,

    /// CE content area: general, ethics-law-tech, suicide-prevention, mft-specific.
    #[arg(long)]
    pub ce_category: Option<CeCategory>,

    /// CE delivery: in-person, online-interactive, online-non-interactive.
    #[arg(long)]
    pub format: Option<DeliveryFormat>,
}

/// Fields to change on an existing entry; anything omitted is kept.
#[derive(Debug, Clone, Default, Args)]
pub struct EntryChanges {
    #[arg(long)]
    pub category: Option<Category>,

    #[arg(long)]
    pub subtype: Option<String>,

    #[arg(long)]
    pub hours: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub audio: Option<bool>,

    #[arg(long)]
    pub video: Option<bool>,

    #[arg(long)]
    pub ce_category: Option<CeCategory>,

    #[arg(long)]
    pub format: Option<DeliveryFormat>,
}
