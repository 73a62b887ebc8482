//! Storage layer for the hour tracker.
//!
//! Persists logged entries, unavailability markers and settings using
//! `rusqlite`. Every mutation goes through [`Database::apply`], which loads
//! the day book, runs the mutation guard and writes inside one transaction.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Use a `Mutex<Database>` or separate instances to share access across threads.
//!
//! # Schema
//!
//! ## Day keys and ordering
//!
//! `entry_date` and `unavailable_days.date` hold local calendar days as
//! `YYYY-MM-DD`. Within a day, entries are ordered by their autoincrement
//! `id`, which is insertion order; the position in that order is the entry
//! index used by edits and deletes.
//!
//! ## Timestamps
//!
//! `occurred_at` is stored verbatim as written by the caller (normally
//! RFC 3339 with the local offset). A malformed value still loads; it only
//! drops out of cycle-bound totals.
//!
//! ## Legacy values
//!
//! Older databases used `session` and `ce` as category names. They are read
//! as clinical and continuing education; new rows always use canonical names.
//!
//! ## Personal events
//!
//! `personal_events` keeps one row per event with its recurrence rule.
//! Removing an event clears `is_active` rather than deleting the row.
//!
//! ## Unreadable rows
//!
//! A row whose day key, category, CE category or delivery format does not
//! parse is skipped on load (logged at `warn`) so the rest of the book stays
//! usable. Such rows are invisible to entry indices; list them with
//! [`Database::unreadable_rows`] and remove them with [`Database::delete_row`].

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use ht_core::{
    Category, CeCategory, DayBook, DayKey, DayKeyedEntries, DeliveryFormat, Entry, EventKind,
    GuardError, Mutation, PersonalEvent, Recurrence, ReviewMethod, UnavailabilityMarker,
    UnavailabilitySet, ValidationError, Verdict, validate_mutation,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

const TRAINING_START_KEY: &str = "training_start_date";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The mutation guard rejected a change.
    #[error(transparent)]
    Guard(#[from] GuardError),
    /// A value failed validation before it was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stored entry could not be turned back into a domain value.
    #[error("invalid entry row {id}: {message}")]
    InvalidRow { id: i64, message: String },
    /// A stored setting has an unusable value.
    #[error("invalid setting {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A stored entry row that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableRow {
    pub id: i64,
    pub entry_date: String,
    pub message: String,
}

/// A personal event and its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: i64,
    pub event: PersonalEvent,
}

/// Row counts for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub entries: usize,
    pub logged_days: usize,
    pub unavailable_days: usize,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- hour_entries: one row per logged entry
            -- entry_date: local day key, 'YYYY-MM-DD'
            -- ce_category / delivery_format: NULL outside continuing education
            CREATE TABLE IF NOT EXISTS hour_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_date TEXT NOT NULL,
                category TEXT NOT NULL,
                subtype TEXT NOT NULL,
                hours REAL NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                reviewed_audio INTEGER NOT NULL DEFAULT 0,
                reviewed_video INTEGER NOT NULL DEFAULT 0,
                occurred_at TEXT NOT NULL,
                ce_category TEXT,
                delivery_format TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_hour_entries_date ON hour_entries(entry_date);

            CREATE TABLE IF NOT EXISTS unavailable_days (
                date TEXT PRIMARY KEY,
                reason TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
            );

            -- recurrence_interval: every N days/weeks/months; unused for none/yearly
            CREATE TABLE IF NOT EXISTS personal_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                event_type TEXT NOT NULL,
                event_date TEXT NOT NULL,
                recurrence_type TEXT NOT NULL DEFAULT 'none',
                recurrence_interval INTEGER NOT NULL DEFAULT 1,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Loads every readable entry grouped by day, in insertion order within
    /// a day. Unreadable rows are skipped.
    pub fn load_entries(&self) -> Result<DayKeyedEntries, DbError> {
        Ok(load_entries(&self.conn)?.entries)
    }

    /// Loads every unavailability marker.
    pub fn load_markers(&self) -> Result<UnavailabilitySet, DbError> {
        load_markers(&self.conn)
    }

    /// Loads the full day book.
    pub fn load_book(&self) -> Result<DayBook, DbError> {
        load_book(&self.conn)
    }

    /// Validates and persists a mutation in a single transaction.
    ///
    /// Returns [`Verdict::NeedsConfirmation`] without writing anything when
    /// the entry exceeds the soft hour threshold and is not yet confirmed.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<Verdict, DbError> {
        let tx = self.conn.transaction()?;
        let LoadedEntries { entries, ids } = load_entries(&tx)?;
        let book = DayBook::from_parts(entries, load_markers(&tx)?);
        let verdict = validate_mutation(&book, mutation)?;
        if verdict != Verdict::Approved {
            return Ok(verdict);
        }

        match mutation {
            Mutation::CreateEntry { day, draft, .. } => {
                let entry = draft.clone().into_entry().map_err(GuardError::from)?;
                insert_entry(&tx, *day, &entry)?;
                tracing::debug!(%day, category = %entry.category, hours = entry.hours, "entry created");
            }
            Mutation::UpdateEntry {
                day, index, draft, ..
            } => {
                let entry = draft.clone().into_entry().map_err(GuardError::from)?;
                let id = entry_id_at(&ids, *day, *index)?;
                update_entry(&tx, id, &entry)?;
                tracing::debug!(%day, index, id, "entry updated");
            }
            Mutation::DeleteEntry { day, index } => {
                let id = entry_id_at(&ids, *day, *index)?;
                tx.execute("DELETE FROM hour_entries WHERE id = ?", [id])?;
                tracing::debug!(%day, index, id, "entry deleted");
            }
            Mutation::MarkUnavailable { day, marker } => {
                tx.execute(
                    "
                    INSERT INTO unavailable_days (date, reason, notes, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(date) DO UPDATE SET reason = excluded.reason, notes = excluded.notes
                    ",
                    params![day.to_string(), marker.reason, marker.notes, now_timestamp()],
                )?;
                tracing::debug!(%day, reason = %marker.reason, "day marked unavailable");
            }
            Mutation::ClearUnavailable { day } => {
                let removed = tx.execute(
                    "DELETE FROM unavailable_days WHERE date = ?",
                    [day.to_string()],
                )?;
                tracing::debug!(%day, removed, "unavailability cleared");
            }
        }

        tx.commit()?;
        Ok(Verdict::Approved)
    }

    /// Entry rows skipped on load because a field does not parse.
    pub fn unreadable_rows(&self) -> Result<Vec<UnreadableRow>, DbError> {
        let mut stmt = self.conn.prepare(ENTRY_QUERY)?;
        let rows = stmt.query_map([], EntryRow::from_row)?;
        let mut unreadable = Vec::new();
        for row in rows {
            let row = row?;
            let (id, entry_date) = (row.id, row.entry_date.clone());
            if let Err(err) = row.into_domain() {
                unreadable.push(UnreadableRow {
                    id,
                    entry_date,
                    message: err.to_string(),
                });
            }
        }
        Ok(unreadable)
    }

    /// Deletes one entry row by its id, readable or not.
    ///
    /// Returns whether a row was removed. Bypasses the mutation guard.
    pub fn delete_row(&self, id: i64) -> Result<bool, DbError> {
        let removed = self.conn.execute("DELETE FROM hour_entries WHERE id = ?", [id])?;
        tracing::debug!(id, removed, "entry row deleted");
        Ok(removed > 0)
    }

    /// Stores a new personal event and returns its id.
    pub fn add_event(&self, event: &PersonalEvent) -> Result<i64, DbError> {
        event.validate()?;
        self.conn.execute(
            "
            INSERT INTO personal_events (
                title, description, event_type, event_date, recurrence_type,
                recurrence_interval, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                event.title.trim(),
                event.description,
                event.kind.as_str(),
                DayKey::from_date(event.date).to_string(),
                event.recurrence.as_str(),
                event.interval.max(1),
                now_timestamp(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, title = %event.title, recurrence = %event.recurrence, "event added");
        Ok(id)
    }

    /// Active personal events, ordered by date. Unreadable rows are skipped.
    pub fn load_events(&self) -> Result<Vec<StoredEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, title, description, event_type, event_date, recurrence_type,
                   recurrence_interval
            FROM personal_events
            WHERE is_active = 1
            ORDER BY event_date ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], EventRow::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            let row = row?;
            let id = row.id;
            match row.into_domain() {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!(id, error = %err, "skipping unreadable event row"),
            }
        }
        Ok(events)
    }

    /// Deactivates a personal event. Returns whether an active event matched.
    pub fn remove_event(&self, id: i64) -> Result<bool, DbError> {
        let removed = self.conn.execute(
            "UPDATE personal_events SET is_active = 0 WHERE id = ? AND is_active = 1",
            [id],
        )?;
        tracing::debug!(id, removed, "event removed");
        Ok(removed > 0)
    }

    /// The stored training start date, if one has been set.
    pub fn training_start_date(&self) -> Result<Option<NaiveDate>, DbError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [TRAINING_START_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|value| {
                value
                    .parse::<DayKey>()
                    .map(DayKey::date)
                    .map_err(|_| DbError::InvalidSetting {
                        key: TRAINING_START_KEY,
                        value,
                    })
            })
            .transpose()
    }

    /// Stores the training start date, replacing any previous value.
    pub fn set_training_start_date(&self, date: NaiveDate) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![TRAINING_START_KEY, DayKey::from_date(date).to_string()],
        )?;
        Ok(())
    }

    /// Row counts for the status command.
    pub fn counts(&self) -> Result<StoreCounts, DbError> {
        let (entries, logged_days): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT entry_date) FROM hour_entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let unavailable_days: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM unavailable_days", [], |row| row.get(0))?;
        Ok(StoreCounts {
            entries: usize::try_from(entries).unwrap_or_default(),
            logged_days: usize::try_from(logged_days).unwrap_or_default(),
            unavailable_days: usize::try_from(unavailable_days).unwrap_or_default(),
        })
    }
}

fn load_book(conn: &Connection) -> Result<DayBook, DbError> {
    Ok(DayBook::from_parts(load_entries(conn)?.entries, load_markers(conn)?))
}

const ENTRY_QUERY: &str = "
    SELECT id, entry_date, category, subtype, hours, notes, reviewed_audio, reviewed_video,
           occurred_at, ce_category, delivery_format
    FROM hour_entries
    ORDER BY entry_date ASC, id ASC
";

/// Readable entries, with the row id behind each position of each day.
struct LoadedEntries {
    entries: DayKeyedEntries,
    ids: BTreeMap<DayKey, Vec<i64>>,
}

struct EntryRow {
    id: i64,
    entry_date: String,
    category: String,
    subtype: String,
    hours: f64,
    notes: String,
    reviewed_audio: bool,
    reviewed_video: bool,
    occurred_at: String,
    ce_category: Option<String>,
    delivery_format: Option<String>,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            entry_date: row.get(1)?,
            category: row.get(2)?,
            subtype: row.get(3)?,
            hours: row.get(4)?,
            notes: row.get(5)?,
            reviewed_audio: row.get(6)?,
            reviewed_video: row.get(7)?,
            occurred_at: row.get(8)?,
            ce_category: row.get(9)?,
            delivery_format: row.get(10)?,
        })
    }

    fn into_domain(self) -> Result<(DayKey, Entry), DbError> {
        let id = self.id;
        let invalid = |message: String| DbError::InvalidRow { id, message };

        let day: DayKey = self.entry_date.parse().map_err(|e| invalid(format!("{e}")))?;
        let category: Category = self.category.parse().map_err(|e| invalid(format!("{e}")))?;
        let ce_category = self
            .ce_category
            .map(|v| v.parse::<CeCategory>())
            .transpose()
            .map_err(|e| invalid(format!("{e}")))?;
        let delivery_format = self
            .delivery_format
            .map(|v| v.parse::<DeliveryFormat>())
            .transpose()
            .map_err(|e| invalid(format!("{e}")))?;

        let entry = Entry {
            category,
            subtype: self.subtype,
            hours: self.hours,
            notes: self.notes,
            review: ReviewMethod {
                audio: self.reviewed_audio,
                video: self.reviewed_video,
            },
            occurred_at: self.occurred_at,
            ce_category,
            delivery_format,
        };
        Ok((day, entry))
    }
}

fn load_entries(conn: &Connection) -> Result<LoadedEntries, DbError> {
    let mut stmt = conn.prepare(ENTRY_QUERY)?;
    let rows = stmt.query_map([], EntryRow::from_row)?;
    let mut loaded = LoadedEntries {
        entries: DayKeyedEntries::new(),
        ids: BTreeMap::new(),
    };
    for row in rows {
        let row = row?;
        let id = row.id;
        match row.into_domain() {
            Ok((day, entry)) => {
                loaded.entries.entry(day).or_default().push(entry);
                loaded.ids.entry(day).or_default().push(id);
            }
            Err(err) => tracing::warn!(id, error = %err, "skipping unreadable entry row"),
        }
    }
    Ok(loaded)
}

struct EventRow {
    id: i64,
    title: String,
    description: Option<String>,
    event_type: String,
    event_date: String,
    recurrence_type: String,
    recurrence_interval: i64,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            event_type: row.get(3)?,
            event_date: row.get(4)?,
            recurrence_type: row.get(5)?,
            recurrence_interval: row.get(6)?,
        })
    }

    fn into_domain(self) -> Result<StoredEvent, DbError> {
        let id = self.id;
        let invalid = |message: String| DbError::InvalidRow { id, message };

        let date: DayKey = self.event_date.parse().map_err(|e| invalid(format!("{e}")))?;
        let kind: EventKind = self.event_type.parse().map_err(|e| invalid(format!("{e}")))?;
        let recurrence: Recurrence = self
            .recurrence_type
            .parse()
            .map_err(|e| invalid(format!("{e}")))?;

        Ok(StoredEvent {
            id,
            event: PersonalEvent {
                title: self.title,
                description: self.description,
                kind,
                date: date.date(),
                recurrence,
                interval: u32::try_from(self.recurrence_interval).unwrap_or(1),
            },
        })
    }
}

fn load_markers(conn: &Connection) -> Result<UnavailabilitySet, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT date, reason, notes
        FROM unavailable_days
        ORDER BY date ASC
        ",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            UnavailabilityMarker {
                reason: row.get(1)?,
                notes: row.get(2)?,
            },
        ))
    })?;
    let mut markers = UnavailabilitySet::new();
    for row in rows {
        let (date, marker) = row?;
        match date.parse::<DayKey>() {
            Ok(day) => {
                markers.insert(day, marker);
            }
            Err(err) => tracing::warn!(%date, error = %err, "skipping marker with invalid date"),
        }
    }
    Ok(markers)
}

fn entry_id_at(ids: &BTreeMap<DayKey, Vec<i64>>, day: DayKey, index: usize) -> Result<i64, DbError> {
    ids.get(&day)
        .and_then(|ids| ids.get(index))
        .copied()
        .ok_or(DbError::Guard(GuardError::EntryNotFound { day, index }))
}

fn insert_entry(conn: &Connection, day: DayKey, entry: &Entry) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO hour_entries (
            entry_date, category, subtype, hours, notes, reviewed_audio, reviewed_video,
            occurred_at, ce_category, delivery_format
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ",
        params![
            day.to_string(),
            entry.category.as_str(),
            entry.subtype,
            entry.hours,
            entry.notes,
            entry.review.audio,
            entry.review.video,
            entry.occurred_at,
            entry.ce_category.map(|c| c.as_str()),
            entry.delivery_format.map(|f| f.as_str()),
        ],
    )?;
    Ok(())
}

fn update_entry(conn: &Connection, id: i64, entry: &Entry) -> Result<(), DbError> {
    conn.execute(
        "
        UPDATE hour_entries
        SET category = ?2, subtype = ?3, hours = ?4, notes = ?5, reviewed_audio = ?6,
            reviewed_video = ?7, occurred_at = ?8, ce_category = ?9, delivery_format = ?10
        WHERE id = ?1
        ",
        params![
            id,
            entry.category.as_str(),
            entry.subtype,
            entry.hours,
            entry.notes,
            entry.review.audio,
            entry.review.video,
            entry.occurred_at,
            entry.ce_category.map(|c| c.as_str()),
            entry.delivery_format.map(|f| f.as_str()),
        ],
    )?;
    Ok(())
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
