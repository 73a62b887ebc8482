//! Calendar helpers: day keys, the CE compliance cycle, and elapsed training time.
//!
//! All calendar reasoning happens in the caller's local calendar. Instants are
//! converted to `Local` before their date is taken, so two timestamps on the
//! same local day always share a [`DayKey`] regardless of time-of-day.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::targets::ELAPSED_TARGET_DAYS;
use crate::types::DayKey;

/// Source of "now".
///
/// Injected everywhere a rule depends on the current date so the rules stay
/// deterministic under test.
pub trait Clock {
    /// The current local instant.
    fn now(&self) -> DateTime<Local>;

    /// The current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Local>);

impl FixedClock {
    /// Freezes time at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Local>) -> Self {
        Self(now)
    }

    /// Freezes time at a local wall-clock reading.
    ///
    /// Returns `None` for readings that do not exist locally (DST gaps) or
    /// are out of range.
    #[must_use]
    pub fn at_local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Returns the canonical day key for an instant in its own calendar.
///
/// Pass a `DateTime<Local>` to get the caller's local day.
pub fn day_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> DayKey {
    DayKey::from_date(instant.date_naive())
}

/// Whether two instants fall on the same calendar day.
pub fn is_same_day<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    day_key(a) == day_key(b)
}

/// Whether an instant falls on the clock's current day.
pub fn is_today<Tz: TimeZone>(instant: &DateTime<Tz>, clock: &impl Clock) -> bool {
    day_key(instant) == day_key(&clock.now())
}

/// Offset-carrying forms besides RFC 3339, as written by SQL databases.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Wall-clock forms without an offset; read as local time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

enum Stamp {
    Instant(DateTime<FixedOffset>),
    Wall(NaiveDateTime),
    Date(NaiveDate),
}

fn parse_stamp(raw: &str) -> Option<Stamp> {
    let raw = raw.trim();
    let offset_aware = DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    });
    if let Some(instant) = offset_aware {
        return Some(Stamp::Instant(instant));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(Stamp::Wall)
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(Stamp::Date))
}

/// Resolves a stored timestamp to the local wall-clock reading it denotes.
///
/// Accepts RFC 3339 and the SQL text forms (`2024-01-15 10:00:00+00`), which
/// are converted to local time; offset-free readings with or without seconds
/// (already local); or a bare `YYYY-MM-DD`, read as local midnight. Anything
/// else yields `None`; callers treat such entries as undated rather than
/// failing.
pub fn local_datetime_of(raw: &str) -> Option<NaiveDateTime> {
    Some(match parse_stamp(raw)? {
        Stamp::Instant(instant) => instant.with_timezone(&Local).naive_local(),
        Stamp::Wall(naive) => naive,
        Stamp::Date(date) => date.and_hms_opt(0, 0, 0)?,
    })
}

/// Resolves a stored timestamp to the local calendar date it occurred on.
///
/// Accepts the same forms as [`local_datetime_of`].
pub fn local_date_of(raw: &str) -> Option<NaiveDate> {
    local_datetime_of(raw).map(|naive| naive.date())
}

/// A two-year continuing-education reporting window, October 1 through
/// September 30.
///
/// Both bounds are inclusive calendar days: all of September 30 belongs to the
/// closing cycle and October 1 opens the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceCycle {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ComplianceCycle {
    /// The cycle that is active on `today`.
    ///
    /// January through September belong to the cycle that opened the previous
    /// October; from October onward a new cycle has opened this year.
    #[must_use]
    pub fn containing(today: NaiveDate) -> Self {
        let start_year = if today.month() < 10 {
            today.year() - 1
        } else {
            today.year()
        };
        Self {
            start: ymd_saturating(start_year, 10, 1),
            end: ymd_saturating(start_year + 2, 9, 30),
        }
    }

    /// Whether a calendar date lies within the cycle, bounds included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The cycle active according to `clock`.
pub fn current_compliance_cycle(clock: &impl Clock) -> ComplianceCycle {
    ComplianceCycle::containing(clock.today())
}

// Only unreachable for years at the edge of chrono's range.
fn ymd_saturating(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

/// Progress through the minimum supervised-training duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElapsedProgress {
    /// Elapsed share of the target, clamped to \[0, 100\].
    pub progress_percent: f64,
    /// Whole days left until the target, never negative.
    pub remaining_days: i64,
}

impl ElapsedProgress {
    /// Progress when no training start date is known.
    #[must_use]
    pub const fn not_started(target_days: u32) -> Self {
        Self {
            progress_percent: 0.0,
            remaining_days: target_days as i64,
        }
    }
}

/// Computes whole-day progress from `start` to `today` toward `target_days`.
///
/// Days are counted between local midnights, so the time of day never matters.
/// A start in the future counts as zero elapsed days.
#[expect(
    clippy::cast_precision_loss,
    reason = "day counts are far below f64 precision limits"
)]
pub fn elapsed_progress(start: Option<NaiveDate>, today: NaiveDate, target_days: u32) -> ElapsedProgress {
    let Some(start) = start else {
        return ElapsedProgress::not_started(target_days);
    };
    let target = i64::from(target_days);
    if target == 0 {
        return ElapsedProgress {
            progress_percent: 100.0,
            remaining_days: 0,
        };
    }

    let elapsed = (today - start).num_days().max(0);
    let progress_percent = (elapsed as f64 / target as f64 * 100.0).clamp(0.0, 100.0);

    ElapsedProgress {
        progress_percent,
        remaining_days: (target - elapsed).max(0),
    }
}

/// [`elapsed_progress`] against the standard two-year target.
pub fn training_progress(start: Option<NaiveDate>, clock: &impl Clock) -> ElapsedProgress {
    elapsed_progress(start, clock.today(), ELAPSED_TARGET_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SecondsFormat, Utc};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn clock(year: i32, month: u32, day: u32) -> FixedClock {
        FixedClock::at_local(year, month, day, 12, 0).expect("valid test clock")
    }

    #[test]
    fn day_key_ignores_time_of_day() {
        let morning = Local.with_ymd_and_hms(2024, 3, 5, 0, 1, 0).earliest().unwrap();
        let night = Local.with_ymd_and_hms(2024, 3, 5, 23, 59, 0).earliest().unwrap();
        assert_eq!(day_key(&morning).to_string(), "2024-03-05");
        assert!(is_same_day(&morning, &night));
    }

    #[test]
    fn is_today_compares_against_clock() {
        let clock = clock(2024, 1, 15);
        let same = Local.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).earliest().unwrap();
        let other = Local.with_ymd_and_hms(2024, 1, 14, 8, 0, 0).earliest().unwrap();
        assert!(is_today(&same, &clock));
        assert!(!is_today(&other, &clock));
    }

    #[test]
    fn cycle_before_october_started_previous_year() {
        let cycle = current_compliance_cycle(&clock(2024, 9, 30));
        assert_eq!(cycle.start, date(2023, 10, 1));
        assert_eq!(cycle.end, date(2025, 9, 30));
    }

    #[test]
    fn cycle_from_october_starts_this_year() {
        let cycle = current_compliance_cycle(&clock(2024, 10, 1));
        assert_eq!(cycle.start, date(2024, 10, 1));
        assert_eq!(cycle.end, date(2026, 9, 30));
    }

    #[test]
    fn cycle_bounds_are_inclusive() {
        let cycle = ComplianceCycle::containing(date(2024, 1, 15));
        assert!(cycle.contains(date(2023, 10, 1)));
        assert!(cycle.contains(date(2025, 9, 30)));
        assert!(!cycle.contains(date(2023, 9, 30)));
        assert!(!cycle.contains(date(2025, 10, 1)));
    }

    #[test]
    fn late_evening_on_september_30_is_still_old_cycle() {
        let late = FixedClock::new(
            Local
                .with_ymd_and_hms(2024, 9, 30, 23, 59, 59)
                .earliest()
                .unwrap(),
        );
        assert_eq!(current_compliance_cycle(&late).start, date(2023, 10, 1));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact equality intended for defaults")]
    fn no_start_date_reports_full_target_remaining() {
        let progress = elapsed_progress(None, date(2024, 1, 15), 730);
        assert_eq!(progress.progress_percent, 0.0);
        assert_eq!(progress.remaining_days, 730);
    }

    #[test]
    fn six_months_in_is_partial_progress() {
        let progress = elapsed_progress(Some(date(2023, 7, 15)), date(2024, 1, 15), 730);
        assert!(progress.progress_percent > 0.0 && progress.progress_percent < 100.0);
        assert!(progress.remaining_days > 0 && progress.remaining_days < 730);
        assert_eq!(progress.remaining_days, 730 - 184);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact equality intended for clamped bounds")]
    fn future_and_same_day_starts_have_full_remaining() {
        let today = date(2024, 1, 15);
        let future = elapsed_progress(Some(date(2024, 6, 1)), today, 730);
        assert_eq!(future.progress_percent, 0.0);
        assert_eq!(future.remaining_days, 730);

        let same_day = elapsed_progress(Some(today), today, 730);
        assert_eq!(same_day.remaining_days, 730);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact equality intended for clamped bounds")]
    fn long_finished_training_clamps() {
        let progress = elapsed_progress(Some(date(2019, 1, 1)), date(2024, 1, 15), 730);
        assert_eq!(progress.progress_percent, 100.0);
        assert_eq!(progress.remaining_days, 0);
    }

    #[test]
    fn local_date_of_accepts_common_forms() {
        let jan_15 = Some(date(2024, 1, 15));
        assert_eq!(local_date_of("2024-01-15T10:00:00"), jan_15);
        assert_eq!(local_date_of("2024-01-15T10:00:00.250"), jan_15);
        assert_eq!(local_date_of("2024-01-15 10:00:00"), jan_15);
        assert_eq!(local_date_of("2024-01-15 10:00:00.123456"), jan_15);
        assert_eq!(local_date_of("2024-01-15T10:00"), jan_15);
        assert_eq!(local_date_of("2024-01-15 10:00"), jan_15);
        assert_eq!(local_date_of(" 2024-01-15 "), jan_15);
        assert_eq!(local_date_of("2024-01-15"), jan_15);
        assert_eq!(local_date_of("invalid-date"), None);
        assert_eq!(local_date_of("2024-13-40 10:00:00"), None);
        assert_eq!(local_date_of(""), None);
    }

    #[test]
    fn local_date_of_converts_offsets_to_local() {
        let noon_utc = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let expected = Some(noon_utc.with_timezone(&Local).date_naive());
        for raw in [
            "2024-01-15T12:00:00Z",
            "2024-01-15T12:00:00.000Z",
            "2024-01-15 12:00:00+00",
            "2024-01-15 12:00:00+00:00",
            "2024-01-15 12:00:00.5+0000",
            "2024-01-15T14:00:00+02",
            "2024-01-15 07:00-05:00",
        ] {
            assert_eq!(local_date_of(raw), expected, "{raw}");
        }
    }

    #[test]
    fn local_datetime_of_orders_mixed_forms() {
        let at = |h, m| date(2024, 1, 15).and_hms_opt(h, m, 0).unwrap();
        assert_eq!(local_datetime_of("2024-01-15 09:30:00"), Some(at(9, 30)));
        assert_eq!(local_datetime_of("2024-01-15T09:30"), Some(at(9, 30)));
        assert_eq!(local_datetime_of("2024-01-15"), Some(at(0, 0)));
        let local = Local.with_ymd_and_hms(2024, 1, 15, 18, 45, 0).earliest().unwrap();
        assert_eq!(local_datetime_of(&local.to_rfc3339()), Some(at(18, 45)));
        assert_eq!(local_datetime_of("soon"), None);
    }

    #[test]
    fn late_evening_instant_keeps_its_local_day() {
        let late = Local.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).earliest().unwrap();
        let early = Local.with_ymd_and_hms(2024, 1, 15, 0, 15, 0).earliest().unwrap();
        for instant in [late, early] {
            let as_utc = instant.with_timezone(&Utc);
            assert_eq!(local_date_of(&instant.to_rfc3339()), Some(date(2024, 1, 15)));
            assert_eq!(
                local_date_of(&as_utc.to_rfc3339_opts(SecondsFormat::Secs, true)),
                Some(date(2024, 1, 15))
            );
            assert_eq!(
                local_date_of(&as_utc.format("%Y-%m-%d %H:%M:%S+00").to_string()),
                Some(date(2024, 1, 15))
            );
        }
    }
}
