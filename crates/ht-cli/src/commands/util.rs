//! Shared utilities for CLI commands.

use std::io::IsTerminal;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate, TimeZone};
use ht_core::{Clock, DayKey, Mutation, Verdict};
use ht_db::Database;
use regex::Regex;

/// Pre-compiled regex for relative day parsing.
static RELATIVE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative day parsing (~1000 years).
const MAX_RELATIVE_DAYS: u64 = 1000 * 365;

/// Parse a day argument as an ISO date, a named day, or a relative offset.
///
/// Supports:
/// - ISO: "2024-01-15"
/// - Named: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_day(s: &str, clock: &impl Clock) -> Result<DayKey> {
    let s = s.trim();
    let today = clock.today();

    match s.to_ascii_lowercase().as_str() {
        "today" => return Ok(DayKey::from_date(today)),
        "yesterday" => return days_before(today, 1),
        _ => {}
    }

    if let Ok(day) = s.parse::<DayKey>() {
        return Ok(day);
    }

    let Some(caps) = RELATIVE_DAY_RE.captures(s) else {
        anyhow::bail!(
            "Invalid day: {s}. Use YYYY-MM-DD, 'today', 'yesterday', or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative day")?;
    let days_per_unit = if &caps[2] == "week" { 7 } else { 1 };

    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative day value too large: {n} {}", &caps[2]);
    }

    days_before(today, n * days_per_unit)
}

fn days_before(today: NaiveDate, days: u64) -> Result<DayKey> {
    today
        .checked_sub_days(Days::new(days))
        .map(DayKey::from_date)
        .context("day is out of range")
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let day: DayKey = s.trim().parse()?;
    Ok(day.date())
}

/// The timestamp stored on an entry logged for `day`: that day at the
/// current local time of day.
pub fn occurred_at_on(day: DayKey, clock: &impl Clock) -> String {
    let naive = day.date().and_time(clock.now().time());
    Local.from_local_datetime(&naive).earliest().map_or_else(
        || naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
        |instant| instant.to_rfc3339(),
    )
}

/// Applies a mutation, asking for confirmation when the guard requires it.
///
/// `confirm` is only called for [`Verdict::NeedsConfirmation`]; when it
/// declines, nothing is written and `Ok(false)` is returned.
pub fn submit(
    db: &mut Database,
    mutation: Mutation,
    confirm: impl FnOnce(f64) -> Result<bool>,
) -> Result<bool> {
    match db.apply(&mutation)? {
        Verdict::Approved => Ok(true),
        Verdict::NeedsConfirmation { hours } => {
            if !confirm(hours)? {
                tracing::debug!(hours, "long entry declined");
                return Ok(false);
            }
            match db.apply(&mutation.confirmed())? {
                Verdict::Approved => Ok(true),
                Verdict::NeedsConfirmation { .. } => {
                    anyhow::bail!("confirmed entry was not accepted")
                }
            }
        }
    }
}

/// Confirmation policy for long entries: `--yes` accepts, an interactive
/// terminal prompts, anything else refuses with a hint.
pub fn confirm_long_entry(yes: bool) -> impl FnOnce(f64) -> Result<bool> {
    move |hours| {
        if yes {
            return Ok(true);
        }
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("{hours} hours exceeds 16 hours in one entry; re-run with --yes to confirm");
        }
        Ok(dialoguer::Confirm::new()
            .with_prompt(format!("Log {hours} hours in a single entry?"))
            .default(false)
            .interact()?)
    }
}
