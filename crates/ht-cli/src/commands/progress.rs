//! Progress command: the compliance snapshot as a report or JSON.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use ht_core::targets::ELAPSED_TARGET_DAYS;
use ht_core::{
    Clock, ComplianceCycle, ComplianceSnapshot, ElapsedProgress, Requirement, RequirementKind,
};
use ht_db::Database;
use serde::Serialize;

/// Everything the progress report shows.
#[derive(Debug)]
pub struct ProgressData {
    pub generated_at: DateTime<Local>,
    pub timezone: String,
    pub training_start: Option<NaiveDate>,
    pub snapshot: ComplianceSnapshot,
}

/// Loads the book and computes the snapshot as of `clock`.
///
/// A start date in the configuration takes precedence over the stored one.
pub fn generate_progress_data(
    db: &Database,
    start_override: Option<NaiveDate>,
    clock: &impl Clock,
) -> Result<ProgressData> {
    let training_start = match start_override {
        Some(date) => Some(date),
        None => db.training_start_date()?,
    };
    let snapshot = db.load_book()?.snapshot(training_start, clock);
    Ok(ProgressData {
        generated_at: clock.now(),
        timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
        training_start,
        snapshot,
    })
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "ratio is clamped to [0, 1] before scaling"
)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        (ratio * 10.0).round() as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// ========== Text Report ==========

fn section(lines: &mut Vec<String>, title: &str, detail: Option<String>) {
    lines.push(String::new());
    match detail {
        Some(detail) => lines.push(format!("{title} ({detail})")),
        None => lines.push(title.to_string()),
    }
    lines.push("─".repeat(title.chars().count()));
}

fn requirement_row(req: &Requirement) -> String {
    let suffix = match req.kind {
        RequirementKind::Minimum if req.is_met() => "  met",
        RequirementKind::Cap if !req.is_met() => "  over cap",
        _ => "",
    };
    format!(
        "  {:<36}{:>8.2} / {:<5} {} {:>5.1}%{suffix}",
        req.label,
        req.hours,
        req.target,
        progress_bar(req.hours, req.target),
        req.percent(),
    )
}

fn training_line(start: Option<NaiveDate>, elapsed: &ElapsedProgress) -> String {
    match start {
        Some(start) => format!(
            "  Started {start}: {:.1}% of {ELAPSED_TARGET_DAYS} days elapsed, {} days remaining",
            elapsed.progress_percent, elapsed.remaining_days
        ),
        None => "  No training start date set. Run 'ht start-date YYYY-MM-DD' to track it."
            .to_string(),
    }
}

/// Formats the progress report for the terminal.
pub fn format_progress(data: &ProgressData) -> String {
    let snapshot = &data.snapshot;
    let cycle: &ComplianceCycle = &snapshot.cycle;
    let (ce, licensure): (Vec<Requirement>, Vec<Requirement>) = snapshot
        .requirements()
        .into_iter()
        .partition(|req| req.key.starts_with("ce_"));

    let mut lines = vec![format!(
        "COMPLIANCE PROGRESS as of {}",
        data.generated_at.date_naive()
    )];

    section(&mut lines, "LICENSURE", None);
    lines.extend(licensure.iter().map(requirement_row));

    section(
        &mut lines,
        "CONTINUING EDUCATION",
        Some(format!("cycle {} to {}", cycle.start, cycle.end)),
    );
    lines.extend(ce.iter().map(requirement_row));

    section(&mut lines, "TRAINING TIME", None);
    lines.push(training_line(data.training_start, &snapshot.elapsed));

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

// ========== JSON Report ==========

/// JSON progress structure.
#[derive(Debug, Serialize)]
pub struct JsonProgress<'a> {
    pub generated_at: String,
    pub timezone: &'a str,
    pub training_start_date: Option<NaiveDate>,
    pub cycle: ComplianceCycle,
    pub elapsed: ElapsedProgress,
    pub totals: &'a ComplianceSnapshot,
    pub derived: JsonDerived,
    pub requirements: Vec<JsonRequirement>,
}

/// Values computed from the totals rather than stored.
#[derive(Debug, Serialize)]
pub struct JsonDerived {
    pub general_ce_hours: f64,
    pub ethics_law_tech_mft_hours: f64,
    pub total_session_hours: f64,
    pub session_progress: f64,
}

#[derive(Debug, Serialize)]
pub struct JsonRequirement {
    #[serde(flatten)]
    pub requirement: Requirement,
    pub percent: f64,
    pub remaining: f64,
    pub met: bool,
}

pub fn format_progress_json(data: &ProgressData) -> Result<String> {
    let snapshot = &data.snapshot;
    let report = JsonProgress {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: &data.timezone,
        training_start_date: data.training_start,
        cycle: snapshot.cycle,
        elapsed: snapshot.elapsed,
        totals: snapshot,
        derived: JsonDerived {
            general_ce_hours: snapshot.general_ce_hours(),
            ethics_law_tech_mft_hours: snapshot.ethics_law_tech_mft_hours(),
            total_session_hours: snapshot.total_session_hours(),
            session_progress: snapshot.session_progress(),
        },
        requirements: snapshot
            .requirements()
            .into_iter()
            .map(|requirement| JsonRequirement {
                percent: requirement.percent(),
                remaining: requirement.remaining(),
                met: requirement.is_met(),
                requirement,
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs `ht progress`.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    start_override: Option<NaiveDate>,
    json: bool,
    clock: &impl Clock,
) -> Result<()> {
    let data = generate_progress_data(db, start_override, clock)?;
    if json {
        writeln!(writer, "{}", format_progress_json(&data)?)?;
    } else {
        write!(writer, "{}", format_progress(&data))?;
    }
    Ok(())
}
