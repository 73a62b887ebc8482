//! US federal holidays.
//!
//! Informational only: a holiday never blocks logging and is not an
//! unavailability marker.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Holiday {
    pub name: &'static str,
    pub date: NaiveDate,
}

enum Rule {
    Fixed { month: u32, day: u32 },
    Nth { month: u32, weekday: Weekday, n: u8 },
    Last { month: u32, weekday: Weekday },
}

const RULES: &[(&str, Rule)] = &[
    ("New Year's Day", Rule::Fixed { month: 1, day: 1 }),
    (
        "Martin Luther King Jr. Day",
        Rule::Nth {
            month: 1,
            weekday: Weekday::Mon,
            n: 3,
        },
    ),
    (
        "Presidents' Day",
        Rule::Nth {
            month: 2,
            weekday: Weekday::Mon,
            n: 3,
        },
    ),
    (
        "Memorial Day",
        Rule::Last {
            month: 5,
            weekday: Weekday::Mon,
        },
    ),
    ("Juneteenth", Rule::Fixed { month: 6, day: 19 }),
    ("Independence Day", Rule::Fixed { month: 7, day: 4 }),
    (
        "Labor Day",
        Rule::Nth {
            month: 9,
            weekday: Weekday::Mon,
            n: 1,
        },
    ),
    (
        "Columbus Day",
        Rule::Nth {
            month: 10,
            weekday: Weekday::Mon,
            n: 2,
        },
    ),
    ("Veterans Day", Rule::Fixed { month: 11, day: 11 }),
    (
        "Thanksgiving Day",
        Rule::Nth {
            month: 11,
            weekday: Weekday::Thu,
            n: 4,
        },
    ),
    ("Christmas Day", Rule::Fixed { month: 12, day: 25 }),
];

impl Rule {
    fn resolve(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            Self::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            Self::Nth { month, weekday, n } => {
                NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
            }
            Self::Last { month, weekday } => last_weekday_of_month(year, month, weekday),
        }
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_month.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

/// The federal holidays observed in `year`, in calendar order.
///
/// Dates are the nominal holiday, not the weekday it is observed on when it
/// falls on a weekend.
pub fn federal_holidays(year: i32) -> Vec<Holiday> {
    RULES
        .iter()
        .filter_map(|&(name, ref rule)| {
            Some(Holiday {
                name,
                date: rule.resolve(year)?,
            })
        })
        .collect()
}

/// The name of the federal holiday falling on `date`, if any.
pub fn holiday_name(date: NaiveDate) -> Option<&'static str> {
    federal_holidays(date.year())
        .into_iter()
        .find(|h| h.date == date)
        .map(|h| h.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holidays_for_2024() {
        let dates: Vec<String> = federal_holidays(2024)
            .iter()
            .map(|h| format!("{} {}", h.date, h.name))
            .collect();
        insta::assert_snapshot!(dates.join("\n"), @r"
        2024-01-01 New Year's Day
        2024-01-15 Martin Luther King Jr. Day
        2024-02-19 Presidents' Day
        2024-05-27 Memorial Day
        2024-06-19 Juneteenth
        2024-07-04 Independence Day
        2024-09-02 Labor Day
        2024-10-14 Columbus Day
        2024-11-11 Veterans Day
        2024-11-28 Thanksgiving Day
        2024-12-25 Christmas Day
        ");
    }

    #[test]
    fn memorial_day_on_month_end() {
        // May 31, 2021 was a Monday.
        assert_eq!(holiday_name(date(2021, 5, 31)), Some("Memorial Day"));
        assert_eq!(holiday_name(date(2021, 5, 24)), None);
    }

    #[test]
    fn ordinary_day_has_no_holiday() {
        assert_eq!(holiday_name(date(2024, 3, 12)), None);
        assert_eq!(holiday_name(date(2023, 11, 23)), Some("Thanksgiving Day"));
    }
}
