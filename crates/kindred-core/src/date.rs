//! Display formatting for partially known dates.

use crate::model::{DateParts, Person};

/// Shown when no date part is known.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Formats the known parts of a date as `dd/mm/yyyy`.
///
/// Absent parts are skipped entirely, so a date with only a day and a year
/// renders as `15/1990`. Day and month are zero-padded to two digits.
pub fn format_display_date(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> String {
    let year = year.filter(|y| *y != 0);
    let month = month.filter(|m| *m != 0);
    let day = day.filter(|d| *d != 0);

    if year.is_none() && month.is_none() && day.is_none() {
        return UNKNOWN_DATE.to_string();
    }

    let mut parts = Vec::with_capacity(3);
    if let Some(day) = day {
        parts.push(format!("{:02}", day));
    }
    if let Some(month) = month {
        parts.push(format!("{:02}", month));
    }
    if let Some(year) = year {
        parts.push(year.to_string());
    }

    parts.join("/")
}

/// Formats a [`DateParts`] value.
pub fn format_date(date: &DateParts) -> String {
    format_display_date(date.year, date.month, date.day)
}

/// Birth date, followed by ` - <death date>` for deceased persons.
///
/// A deceased person with no recorded death date still gets the suffix,
/// rendered with the unknown placeholder.
pub fn format_life_span(person: &Person) -> String {
    let birth = format_date(&person.birth);
    if person.is_deceased() {
        format!("{} - {}", birth, format_date(&person.death))
    } else {
        birth
    }
}
