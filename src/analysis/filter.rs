//! Per-element accept / reject / abort decisions.
//!
//! Each attribute is parsed into a [`Field`] outcome first; [`evaluate`] then
//! turns those outcomes into a single [`Decision`]. Which failures are
//! recoverable is decided here and nowhere else.

use crate::models::{ActivityRecord, Rejection};
use crate::scanner::Element;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Element carrying per-workout aggregates.
pub const WORKOUT_STATISTICS: &str = "WorkoutStatistics";

/// Quantity identifier for walking and running distance.
pub const DISTANCE_WALKING_RUNNING: &str = "HKQuantityTypeIdentifierDistanceWalkingRunning";

/// Records faster than this many seconds per kilometer are classified as
/// walking and dropped.
pub const MIN_RUNNING_PACE_SECONDS_PER_KM: f64 = 360.0;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that abort the whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Malformed distance {value:?} on record starting {start_date}")]
    MalformedDistance { value: String, start_date: String },
    #[error("Malformed end date {value:?} on record starting {start_date}")]
    MalformedEndDate { value: String, start_date: String },
    #[error("Missing attribute `{attribute}` on record starting {start_date}")]
    MissingAttribute {
        attribute: &'static str,
        start_date: String,
    },
}

/// What to do when `sum` or `endDate` is unusable on a record that already
/// passed the type and year gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// Fail the run.
    #[default]
    Abort,
    /// Drop the record and keep scanning.
    Skip,
}

/// Running/walking separation by pace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceFilter {
    pub enabled: bool,
    pub min_seconds_per_km: f64,
}

impl Default for PaceFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            min_seconds_per_km: MIN_RUNNING_PACE_SECONDS_PER_KM,
        }
    }
}

impl PaceFilter {
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// True when the pace is too fast to count as running.
    pub fn rejects(&self, pace: Option<f64>) -> bool {
        match pace {
            Some(pace) if self.enabled => pace < self.min_seconds_per_km,
            _ => false,
        }
    }
}

/// Everything [`evaluate`] needs to know about the run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub year: i32,
    pub element_name: String,
    pub quantity_type: String,
    pub pace: PaceFilter,
    pub numeric_policy: NumericPolicy,
}

impl FilterCriteria {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            element_name: WORKOUT_STATISTICS.to_string(),
            quantity_type: DISTANCE_WALKING_RUNNING.to_string(),
            pace: PaceFilter::default(),
            numeric_policy: NumericPolicy::default(),
        }
    }
}

/// Result of parsing one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Parsed(T),
    Missing,
    Malformed(String),
}

impl<T> Field<T> {
    fn from_attr(raw: Option<&str>, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        match raw {
            None => Field::Missing,
            Some(raw) => match parse(raw) {
                Some(value) => Field::Parsed(value),
                None => Field::Malformed(raw.to_string()),
            },
        }
    }

    fn ok(self) -> Option<T> {
        match self {
            Field::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

/// Outcome for one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accept(ActivityRecord),
    Reject(Rejection),
    Abort(FilterError),
}

/// Decide what happens to one element.
///
/// | field              | missing        | malformed            |
/// |--------------------|----------------|----------------------|
/// | `type`             | reject         | reject (no match)    |
/// | `startDate`        | reject         | reject               |
/// | `sum`              | numeric policy | numeric policy       |
/// | `endDate`          | numeric policy | numeric policy       |
/// | `averageHeartRate` | no sample      | no sample            |
pub fn evaluate(element: &Element, criteria: &FilterCriteria) -> Decision {
    if element.name != criteria.element_name {
        return Decision::Reject(Rejection::WrongElement);
    }

    if element.attr("type") != Some(criteria.quantity_type.as_str()) {
        return Decision::Reject(Rejection::WrongType);
    }

    let raw_start = element.attr("startDate");
    let start = match Field::from_attr(raw_start, parse_date) {
        Field::Parsed(start) => start,
        Field::Missing => return Decision::Reject(Rejection::MissingStartDate),
        Field::Malformed(_) => return Decision::Reject(Rejection::MalformedStartDate),
    };
    let raw_start = raw_start.unwrap_or_default();

    if start.year() != criteria.year {
        return Decision::Reject(Rejection::OtherYear);
    }

    let distance = match Field::from_attr(element.attr("sum"), parse_number) {
        Field::Parsed(distance) => distance,
        unusable => {
            return numeric_failure(
                criteria.numeric_policy,
                Rejection::MalformedDistance,
                unusable_error(unusable, "sum", raw_start, |value, start_date| {
                    FilterError::MalformedDistance { value, start_date }
                }),
            )
        }
    };

    let raw_end = element.attr("endDate");
    let end = match Field::from_attr(raw_end, parse_date) {
        Field::Parsed(end) => end,
        unusable => {
            return numeric_failure(
                criteria.numeric_policy,
                Rejection::MalformedEndDate,
                unusable_error(unusable, "endDate", raw_start, |value, start_date| {
                    FilterError::MalformedEndDate { value, start_date }
                }),
            )
        }
    };

    let duration = (end - start).num_milliseconds() as f64 / 1000.0;
    let heart_rate = Field::from_attr(element.attr("averageHeartRate"), parse_heart_rate).ok();

    let record = ActivityRecord {
        distance,
        start_date: raw_start.to_string(),
        end_date: raw_end.unwrap_or_default().to_string(),
        duration,
        heart_rate,
    };

    if criteria.pace.rejects(record.pace()) {
        return Decision::Reject(Rejection::TooFast);
    }

    Decision::Accept(record)
}

fn numeric_failure(policy: NumericPolicy, rejection: Rejection, error: FilterError) -> Decision {
    match policy {
        NumericPolicy::Abort => Decision::Abort(error),
        NumericPolicy::Skip => Decision::Reject(rejection),
    }
}

fn unusable_error<T>(
    field: Field<T>,
    attribute: &'static str,
    start_date: &str,
    malformed: impl FnOnce(String, String) -> FilterError,
) -> FilterError {
    match field {
        Field::Malformed(value) => malformed(value, start_date.to_string()),
        _ => FilterError::MissingAttribute {
            attribute,
            start_date: start_date.to_string(),
        },
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS`, discarding any UTC offset suffix.
///
/// The year must be exactly four digits and leap seconds are refused.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let literal = strip_offset(raw);
    let year = literal.as_bytes().get(..5)?;
    if !year[..4].iter().all(u8::is_ascii_digit) || year[4] != b'-' {
        return None;
    }

    let parsed = NaiveDateTime::parse_from_str(literal, DATE_FORMAT).ok()?;
    if parsed.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(parsed)
}

fn strip_offset(raw: &str) -> &str {
    let head = raw.split('+').next().unwrap_or(raw).trim();

    match head.rsplit_once(' ') {
        Some((rest, tail)) if is_negative_offset(tail) => rest.trim_end(),
        _ => head,
    }
}

fn is_negative_offset(token: &str) -> bool {
    token.len() == 5
        && token.starts_with('-')
        && token[1..].bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

fn parse_heart_rate(raw: &str) -> Option<i128> {
    raw.trim().parse().ok()
}
