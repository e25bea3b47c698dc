//! Data models for extracted activities.
//!
//! This module contains the records produced by the filter, the running
//! totals folded from them, and the values derived for the final report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One accepted walking/running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Distance covered, in kilometers.
    pub distance: f64,
    /// Start date exactly as it appeared in the export.
    pub start_date: String,
    /// End date exactly as it appeared in the export.
    pub end_date: String,
    /// End minus start, in seconds. The UTC offset is ignored.
    pub duration: f64,
    /// Average heart rate for the session, if the export carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i128>,
}

impl ActivityRecord {
    /// Seconds per kilometer, or `None` when no distance was covered.
    pub fn pace(&self) -> Option<f64> {
        if self.distance > 0.0 {
            Some(self.duration / self.distance)
        } else {
            None
        }
    }
}

/// Running totals over every accepted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Sum of distances in kilometers.
    pub total_distance: f64,
    /// Sum of durations in seconds.
    pub total_duration: f64,
    /// Sum of heart-rate samples, saturating at `i128::MAX`.
    pub total_heart_rate: i128,
    /// Number of records that carried a heart rate.
    pub heart_rate_samples: usize,
}

impl Aggregate {
    /// Add one accepted record to the totals.
    pub fn record(&mut self, activity: &ActivityRecord) {
        self.total_distance += activity.distance;
        self.total_duration += activity.duration;

        if let Some(hr) = activity.heart_rate {
            self.total_heart_rate = self.total_heart_rate.saturating_add(hr);
            self.heart_rate_samples += 1;
        }
    }

    /// Average pace in seconds per kilometer.
    pub fn average_pace(&self) -> Option<f64> {
        if self.total_distance > 0.0 {
            Some(self.total_duration / self.total_distance)
        } else {
            None
        }
    }

    /// Average heart rate in beats per minute.
    pub fn average_heart_rate(&self) -> Option<f64> {
        if self.heart_rate_samples > 0 {
            Some(self.total_heart_rate as f64 / self.heart_rate_samples as f64)
        } else {
            None
        }
    }
}

/// Why an element was left out of the result without failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Element name is not the workout-statistics tag.
    WrongElement,
    /// `type` is missing or names another quantity.
    WrongType,
    /// No `startDate` attribute.
    MissingStartDate,
    /// `startDate` could not be parsed.
    MalformedStartDate,
    /// Started in a different year.
    OtherYear,
    /// `sum` is missing or not a number (skip policy only).
    MalformedDistance,
    /// `endDate` is missing or unparseable (skip policy only).
    MalformedEndDate,
    /// Pace is faster than the running threshold; treated as walking.
    TooFast,
}

impl Rejection {
    /// False for elements that were never candidates in the first place.
    pub fn is_relevant(&self) -> bool {
        !matches!(self, Rejection::WrongElement | Rejection::WrongType)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongElement => write!(f, "other element"),
            Rejection::WrongType => write!(f, "other quantity type"),
            Rejection::MissingStartDate => write!(f, "missing start date"),
            Rejection::MalformedStartDate => write!(f, "malformed start date"),
            Rejection::OtherYear => write!(f, "other year"),
            Rejection::MalformedDistance => write!(f, "malformed distance"),
            Rejection::MalformedEndDate => write!(f, "malformed end date"),
            Rejection::TooFast => write!(f, "pace below running threshold"),
        }
    }
}

/// Count of silently rejected elements per reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectionStats {
    pub by_reason: BTreeMap<Rejection, usize>,
}

impl RejectionStats {
    pub fn bump(&mut self, reason: Rejection) {
        *self.by_reason.entry(reason).or_insert(0) += 1;
    }

    #[cfg(test)]
    pub fn count(&self, reason: Rejection) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Rejections of workout-statistics elements of the right type.
    ///
    /// Unrelated elements dominate a real export, so they are left out.
    pub fn relevant(&self) -> usize {
        self.by_reason
            .iter()
            .filter(|(reason, _)| reason.is_relevant())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Everything the scan produced: records in document order plus totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub records: Vec<ActivityRecord>,
    pub totals: Aggregate,
    pub rejections: RejectionStats,
}

/// Values printed for the requested year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub activity_count: usize,
    pub total_distance_km: f64,
    pub average_pace_seconds_per_km: Option<f64>,
    pub average_heart_rate: Option<f64>,
}

impl YearSummary {
    pub fn from_extraction(year: i32, extraction: &Extraction) -> Self {
        Self {
            year,
            activity_count: extraction.records.len(),
            total_distance_km: extraction.totals.total_distance,
            average_pace_seconds_per_km: extraction.totals.average_pace(),
            average_heart_rate: extraction.totals.average_heart_rate(),
        }
    }
}
