//! Text and JSON report generation.
//!
//! Both formats are rendered from the same [`YearSummary`]; the JSON report
//! additionally carries the individual records and rejection counts.

use crate::models::{ActivityRecord, Extraction, RejectionStats, YearSummary};
use anyhow::Result;
use serde::Serialize;

/// Generate the plain-text report.
pub fn generate_text_report(summary: &YearSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("Year: {}\n", summary.year));
    output.push_str(&format!(
        "Number of Running Activities: {}\n",
        summary.activity_count
    ));
    output.push_str(&format!(
        "Total Running Distance: {:.2} km\n",
        summary.total_distance_km
    ));
    output.push_str(&format!(
        "Average Running Pace: {} per kilometer\n",
        format_pace(summary.average_pace_seconds_per_km)
    ));

    match summary.average_heart_rate {
        Some(hr) => output.push_str(&format!("Average Heart Rate: {:.1} beats per minute\n", hr)),
        None => output.push_str("No heart rate data available\n"),
    }

    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: &'a YearSummary,
    average_pace: String,
    records: &'a [ActivityRecord],
    rejected: &'a RejectionStats,
}

/// Generate a JSON report.
pub fn generate_json_report(summary: &YearSummary, extraction: &Extraction) -> Result<String> {
    let report = JsonReport {
        summary,
        average_pace: format_pace(summary.average_pace_seconds_per_km),
        records: &extraction.records,
        rejected: &extraction.rejections,
    };

    serde_json::to_string_pretty(&report).map_err(Into::into)
}

/// Format seconds per kilometer as `MM:SS`, or `N/A`.
///
/// Fractional seconds are truncated before splitting into minutes.
pub fn format_pace(pace: Option<f64>) -> String {
    match pace {
        Some(pace) => {
            let seconds = pace.trunc() as i64;
            format!("{:02}:{:02}", seconds.div_euclid(60), seconds.rem_euclid(60))
        }
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rejection;

    fn create_test_extraction() -> Extraction {
        let mut extraction = Extraction::default();
        let records = [
            ActivityRecord {
                distance: 5.0,
                start_date: "2023-02-04 09:00:00 +0100".to_string(),
                end_date: "2023-02-04 09:30:00 +0100".to_string(),
                duration: 1800.0,
                heart_rate: Some(148),
            },
            ActivityRecord {
                distance: 3.2,
                start_date: "2023-03-11 18:00:00 +0100".to_string(),
                end_date: "2023-03-11 18:22:00 +0100".to_string(),
                duration: 1320.0,
                heart_rate: Some(137),
            },
        ];
        for record in records {
            extraction.totals.record(&record);
            extraction.records.push(record);
        }
        extraction.rejections.bump(Rejection::OtherYear);
        extraction
    }

    #[test]
    fn test_generate_text_report() {
        let extraction = create_test_extraction();
        let summary = YearSummary::from_extraction(2023, &extraction);
        let text = generate_text_report(&summary);

        assert_eq!(
            text,
            "Year: 2023\n\
             Number of Running Activities: 2\n\
             Total Running Distance: 8.20 km\n\
             Average Running Pace: 06:20 per kilometer\n\
             Average Heart Rate: 142.5 beats per minute\n"
        );
    }

    #[test]
    fn test_text_report_without_data() {
        let summary = YearSummary::from_extraction(2019, &Extraction::default());
        let text = generate_text_report(&summary);

        assert!(text.contains("Number of Running Activities: 0"));
        assert!(text.contains("Total Running Distance: 0.00 km"));
        assert!(text.contains("Average Running Pace: N/A per kilometer"));
        assert!(text.ends_with("No heart rate data available\n"));
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(Some(360.0)), "06:00");
        assert_eq!(format_pace(Some(380.49)), "06:20");
        assert_eq!(format_pace(Some(59.99)), "00:59");
        assert_eq!(format_pace(Some(3725.0)), "62:05");
        assert_eq!(format_pace(None), "N/A");
    }

    #[test]
    fn test_generate_json_report() {
        let extraction = create_test_extraction();
        let summary = YearSummary::from_extraction(2023, &extraction);
        let json = generate_json_report(&summary, &extraction).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["year"], 2023);
        assert_eq!(value["activity_count"], 2);
        assert_eq!(value["average_pace"], "06:20");
        assert_eq!(value["records"].as_array().map(|r| r.len()), Some(2));
        assert_eq!(value["records"][0]["heart_rate"], 148);
        assert_eq!(value["rejected"]["by_reason"]["other_year"], 1);
    }
}
