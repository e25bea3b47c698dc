//! Folding filter decisions into an [`Extraction`].
//!
//! The fold only ever grows its state: accepted records are appended in
//! document order and added to the totals, rejections are counted.

use crate::analysis::filter::{evaluate, Decision, FilterCriteria, FilterError};
use crate::models::Extraction;
use crate::scanner::{Element, ElementStream, ScanError};
use std::path::Path;
use tracing::debug;

/// Failure of a whole extraction run.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Fold a stream of elements into records and totals.
pub fn extract<I>(elements: I, criteria: &FilterCriteria) -> Result<Extraction, ExtractError>
where
    I: IntoIterator<Item = Result<Element, ScanError>>,
{
    elements
        .into_iter()
        .try_fold(Extraction::default(), |extraction, element| {
            let decision = evaluate(&element?, criteria);
            apply(extraction, decision)
        })
}

/// Scan an export file and extract matching records.
pub fn extract_file(path: &Path, criteria: &FilterCriteria) -> Result<Extraction, ExtractError> {
    let stream = ElementStream::open(path)?.only(criteria.element_name.clone());
    let extraction = extract(stream, criteria)?;

    debug!(
        "Accepted {} records, rejected {} candidates",
        extraction.records.len(),
        extraction.rejections.relevant()
    );
    for (reason, count) in &extraction.rejections.by_reason {
        debug!("  {}: {}", reason, count);
    }

    Ok(extraction)
}

/// Apply one decision to the accumulated state.
pub fn apply(mut extraction: Extraction, decision: Decision) -> Result<Extraction, ExtractError> {
    match decision {
        Decision::Accept(record) => {
            extraction.totals.record(&record);
            extraction.records.push(record);
        }
        Decision::Reject(reason) => {
            if reason.is_relevant() {
                debug!("Skipping record: {}", reason);
            }
            extraction.rejections.bump(reason);
        }
        Decision::Abort(error) => return Err(error.into()),
    }

    Ok(extraction)
}
