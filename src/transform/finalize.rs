use crate::constants::MAX_RATING;
use crate::types::{CandidateRecord, RawRecord, TypedRecord};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Timestamp shared by every row of a batch: the earliest collection time
/// stamped by extraction, or now if the records carry none.
pub fn batch_timestamp(records: &[RawRecord]) -> DateTime<Utc> {
    records
        .iter()
        .filter_map(|record| record.collected_at)
        .min()
        .unwrap_or_else(Utc::now)
}

/// Drop candidates with any missing field and stamp the rest with `collected_at`.
/// Returns the typed rows and the number dropped.
pub fn drop_incomplete(
    candidates: Vec<CandidateRecord>,
    collected_at: DateTime<Utc>,
) -> (Vec<TypedRecord>, usize) {
    let total = candidates.len();
    let complete: Vec<TypedRecord> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let missing = candidate.missing_columns();
            if !missing.is_empty() {
                debug!(title = ?candidate.title, ?missing, "Dropping incomplete row");
            }
            candidate.complete(collected_at)
        })
        .collect();
    let dropped = total - complete.len();
    (complete, dropped)
}

/// Remove exact duplicates, keeping the first occurrence in order.
pub fn dedup(records: Vec<TypedRecord>) -> (Vec<TypedRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<TypedRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.key()))
        .collect();
    let removed = total - unique.len();
    (unique, removed)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("price {0} is negative or not finite")]
    Price(f64),

    #[error("rating {0} is outside 0..=5")]
    Rating(f64),
}

pub fn validate_record(record: &TypedRecord) -> Result<(), SchemaViolation> {
    if !record.price.is_finite() || record.price < 0.0 {
        return Err(SchemaViolation::Price(record.price));
    }
    if !(0.0..=MAX_RATING).contains(&record.rating) {
        return Err(SchemaViolation::Rating(record.rating));
    }
    Ok(())
}

/// Final pass over the typed rows; parsers already guarantee these ranges,
/// so a rejection here points at a parser bug.
pub fn enforce_schema(records: Vec<TypedRecord>) -> (Vec<TypedRecord>, usize) {
    let total = records.len();
    let valid: Vec<TypedRecord> = records
        .into_iter()
        .filter(|record| match validate_record(record) {
            Ok(()) => true,
            Err(violation) => {
                warn!(title = %record.title, %violation, "Dropping row that violates the output schema");
                false
            }
        })
        .collect();
    let rejected = total - valid.len();
    (valid, rejected)
}
