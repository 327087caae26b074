use crate::metrics::TransformMetrics;
use crate::transform::parsers::{
    parse_colors, parse_gender, parse_price, parse_rating, parse_size, parse_title, FieldError,
};
use crate::types::{CandidateRecord, Column, RawRecord};
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Count of unparseable values per column for one batch.
pub type FieldFailures = BTreeMap<Column, usize>;

/// Applies the field parsers to raw records.
///
/// A failing parser only blanks its own field; the rest of the row is still
/// parsed. Rows are not dropped here.
pub struct RecordTransformer {
    exchange_rate: f64,
}

impl RecordTransformer {
    pub fn new(exchange_rate: f64) -> Self {
        Self { exchange_rate }
    }

    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }

    pub fn transform_record(&self, raw: &RawRecord, failures: &mut FieldFailures) -> CandidateRecord {
        let rate = self.exchange_rate;
        CandidateRecord {
            title: parse_field(raw, Column::Title, parse_title, failures),
            price: parse_field(raw, Column::Price, |s| parse_price(s, rate), failures),
            rating: parse_field(raw, Column::Rating, parse_rating, failures),
            colors: parse_field(raw, Column::Colors, parse_colors, failures),
            size: parse_field(raw, Column::Size, parse_size, failures),
            gender: parse_field(raw, Column::Gender, parse_gender, failures),
        }
    }

    /// Transform every record, then report columns that failed for the whole batch.
    pub fn transform_records(&self, records: &[RawRecord]) -> (Vec<CandidateRecord>, FieldFailures) {
        let mut failures = FieldFailures::new();
        let candidates: Vec<CandidateRecord> = records
            .iter()
            .map(|raw| self.transform_record(raw, &mut failures))
            .collect();

        for column in degraded_columns(&failures, records.len()) {
            // The batch carries on; every row just lacks this column and is
            // dropped during finalization.
            error!(
                column = %column,
                rows = records.len(),
                "Column could not be transformed for any row"
            );
            TransformMetrics::record_column_degraded(column);
        }

        (candidates, failures)
    }
}

/// Columns whose parser failed on every one of `rows` rows.
///
/// A single row never counts as a degraded column; its failures are plain
/// field failures.
pub fn degraded_columns(failures: &FieldFailures, rows: usize) -> Vec<Column> {
    if rows < 2 {
        return Vec::new();
    }
    failures
        .iter()
        .filter(|(_, count)| **count == rows)
        .map(|(column, _)| *column)
        .collect()
}

fn parse_field<T, F>(
    raw: &RawRecord,
    column: Column,
    parser: F,
    failures: &mut FieldFailures,
) -> Option<T>
where
    F: Fn(&str) -> Result<T, FieldError>,
{
    let parsed = raw.field(column).ok_or(FieldError::Absent).and_then(parser);
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(column = %column, error = %e, "Field marked missing");
            *failures.entry(column).or_default() += 1;
            TransformMetrics::record_field_failure(column);
            None
        }
    }
}
