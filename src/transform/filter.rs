use crate::constants::{PRICE_SENTINELS, RATING_LABEL, RATING_SENTINELS, TITLE_SENTINELS};
use crate::types::{Column, RawRecord};

/// Returns the first column holding an "unavailable at scrape time" marker.
pub fn sentinel_column(record: &RawRecord) -> Option<Column> {
    let checks: [(Column, &[&str]); 3] = [
        (Column::Title, TITLE_SENTINELS),
        (Column::Price, PRICE_SENTINELS),
        (Column::Rating, RATING_SENTINELS),
    ];

    checks.into_iter().find_map(|(column, sentinels)| {
        record
            .field(column)
            .map(|value| match column {
                Column::Rating => rating_text(value),
                _ => value.trim(),
            })
            .filter(|value| sentinels.contains(value))
            .map(|_| column)
    })
}

/// Rating text without the "Rating:" label and the star glyphs in front of it,
/// e.g. "Rating: ⭐ Invalid Rating / 5" -> "Invalid Rating / 5".
fn rating_text(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix(RATING_LABEL)
        .unwrap_or(trimmed)
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end()
}

pub fn is_sentinel_record(record: &RawRecord) -> bool {
    sentinel_column(record).is_some()
}

/// Keeps records with no sentinel value. Returns the survivors and the
/// number of records excluded.
pub fn filter_valid(records: Vec<RawRecord>) -> (Vec<RawRecord>, usize) {
    let total = records.len();
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|record| !is_sentinel_record(record))
        .collect();
    let excluded = total - kept.len();
    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RawRecord {
        RawRecord::new(
            "T-shirt 2",
            "$102.15",
            "Rating: 3.9 / 5",
            "3 Colors",
            "Size: M",
            "Gender: Women",
        )
    }

    #[test]
    fn test_detects_each_sentinel() {
        let mut record = valid();
        assert_eq!(sentinel_column(&record), None);

        record.title = Some("Unknown Product".into());
        assert_eq!(sentinel_column(&record), Some(Column::Title));

        let mut record = valid();
        record.price = Some("Price Unavailable".into());
        assert_eq!(sentinel_column(&record), Some(Column::Price));

        let mut record = valid();
        record.rating = Some("Not Rated".into());
        assert_eq!(sentinel_column(&record), Some(Column::Rating));

        let mut record = valid();
        record.rating = Some(" Invalid Rating / 5 ".into());
        assert_eq!(sentinel_column(&record), Some(Column::Rating));
    }

    #[test]
    fn test_labelled_rating_sentinels() {
        let mut record = valid();
        record.rating = Some("Rating: ⭐ Invalid Rating / 5".into());
        assert_eq!(sentinel_column(&record), Some(Column::Rating));

        record.rating = Some("Rating: Not Rated".into());
        assert_eq!(sentinel_column(&record), Some(Column::Rating));

        record.rating = Some("Rating: ⭐ 4.5 / 5".into());
        assert_eq!(sentinel_column(&record), None);
    }

    #[test]
    fn test_longer_text_is_not_a_sentinel() {
        let mut record = valid();
        record.title = Some("Unknown Product Deluxe".into());
        record.rating = Some("Rating: Not Rated Yet".into());
        assert!(!is_sentinel_record(&record));
    }

    #[test]
    fn test_absent_fields_are_not_sentinels() {
        let record = RawRecord::default();
        assert!(!is_sentinel_record(&record));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut bad = valid();
        bad.title = Some("Unknown Product".into());
        let records = vec![valid(), bad, valid()];

        let (once, excluded) = filter_valid(records);
        assert_eq!(excluded, 1);
        assert_eq!(once.len(), 2);

        let (twice, excluded_again) = filter_valid(once.clone());
        assert_eq!(excluded_again, 0);
        assert_eq!(twice, once);
    }
}
