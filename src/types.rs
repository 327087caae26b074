use crate::constants::{COLUMNS, TIMESTAMP_FORMAT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One product card as scraped, before any cleaning.
///
/// Every field is optional because the crawler may not find the element on
/// a card. Older dumps used capitalized keys (`Title`, `Price`, ...), both
/// spellings deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "Title")]
    pub title: Option<String>,
    #[serde(default, alias = "Price")]
    pub price: Option<String>,
    #[serde(default, alias = "Rating")]
    pub rating: Option<String>,
    #[serde(default, alias = "Colors")]
    pub colors: Option<String>,
    #[serde(default, alias = "Size")]
    pub size: Option<String>,
    #[serde(default, alias = "Gender")]
    pub gender: Option<String>,
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

impl RawRecord {
    /// Convenience constructor for a card where every field was found.
    pub fn new(
        title: &str,
        price: &str,
        rating: &str,
        colors: &str,
        size: &str,
        gender: &str,
    ) -> Self {
        Self {
            title: Some(title.to_string()),
            price: Some(price.to_string()),
            rating: Some(rating.to_string()),
            colors: Some(colors.to_string()),
            size: Some(size.to_string()),
            gender: Some(gender.to_string()),
            collected_at: None,
        }
    }

    pub fn field(&self, column: Column) -> Option<&str> {
        match column {
            Column::Title => self.title.as_deref(),
            Column::Price => self.price.as_deref(),
            Column::Rating => self.rating.as_deref(),
            Column::Colors => self.colors.as_deref(),
            Column::Size => self.size.as_deref(),
            Column::Gender => self.gender.as_deref(),
        }
    }
}

/// The six scraped columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Title,
    Price,
    Rating,
    Colors,
    Size,
    Gender,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Title,
        Column::Price,
        Column::Rating,
        Column::Colors,
        Column::Size,
        Column::Gender,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Price => "price",
            Column::Rating => "rating",
            Column::Colors => "colors",
            Column::Size => "size",
            Column::Gender => "gender",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row after field parsing; `None` marks a value that could not be extracted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub colors: Option<u32>,
    pub size: Option<String>,
    pub gender: Option<String>,
}

impl CandidateRecord {
    pub fn missing_columns(&self) -> Vec<Column> {
        let present = [
            self.title.is_some(),
            self.price.is_some(),
            self.rating.is_some(),
            self.colors.is_some(),
            self.size.is_some(),
            self.gender.is_some(),
        ];
        Column::ALL
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(column, _)| *column)
            .collect()
    }

    /// Promote to a typed row, or `None` if any field is missing.
    pub fn complete(self, collected_at: DateTime<Utc>) -> Option<TypedRecord> {
        Some(TypedRecord {
            title: self.title?,
            price: self.price?,
            rating: self.rating?,
            colors: self.colors?,
            size: self.size?,
            gender: self.gender?,
            collected_at,
        })
    }
}

/// A fully cleaned catalog row. `price` is in the destination currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedRecord {
    pub title: String,
    pub price: f64,
    pub rating: f64,
    pub colors: u32,
    pub size: String,
    pub gender: String,
    pub collected_at: DateTime<Utc>,
}

/// Hashable identity of a row; floats compare by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    title: String,
    price: u64,
    rating: u64,
    colors: u32,
    size: String,
    gender: String,
    collected_at: DateTime<Utc>,
}

impl TypedRecord {
    pub fn key(&self) -> RowKey {
        RowKey {
            title: self.title.clone(),
            price: self.price.to_bits(),
            rating: self.rating.to_bits(),
            colors: self.colors,
            size: self.size.clone(),
            gender: self.gender.clone(),
            collected_at: self.collected_at,
        }
    }

    pub fn collected_at_text(&self) -> String {
        self.collected_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The row in `COLUMNS` order, every cell rendered as text.
    pub fn to_text_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.price.to_string(),
            self.rating.to_string(),
            self.colors.to_string(),
            self.size.clone(),
            self.gender.clone(),
            self.collected_at_text(),
        ]
    }
}

/// Final, deduplicated table handed to every sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<TypedRecord>,
}

impl Dataset {
    pub fn new(records: Vec<TypedRecord>) -> Self {
        Self { records }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn records(&self) -> &[TypedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<TypedRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TypedRecord;
    type IntoIter = std::slice::Iter<'a, TypedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Why a batch produced nothing to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// Extraction handed over no records at all.
    NoRawRecords,
    /// Every record was dropped by filtering, parsing or finalization.
    AllRowsDropped,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoRawRecords => f.write_str("no raw records to transform"),
            EmptyReason::AllRowsDropped => f.write_str("no valid rows left after transform"),
        }
    }
}

/// Result of transforming one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Ready(Dataset),
    Empty(EmptyReason),
}

impl BatchOutcome {
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            BatchOutcome::Ready(dataset) => Some(dataset),
            BatchOutcome::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BatchOutcome::Empty(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_raw_record_accepts_capitalized_keys() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"Title": "T-shirt 2", "Price": "$102.15", "Rating": "3.9 / 5",
                "Colors": "3 Colors", "Size": "Size: M", "Gender": "Gender: Women"}"#,
        )
        .unwrap();
        assert_eq!(raw.title.as_deref(), Some("T-shirt 2"));
        assert_eq!(raw.gender.as_deref(), Some("Gender: Women"));
        assert!(raw.collected_at.is_none());
    }

    #[test]
    fn test_missing_key_deserializes_as_none() {
        let raw: RawRecord = serde_json::from_str(r#"{"title": "Pants 4"}"#).unwrap();
        assert_eq!(raw.field(Column::Title), Some("Pants 4"));
        assert_eq!(raw.field(Column::Price), None);
    }

    #[test]
    fn test_candidate_completion() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        let candidate = CandidateRecord {
            title: Some("Hoodie 3".into()),
            price: Some(800_000.0),
            rating: Some(4.1),
            colors: Some(2),
            size: Some("XL".into()),
            gender: None,
        };
        assert_eq!(candidate.missing_columns(), vec![Column::Gender]);
        assert!(candidate.clone().complete(ts).is_none());

        let full = CandidateRecord {
            gender: Some("Men".into()),
            ..candidate
        };
        let typed = full.complete(ts).unwrap();
        assert_eq!(typed.gender, "Men");
        assert_eq!(typed.collected_at, ts);
    }

    #[test]
    fn test_text_row_follows_column_order() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        let record = TypedRecord {
            title: "Jacket 7".into(),
            price: 1_600_000.0,
            rating: 4.5,
            colors: 3,
            size: "L".into(),
            gender: "Unisex".into(),
            collected_at: ts,
        };
        let row = record.to_text_row();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[0], "Jacket 7");
        assert_eq!(row[1], "1600000");
        assert_eq!(row[3], "3");
        assert_eq!(row[6], "2025-01-15 08:00:00.000000");
    }
}
