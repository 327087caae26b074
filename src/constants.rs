/// Raw-value markers the catalog renders when a field was unavailable at scrape time.
pub const UNKNOWN_TITLE: &str = "Unknown Product";
pub const PRICE_UNAVAILABLE: &str = "Price Unavailable";
pub const RATING_NOT_RATED: &str = "Not Rated";
pub const RATING_INVALID: &str = "Invalid Rating / 5";

pub const TITLE_SENTINELS: &[&str] = &[UNKNOWN_TITLE];
pub const PRICE_SENTINELS: &[&str] = &[PRICE_UNAVAILABLE];
pub const RATING_SENTINELS: &[&str] = &[RATING_NOT_RATED, RATING_INVALID];

// Decorative prefixes stripped from text fields
pub const SIZE_PREFIX: &str = "Size: ";
pub const GENDER_PREFIX: &str = "Gender: ";
pub const RATING_LABEL: &str = "Rating:";

pub const MAX_RATING: f64 = 5.0;

// Configuration defaults
pub const DEFAULT_BASE_URL: &str = "https://fashion-studio.dicoding.dev";
pub const DEFAULT_PAGE_COUNT: u32 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_OUTPUT_PATH: &str = "products.csv";
pub const DEFAULT_WORKSHEET_NAME: &str = "products";
pub const DEFAULT_TABLE_NAME: &str = "products";

/// Column order shared by every sink.
pub const COLUMNS: [&str; 7] = [
    "title",
    "price",
    "rating",
    "colors",
    "size",
    "gender",
    "collected_at",
];

/// Text form of `collected_at` for the CSV, spreadsheet and SQLite sinks.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// Sink names used in logs, metrics and load reports
pub const CSV_SINK: &str = "csv";
pub const SHEETS_SINK: &str = "google_sheets";
pub const SQLITE_SINK: &str = "sqlite";
