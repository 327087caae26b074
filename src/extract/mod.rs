//! Extraction: fetch catalog pages and turn product cards into [`RawRecord`]s.

pub mod dump;
pub mod parser;

pub use dump::{read_raw_dump, write_raw_dump, RawDumpSource};
pub use parser::parse_product_cards;

use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::metrics::ExtractMetrics;
use crate::types::RawRecord;
use async_trait::async_trait;
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

/// Anything that hands the transform stage a batch of raw records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_records(&self) -> Result<Vec<RawRecord>>;
}

/// Fetches one page body by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(EtlError::Api {
                message: format!("GET {} failed with status: {}", url, response.status()),
            });
        }

        Ok(response.text().await?)
    }
}

/// URL of catalog page `page` (1-based).
pub fn page_url(base_url: &str, page: u32) -> String {
    format!("{}/index.php?page={}", base_url.trim_end_matches('/'), page)
}

/// Crawler for the Fashion Studio catalog.
///
/// Walks pages 1..=page_count and stops early at the first page with no
/// product cards. Any failed page aborts the whole scrape.
pub struct FashionStudioCrawler<F: PageFetcher> {
    fetcher: F,
    base_url: String,
    page_count: u32,
}

impl FashionStudioCrawler<ReqwestFetcher> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(fetcher, &config.base_url, config.page_count))
    }
}

impl<F: PageFetcher> FashionStudioCrawler<F> {
    pub fn new(fetcher: F, base_url: &str, page_count: u32) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            page_count,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> CatalogSource for FashionStudioCrawler<F> {
    fn source_name(&self) -> &'static str {
        "fashion_studio"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url, page_count = self.page_count))]
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let collected_at = Utc::now();
        let mut records = Vec::new();

        for page in 1..=self.page_count {
            let url = page_url(&self.base_url, page);
            let started = Instant::now();

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    error!("Failed to fetch {}: {}", url, e);
                    ExtractMetrics::record_page_error();
                    return Err(e);
                }
            };

            let cards = parse_product_cards(&body);
            ExtractMetrics::record_page_success(cards.len(), started.elapsed().as_secs_f64());

            if cards.is_empty() {
                info!("No products on page {}, stopping", page);
                break;
            }

            info!("Scraped {} products from {}", cards.len(), url);
            records.extend(cards.into_iter().map(|card| RawRecord {
                collected_at: Some(collected_at),
                ..card
            }));
        }

        info!("Total products scraped: {}", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| EtlError::Api {
                message: format!("connection refused: {url}"),
            })
        }
    }

    const CARD: &str = r#"<div class="collection-card">
        <h3 class="product-title">T-shirt 2</h3><span class="price">$102.15</span>
        <p>Rating: 3.9 / 5</p><p>3 Colors</p><p>Size: M</p><p>Gender: Women</p></div>"#;

    #[test]
    fn test_page_url() {
        assert_eq!(
            page_url("https://fashion-studio.dicoding.dev/", 2),
            "https://fashion-studio.dicoding.dev/index.php?page=2"
        );
    }

    #[tokio::test]
    async fn test_stops_at_empty_page() {
        let fetcher = FakeFetcher::new(&[
            ("http://shop/index.php?page=1", CARD),
            ("http://shop/index.php?page=2", "<html><body></body></html>"),
        ]);
        let crawler = FashionStudioCrawler::new(fetcher, "http://shop", 5);

        let records = crawler.fetch_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].collected_at.is_some());
        assert_eq!(crawler.fetcher.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_respects_page_count() {
        let fetcher = FakeFetcher::new(&[
            ("http://shop/index.php?page=1", CARD),
            ("http://shop/index.php?page=2", CARD),
        ]);
        let crawler = FashionStudioCrawler::new(fetcher, "http://shop", 2);

        let records = crawler.fetch_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].collected_at, records[1].collected_at);
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_scrape() {
        let fetcher = FakeFetcher::new(&[("http://shop/index.php?page=1", CARD)]);
        let crawler = FashionStudioCrawler::new(fetcher, "http://shop", 3);

        let result = crawler.fetch_records().await;
        assert!(matches!(result, Err(EtlError::Api { .. })));
    }
}
