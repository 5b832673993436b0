// src/scrape/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod job_scraper;

pub use job_scraper::DevBgScraper;

/// Producer of category listing files.
///
/// Implementations replace `destination` only after every page was fetched,
/// so a failed scrape leaves the previous file untouched.
#[async_trait]
pub trait ListingScraper: Send + Sync {
    /// Fetch the listings behind `source_url` into `destination`; returns the row count.
    async fn scrape(&self, source_url: &str, destination: &Path) -> Result<usize>;
}
