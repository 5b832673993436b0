// src/dataset_loader.rs
//! Loading of per-category listing files with a memoized, normalized result

use anyhow::{Context, Result};
use chrono::Datelike;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::core::FsOps;
use crate::date_normalizer::DateNormalizer;
use crate::types::listing::{
    COLUMN_COMPANY, COLUMN_POSTED_DATE, COLUMN_TECH_STACK, COLUMN_TITLE,
};
use crate::types::{Dataset, JobListing, RawListing};

/// Identity of a source file's content as seen by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSignal {
    modified: Option<SystemTime>,
    len: u64,
}

impl SourceSignal {
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read listing file: {}", path.display()))?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

struct CacheEntry {
    signal: SourceSignal,
    dataset: Arc<Dataset>,
}

pub struct DatasetLoader {
    data_dir: PathBuf,
    normalizer: DateNormalizer,
    reference_year: Option<i32>,
    cache: HashMap<String, CacheEntry>,
}

impl DatasetLoader {
    pub fn new(data_dir: PathBuf, normalizer: DateNormalizer) -> Self {
        Self {
            data_dir,
            normalizer,
            reference_year: None,
            cache: HashMap::new(),
        }
    }

    /// Pin the year appended to posted dates instead of using the current one.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn source_path(&self, category: &str) -> PathBuf {
        FsOps::category_file_path(&self.data_dir, &FsOps::normalize_category_slug(category))
    }

    /// Dataset for `category`, re-read only when its file changed since the last load.
    ///
    /// On error the previously cached dataset, if any, is kept.
    pub fn load(&mut self, category: &str) -> Result<Arc<Dataset>> {
        let slug = FsOps::normalize_category_slug(category);
        let path = FsOps::category_file_path(&self.data_dir, &slug);
        let signal = SourceSignal::read(&path)?;

        if let Some(entry) = self.cache.get(&slug) {
            if entry.signal == signal {
                debug!("Dataset cache hit for {}", slug);
                return Ok(Arc::clone(&entry.dataset));
            }
            info!("Listing file for {} changed, reloading", slug);
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open listing file: {}", path.display()))?;
        let dataset = parse_listings(file, &self.normalizer, self.reference_year())
            .with_context(|| format!("Failed to load listings from {}", path.display()))?;

        let undated = dataset.iter().filter(|l| l.posted_date.is_none()).count();
        info!(
            "Loaded {} listings for {} ({} without a parseable date)",
            dataset.len(),
            slug,
            undated
        );

        let dataset = Arc::new(dataset);
        self.cache.insert(
            slug,
            CacheEntry {
                signal,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    /// Drop the cached dataset of `category`; returns whether one existed.
    pub fn invalidate(&mut self, category: &str) -> bool {
        let slug = FsOps::normalize_category_slug(category);
        let removed = self.cache.remove(&slug).is_some();
        if removed {
            info!("Invalidated cached dataset for {}", slug);
        }
        removed
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    pub fn is_cached(&self, category: &str) -> bool {
        self.cache
            .contains_key(&FsOps::normalize_category_slug(category))
    }

    fn reference_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

/// Parse a listing CSV. Missing columns fail; short or odd rows are kept.
pub fn parse_listings<R: Read>(
    reader: R,
    normalizer: &DateNormalizer,
    reference_year: i32,
) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader
        .byte_headers()
        .context("Failed to read CSV header")?
        .clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    == name
            })
            .with_context(|| format!("Missing column '{}'", name))
    };
    let title_idx = column(COLUMN_TITLE)?;
    let company_idx = column(COLUMN_COMPANY)?;
    let date_idx = column(COLUMN_POSTED_DATE)?;
    let tech_idx = column(COLUMN_TECH_STACK)?;

    let mut dataset = Dataset::new();
    for (row, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", row + 1))?;
        let field = |idx: usize| {
            record
                .get(idx)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };

        let raw = RawListing {
            title: field(title_idx),
            company: field(company_idx),
            posted_date: field(date_idx),
            tech_stack: field(tech_idx),
        };
        let posted_date = normalizer.normalize(&raw.posted_date, reference_year);
        dataset.push(JobListing::new(raw, posted_date));
    }

    Ok(dataset)
}
