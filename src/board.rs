// src/board.rs
//! Request/response entry point: load, filter and rank one category per query

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregation::{self, RankedCount};
use crate::core::fs_ops::Category;
use crate::core::{ConfigManager, FsOps};
use crate::dataset_loader::DatasetLoader;
use crate::date_normalizer::DateNormalizer;
use crate::filter::{self, FilterCriteria, ALL_COMPANIES};
use crate::scrape::ListingScraper;
use crate::types::{Dataset, JobListing};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub category: String,
    /// Listings in the category before filtering.
    pub total: usize,
    pub listings: Vec<JobListing>,
    pub top_companies: Vec<RankedCount>,
    pub top_tags: Vec<RankedCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The filters left nothing to show.
    NoMatches { category: String, total: usize },
    Listings(DashboardView),
}

/// Choices offered for the company and tag filters.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub companies: Vec<String>,
    pub tags: Vec<String>,
}

pub struct JobBoard {
    config: ConfigManager,
    loader: DatasetLoader,
}

impl JobBoard {
    pub fn new(config: ConfigManager) -> Result<Self> {
        let normalizer = DateNormalizer::new(config.locale_table()?);
        let loader = DatasetLoader::new(config.data_dir.clone(), normalizer);
        Ok(Self { config, loader })
    }

    pub fn with_loader(config: ConfigManager, loader: DatasetLoader) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        FsOps::list_categories(&self.config.data_dir).await
    }

    pub fn dataset(&mut self, category: &str) -> Result<Arc<Dataset>> {
        self.loader.load(category)
    }

    pub fn query(&mut self, category: &str, criteria: &FilterCriteria) -> Result<QueryOutcome> {
        let dataset = self.loader.load(category)?;
        let display_name = FsOps::display_name(&FsOps::normalize_category_slug(category));

        let matches = filter::apply(&dataset, criteria);
        if matches.is_empty() {
            info!("No listings in {} match the current filters", display_name);
            return Ok(QueryOutcome::NoMatches {
                category: display_name,
                total: dataset.len(),
            });
        }

        let top_n = self.config.top_n;
        let view = DashboardView {
            top_companies: aggregation::top_companies(matches.iter().copied(), top_n),
            top_tags: aggregation::top_tags(matches.iter().copied(), top_n),
            listings: matches.into_iter().cloned().collect(),
            total: dataset.len(),
            category: display_name,
        };
        Ok(QueryOutcome::Listings(view))
    }

    pub fn options(&mut self, category: &str) -> Result<FilterOptions> {
        let dataset = self.loader.load(category)?;
        let mut companies = vec![ALL_COMPANIES.to_string()];
        companies.extend(filter::company_options(dataset.iter()));
        Ok(FilterOptions {
            companies,
            tags: filter::tag_options(dataset.iter()),
        })
    }

    /// Re-scrape a category and drop its cached dataset once the new file is in place.
    ///
    /// A failed scrape leaves both the file and the cache as they were.
    pub async fn refresh<S>(&mut self, category: &str, scraper: &S) -> Result<usize>
    where
        S: ListingScraper + ?Sized,
    {
        let slug = FsOps::normalize_category_slug(category);
        let url = self.config.scrape_url(&slug);
        let destination = self.loader.source_path(&slug);

        info!("Scraping job data for {}", slug);
        let count = match scraper.scrape(&url, &destination).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Scrape of {} failed, keeping previous data: {}", slug, e);
                return Err(e);
            }
        };

        self.loader.invalidate(&slug);
        info!("Scraping completed for {}: {} listings", slug, count);
        Ok(count)
    }
}
