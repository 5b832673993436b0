// src/lib.rs
//! Ingestion and query pipeline for scraped job listings.
//!
//! Category CSV files are loaded and normalized by [`DatasetLoader`],
//! narrowed by [`filter::apply`] and summarized by [`aggregation`].
//! [`JobBoard`] runs the whole pipeline per request and triggers re-scrapes.

pub mod aggregation;
pub mod board;
pub mod cli;
pub mod core;
pub mod dataset_loader;
pub mod date_normalizer;
pub mod filter;
pub mod scrape;
pub mod types;

pub use aggregation::{top_companies, top_tags, RankedCount};
pub use board::{DashboardView, FilterOptions, JobBoard, QueryOutcome};
pub use dataset_loader::DatasetLoader;
pub use date_normalizer::{normalize, DateNormalizer, LocaleTable};
pub use filter::{CompanyFilter, DateRange, FilterCriteria};
pub use types::{Dataset, JobListing, RawListing, TechStack};
