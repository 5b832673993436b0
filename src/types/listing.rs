// src/types/listing.rs
//! Job listing records as read from and written to the per-category CSV files

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ===== CSV columns =====

pub const COLUMN_TITLE: &str = "Job Title";
pub const COLUMN_COMPANY: &str = "Company Name";
pub const COLUMN_POSTED_DATE: &str = "Posted Date";
pub const COLUMN_TECH_STACK: &str = "Tech Stack";

pub const TAG_SEPARATOR: &str = ", ";

/// One row of a category file exactly as the scraper writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(rename = "Job Title")]
    pub title: String,
    #[serde(rename = "Company Name")]
    pub company: String,
    #[serde(rename = "Posted Date")]
    pub posted_date: String,
    #[serde(rename = "Tech Stack")]
    pub tech_stack: String,
}

// ===== Normalized listing =====

/// A scraped posting after date normalization and tag splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub posted_date_raw: String,
    pub posted_date: Option<NaiveDate>,
    pub tech_stack: TechStack,
}

impl JobListing {
    pub fn new(raw: RawListing, posted_date: Option<NaiveDate>) -> Self {
        Self {
            tech_stack: TechStack::parse(&raw.tech_stack),
            title: raw.title,
            company: raw.company,
            posted_date_raw: raw.posted_date,
            posted_date,
        }
    }
}

/// Listings of one category, in file order.
pub type Dataset = Vec<JobListing>;

/// Distinct technology tags of a listing.
///
/// Keeps the order in which tags first appear in the raw field, so the
/// display matches the source, while matching is by exact tag equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechStack(Vec<String>);

impl TechStack {
    /// Split a raw `"Python, Go"` field. Empty pieces and repeats are dropped.
    pub fn parse(raw: &str) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for piece in raw.split(',') {
            let tag = piece.trim();
            if tag.is_empty() || tags.iter().any(|t| t == tag) {
                continue;
            }
            tags.push(tag.to_string());
        }
        Self(tags)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// True when at least one requested tag is present.
    pub fn intersects(&self, wanted: &BTreeSet<String>) -> bool {
        self.0.iter().any(|t| wanted.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags joined back into the file representation.
    pub fn to_raw(&self) -> String {
        self.0.join(TAG_SEPARATOR)
    }
}
