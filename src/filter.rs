// src/filter.rs
//! Listing filters. All active criteria must hold; input order is preserved.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::JobListing;

/// Company choice meaning "no company constraint".
pub const ALL_COMPANIES: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyFilter {
    #[default]
    All,
    Exact(String),
}

impl CompanyFilter {
    /// Map a selection from the company list; `"All"` disables the filter.
    pub fn from_choice(choice: &str) -> Self {
        if choice == ALL_COMPANIES {
            Self::All
        } else {
            Self::Exact(choice.to_string())
        }
    }
}

/// Inclusive posting-date bounds; an unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Undated listings never fall inside a range.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the job title.
    pub title: Option<String>,
    pub company: CompanyFilter,
    /// A listing matches when it carries any of these tags.
    pub tags: BTreeSet<String>,
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_company(mut self, company: CompanyFilter) -> Self {
        self.company = company;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    fn title_needle(&self) -> Option<String> {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.title_needle().is_none()
            && self.company == CompanyFilter::All
            && self.tags.is_empty()
            && self.date_range.is_none()
    }

    fn matches_with(&self, listing: &JobListing, title_needle: Option<&str>) -> bool {
        if let Some(needle) = title_needle {
            if !listing.title.to_lowercase().contains(needle) {
                return false;
            }
        }
        if let CompanyFilter::Exact(company) = &self.company {
            if &listing.company != company {
                return false;
            }
        }
        if !self.tags.is_empty() && !listing.tech_stack.intersects(&self.tags) {
            return false;
        }
        if let Some(range) = &self.date_range {
            if !range.contains(listing.posted_date) {
                return false;
            }
        }
        true
    }
}

/// Listings satisfying `criteria`, in their original order.
pub fn apply<'a>(dataset: &'a [JobListing], criteria: &FilterCriteria) -> Vec<&'a JobListing> {
    let needle = criteria.title_needle();
    dataset
        .iter()
        .filter(|listing| criteria.matches_with(listing, needle.as_deref()))
        .collect()
}

/// Distinct companies in first-seen order, for the company choice list.
pub fn company_options<'a, I>(listings: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a JobListing>,
{
    let mut seen = BTreeSet::new();
    let mut companies = Vec::new();
    for listing in listings {
        if seen.insert(listing.company.as_str()) {
            companies.push(listing.company.clone());
        }
    }
    companies
}

/// Distinct tags in first-seen order, for the tag choice list.
pub fn tag_options<'a, I>(listings: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a JobListing>,
{
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for listing in listings {
        for tag in listing.tech_stack.iter() {
            if seen.insert(tag) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}
