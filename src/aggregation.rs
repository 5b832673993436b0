// src/aggregation.rs
//! Ranked frequency tables over listings (top companies, top tags)

use serde::Serialize;
use std::collections::HashMap;

use crate::types::JobListing;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    pub key: String,
    pub count: usize,
}

impl RankedCount {
    pub fn new(key: &str, count: usize) -> Self {
        Self {
            key: key.to_string(),
            count,
        }
    }
}

/// Count keys, order by descending count and keep the first `n`.
///
/// Equal counts keep the order in which their keys were first seen.
fn rank<'a, I>(keys: I, n: usize) -> Vec<RankedCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for key in keys {
        if key.is_empty() {
            continue;
        }
        match positions.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(n)
        .map(|(key, count)| RankedCount::new(key, count))
        .collect()
}

/// Listings per company. Listings without a company name are not counted.
pub fn top_companies<'a, I>(listings: I, n: usize) -> Vec<RankedCount>
where
    I: IntoIterator<Item = &'a JobListing>,
{
    rank(listings.into_iter().map(|l| l.company.as_str()), n)
}

/// Listings per tag; a listing contributes once to each of its tags.
pub fn top_tags<'a, I>(listings: I, n: usize) -> Vec<RankedCount>
where
    I: IntoIterator<Item = &'a JobListing>,
{
    rank(listings.into_iter().flat_map(|l| l.tech_stack.iter()), n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dataset, RawListing};

    fn listing(company: &str, tags: &str) -> JobListing {
        JobListing::new(
            RawListing {
                title: "Developer".to_string(),
                company: company.to_string(),
                posted_date: String::new(),
                tech_stack: tags.to_string(),
            },
            None,
        )
    }

    #[test]
    fn test_top_tags_scenario() {
        let data = vec![listing("X", "Python, Go"), listing("X", "Java")];
        assert_eq!(
            top_tags(&data, 10),
            vec![
                RankedCount::new("Python", 1),
                RankedCount::new("Go", 1),
                RankedCount::new("Java", 1),
            ]
        );
        assert_eq!(top_companies(&data, 10), vec![RankedCount::new("X", 2)]);
    }

    #[test]
    fn test_top_companies_keeps_highest_counts() {
        let mut data = Dataset::new();
        for i in 0..15 {
            for _ in 0..=i {
                data.push(listing(&format!("Company {:02}", i), ""));
            }
        }

        let top = top_companies(&data, 10);
        assert_eq!(top.len(), 10);
        let keys: Vec<_> = top.iter().map(|r| r.key.clone()).collect();
        let expected: Vec<_> = (5..15).rev().map(|i| format!("Company {:02}", i)).collect();
        assert_eq!(keys, expected);
        assert!(top.windows(2).all(|w| w[0].count > w[1].count));
        assert!(top.iter().map(|r| r.count).sum::<usize>() <= data.len());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let data = vec![
            listing("B", "Rust"),
            listing("A", "Go, Rust"),
            listing("C", "Go"),
            listing("A", "Kotlin"),
        ];
        let companies = top_companies(&data, 3);
        assert_eq!(
            companies,
            vec![
                RankedCount::new("A", 2),
                RankedCount::new("B", 1),
                RankedCount::new("C", 1),
            ]
        );
        let tags = top_tags(&data, 2);
        assert_eq!(tags, vec![RankedCount::new("Rust", 2), RankedCount::new("Go", 2)]);
    }

    #[test]
    fn test_duplicate_tags_count_once_per_listing() {
        let data = vec![listing("A", "Go, Go, Go")];
        assert_eq!(top_tags(&data, 10), vec![RankedCount::new("Go", 1)]);
    }

    #[test]
    fn test_empty_inputs_yield_empty_rankings() {
        let empty: Dataset = Vec::new();
        assert!(top_companies(&empty, 10).is_empty());
        assert!(top_tags(&empty, 10).is_empty());

        let untagged = vec![listing("A", ""), listing("", " , ")];
        assert!(top_tags(&untagged, 10).is_empty());
        assert_eq!(top_companies(&untagged, 10), vec![RankedCount::new("A", 1)]);
    }

    #[test]
    fn test_rankings_accept_filtered_views() {
        let data = vec![listing("A", "Go"), listing("B", "Go"), listing("A", "Rust")];
        let view: Vec<&JobListing> = data.iter().filter(|l| l.company == "A").collect();
        assert_eq!(
            top_tags(view.iter().copied(), 10),
            vec![RankedCount::new("Go", 1), RankedCount::new("Rust", 1)]
        );
    }
}
