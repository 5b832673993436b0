// src/types/mod.rs
pub mod listing;

pub use listing::{Dataset, JobListing, RawListing, TechStack};
