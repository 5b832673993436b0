// src/cli.rs
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::aggregation::RankedCount;
use crate::board::{DashboardView, FilterOptions, JobBoard, QueryOutcome};
use crate::core::ConfigManager;
use crate::filter::{CompanyFilter, DateRange, FilterCriteria, ALL_COMPANIES};
use crate::scrape::DevBgScraper;

#[derive(Parser, Debug)]
#[command(name = "job-board")]
#[command(about = "Browse, filter and summarize scraped job listings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the <category>_jobs.csv files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available job categories
    Categories,
    /// Show the listings of a category with top companies and tags
    Show {
        category: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Number of entries in each ranking
        #[arg(long)]
        top: Option<usize>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the company and tag choices of a category
    Options {
        category: String,
        #[arg(long)]
        json: bool,
    },
    /// Scrape fresh listings for a category and replace its file
    Scrape { category: String },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Case-insensitive part of the job title
    #[arg(long)]
    pub title: Option<String>,
    /// Exact company name, or "All"
    #[arg(long, default_value = ALL_COMPANIES)]
    pub company: String,
    /// Technology tag; repeat to accept any of several
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Earliest posting date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Latest posting date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn criteria(&self) -> Result<FilterCriteria> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                anyhow::bail!("--from {} is after --to {}", from, to);
            }
        }

        let mut criteria = FilterCriteria::new().with_company(CompanyFilter::from_choice(&self.company));
        if let Some(title) = &self.title {
            criteria = criteria.with_title(title);
        }
        for tag in &self.tags {
            criteria = criteria.with_tag(tag);
        }
        if self.from.is_some() || self.to.is_some() {
            criteria = criteria.with_date_range(DateRange::new(self.from, self.to));
        }
        Ok(criteria)
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let mut config = ConfigManager::load()?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command {
        Command::Categories => {
            let board = JobBoard::new(config)?;
            let categories = board.categories().await?;
            if categories.is_empty() {
                println!(
                    "No job categories found in {}",
                    board.config().data_dir.display()
                );
            }
            for category in categories {
                println!("{:<20} {}", category.display_name, category.path.display());
            }
        }

        Command::Show {
            category,
            filters,
            top,
            json,
        } => {
            if let Some(top) = top {
                config = config.with_top_n(top);
            }
            config.validate()?;

            let criteria = filters.criteria()?;
            let mut board = JobBoard::new(config)?;
            let outcome = board.query(&category, &criteria)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }

        Command::Options { category, json } => {
            let mut board = JobBoard::new(config)?;
            let options = board.options(&category)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                print_options(&options);
            }
        }

        Command::Scrape { category } => {
            let scraper = DevBgScraper::new(&config.scrape)?;
            let mut board = JobBoard::new(config)?;

            println!("Scraping job data for {}, please wait...", category.to_lowercase());
            let count = board.refresh(&category, &scraper).await?;
            let dataset = board.dataset(&category)?;
            println!(
                "Scraping completed! {} listings written, {} loaded.",
                count,
                dataset.len()
            );
        }
    }

    Ok(())
}

fn print_outcome(outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::NoMatches { category, .. } => {
            println!("No job offers found matching your search in {}.", category);
        }
        QueryOutcome::Listings(view) => print_view(view),
    }
}

fn print_view(view: &DashboardView) {
    println!(
        "Showing {} of {} job offers for {}:",
        view.listings.len(),
        view.total,
        view.category
    );
    println!();
    println!(
        "{:<40} {:<25} {:<10} {}",
        "Job Title", "Company Name", "Posted", "Tech Stack"
    );
    println!("{}", "-".repeat(100));
    for listing in &view.listings {
        let posted = listing
            .posted_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<40} {:<25} {:<10} {}",
            truncate(&listing.title, 40),
            truncate(&listing.company, 25),
            posted,
            listing.tech_stack.to_raw()
        );
    }

    println!();
    println!("Top Companies by Job Offers in {}", view.category);
    if view.top_companies.is_empty() {
        println!("  No job data available for {}.", view.category);
    } else {
        print_bars(&view.top_companies);
    }

    println!();
    println!("Top Tech Stack Distribution in {}", view.category);
    if view.top_tags.is_empty() {
        println!("  No tech stack data available for {}.", view.category);
    } else {
        print_shares(&view.top_tags);
    }
}

fn print_bars(ranking: &[RankedCount]) {
    let max = ranking.iter().map(|r| r.count).max().unwrap_or(1).max(1);
    for entry in ranking {
        let width = (entry.count * 30).div_ceil(max);
        println!(
            "  {:<25} {:>4} {}",
            truncate(&entry.key, 25),
            entry.count,
            "#".repeat(width)
        );
    }
}

/// Share of each tag within the ranking, as the pie chart labels show it.
fn print_shares(ranking: &[RankedCount]) {
    let total: usize = ranking.iter().map(|r| r.count).sum();
    for entry in ranking {
        let share = entry.count as f64 * 100.0 / total.max(1) as f64;
        println!("  {:<25} {:>4} {:>5.1}%", truncate(&entry.key, 25), entry.count, share);
    }
}

fn print_options(options: &FilterOptions) {
    println!("Companies:");
    for company in &options.companies {
        println!("  {}", company);
    }
    println!("Tech stack:");
    for tag in &options.tags {
        println!("  {}", tag);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
