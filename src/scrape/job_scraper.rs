// src/scrape/job_scraper.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::{info, warn};

use super::ListingScraper;
use crate::core::config_manager::ScrapeConfig;
use crate::core::FsOps;
use crate::types::listing::{
    COLUMN_COMPANY, COLUMN_POSTED_DATE, COLUMN_TECH_STACK, COLUMN_TITLE, TAG_SEPARATOR,
};
use crate::types::RawListing;

const CARD_SELECTOR: &str = "div.job-list-item";
const TITLE_SELECTORS: [&str; 2] = ["h6.job-title", ".job-title"];
const COMPANY_SELECTORS: [&str; 2] = ["span.company-name", ".company-name"];
const DATE_SELECTORS: [&str; 2] = ["span.date", ".date"];
const TECH_IMAGE_SELECTOR: &str = ".tech-stack-wrap img";
const TECH_TEXT_SELECTOR: &str = ".tech-stack-wrap span";

/// Scraper for dev.bg category listings, one request per result page.
pub struct DevBgScraper {
    client: Client,
    max_pages: u32,
}

impl DevBgScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_pages: config.max_pages,
        })
    }

    /// Body of a result page, or `None` once the site reports no such page.
    async fn fetch_page(&self, url: &str, page: u32) -> Result<Option<String>> {
        info!("Fetching listing page {}: {}", page, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch listing page {}", page))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND && page > 1 {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("HTTP error {} for {}", status, url);
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;
        Ok(Some(html))
    }
}

#[async_trait]
impl ListingScraper for DevBgScraper {
    async fn scrape(&self, source_url: &str, destination: &Path) -> Result<usize> {
        let mut listings = Vec::new();

        for page in 1..=self.max_pages {
            let url = format!("{}{}", source_url, page);
            let Some(html) = self.fetch_page(&url, page).await? else {
                break;
            };

            let found = parse_listing_page(&html);
            if found.is_empty() {
                break;
            }
            info!("Page {} yielded {} listings", page, found.len());
            listings.extend(found);

            if page == self.max_pages {
                warn!("Stopped after the page limit of {}", self.max_pages);
            }
        }

        if listings.is_empty() {
            anyhow::bail!(
                "No listings found at {}1, keeping {}",
                source_url,
                destination.display()
            );
        }

        let content = write_listings_csv(&listings)?;
        FsOps::write_file_atomic(destination, &content).await?;

        info!(
            "Scraped {} listings into {}",
            listings.len(),
            destination.display()
        );
        Ok(listings.len())
    }
}

/// Serialize rows in the category file format.
pub fn write_listings_csv(listings: &[RawListing]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if listings.is_empty() {
        writer
            .write_record([COLUMN_TITLE, COLUMN_COMPANY, COLUMN_POSTED_DATE, COLUMN_TECH_STACK])
            .context("Failed to write CSV header")?;
    }
    for listing in listings {
        writer
            .serialize(listing)
            .context("Failed to serialize listing")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))
}

/// Extract the job cards of one result page.
pub fn parse_listing_page(html: &str) -> Vec<RawListing> {
    let document = Html::parse_document(html);
    let Ok(card_selector) = Selector::parse(CARD_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&card_selector)
        .filter_map(|card| {
            let title = find_text_by_selectors(&card, &TITLE_SELECTORS)?;
            Some(RawListing {
                title,
                company: find_text_by_selectors(&card, &COMPANY_SELECTORS).unwrap_or_default(),
                posted_date: find_text_by_selectors(&card, &DATE_SELECTORS).unwrap_or_default(),
                tech_stack: tech_tags(&card).join(TAG_SEPARATOR),
            })
        })
        .collect()
}

fn find_text_by_selectors(card: &ElementRef, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = card.select(&selector).next() {
                let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn tech_tags(card: &ElementRef) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    if let Ok(selector) = Selector::parse(TECH_IMAGE_SELECTOR) {
        for image in card.select(&selector) {
            let value = image.value();
            if let Some(tag) = value.attr("title").or_else(|| value.attr("alt")) {
                push_tag(&mut tags, tag);
            }
        }
    }

    if tags.is_empty() {
        if let Ok(selector) = Selector::parse(TECH_TEXT_SELECTOR) {
            for span in card.select(&selector) {
                push_tag(&mut tags, &span.text().collect::<String>());
            }
        }
    }

    tags
}

fn push_tag(tags: &mut Vec<String>, raw: &str) {
    let tag = clean_text(raw);
    if !tag.is_empty() && !tags.contains(&tag) {
        tags.push(tag);
    }
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_normalizer::DateNormalizer;
    use crate::dataset_loader::parse_listings;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE: &str = r#"
        <html><body>
          <div class="job-list-item">
            <h6 class="job-title">  Senior   Python Developer </h6>
            <span class="company-name">Acme</span>
            <span class="date">15 март</span>
            <div class="tech-stack-wrap">
              <img src="py.png" title="Python">
              <img src="go.png" alt="Go">
              <img src="py2.png" title="Python">
            </div>
          </div>
          <div class="job-list-item">
            <h6 class="job-title">QA Engineer</h6>
            <span class="company-name">Globex, Ltd</span>
            <span class="date">1 апр.</span>
            <div class="tech-stack-wrap"><span>Selenium</span><span> Java </span></div>
          </div>
          <div class="job-list-item">
            <span class="company-name">No title here</span>
          </div>
        </body></html>
    "#;

    /// Serve `body` for every request; returns the page URL prefix.
    async fn serve(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{}/jobs/?_paged=", addr)
    }

    fn scraper(max_pages: u32) -> DevBgScraper {
        DevBgScraper::new(&ScrapeConfig {
            max_pages,
            ..ScrapeConfig::default()
        })
        .unwrap()
    }

    fn temp_file() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("job-board-scrape-{}.csv", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_scrape_without_cards_keeps_existing_file() {
        let url = serve("<html><body><p>Няма обяви</p></body></html>").await;
        let destination = temp_file();
        std::fs::write(&destination, "previous content").unwrap();

        assert!(scraper(2).scrape(&url, &destination).await.is_err());
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "previous content");

        std::fs::remove_file(&destination).unwrap();
    }

    #[tokio::test]
    async fn test_scrape_writes_every_page() {
        let url = serve(PAGE).await;
        let destination = temp_file();

        assert_eq!(scraper(2).scrape(&url, &destination).await.unwrap(), 4);
        let content = std::fs::read(&destination).unwrap();
        let dataset = parse_listings(content.as_slice(), &DateNormalizer::default(), 2024).unwrap();
        assert_eq!(dataset.len(), 4);

        std::fs::remove_file(&destination).unwrap();
    }

    #[test]
    fn test_parse_listing_page() {
        let listings = parse_listing_page(PAGE);
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].title, "Senior Python Developer");
        assert_eq!(listings[0].company, "Acme");
        assert_eq!(listings[0].posted_date, "15 март");
        assert_eq!(listings[0].tech_stack, "Python, Go");

        assert_eq!(listings[1].company, "Globex, Ltd");
        assert_eq!(listings[1].tech_stack, "Selenium, Java");
    }

    #[test]
    fn test_parse_page_without_cards() {
        assert!(parse_listing_page("<html><body><p>Няма обяви</p></body></html>").is_empty());
    }

    #[test]
    fn test_written_csv_loads_back() {
        let listings = parse_listing_page(PAGE);
        let content = write_listings_csv(&listings).unwrap();

        let dataset = parse_listings(content.as_slice(), &DateNormalizer::default(), 2024).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset[1].company, "Globex, Ltd");
        assert_eq!(dataset[1].tech_stack.iter().collect::<Vec<_>>(), vec!["Selenium", "Java"]);
    }

    #[test]
    fn test_empty_csv_keeps_header() {
        let content = write_listings_csv(&[]).unwrap();
        let dataset = parse_listings(content.as_slice(), &DateNormalizer::default(), 2024).unwrap();
        assert!(dataset.is_empty());
    }
}
