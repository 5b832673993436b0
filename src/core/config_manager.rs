// src/core/config_manager.rs
//! Configuration loading: optional config.yaml profile plus environment overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::date_normalizer::LocaleTable;

pub const CATEGORY_PLACEHOLDER: &str = "{category}";

const DEFAULT_SCRAPE_URL: &str =
    "https://dev.bg/company/jobs/{category}/sofiya/?_job_location=sofiya&_paged=";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigManager {
    pub data_dir: PathBuf,
    /// TOML month table; the built-in Bulgarian table when unset.
    pub locale_file: Option<PathBuf>,
    pub top_n: usize,
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub url_template: String,
    pub timeout_seconds: u64,
    pub max_pages: u32,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: Option<ConfigManager>,
    production: Option<ConfigManager>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            locale_file: None,
            top_n: 10,
            scrape: ScrapeConfig::default(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_SCRAPE_URL.to_string(),
            timeout_seconds: 30,
            max_pages: 50,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ConfigManager {
    /// Load configuration for the current environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = std::env::var("JOB_BOARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yaml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::from_yaml_str(&content, &environment)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            info!("{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.apply_env_overrides()?;
        config.resolve_paths()?;
        config.validate()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("JOB_BOARD_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Pick the profile for `environment` out of a config.yaml document
    pub fn from_yaml_str(content: &str, environment: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content).context("Invalid configuration YAML")?;

        let profile = match environment {
            "production" => file.production,
            _ => file.local,
        };

        Ok(profile.unwrap_or_default())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("JOB_BOARD_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("JOB_BOARD_LOCALE_FILE") {
            self.locale_file = Some(PathBuf::from(path));
        }
        if let Ok(top_n) = std::env::var("JOB_BOARD_TOP_N") {
            self.top_n = top_n
                .parse()
                .map_err(|_| anyhow::anyhow!("JOB_BOARD_TOP_N must be a positive number"))?;
        }
        if let Ok(url) = std::env::var("JOB_BOARD_SCRAPE_URL") {
            self.scrape.url_template = url;
        }
        Ok(())
    }

    fn resolve_paths(&mut self) -> Result<()> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        self.data_dir = Self::resolve_path(&current_dir, &self.data_dir);
        self.locale_file = self
            .locale_file
            .as_ref()
            .map(|path| Self::resolve_path(&current_dir, path));
        Ok(())
    }

    fn resolve_path(base: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            anyhow::bail!("top_n must be greater than zero");
        }
        if !self.scrape.url_template.contains(CATEGORY_PLACEHOLDER) {
            anyhow::bail!(
                "scrape.url_template must contain {}: {}",
                CATEGORY_PLACEHOLDER,
                self.scrape.url_template
            );
        }
        if self.scrape.max_pages == 0 {
            anyhow::bail!("scrape.max_pages must be greater than zero");
        }
        Ok(())
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Listing URL for a category; the scraper appends the page number.
    pub fn scrape_url(&self, slug: &str) -> String {
        self.scrape.url_template.replace(CATEGORY_PLACEHOLDER, slug)
    }

    pub fn locale_table(&self) -> Result<LocaleTable> {
        match &self.locale_file {
            Some(path) => {
                let table = LocaleTable::load(path)?;
                info!("Loaded locale table '{}' from {}", table.locale(), path.display());
                Ok(table)
            }
            None => Ok(LocaleTable::bulgarian()),
        }
    }
}
