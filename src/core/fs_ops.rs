// src/core/fs_ops.rs
//! File system operations for the per-category listing files

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Suffix shared by every category file: `backend_jobs.csv`.
pub const CATEGORY_FILE_SUFFIX: &str = "_jobs.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub slug: String,
    pub display_name: String,
    pub path: PathBuf,
}

impl Category {
    pub fn new(data_dir: &Path, slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            display_name: FsOps::display_name(slug),
            path: FsOps::category_file_path(data_dir, slug),
        }
    }
}

pub struct FsOps;

impl FsOps {
    /// Ensure directory exists
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Write to a sibling temp file, then rename over `path`.
    ///
    /// Readers see either the old content or the new one, never a partial file.
    pub async fn write_file_atomic(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir_exists(parent).await?;
            }
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid file path: {}", path.display()))?;
        let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, content).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e).with_context(|| format!("Failed to write file: {}", temp_path.display()));
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e).with_context(|| {
                format!("Failed to move {} to {}", temp_path.display(), path.display())
            });
        }

        info!("Written file: {}", path.display());
        Ok(())
    }

    /// Category files found in `data_dir`, sorted by slug
    pub async fn list_categories(data_dir: &Path) -> Result<Vec<Category>> {
        let mut categories = Vec::new();

        if !data_dir.exists() {
            warn!("Data directory does not exist: {}", data_dir.display());
            return Ok(categories);
        }

        let mut entries = fs::read_dir(data_dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", data_dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(slug) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(Self::slug_from_file_name)
            {
                categories.push(Category::new(data_dir, &slug));
            }
        }

        categories.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(categories)
    }

    pub fn slug_from_file_name(file_name: &str) -> Option<String> {
        file_name
            .strip_suffix(CATEGORY_FILE_SUFFIX)
            .filter(|slug| !slug.is_empty() && !slug.starts_with('.'))
            .map(str::to_string)
    }

    pub fn category_file_path(data_dir: &Path, slug: &str) -> PathBuf {
        data_dir.join(format!("{}{}", slug, CATEGORY_FILE_SUFFIX))
    }

    /// Normalize a user supplied category for file system usage ("Back End" -> "back-end")
    pub fn normalize_category_slug(name: &str) -> String {
        name.trim()
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }

    /// "backend" -> "Backend"
    pub fn display_name(slug: &str) -> String {
        let mut chars = slug.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }
}
