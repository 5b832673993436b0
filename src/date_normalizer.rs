// src/date_normalizer.rs
//! Translation of year-less, locale-specific short dates ("15 март") into
//! calendar dates.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Format of a translated date once the reference year is appended.
pub const DATE_FORMAT: &str = "%d %b %Y";

const CANONICAL_MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Debug, Deserialize)]
struct LocaleFile {
    locale: String,
    months: BTreeMap<String, String>,
}

/// Month tokens of one locale mapped to the English abbreviations `%b` parses.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    locale: String,
    // Longest token first so a token that prefixes another cannot shadow it.
    entries: Vec<(String, String)>,
}

impl LocaleTable {
    pub fn new(locale: &str, months: BTreeMap<String, String>) -> Result<Self> {
        if months.len() != CANONICAL_MONTHS.len() {
            anyhow::bail!(
                "Locale '{}' must map exactly {} month tokens, found {}",
                locale,
                CANONICAL_MONTHS.len(),
                months.len()
            );
        }

        let mut covered = BTreeSet::new();
        for (token, canonical) in &months {
            if token.trim().is_empty() {
                anyhow::bail!("Locale '{}' contains an empty month token", locale);
            }
            let lower = canonical.to_lowercase();
            if !CANONICAL_MONTHS.contains(&lower.as_str()) {
                anyhow::bail!(
                    "Locale '{}' maps '{}' to unknown month '{}'",
                    locale,
                    token,
                    canonical
                );
            }
            covered.insert(lower);
        }
        if covered.len() != CANONICAL_MONTHS.len() {
            anyhow::bail!("Locale '{}' maps several tokens to the same month", locale);
        }

        let mut entries: Vec<(String, String)> = months.into_iter().collect();
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        Ok(Self {
            locale: locale.to_string(),
            entries,
        })
    }

    /// Short month forms used by dev.bg listings.
    pub fn bulgarian() -> Self {
        let months = [
            ("ян.", "Jan"),
            ("фев.", "Feb"),
            ("март", "Mar"),
            ("апр.", "Apr"),
            ("май", "May"),
            ("юни", "Jun"),
            ("юли", "Jul"),
            ("авг.", "Aug"),
            ("сеп.", "Sep"),
            ("окт.", "Oct"),
            ("ноем.", "Nov"),
            ("дек.", "Dec"),
        ];
        let mut entries: Vec<(String, String)> = months
            .iter()
            .map(|(token, canonical)| (token.to_string(), canonical.to_string()))
            .collect();
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        Self {
            locale: "bg".to_string(),
            entries,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: LocaleFile = toml::from_str(content).context("Failed to parse locale table")?;
        Self::new(&file.locale, file.months)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read locale table: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid locale table: {}", path.display()))
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Replace every known month token in one pass; replaced text is not rescanned.
    pub fn translate(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        'scan: while !rest.is_empty() {
            for (token, canonical) in &self.entries {
                if let Some(tail) = rest.strip_prefix(token.as_str()) {
                    out.push_str(canonical);
                    rest = tail;
                    continue 'scan;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }

        out
    }
}

impl Default for LocaleTable {
    fn default() -> Self {
        Self::bulgarian()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateNormalizer {
    table: LocaleTable,
}

impl DateNormalizer {
    pub fn new(table: LocaleTable) -> Self {
        Self { table }
    }

    /// `None` whenever the input does not translate into a real calendar date.
    ///
    /// Day and month must be separated by whitespace; `"15март"` is rejected.
    pub fn normalize(&self, raw: &str, reference_year: i32) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let translated = self.table.translate(trimmed);
        let mut parts = translated.split_whitespace();
        let (Some(day), Some(month), None) = (parts.next(), parts.next(), parts.next()) else {
            debug!("Posted date '{}' is not a day and a month", raw);
            return None;
        };

        let candidate = format!("{} {} {}", day, month, reference_year);
        match NaiveDate::parse_from_str(&candidate, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                debug!("Unparseable posted date '{}': {}", raw, e);
                None
            }
        }
    }
}

/// Normalize with the built-in Bulgarian table.
pub fn normalize(raw: &str, reference_year: i32) -> Option<NaiveDate> {
    DateNormalizer::default().normalize(raw, reference_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_normalize_known_months() {
        assert_eq!(normalize("15 март", 2024), date(2024, 3, 15));
        assert_eq!(normalize("1 апр.", 2024), date(2024, 4, 1));
        assert_eq!(normalize("03 ноем.", 2023), date(2023, 11, 3));
        assert_eq!(normalize("  28 дек. ", 2024), date(2024, 12, 28));
    }

    #[test]
    fn test_normalize_unknown_token() {
        assert_eq!(normalize("31 xyz.", 2024), None);
        assert_eq!(normalize("15 March-ish", 2024), None);
    }

    #[test]
    fn test_normalize_bad_days() {
        assert_eq!(normalize("32 март", 2024), None);
        assert_eq!(normalize("0 март", 2024), None);
        assert_eq!(normalize("31 фев.", 2024), None);
        assert_eq!(normalize("x5 март", 2024), None);
        assert_eq!(normalize("", 2024), None);
        assert_eq!(normalize("   ", 2024), None);
    }

    #[test]
    fn test_normalize_requires_separated_day_and_month() {
        assert_eq!(normalize("15март", 2024), None);
        assert_eq!(normalize("15 март 2023", 2024), None);
        assert_eq!(normalize("15\tмарт", 2024), date(2024, 3, 15));
        assert_eq!(normalize("15   март", 2024), date(2024, 3, 15));
    }

    #[test]
    fn test_normalize_leap_day_follows_reference_year() {
        assert_eq!(normalize("29 фев.", 2024), date(2024, 2, 29));
        assert_eq!(normalize("29 фев.", 2023), None);
    }

    #[test]
    fn test_translate_does_not_rescan_output() {
        let toml = r#"
            locale = "test"
            [months]
            "ян." = "Jan"
            "Jan" = "Feb"
            "март" = "Mar"
            "апр." = "Apr"
            "май" = "May"
            "юни" = "Jun"
            "юли" = "Jul"
            "авг." = "Aug"
            "сеп." = "Sep"
            "окт." = "Oct"
            "ноем." = "Nov"
            "дек." = "Dec"
        "#;
        let table = LocaleTable::from_toml_str(toml).unwrap();
        assert_eq!(table.translate("1 ян."), "1 Jan");

        let normalizer = DateNormalizer::new(table);
        assert_eq!(normalizer.normalize("1 ян.", 2024), date(2024, 1, 1));
        assert_eq!(normalizer.normalize("1 Jan", 2024), date(2024, 2, 1));
    }

    #[test]
    fn test_shipped_locale_file_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("locales/bg.toml");
        let table = LocaleTable::load(&path).unwrap();
        assert_eq!(table.locale(), "bg");

        let builtin = LocaleTable::bulgarian();
        for raw in ["15 март", "1 апр.", "3 ноем.", "9 ян."] {
            assert_eq!(table.translate(raw), builtin.translate(raw));
        }
    }

    #[test]
    fn test_locale_table_rejects_incomplete_mapping() {
        let toml = r#"
            locale = "short"
            [months]
            "jan" = "Jan"
        "#;
        assert!(LocaleTable::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_locale_table_rejects_unknown_canonical() {
        let mut months = BTreeMap::new();
        for (i, m) in CANONICAL_MONTHS.iter().enumerate() {
            months.insert(format!("m{}", i), m.to_string());
        }
        months.insert("m0".to_string(), "Foo".to_string());
        assert!(LocaleTable::new("bad", months).is_err());
    }

    #[test]
    fn test_locale_table_accepts_full_mapping() {
        let canonical = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        let months: BTreeMap<String, String> = canonical
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("m{:02}", i + 1), m.to_string()))
            .collect();
        let table = LocaleTable::new("numbers", months).unwrap();
        assert_eq!(table.locale(), "numbers");
        assert_eq!(
            DateNormalizer::new(table).normalize("7 m05", 2024),
            date(2024, 5, 7)
        );
    }
}
