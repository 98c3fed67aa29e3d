use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::matching::naming::NamingTemplate;
use crate::matching::options::{
    RunOptions, DEFAULT_COVER_LETTER_TEMPLATE, DEFAULT_NEUTRAL_PHRASE, DEFAULT_RESUME_TEMPLATE,
};
use crate::matching::recency::DEFAULT_HALF_LIFE_MONTHS;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub profile_path: PathBuf,
    pub category_library_path: PathBuf,
    pub output_dir: PathBuf,
    /// `offerings_path` in run requests resolves inside this directory.
    pub offerings_dir: PathBuf,
    /// Reports are only persisted when set.
    pub report_dir: Option<PathBuf>,
    pub resume_name_template: String,
    pub cover_letter_name_template: String,
    pub fallback_category: Option<String>,
    pub overwrite_outputs: bool,
    pub neutral_soft_skill_phrase: String,
    pub recency_half_life_months: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            profile_path: require_env("PROFILE_PATH")?.into(),
            category_library_path: require_env("CATEGORY_LIBRARY_PATH")?.into(),
            output_dir: optional_env("OUTPUT_DIR")
                .unwrap_or_else(|| "output".to_string())
                .into(),
            offerings_dir: optional_env("OFFERINGS_DIR")
                .unwrap_or_else(|| "offerings".to_string())
                .into(),
            report_dir: optional_env("REPORT_DIR").map(PathBuf::from),
            resume_name_template: optional_env("RESUME_NAME_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_RESUME_TEMPLATE.to_string()),
            cover_letter_name_template: optional_env("COVER_LETTER_NAME_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_COVER_LETTER_TEMPLATE.to_string()),
            fallback_category: optional_env("FALLBACK_CATEGORY"),
            overwrite_outputs: match optional_env("OVERWRITE_OUTPUTS") {
                Some(raw) => parse_flag(&raw)
                    .with_context(|| format!("OVERWRITE_OUTPUTS must be a boolean, got '{raw}'"))?,
                None => false,
            },
            neutral_soft_skill_phrase: optional_env("NEUTRAL_SOFT_SKILL_PHRASE")
                .unwrap_or_else(|| DEFAULT_NEUTRAL_PHRASE.to_string()),
            recency_half_life_months: match optional_env("RECENCY_HALF_LIFE_MONTHS") {
                Some(raw) => raw
                    .parse::<f64>()
                    .ok()
                    .filter(|m| m.is_finite() && *m > 0.0)
                    .with_context(|| {
                        format!("RECENCY_HALF_LIFE_MONTHS must be a positive number, got '{raw}'")
                    })?,
                None => DEFAULT_HALF_LIFE_MONTHS,
            },
        })
    }

    /// Run options for a run starting on `as_of`. `overwrite` overrides the
    /// configured policy for this run only.
    pub fn run_options(&self, as_of: NaiveDate, overwrite: Option<bool>) -> RunOptions {
        let mut options = RunOptions::new(self.output_dir.clone(), as_of);
        options.resume_template = NamingTemplate::new(self.resume_name_template.clone());
        options.cover_letter_template = NamingTemplate::new(self.cover_letter_name_template.clone());
        options.fallback_category = self.fallback_category.clone();
        options.overwrite = overwrite.unwrap_or(self.overwrite_outputs);
        options.neutral_phrase = self.neutral_soft_skill_phrase.clone();
        options.scoring.half_life_months = self.recency_half_life_months;
        options
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            profile_path: "profile.txt".into(),
            category_library_path: "library.json".into(),
            output_dir: "output".into(),
            offerings_dir: "offerings".into(),
            report_dir: None,
            resume_name_template: DEFAULT_RESUME_TEMPLATE.to_string(),
            cover_letter_name_template: DEFAULT_COVER_LETTER_TEMPLATE.to_string(),
            fallback_category: Some("general".to_string()),
            overwrite_outputs: false,
            neutral_soft_skill_phrase: "professionalism".to_string(),
            recency_half_life_months: 12.0,
        }
    }

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_run_options_carry_config_and_date() {
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let options = config().run_options(as_of, None);
        assert_eq!(options.scoring.as_of, as_of);
        assert_eq!(options.scoring.half_life_months, 12.0);
        assert_eq!(options.fallback_category.as_deref(), Some("general"));
        assert_eq!(options.resume_template, NamingTemplate::new(DEFAULT_RESUME_TEMPLATE));
        assert!(!options.overwrite);
    }

    #[test]
    fn test_run_options_overwrite_override() {
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert!(config().run_options(as_of, Some(true)).overwrite);
    }
}
