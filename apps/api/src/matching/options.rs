use std::path::PathBuf;

use chrono::NaiveDate;

use crate::matching::naming::NamingTemplate;
use crate::matching::scoring::ScoringConfig;

pub const DEFAULT_RESUME_TEMPLATE: &str = "{company} - {position} - Resume";
pub const DEFAULT_COVER_LETTER_TEMPLATE: &str = "{company} - {position} - Cover Letter";
pub const DEFAULT_NEUTRAL_PHRASE: &str = "professionalism";

/// Run-wide settings. Built from `Config` once per run and shared read-only;
/// no component reads the environment itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub resume_template: NamingTemplate,
    pub cover_letter_template: NamingTemplate,
    /// Must name a library category; checked before the run starts.
    pub fallback_category: Option<String>,
    pub overwrite: bool,
    /// Fills `{{soft_skill}}` spans the offering has no phrase for.
    pub neutral_phrase: String,
    pub scoring: ScoringConfig,
}

impl RunOptions {
    pub fn new(output_dir: impl Into<PathBuf>, as_of: NaiveDate) -> Self {
        Self {
            output_dir: output_dir.into(),
            resume_template: NamingTemplate::new(DEFAULT_RESUME_TEMPLATE),
            cover_letter_template: NamingTemplate::new(DEFAULT_COVER_LETTER_TEMPLATE),
            fallback_category: None,
            overwrite: false,
            neutral_phrase: DEFAULT_NEUTRAL_PHRASE.to_string(),
            scoring: ScoringConfig::as_of(as_of),
        }
    }
}
