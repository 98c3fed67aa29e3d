use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    Remote,
    Hybrid,
    OnSite,
}

/// Annual salary interval. `min <= max` is enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

impl SalaryRange {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// One normalized job offering. Read-only once built.
///
/// `company` and `position` are stored as received; the customizer sanitizes
/// them before they reach a filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub company: String,
    pub position: String,
    /// Normalized skill → emphasis weight (> 0).
    pub required_skills: BTreeMap<String, f64>,
    /// Canonical soft-skill names found in the posting.
    pub soft_skills_mentioned: BTreeSet<String>,
    pub location: Option<String>,
    pub salary_range: Option<SalaryRange>,
    pub start_date: Option<NaiveDate>,
    pub raw_description: String,
    pub industry: Option<String>,
    pub company_size: Option<u32>,
    pub remote_policy: Option<RemotePolicy>,
    pub commute_minutes: Option<u32>,
}

impl Offering {
    /// Identity string used in logs and failure records.
    pub fn label(&self) -> String {
        format!("{} / {}", self.company.trim(), self.position.trim())
    }
}

/// An offering as returned by the job-search API.
///
/// Every field is optional on the wire; normalization decides what is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOffering {
    pub employer_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub job_city: Option<String>,
    pub job_country: Option<String>,
    pub job_is_remote: Option<bool>,
    /// "remote" | "hybrid" | "on_site"; takes precedence over `job_is_remote`.
    pub job_workplace_type: Option<String>,
    pub job_min_salary: Option<f64>,
    pub job_max_salary: Option<f64>,
    pub job_start_date: Option<NaiveDate>,
    pub job_required_skills: Vec<String>,
    pub job_highlights: JobHighlights,
    pub employer_industry: Option<String>,
    pub employer_size: Option<u32>,
    pub commute_minutes: Option<u32>,
}

impl RawOffering {
    /// Identity for failure records, tolerant of missing fields.
    pub fn label(&self) -> String {
        format!(
            "{} / {}",
            self.employer_name.as_deref().unwrap_or("<unknown company>").trim(),
            self.job_title.as_deref().unwrap_or("<unknown position>").trim()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobHighlights {
    #[serde(rename = "Qualifications")]
    pub qualifications: Vec<String>,
    #[serde(rename = "Responsibilities")]
    pub responsibilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_range_orders_bounds() {
        let range = SalaryRange::new(120_000.0, 90_000.0);
        assert_eq!(range.min, 90_000.0);
        assert_eq!(range.max, 120_000.0);
        assert_eq!(range.midpoint(), 105_000.0);
    }

    #[test]
    fn test_raw_offering_deserializes_sparse_payload() {
        let json = r#"{
            "employer_name": "Acme",
            "job_title": "Backend Engineer",
            "job_highlights": {"Qualifications": ["3+ years Python"]}
        }"#;
        let raw: RawOffering = serde_json::from_str(json).unwrap();
        assert_eq!(raw.employer_name.as_deref(), Some("Acme"));
        assert!(raw.job_min_salary.is_none());
        assert_eq!(raw.job_highlights.qualifications.len(), 1);
        assert!(raw.job_highlights.responsibilities.is_empty());
    }

    #[test]
    fn test_raw_label_tolerates_missing_identity() {
        let raw = RawOffering::default();
        assert_eq!(raw.label(), "<unknown company> / <unknown position>");
    }
}
