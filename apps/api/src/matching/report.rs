use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::matching::customizer::CustomizationOutcome;
use crate::matching::scoring::{RankResult, ScoreKind};
use crate::matching::selector::Selection;
use crate::models::offering::Offering;
use crate::models::profile::Preferences;

/// Tabular placeholder for a metric the offering has no data for.
pub const MISSING_METRIC: &str = "n/a";

/// Column order of `ReportRow::cells`.
pub const REPORT_COLUMNS: &[&str] = &[
    "company",
    "position",
    "candidate_score",
    "offering_score",
    "candidate_explanations",
    "offering_explanations",
    "resume_category",
    "cover_letter_category",
    "resume_path",
    "cover_letter_path",
    "inserted_phrases",
    "commute_minutes",
    "salary_delta",
    "start_date_delta_days",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub company: String,
    pub position: String,
    pub candidate_score: f64,
    pub offering_score: f64,
    /// Explanations flattened for one table cell, strongest first.
    pub candidate_explanations: String,
    pub offering_explanations: String,
    pub resume_category: String,
    pub cover_letter_category: String,
    pub resume_path: PathBuf,
    pub cover_letter_path: PathBuf,
    pub inserted_phrases: Vec<String>,
    pub commute_minutes: Option<u32>,
    /// Salary midpoint minus the profile's floor.
    pub salary_delta: Option<f64>,
    /// Offering start date minus the profile's availability date.
    pub start_date_delta_days: Option<i64>,
    #[serde(skip)]
    pub experience_recency: f64,
}

impl ReportRow {
    /// One string per `REPORT_COLUMNS` entry.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.company.clone(),
            self.position.clone(),
            format!("{:.1}", self.candidate_score),
            format!("{:.1}", self.offering_score),
            self.candidate_explanations.clone(),
            self.offering_explanations.clone(),
            self.resume_category.clone(),
            self.cover_letter_category.clone(),
            self.resume_path.display().to_string(),
            self.cover_letter_path.display().to_string(),
            self.inserted_phrases.join(", "),
            metric(self.commute_minutes),
            metric(self.salary_delta.map(|d| format!("{d:.0}"))),
            metric(self.start_date_delta_days),
        ]
    }
}

/// Tab-separated table with a `REPORT_COLUMNS` header, one line per row.
pub fn render_table(rows: &[ReportRow]) -> String {
    let mut out = REPORT_COLUMNS.join("\t");
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row
            .cells()
            .into_iter()
            .map(|cell| cell.replace(['\t', '\n', '\r'], " "))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

fn metric<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_METRIC.to_string())
}

/// Folds one offering's results into a report row. Pure.
pub fn assemble(
    rank: &RankResult,
    selection: &Selection,
    outcome: &CustomizationOutcome,
    offering: &Offering,
    preferences: &Preferences,
) -> Result<ReportRow, MatchError> {
    let company = offering.company.trim();
    if company.is_empty() {
        return Err(MatchError::MissingIdentity("company"));
    }
    let position = offering.position.trim();
    if position.is_empty() {
        return Err(MatchError::MissingIdentity("position"));
    }

    let salary_delta = match (offering.salary_range, preferences.salary_floor) {
        (Some(range), Some(floor)) => Some(range.midpoint() - floor),
        _ => None,
    };
    let start_date_delta_days = match (offering.start_date, preferences.available_from) {
        (Some(start), Some(available)) => Some((start - available).num_days()),
        _ => None,
    };

    Ok(ReportRow {
        company: company.to_string(),
        position: position.to_string(),
        candidate_score: rank.candidate_score,
        offering_score: rank.offering_score,
        candidate_explanations: flatten(rank, ScoreKind::Candidate),
        offering_explanations: flatten(rank, ScoreKind::Offering),
        resume_category: selection.resume_category.clone(),
        cover_letter_category: selection.cover_letter_category.clone(),
        resume_path: outcome.resume_output_path.clone(),
        cover_letter_path: outcome.cover_letter_output_path.clone(),
        inserted_phrases: outcome.inserted_phrases.clone(),
        commute_minutes: offering.commute_minutes,
        salary_delta,
        start_date_delta_days,
        experience_recency: rank.experience_recency,
    })
}

fn flatten(rank: &RankResult, kind: ScoreKind) -> String {
    rank.explanations_for(kind)
        .map(|e| e.render())
        .collect::<Vec<_>>()
        .join("; ")
}
