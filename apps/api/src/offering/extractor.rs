//! Offering extraction: turns a raw search-API record into a normalized `Offering`.
//!
//! Required skills are weighted by emphasis, following the usual JD keyword
//! scheme: every mention counts its position weight.
//!   title = 1.0, requirement lines = 0.8, everything else = 0.6
//! Skills the API lists explicitly get a base emphasis of 1.0 on top.
//! Ambiguous terms ("spring", "swift", ...) ignore plain body text.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::MatchError;
use crate::models::offering::{Offering, RawOffering, RemotePolicy, SalaryRange};
use crate::models::skills::{
    aliases_of, is_ambiguous_term, normalize_skill, soft_skill_phrasings, BUILTIN_TECH_SKILLS,
    SOFT_SKILL_LEXICON,
};

const TITLE_WEIGHT: f64 = 1.0;
const REQUIREMENT_WEIGHT: f64 = 0.8;
const BODY_WEIGHT: f64 = 0.6;
const LISTED_SKILL_BASE: f64 = 1.0;

/// Phrases that mark a line as stating a requirement.
const REQUIREMENT_MARKERS: &[&str] = &[
    "require",
    "must",
    "qualification",
    "experience with",
    "experience in",
    "proficien",
    "you have",
    "you bring",
    "skills:",
];

lazy_static! {
    static ref LINE_SPLIT: Regex = Regex::new(r"[\r\n]+|\.\s+").unwrap();
}

/// Builds a case-insensitive matcher for any of `phrases` that respects skill
/// boundaries, so `c` never matches inside `c++` and `java` never inside
/// `javascript`. Group 1 is the phrase itself.
fn term_pattern<'a>(phrases: impl Iterator<Item = &'a str>) -> Regex {
    let alternatives: Vec<String> = phrases.map(regex::escape).collect();
    let pattern = format!(
        r"(?i)(?:^|[^a-z0-9+#.])({})(?:$|[^a-z0-9+#])",
        alternatives.join("|")
    );
    Regex::new(&pattern).expect("escaped alternatives always compile")
}

/// Counts mentions. Resuming at the end of the phrase lets a separator shared
/// by two mentions serve as the boundary of both.
fn count_mentions(pattern: &Regex, text: &str) -> usize {
    let mut count = 0;
    let mut pos = 0;
    while let Some(caps) = pattern.captures_at(text, pos) {
        let Some(term) = caps.get(1) else { break };
        count += 1;
        pos = term.end();
    }
    count
}

/// The set of technical terms recognizable in offering text, with one
/// compiled matcher per canonical term.
pub struct SkillVocabulary {
    terms: BTreeMap<String, Regex>,
}

impl SkillVocabulary {
    /// Builtin terms plus every extra term given (profile and library skills).
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical: BTreeSet<String> =
            BUILTIN_TECH_SKILLS.iter().map(|s| s.to_string()).collect();
        canonical.extend(
            extra
                .into_iter()
                .map(|s| normalize_skill(s.as_ref()))
                .filter(|s| !s.is_empty()),
        );

        let terms = canonical
            .into_iter()
            .map(|term| {
                let mut phrases = vec![term.as_str()];
                for alias in aliases_of(&term) {
                    phrases.push(alias);
                }
                let pattern = term_pattern(phrases.into_iter());
                (term, pattern)
            })
            .collect();

        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    fn mentions(&self, term: &str, text: &str) -> usize {
        self.terms
            .get(term)
            .map(|p| count_mentions(p, text))
            .unwrap_or(0)
    }
}

/// Normalizes a raw offering. Fails only when company or position is blank.
pub fn normalize_offering(
    raw: &RawOffering,
    vocabulary: &SkillVocabulary,
) -> Result<Offering, MatchError> {
    let company = non_blank(raw.employer_name.as_deref()).ok_or(MatchError::MissingIdentity("company"))?;
    let position = non_blank(raw.job_title.as_deref()).ok_or(MatchError::MissingIdentity("position"))?;

    let raw_description = compose_description(raw);
    let required_skills = extract_required_skills(raw, &position, vocabulary);
    let soft_skills_mentioned = extract_soft_skills(&format!("{position}\n{raw_description}"));

    Ok(Offering {
        company,
        position,
        required_skills,
        soft_skills_mentioned,
        location: compose_location(raw),
        salary_range: compose_salary(raw.job_min_salary, raw.job_max_salary),
        start_date: raw.job_start_date,
        raw_description,
        industry: non_blank(raw.employer_industry.as_deref()).map(|i| i.to_lowercase()),
        company_size: raw.employer_size,
        remote_policy: remote_policy(raw),
        commute_minutes: raw.commute_minutes,
    })
}

fn extract_required_skills(
    raw: &RawOffering,
    title: &str,
    vocabulary: &SkillVocabulary,
) -> BTreeMap<String, f64> {
    let mut emphasis: BTreeMap<String, f64> = BTreeMap::new();

    for listed in &raw.job_required_skills {
        let name = normalize_skill(listed);
        if !name.is_empty() {
            *emphasis.entry(name).or_insert(0.0) += LISTED_SKILL_BASE;
        }
    }

    let mut weighted_text: Vec<(&str, f64)> = vec![(title, TITLE_WEIGHT)];
    for line in &raw.job_highlights.qualifications {
        weighted_text.push((line.as_str(), REQUIREMENT_WEIGHT));
    }
    for line in &raw.job_highlights.responsibilities {
        weighted_text.push((line.as_str(), BODY_WEIGHT));
    }
    if let Some(description) = raw.job_description.as_deref() {
        for line in LINE_SPLIT.split(description) {
            let lower = line.to_lowercase();
            let weight = if REQUIREMENT_MARKERS.iter().any(|m| lower.contains(m)) {
                REQUIREMENT_WEIGHT
            } else {
                BODY_WEIGHT
            };
            weighted_text.push((line, weight));
        }
    }

    for term in vocabulary.terms.keys() {
        let ambiguous = is_ambiguous_term(term);
        let score: f64 = weighted_text
            .iter()
            .filter(|(_, weight)| !ambiguous || *weight > BODY_WEIGHT)
            .map(|(text, weight)| vocabulary.mentions(term, text) as f64 * weight)
            .sum();
        if score > 0.0 {
            *emphasis.entry(term.clone()).or_insert(0.0) += score;
        }
    }

    // Round so the same posting always yields bit-identical weights.
    emphasis
        .into_iter()
        .map(|(k, v)| (k, (v * 100.0).round() / 100.0))
        .collect()
}

/// Canonical soft skills mentioned anywhere in `text`.
pub fn extract_soft_skills(text: &str) -> BTreeSet<String> {
    SOFT_SKILL_LEXICON
        .iter()
        .filter(|(canonical, _)| soft_skill_frequency(text, canonical) > 0)
        .map(|(canonical, _)| canonical.to_string())
        .collect()
}

/// How many times any phrasing of the canonical soft skill appears in `text`.
pub fn soft_skill_frequency(text: &str, canonical: &str) -> usize {
    let phrasings = soft_skill_phrasings(canonical);
    let pattern = term_pattern(phrasings.into_iter());
    count_mentions(&pattern, text)
}

fn compose_description(raw: &RawOffering) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(description) = raw.job_description.as_deref() {
        if !description.trim().is_empty() {
            parts.push(description.trim());
        }
    }
    parts.extend(raw.job_highlights.qualifications.iter().map(|s| s.trim()));
    parts.extend(raw.job_highlights.responsibilities.iter().map(|s| s.trim()));
    parts.retain(|p| !p.is_empty());
    parts.join("\n")
}

fn compose_location(raw: &RawOffering) -> Option<String> {
    let parts: Vec<String> = [raw.job_city.as_deref(), raw.job_country.as_deref()]
        .into_iter()
        .filter_map(non_blank)
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn compose_salary(min: Option<f64>, max: Option<f64>) -> Option<SalaryRange> {
    let valid = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
    match (valid(min), valid(max)) {
        (Some(lo), Some(hi)) => Some(SalaryRange::new(lo, hi)),
        (Some(v), None) | (None, Some(v)) => Some(SalaryRange::new(v, v)),
        (None, None) => None,
    }
}

fn remote_policy(raw: &RawOffering) -> Option<RemotePolicy> {
    let explicit = raw.job_workplace_type.as_deref().and_then(|w| {
        match w.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "remote" => Some(RemotePolicy::Remote),
            "hybrid" => Some(RemotePolicy::Hybrid),
            "on site" | "onsite" | "office" => Some(RemotePolicy::OnSite),
            _ => None,
        }
    });
    explicit.or(match raw.job_is_remote {
        Some(true) => Some(RemotePolicy::Remote),
        Some(false) => Some(RemotePolicy::OnSite),
        None => None,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
