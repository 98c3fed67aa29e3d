//! Scoring Engine: Candidate Rank and Offering Rank for one (profile, offering) pair.
//!
//! Default backend: `WeightedRankScorer`.
//! `AppState` holds an `Arc<dyn RankScorer>` so the backend can be swapped
//! without touching the pipeline or the handlers.
//!
//! Both scores live on a 0–100 scale. Every factor that moved either score is
//! listed in `explanations` with its signed contribution in score points.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::matching::recency::{compute_recency_score, DEFAULT_HALF_LIFE_MONTHS};
use crate::models::offering::{Offering, RemotePolicy};
use crate::models::profile::{Preferences, Profile, RemoteTolerance, SkillSource};
use crate::models::skills::normalize_skill;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Candidate,
    Offering,
}

/// One factor → contribution statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub score: ScoreKind,
    pub factor: String,
    /// Signed contribution in points of `score`'s 0–100 scale.
    pub contribution: f64,
    pub detail: String,
}

impl Explanation {
    /// Compact form for tabular display, e.g. `python match (+50.0)`.
    pub fn render(&self) -> String {
        format!("{} ({:+.1})", self.factor, self.contribution)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankResult {
    pub candidate_score: f64,
    pub offering_score: f64,
    /// Ordered by absolute contribution, largest first.
    pub explanations: Vec<Explanation>,
    pub matched_skills: BTreeSet<String>,
    pub unmatched_skills: BTreeSet<String>,
    /// Recency of the most recent role using any matched skill (0–1).
    /// The only tie-break between equal Candidate Ranks.
    pub experience_recency: f64,
    pub scorer_backend: String,
}

impl RankResult {
    pub fn explanations_for(&self, kind: ScoreKind) -> impl Iterator<Item = &Explanation> {
        self.explanations.iter().filter(move |e| e.score == kind)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The rank scorer trait. Implement this to swap backends without touching
/// the pipeline, handler, or caller code.
///
/// Carried in `AppState` as `Arc<dyn RankScorer>`.
pub trait RankScorer: Send + Sync {
    fn score(
        &self,
        profile: &Profile,
        offering: &Offering,
        config: &ScoringConfig,
    ) -> Result<RankResult, MatchError>;

    /// Backend name recorded in every RankResult.
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Reference date for experience recency. Fixed per run.
    pub as_of: NaiveDate,
    pub half_life_months: f64,
}

impl ScoringConfig {
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            half_life_months: DEFAULT_HALF_LIFE_MONTHS,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedRankScorer: default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Recency multiplier for declared skills not flagged as recent.
const STALE_SKILL_FACTOR: f64 = 0.85;

/// Bounds of each Offering Rank term. A term never leaves `[-bound, +bound]`.
const INDUSTRY_BOUND: f64 = 15.0;
const COMPANY_SIZE_BOUND: f64 = 10.0;
const REMOTE_BOUND: f64 = 15.0;
const SALARY_BOUND: f64 = 20.0;
const START_DATE_BOUND: f64 = 10.0;
const LOCATION_BOUND: f64 = 10.0;
const COMMUTE_BOUND: f64 = 10.0;
const SOFT_SKILL_BOUND: f64 = 10.0;
const OFFERING_BOUND_TOTAL: f64 = INDUSTRY_BOUND
    + COMPANY_SIZE_BOUND
    + REMOTE_BOUND
    + SALARY_BOUND
    + START_DATE_BOUND
    + LOCATION_BOUND
    + COMMUTE_BOUND
    + SOFT_SKILL_BOUND;

/// Relative distance from the salary floor at which the salary term saturates.
const SALARY_SATURATION: f64 = 0.25;
/// Days after availability at which an early start stops earning credit.
const START_DATE_HORIZON_DAYS: f64 = 180.0;
/// Days before availability at which the start-date penalty saturates.
const START_DATE_CONFLICT_DAYS: f64 = 90.0;

/// Skill-overlap + preference-alignment scorer.
///
/// Candidate Rank:
/// 1. For each required skill (emphasis w):
///    - matched → strength s from proficiency, recency and recent roles (0–1]
///    - unmatched → counted against the score
/// 2. candidate = 100 × S / (S + U), S = Σ w·s over matched, U = Σ w over unmatched
///
/// Offering Rank: bounded terms c_i ∈ [-B_i, B_i], missing data → 0.
///    offering = 100 × (Σ c_i + Σ B_i) / (2 Σ B_i)
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRankScorer;

impl RankScorer for WeightedRankScorer {
    fn score(
        &self,
        profile: &Profile,
        offering: &Offering,
        config: &ScoringConfig,
    ) -> Result<RankResult, MatchError> {
        let requirements = normalized_requirements(offering)?;

        let candidate = candidate_rank(profile, &requirements, config);
        let (offering_score, offering_explanations) =
            offering_rank(&profile.preferences, offering);

        let mut explanations = candidate.explanations;
        explanations.extend(offering_explanations);
        sort_explanations(&mut explanations);

        Ok(RankResult {
            candidate_score: candidate.score,
            offering_score,
            explanations,
            matched_skills: candidate.matched,
            unmatched_skills: candidate.unmatched,
            experience_recency: candidate.recency,
            scorer_backend: self.backend().to_string(),
        })
    }

    fn backend(&self) -> &'static str {
        "weighted"
    }
}

fn normalized_requirements(offering: &Offering) -> Result<BTreeMap<String, f64>, MatchError> {
    let mut requirements: BTreeMap<String, f64> = BTreeMap::new();
    for (skill, weight) in &offering.required_skills {
        let name = normalize_skill(skill);
        if name.is_empty() || !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        let slot = requirements.entry(name).or_insert(0.0);
        *slot = slot.max(*weight);
    }

    if requirements.is_empty() {
        let reason = if offering.raw_description.trim().is_empty() {
            "offering has no description text and no listed skills"
        } else {
            "no recognizable required skills in the offering description"
        };
        return Err(MatchError::InsufficientData(reason.to_string()));
    }
    Ok(requirements)
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate Rank
// ────────────────────────────────────────────────────────────────────────────

struct CandidateRank {
    score: f64,
    explanations: Vec<Explanation>,
    matched: BTreeSet<String>,
    unmatched: BTreeSet<String>,
    recency: f64,
}

struct SkillEvidence {
    strength: f64,
    role_recency: f64,
    source: String,
}

fn candidate_rank(
    profile: &Profile,
    requirements: &BTreeMap<String, f64>,
    config: &ScoringConfig,
) -> CandidateRank {
    let mut matched_terms: Vec<(&str, f64, SkillEvidence)> = Vec::new();
    let mut unmatched_terms: Vec<(&str, f64)> = Vec::new();

    for (skill, &weight) in requirements {
        match skill_evidence(profile, skill, config) {
            Some(evidence) => matched_terms.push((skill.as_str(), weight, evidence)),
            None => unmatched_terms.push((skill.as_str(), weight)),
        }
    }

    let matched_total: f64 = matched_terms.iter().map(|(_, w, e)| w * e.strength).sum();
    let unmatched_total: f64 = unmatched_terms.iter().map(|(_, w)| w).sum();
    let denominator = matched_total + unmatched_total;

    let mut explanations = Vec::new();
    for (skill, weight, evidence) in &matched_terms {
        explanations.push(Explanation {
            score: ScoreKind::Candidate,
            factor: format!("{skill} match"),
            contribution: round2(100.0 * weight * evidence.strength / denominator),
            detail: format!(
                "emphasis {weight:.2} × strength {:.2} ({})",
                evidence.strength, evidence.source
            ),
        });
    }
    for (skill, weight) in &unmatched_terms {
        explanations.push(Explanation {
            score: ScoreKind::Candidate,
            factor: format!("{skill} missing"),
            contribution: round2(-100.0 * weight / denominator),
            detail: format!("emphasis {weight:.2}, not in profile"),
        });
    }

    let recency = matched_terms
        .iter()
        .map(|(_, _, e)| e.role_recency)
        .fold(0.0_f64, f64::max);

    CandidateRank {
        score: round2(100.0 * matched_total / denominator),
        explanations,
        matched: matched_terms.iter().map(|(s, _, _)| s.to_string()).collect(),
        unmatched: unmatched_terms.iter().map(|(s, _)| s.to_string()).collect(),
        recency: round4(recency),
    }
}

/// Strength of the profile's evidence for `skill`, or `None` when the skill
/// does not resolve to a profile entry.
fn skill_evidence(profile: &Profile, skill: &str, config: &ScoringConfig) -> Option<SkillEvidence> {
    let entry = profile.skill(skill)?;

    let entry_strength =
        entry.proficiency.weight() * if entry.recent { 1.0 } else { STALE_SKILL_FACTOR };

    let role_recency = profile
        .roles_using(skill)
        .map(|role| compute_recency_score(role.end, config.as_of, config.half_life_months))
        .fold(0.0_f64, f64::max);
    let role_strength = if profile.roles_using(skill).next().is_some() {
        0.5 + 0.5 * role_recency
    } else {
        0.0
    };

    let source = match entry.source {
        SkillSource::Declared => "declared",
        SkillSource::Experience => "experience",
        SkillSource::Education => "education",
    };
    let source = if role_strength > entry_strength {
        format!("{source}, recent role")
    } else {
        format!("{source}, {:?} proficiency", entry.proficiency).to_lowercase()
    };

    Some(SkillEvidence {
        strength: entry_strength.max(role_strength).clamp(0.0, 1.0),
        role_recency,
        source,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Offering Rank
// ────────────────────────────────────────────────────────────────────────────

struct Term {
    factor: String,
    value: f64,
    detail: String,
}

impl Term {
    fn new(factor: &str, value: f64, detail: impl Into<String>) -> Self {
        Self {
            factor: factor.to_string(),
            value,
            detail: detail.into(),
        }
    }

    fn neutral(factor: &str) -> Self {
        Self::new(factor, 0.0, "neutral: no penalty, no reward")
    }
}

fn offering_rank(prefs: &Preferences, offering: &Offering) -> (f64, Vec<Explanation>) {
    let terms = [
        industry_term(prefs, offering),
        company_size_term(prefs, offering),
        remote_term(prefs, offering),
        salary_term(prefs, offering),
        start_date_term(prefs, offering),
        location_term(prefs, offering),
        commute_term(prefs, offering),
        soft_skill_term(prefs, offering),
    ];

    let total: f64 = terms.iter().map(|t| t.value).sum();
    let score = round2(100.0 * (total + OFFERING_BOUND_TOTAL) / (2.0 * OFFERING_BOUND_TOTAL));
    let points_per_unit = 100.0 / (2.0 * OFFERING_BOUND_TOTAL);

    let explanations = terms
        .into_iter()
        .map(|t| Explanation {
            score: ScoreKind::Offering,
            factor: t.factor,
            contribution: round2(t.value * points_per_unit),
            detail: t.detail,
        })
        .collect();

    (score, explanations)
}

fn industry_term(prefs: &Preferences, offering: &Offering) -> Term {
    if prefs.industries.is_empty() {
        return Term::neutral("no industry preference");
    }
    let Some(industry) = offering.industry.as_deref() else {
        return Term::neutral("industry data unavailable");
    };
    let industry = industry.to_lowercase();
    let hit = prefs
        .industries
        .iter()
        .any(|wanted| phrases_overlap(wanted, &industry));
    if hit {
        Term::new("industry match", INDUSTRY_BOUND, industry)
    } else {
        Term::new("industry mismatch", -INDUSTRY_BOUND * 2.0 / 3.0, industry)
    }
}

fn company_size_term(prefs: &Preferences, offering: &Offering) -> Term {
    let Some(range) = prefs.company_size else {
        return Term::neutral("no company-size preference");
    };
    let Some(size) = offering.company_size else {
        return Term::neutral("company size unavailable");
    };
    let detail = format!("{size} employees");
    if range.contains(size) {
        Term::new("company size in range", COMPANY_SIZE_BOUND, detail)
    } else {
        Term::new("company size out of range", -COMPANY_SIZE_BOUND, detail)
    }
}

fn remote_term(prefs: &Preferences, offering: &Offering) -> Term {
    let Some(policy) = offering.remote_policy else {
        return Term::neutral("remote policy unavailable");
    };
    let value = match (prefs.remote, policy) {
        (RemoteTolerance::Any, _) => 5.0,
        (RemoteTolerance::RemoteOnly, RemotePolicy::Remote) => 15.0,
        (RemoteTolerance::RemoteOnly, RemotePolicy::Hybrid) => -5.0,
        (RemoteTolerance::RemoteOnly, RemotePolicy::OnSite) => -15.0,
        (RemoteTolerance::Hybrid, RemotePolicy::Remote) => 10.0,
        (RemoteTolerance::Hybrid, RemotePolicy::Hybrid) => 15.0,
        (RemoteTolerance::Hybrid, RemotePolicy::OnSite) => -5.0,
        (RemoteTolerance::OnSite, RemotePolicy::OnSite) => 15.0,
        (RemoteTolerance::OnSite, RemotePolicy::Hybrid) => 5.0,
        (RemoteTolerance::OnSite, RemotePolicy::Remote) => -5.0,
    };
    let factor = if value >= REMOTE_BOUND {
        "remote policy match"
    } else if value > 0.0 {
        "remote policy acceptable"
    } else {
        "remote policy mismatch"
    };
    Term::new(factor, value, format!("{policy:?} vs {:?}", prefs.remote).to_lowercase())
}

/// Monotone in the salary midpoint: saturates at ±25% around the floor.
fn salary_term(prefs: &Preferences, offering: &Offering) -> Term {
    let Some(floor) = prefs.salary_floor.filter(|f| *f > 0.0) else {
        return Term::neutral("no salary floor set");
    };
    let Some(range) = offering.salary_range else {
        return Term::neutral("salary data unavailable");
    };
    let delta = (range.midpoint() - floor) / floor;
    let value = SALARY_BOUND * (delta / SALARY_SATURATION).clamp(-1.0, 1.0);
    let factor = if value > 0.0 {
        "salary above floor"
    } else if value < 0.0 {
        "salary below floor"
    } else {
        "salary at floor"
    };
    Term::new(
        factor,
        value,
        format!("midpoint {:.0} vs floor {floor:.0}", range.midpoint()),
    )
}

fn start_date_term(prefs: &Preferences, offering: &Offering) -> Term {
    let Some(available) = prefs.available_from else {
        return Term::neutral("no availability date set");
    };
    let Some(start) = offering.start_date else {
        return Term::neutral("start date unavailable");
    };
    let days = (start - available).num_days() as f64;
    if days >= 0.0 {
        let value = START_DATE_BOUND * (1.0 - days.min(START_DATE_HORIZON_DAYS) / START_DATE_HORIZON_DAYS);
        Term::new(
            "start date after availability",
            value,
            format!("starts {days:.0} days after availability"),
        )
    } else {
        let value = -START_DATE_BOUND * (-days).min(START_DATE_CONFLICT_DAYS) / START_DATE_CONFLICT_DAYS;
        Term::new(
            "start date before availability",
            value,
            format!("starts {:.0} days before availability", -days),
        )
    }
}

fn location_term(prefs: &Preferences, offering: &Offering) -> Term {
    if offering.remote_policy == Some(RemotePolicy::Remote) {
        return Term::neutral("remote role, location not applicable");
    }
    if prefs.locations.is_empty() {
        return Term::neutral("no location preference");
    }
    let Some(location) = offering.location.as_deref() else {
        return Term::neutral("location unavailable");
    };
    let hit = prefs
        .locations
        .iter()
        .any(|wanted| phrases_overlap(wanted, location));
    if hit {
        Term::new("location match", LOCATION_BOUND, location)
    } else {
        Term::new("location mismatch", -LOCATION_BOUND, location)
    }
}

fn commute_term(prefs: &Preferences, offering: &Offering) -> Term {
    let Some(limit) = prefs.max_commute_minutes else {
        return Term::neutral("no commute limit set");
    };
    if offering.remote_policy == Some(RemotePolicy::Remote) {
        return Term::neutral("remote role, no commute");
    }
    let Some(minutes) = offering.commute_minutes else {
        return Term::neutral("commute data unavailable");
    };
    let detail = format!("{minutes} min vs limit {limit} min");
    let (minutes, limit) = (minutes as f64, limit as f64);
    if minutes <= limit {
        let value = if limit > 0.0 {
            COMMUTE_BOUND * (1.0 - minutes / limit)
        } else {
            COMMUTE_BOUND
        };
        Term::new("commute within limit", value, detail)
    } else {
        let over = if limit > 0.0 { (minutes - limit) / limit } else { 1.0 };
        Term::new("commute over limit", -COMMUTE_BOUND * over.min(1.0), detail)
    }
}

fn soft_skill_term(prefs: &Preferences, offering: &Offering) -> Term {
    if prefs.soft_skill_affinities.is_empty() {
        return Term::neutral("no soft-skill affinities set");
    }
    if offering.soft_skills_mentioned.is_empty() {
        return Term::neutral("soft-skill data unavailable");
    }
    let shared: Vec<&str> = prefs
        .soft_skill_affinities
        .intersection(&offering.soft_skills_mentioned)
        .map(String::as_str)
        .collect();
    if shared.is_empty() {
        return Term::new("no soft-skill overlap", 0.0, "neutral: no shared soft skills");
    }
    Term::new(
        "soft-skill affinity",
        (5.0 * shared.len() as f64).min(SOFT_SKILL_BOUND),
        shared.join(", "),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Largest magnitude first; at equal magnitude gains before losses, then
/// Candidate before Offering, then factor label.
fn sort_explanations(explanations: &mut [Explanation]) {
    explanations.sort_by(|a, b| {
        b.contribution
            .abs()
            .total_cmp(&a.contribution.abs())
            .then_with(|| (b.contribution > 0.0).cmp(&(a.contribution > 0.0)))
            .then_with(|| a.score.cmp(&b.score))
            .then_with(|| a.factor.cmp(&b.factor))
    });
}

fn phrase_tokens(phrase: &str) -> BTreeSet<String> {
    phrase
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when every word of one phrase appears as a whole word in the other:
/// "berlin" meets "Berlin, DE", "ai" never meets "retail".
fn phrases_overlap(a: &str, b: &str) -> bool {
    let (a, b) = (phrase_tokens(a), phrase_tokens(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.is_subset(&b) || b.is_subset(&a)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::offering::SalaryRange;
    use crate::models::profile::{ExperienceRecord, Proficiency, SizeRange, SkillEntry};

    fn date(raw: &str) -> NaiveDate {
        raw.parse().unwrap()
    }

    fn score(profile: &Profile, offering: &Offering) -> Result<RankResult, MatchError> {
        WeightedRankScorer.score(profile, offering, &ScoringConfig::as_of(date("2026-10-01")))
    }

    fn skill(name: &str, proficiency: Proficiency, recent: bool) -> SkillEntry {
        SkillEntry {
            name: name.to_string(),
            proficiency,
            recent,
            source: SkillSource::Declared,
        }
    }

    fn role(title: &str, end: Option<&str>, skills: &[&str]) -> ExperienceRecord {
        ExperienceRecord {
            title: title.to_string(),
            company: None,
            start: date("2010-01-01"),
            end: end.map(date),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            responsibilities: String::new(),
        }
    }

    fn python_sql_profile() -> Profile {
        Profile::new(
            vec![
                skill("python", Proficiency::High, true),
                skill("sql", Proficiency::Medium, false),
            ],
            vec![],
            vec![],
            Preferences::default(),
        )
    }

    fn offering(skills: &[(&str, f64)]) -> Offering {
        Offering {
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            required_skills: skills.iter().map(|(s, w)| (s.to_string(), *w)).collect(),
            raw_description: "Build things.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_partial_overlap_lists_matched_and_unmatched() {
        let result = score(&python_sql_profile(), &offering(&[("python", 1.0), ("aws", 1.0)]))
            .unwrap();

        assert_eq!(result.matched_skills, BTreeSet::from(["python".to_string()]));
        assert_eq!(result.unmatched_skills, BTreeSet::from(["aws".to_string()]));
        assert!(
            result.candidate_score > 0.0 && result.candidate_score < 100.0,
            "Partial overlap should be strictly between 0 and 100, got {}",
            result.candidate_score
        );

        let python_pos = result
            .explanations
            .iter()
            .position(|e| e.factor == "python match")
            .expect("python match explained");
        let first_neutral = result
            .explanations
            .iter()
            .position(|e| e.contribution == 0.0)
            .expect("neutral factors present");
        assert!(python_pos < first_neutral, "python match must precede neutral factors");
    }

    #[test]
    fn test_full_match_scores_100() {
        let result = score(&python_sql_profile(), &offering(&[("python", 2.0), ("sql", 1.0)]))
            .unwrap();
        assert_eq!(result.candidate_score, 100.0);
        assert!(result.unmatched_skills.is_empty());
    }

    #[test]
    fn test_no_match_scores_zero() {
        let result = score(&python_sql_profile(), &offering(&[("rust", 1.0)]))
            .unwrap();
        assert_eq!(result.candidate_score, 0.0);
    }

    #[test]
    fn test_scores_are_deterministic() {
        let profile = python_sql_profile();
        let offer = offering(&[("python", 1.3), ("aws", 0.8), ("sql", 0.6)]);
        let first = score(&profile, &offer).unwrap();
        for _ in 0..5 {
            assert_eq!(score(&profile, &offer).unwrap(), first);
        }
    }

    #[test]
    fn test_adding_matched_skill_never_decreases_candidate_score() {
        let profile = Profile::new(
            vec![
                skill("python", Proficiency::High, true),
                skill("sql", Proficiency::Low, false),
                skill("docker", Proficiency::Medium, true),
            ],
            vec![],
            vec![],
            Preferences::default(),
        );
        let base = [("python", 1.0), ("aws", 2.0)];
        let before = score(&profile, &offering(&base)).unwrap().candidate_score;

        for (extra, weight) in [("sql", 0.1), ("sql", 5.0), ("docker", 1.0)] {
            let mut skills = base.to_vec();
            skills.push((extra, weight));
            let after = score(&profile, &offering(&skills)).unwrap().candidate_score;
            assert!(after >= before, "adding {extra}@{weight}: {after} < {before}");
        }
    }

    #[test]
    fn test_high_proficiency_recent_skill_is_stronger() {
        let strong = Profile::new(
            vec![skill("python", Proficiency::High, true)],
            vec![],
            vec![],
            Preferences::default(),
        );
        let weak = Profile::new(
            vec![skill("python", Proficiency::Low, false)],
            vec![],
            vec![],
            Preferences::default(),
        );
        let offer = offering(&[("python", 1.0), ("aws", 1.0)]);
        let strong_score = score(&strong, &offer).unwrap().candidate_score;
        let weak_score = score(&weak, &offer).unwrap().candidate_score;
        assert!(strong_score > weak_score);
    }

    #[test]
    fn test_explanations_sorted_by_magnitude() {
        let mut profile = python_sql_profile();
        profile.preferences.salary_floor = Some(100_000.0);
        profile.preferences.remote = RemoteTolerance::RemoteOnly;
        let mut offer = offering(&[("python", 1.0), ("aws", 3.0), ("sql", 0.5)]);
        offer.salary_range = Some(SalaryRange::new(70_000.0, 80_000.0));
        offer.remote_policy = Some(RemotePolicy::Hybrid);

        let result = score(&profile, &offer).unwrap();
        for pair in result.explanations.windows(2) {
            assert!(
                pair[0].contribution.abs() >= pair[1].contribution.abs(),
                "{:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_missing_salary_is_explicit_neutral_term() {
        let mut profile = python_sql_profile();
        profile.preferences.salary_floor = Some(90_000.0);
        let result = score(&profile, &offering(&[("python", 1.0)]))
            .unwrap();
        let salary = result
            .explanations
            .iter()
            .find(|e| e.factor == "salary data unavailable")
            .expect("salary factor explained");
        assert_eq!(salary.contribution, 0.0);
        assert_eq!(salary.score, ScoreKind::Offering);
    }

    #[test]
    fn test_all_missing_offering_data_is_neutral_50() {
        let mut profile = python_sql_profile();
        profile.preferences = Preferences {
            industries: BTreeSet::from(["fintech".to_string()]),
            company_size: Some(SizeRange { min: 10, max: Some(500) }),
            remote: RemoteTolerance::Hybrid,
            salary_floor: Some(90_000.0),
            locations: vec!["Berlin".to_string()],
            soft_skill_affinities: BTreeSet::from(["communication".to_string()]),
            available_from: Some(date("2026-11-01")),
            max_commute_minutes: Some(45),
        };
        let result = score(&profile, &offering(&[("python", 1.0)]))
            .unwrap();
        assert_eq!(result.offering_score, 50.0);
        assert!(result
            .explanations_for(ScoreKind::Offering)
            .all(|e| e.contribution == 0.0));
    }

    #[test]
    fn test_lower_salary_never_raises_offering_score() {
        let mut profile = python_sql_profile();
        profile.preferences.salary_floor = Some(100_000.0);
        let mut previous = f64::INFINITY;
        for midpoint in [140_000.0, 110_000.0, 100_000.0, 95_000.0, 80_000.0, 50_000.0, 10_000.0] {
            let mut offer = offering(&[("python", 1.0)]);
            offer.salary_range = Some(SalaryRange::new(midpoint, midpoint));
            let offering_score = score(&profile, &offer).unwrap().offering_score;
            assert!(offering_score <= previous, "salary {midpoint} raised score to {offering_score}");
            previous = offering_score;
        }
    }

    #[test]
    fn test_offering_score_bounded() {
        let mut profile = python_sql_profile();
        profile.preferences = Preferences {
            industries: BTreeSet::from(["fintech".to_string()]),
            company_size: Some(SizeRange { min: 10, max: Some(500) }),
            remote: RemoteTolerance::OnSite,
            salary_floor: Some(50_000.0),
            locations: vec!["Berlin".to_string()],
            soft_skill_affinities: BTreeSet::from(["communication".to_string(), "ownership".to_string()]),
            available_from: Some(date("2026-11-01")),
            max_commute_minutes: Some(45),
        };
        let mut offer = offering(&[("python", 1.0)]);
        offer.industry = Some("fintech".to_string());
        offer.company_size = Some(100);
        offer.remote_policy = Some(RemotePolicy::OnSite);
        offer.salary_range = Some(SalaryRange::new(200_000.0, 250_000.0));
        offer.location = Some("Berlin, DE".to_string());
        offer.start_date = Some(date("2026-11-01"));
        offer.commute_minutes = Some(0);
        offer.soft_skills_mentioned = BTreeSet::from(["communication".to_string(), "ownership".to_string()]);

        let result = score(&profile, &offer).unwrap();
        assert_eq!(result.offering_score, 100.0);
    }

    #[test]
    fn test_industry_matches_whole_words_only() {
        let mut profile = python_sql_profile();
        profile.preferences.industries = BTreeSet::from(["retail".to_string()]);
        let mut offer = offering(&[("python", 1.0)]);
        offer.industry = Some("ai".to_string());
        let result = score(&profile, &offer).unwrap();
        let industry = result
            .explanations_for(ScoreKind::Offering)
            .find(|e| e.factor.starts_with("industry"))
            .expect("industry factor explained");
        assert_eq!(industry.factor, "industry mismatch");
        assert!(industry.contribution < 0.0);

        profile.preferences.industries = BTreeSet::from(["it".to_string()]);
        offer.industry = Some("fintech".to_string());
        let result = score(&profile, &offer).unwrap();
        assert!(result
            .explanations_for(ScoreKind::Offering)
            .any(|e| e.factor == "industry mismatch"));

        offer.industry = Some("retail banking".to_string());
        profile.preferences.industries = BTreeSet::from(["retail".to_string()]);
        let result = score(&profile, &offer).unwrap();
        assert!(result
            .explanations_for(ScoreKind::Offering)
            .any(|e| e.factor == "industry match"));
    }

    #[test]
    fn test_location_matches_whole_words_only() {
        let mut profile = python_sql_profile();
        profile.preferences.locations = vec!["Berlin".to_string()];
        let mut offer = offering(&[("python", 1.0)]);
        offer.location = Some("Berlin, DE".to_string());
        let result = score(&profile, &offer).unwrap();
        assert!(result
            .explanations_for(ScoreKind::Offering)
            .any(|e| e.factor == "location match"));

        profile.preferences.locations = vec!["York".to_string()];
        offer.location = Some("New Yorkshire, UK".to_string());
        let result = score(&profile, &offer).unwrap();
        assert!(result
            .explanations_for(ScoreKind::Offering)
            .any(|e| e.factor == "location mismatch"));
    }

    #[test]
    fn test_start_date_neutral_without_availability() {
        let profile = python_sql_profile();
        assert_eq!(profile.preferences.available_from, None);
        let mut offer = offering(&[("python", 1.0)]);
        offer.start_date = Some(date("2026-10-05"));
        let result = score(&profile, &offer).unwrap();
        let start = result
            .explanations_for(ScoreKind::Offering)
            .find(|e| e.factor == "no availability date set")
            .expect("start date factor explained");
        assert_eq!(start.contribution, 0.0);
    }

    #[test]
    fn test_empty_offering_is_insufficient_data() {
        let mut offer = offering(&[]);
        offer.raw_description = "   ".to_string();
        let err = score(&python_sql_profile(), &offer).unwrap_err();
        assert!(matches!(err, MatchError::InsufficientData(_)));
    }

    #[test]
    fn test_recent_role_breaks_candidate_tie() {
        let profile = Profile::new(
            vec![
                skill("python", Proficiency::High, true),
                skill("go", Proficiency::High, true),
            ],
            vec![],
            vec![
                role("Current", None, &["python"]),
                role("Old", Some("2015-01-01"), &["go"]),
            ],
            Preferences::default(),
        );
        let recent = score(&profile, &offering(&[("python", 1.0)])).unwrap();
        let stale = score(&profile, &offering(&[("golang", 1.0)])).unwrap();
        assert_eq!(recent.candidate_score, stale.candidate_score);
        assert_eq!(recent.experience_recency, 1.0);
        assert!(recent.experience_recency > stale.experience_recency);
    }

    #[test]
    fn test_experience_only_skill_resolves_through_profile() {
        let profile = Profile::new(
            vec![],
            vec![],
            vec![role("Current", None, &["kubernetes"])],
            Preferences::default(),
        );
        let result = score(&profile, &offering(&[("k8s", 1.0)]))
            .unwrap();
        assert!(result.matched_skills.contains("kubernetes"));
        assert_eq!(result.candidate_score, 100.0);
    }

    #[test]
    fn test_explanation_render_is_signed() {
        let e = Explanation {
            score: ScoreKind::Candidate,
            factor: "aws missing".to_string(),
            contribution: -12.5,
            detail: String::new(),
        };
        assert_eq!(e.render(), "aws missing (-12.5)");
    }
}
