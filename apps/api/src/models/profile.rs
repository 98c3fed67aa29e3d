use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::skills::{normalize_skill, normalize_soft_skill};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Low,
    #[default]
    Medium,
    High,
}

impl Proficiency {
    pub fn weight(self) -> f64 {
        match self {
            Proficiency::Low => 0.5,
            Proficiency::Medium => 0.75,
            Proficiency::High => 1.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "beginner" | "basic" => Some(Proficiency::Low),
            "medium" | "intermediate" | "mid" => Some(Proficiency::Medium),
            "high" | "expert" | "advanced" | "strong" => Some(Proficiency::High),
            _ => None,
        }
    }
}

/// Where a skill entry came from. Declared entries win over derived ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    Declared,
    Experience,
    Education,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default)]
    pub proficiency: Proficiency,
    #[serde(default)]
    pub recent: bool,
    #[serde(default = "declared")]
    pub source: SkillSource,
}

fn declared() -> SkillSource {
    SkillSource::Declared
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub credential: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// Courses or subjects that count as skill evidence.
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    pub start: NaiveDate,
    /// `None` means the role is current.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub responsibilities: String,
}

impl ExperienceRecord {
    pub fn uses_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteTolerance {
    RemoteOnly,
    Hybrid,
    OnSite,
    #[default]
    Any,
}

impl RemoteTolerance {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "remote" | "remote only" | "fully remote" => Some(RemoteTolerance::RemoteOnly),
            "hybrid" => Some(RemoteTolerance::Hybrid),
            "on site" | "onsite" | "office" | "in office" => Some(RemoteTolerance::OnSite),
            "any" | "flexible" => Some(RemoteTolerance::Any),
            _ => None,
        }
    }
}

/// Inclusive employee-count range; `max: None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl SizeRange {
    pub fn contains(&self, size: u32) -> bool {
        size >= self.min && self.max.map_or(true, |max| size <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub industries: BTreeSet<String>,
    pub company_size: Option<SizeRange>,
    pub remote: RemoteTolerance,
    pub salary_floor: Option<f64>,
    pub locations: Vec<String>,
    pub soft_skill_affinities: BTreeSet<String>,
    pub available_from: Option<NaiveDate>,
    pub max_commute_minutes: Option<u32>,
}

/// The user's normalized profile. Built once per run and shared read-only.
///
/// `skills` holds every skill scoring may reference: declared entries plus
/// entries derived from experience and education, keyed by normalized name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub skills: BTreeMap<String, SkillEntry>,
    pub education: Vec<EducationRecord>,
    pub experience: Vec<ExperienceRecord>,
    pub preferences: Preferences,
}

/// Serialized profile shape accepted from JSON configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileDocument {
    pub skills: Vec<SkillEntry>,
    pub education: Vec<EducationRecord>,
    pub experience: Vec<ExperienceRecord>,
    pub preferences: Preferences,
}

impl Profile {
    /// Normalizes every skill name, orders experience most recent first and
    /// folds experience/education skills into the skill index.
    pub fn new(
        declared_skills: Vec<SkillEntry>,
        education: Vec<EducationRecord>,
        experience: Vec<ExperienceRecord>,
        preferences: Preferences,
    ) -> Self {
        let mut skills = BTreeMap::new();
        for mut entry in declared_skills {
            let name = normalize_skill(&entry.name);
            if name.is_empty() {
                continue;
            }
            entry.name = name.clone();
            entry.source = SkillSource::Declared;
            // A repeated declaration keeps the stronger proficiency.
            skills
                .entry(name)
                .and_modify(|existing: &mut SkillEntry| {
                    existing.proficiency = existing.proficiency.max(entry.proficiency);
                    existing.recent |= entry.recent;
                })
                .or_insert(entry);
        }

        let mut experience: Vec<ExperienceRecord> = experience
            .into_iter()
            .map(|mut role| {
                role.skills = normalize_all(&role.skills);
                role
            })
            .collect();
        // Current roles first, then by end date, then by start date.
        experience.sort_by(|a, b| {
            let a_end = a.end.unwrap_or(NaiveDate::MAX);
            let b_end = b.end.unwrap_or(NaiveDate::MAX);
            b_end.cmp(&a_end).then(b.start.cmp(&a.start))
        });

        for role in &experience {
            for skill in &role.skills {
                skills.entry(skill.clone()).or_insert_with(|| SkillEntry {
                    name: skill.clone(),
                    proficiency: Proficiency::Medium,
                    recent: role.end.is_none(),
                    source: SkillSource::Experience,
                });
            }
        }

        let education: Vec<EducationRecord> = education
            .into_iter()
            .map(|mut record| {
                record.skills = normalize_all(&record.skills);
                record
            })
            .collect();

        for record in &education {
            for skill in &record.skills {
                skills.entry(skill.clone()).or_insert_with(|| SkillEntry {
                    name: skill.clone(),
                    proficiency: Proficiency::Low,
                    recent: false,
                    source: SkillSource::Education,
                });
            }
        }

        let mut preferences = preferences;
        preferences.industries = preferences
            .industries
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();
        preferences.soft_skill_affinities = preferences
            .soft_skill_affinities
            .iter()
            .map(|s| normalize_soft_skill(s))
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            skills,
            education,
            experience,
            preferences,
        }
    }

    pub fn from_document(doc: ProfileDocument) -> Self {
        Self::new(doc.skills, doc.education, doc.experience, doc.preferences)
    }

    pub fn skill(&self, name: &str) -> Option<&SkillEntry> {
        self.skills.get(name)
    }

    /// Roles that list `skill`, most recent first.
    pub fn roles_using<'a>(&'a self, skill: &'a str) -> impl Iterator<Item = &'a ExperienceRecord> {
        self.experience.iter().filter(move |role| role.uses_skill(skill))
    }
}

fn normalize_all(skills: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, proficiency: Proficiency, recent: bool) -> SkillEntry {
        SkillEntry {
            name: name.to_string(),
            proficiency,
            recent,
            source: SkillSource::Declared,
        }
    }

    fn role(title: &str, start: &str, end: Option<&str>, skills: &[&str]) -> ExperienceRecord {
        ExperienceRecord {
            title: title.to_string(),
            company: None,
            start: start.parse().unwrap(),
            end: end.map(|e| e.parse().unwrap()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            responsibilities: String::new(),
        }
    }

    #[test]
    fn test_declared_skills_are_normalized() {
        let profile = Profile::new(
            vec![skill("  Python ", Proficiency::High, true), skill("JS", Proficiency::Low, false)],
            vec![],
            vec![],
            Preferences::default(),
        );
        assert!(profile.skill("python").is_some());
        assert!(profile.skill("javascript").is_some());
    }

    #[test]
    fn test_duplicate_declaration_keeps_stronger_proficiency() {
        let profile = Profile::new(
            vec![skill("sql", Proficiency::Low, false), skill("SQL", Proficiency::High, false)],
            vec![],
            vec![],
            Preferences::default(),
        );
        assert_eq!(profile.skill("sql").unwrap().proficiency, Proficiency::High);
    }

    #[test]
    fn test_experience_skills_are_indexed_with_source() {
        let profile = Profile::new(
            vec![skill("python", Proficiency::High, true)],
            vec![],
            vec![role("Engineer", "2020-01-01", None, &["Python", "k8s"])],
            Preferences::default(),
        );
        assert_eq!(profile.skill("python").unwrap().source, SkillSource::Declared);
        let derived = profile.skill("kubernetes").unwrap();
        assert_eq!(derived.source, SkillSource::Experience);
        assert!(derived.recent, "skill from a current role counts as recent");
    }

    #[test]
    fn test_experience_ordered_most_recent_first() {
        let profile = Profile::new(
            vec![],
            vec![],
            vec![
                role("Old", "2015-01-01", Some("2017-01-01"), &[]),
                role("Current", "2021-01-01", None, &[]),
                role("Middle", "2017-02-01", Some("2020-12-01"), &[]),
            ],
            Preferences::default(),
        );
        let titles: Vec<_> = profile.experience.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Current", "Middle", "Old"]);
    }

    #[test]
    fn test_education_courses_become_low_proficiency_skills() {
        let profile = Profile::new(
            vec![],
            vec![EducationRecord {
                credential: "BSc".to_string(),
                institution: "Uni".to_string(),
                year: Some(2018),
                skills: vec!["Statistics".to_string()],
            }],
            vec![],
            Preferences::default(),
        );
        let entry = profile.skill("statistics").unwrap();
        assert_eq!(entry.source, SkillSource::Education);
        assert_eq!(entry.proficiency, Proficiency::Low);
    }

    #[test]
    fn test_size_range_open_ended() {
        let range = SizeRange { min: 50, max: None };
        assert!(range.contains(10_000));
        assert!(!range.contains(49));
    }

    #[test]
    fn test_remote_tolerance_parse() {
        assert_eq!(RemoteTolerance::parse("Remote-only"), Some(RemoteTolerance::RemoteOnly));
        assert_eq!(RemoteTolerance::parse("on_site"), Some(RemoteTolerance::OnSite));
        assert_eq!(RemoteTolerance::parse("sometimes"), None);
    }
}
