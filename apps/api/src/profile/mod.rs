//! Profile construction: turns configuration text into a normalized `Profile`.
//!
//! Scoring never sees raw text: everything fuzzy about reading a profile stays
//! behind `ProfileParser`. Two backends ship:
//! - `TextProfileParser`: the sectioned plain-text format below.
//! - `JsonProfileParser`: a serialized `ProfileDocument`.
//!
//! ```text
//! [skills]
//! python: high, recent
//! sql
//!
//! [education]
//! BSc Computer Science | Example University | 2018 | algorithms, databases
//!
//! [experience]
//! Backend Engineer | Acme | 2021-03 | present | python, aws | Built payment APIs
//!
//! [preferences]
//! industries: fintech, healthcare
//! company_size: 50-500
//! remote: hybrid
//! salary_floor: 90k
//! locations: Berlin, Munich
//! soft_skills: communication, leadership
//! available_from: 2026-11-01
//! max_commute_minutes: 45
//! ```

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::profile::{
    EducationRecord, ExperienceRecord, Preferences, Proficiency, Profile, ProfileDocument,
    RemoteTolerance, SizeRange, SkillEntry, SkillSource,
};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("JSON profile error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read profile: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile construction backend. Implementations must be deterministic.
pub trait ProfileParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Profile, ProfileError>;
}

pub struct JsonProfileParser;

impl ProfileParser for JsonProfileParser {
    fn parse(&self, text: &str) -> Result<Profile, ProfileError> {
        let doc: ProfileDocument = serde_json::from_str(text)?;
        Ok(Profile::from_document(doc))
    }
}

pub struct TextProfileParser;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Skills,
    Education,
    Experience,
    Preferences,
}

impl ProfileParser for TextProfileParser {
    fn parse(&self, text: &str) -> Result<Profile, ProfileError> {
        let mut section = Section::None;
        let mut doc = ProfileDocument::default();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                section = match line[1..line.len() - 1].trim().to_lowercase().as_str() {
                    "skills" => Section::Skills,
                    "education" => Section::Education,
                    "experience" => Section::Experience,
                    "preferences" => Section::Preferences,
                    other => return Err(syntax(line_no, format!("unknown section '{other}'"))),
                };
                continue;
            }

            match section {
                Section::None => {
                    return Err(syntax(line_no, "content before the first section header"))
                }
                Section::Skills => doc.skills.push(parse_skill(line)),
                Section::Education => doc.education.push(parse_education(line, line_no)?),
                Section::Experience => doc.experience.push(parse_experience(line, line_no)?),
                Section::Preferences => apply_preference(&mut doc.preferences, line, line_no)?,
            }
        }

        debug!(
            skills = doc.skills.len(),
            roles = doc.experience.len(),
            credentials = doc.education.len(),
            "Parsed profile text"
        );
        Ok(Profile::from_document(doc))
    }
}

/// Reads a profile file, choosing the parser by extension (`.json` or text).
pub fn load_profile(path: &Path) -> Result<Profile, ProfileError> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let profile = if is_json {
        JsonProfileParser.parse(&text)?
    } else {
        TextProfileParser.parse(&text)?
    };

    info!(
        skills = profile.skills.len(),
        roles = profile.experience.len(),
        "Profile loaded from {}",
        path.display()
    );
    Ok(profile)
}

fn syntax(line: usize, message: impl Into<String>) -> ProfileError {
    ProfileError::Syntax {
        line,
        message: message.into(),
    }
}

/// `name[: qualifier, qualifier]`. Qualifiers are a proficiency and/or `recent`.
fn parse_skill(line: &str) -> SkillEntry {
    let (name, qualifiers) = line.split_once(':').unwrap_or((line, ""));
    let mut entry = SkillEntry {
        name: name.trim().to_string(),
        proficiency: Proficiency::Medium,
        recent: false,
        source: SkillSource::Declared,
    };
    for qualifier in split_list(qualifiers) {
        if qualifier.eq_ignore_ascii_case("recent") || qualifier.eq_ignore_ascii_case("current") {
            entry.recent = true;
        } else if let Some(p) = Proficiency::parse(&qualifier) {
            entry.proficiency = p;
        }
    }
    entry
}

fn parse_education(line: &str, line_no: usize) -> Result<EducationRecord, ProfileError> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let credential = fields[0];
    if credential.is_empty() {
        return Err(syntax(line_no, "education entry needs a credential"));
    }
    let year = match fields.get(2).filter(|f| !f.is_empty()) {
        Some(raw) => Some(
            raw.parse::<i32>()
                .map_err(|_| syntax(line_no, format!("invalid year '{raw}'")))?,
        ),
        None => None,
    };
    Ok(EducationRecord {
        credential: credential.to_string(),
        institution: fields.get(1).unwrap_or(&"").to_string(),
        year,
        skills: fields.get(3).map(|f| split_list(f)).unwrap_or_default(),
    })
}

/// `title | company | start | end | skills | responsibilities`
fn parse_experience(line: &str, line_no: usize) -> Result<ExperienceRecord, ProfileError> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < 3 || fields[0].is_empty() {
        return Err(syntax(
            line_no,
            "experience entry needs at least 'title | company | start'",
        ));
    }
    let start = parse_date(fields[2])
        .ok_or_else(|| syntax(line_no, format!("invalid start date '{}'", fields[2])))?;
    let end = match fields.get(3).copied().unwrap_or("") {
        "" => None,
        raw if is_present(raw) => None,
        raw => Some(parse_date(raw).ok_or_else(|| syntax(line_no, format!("invalid end date '{raw}'")))?),
    };
    if end.is_some_and(|end| end < start) {
        return Err(syntax(line_no, "experience ends before it starts"));
    }
    Ok(ExperienceRecord {
        title: fields[0].to_string(),
        company: Some(fields[1]).filter(|c| !c.is_empty()).map(str::to_string),
        start,
        end,
        skills: fields.get(4).map(|f| split_list(f)).unwrap_or_default(),
        responsibilities: fields.get(5).unwrap_or(&"").to_string(),
    })
}

fn apply_preference(
    prefs: &mut Preferences,
    line: &str,
    line_no: usize,
) -> Result<(), ProfileError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| syntax(line_no, "preference must be 'key: value'"))?;
    let value = value.trim();

    match key.trim().to_lowercase().replace(' ', "_").as_str() {
        "industries" | "industry" => prefs.industries.extend(split_list(value)),
        "company_size" => prefs.company_size = Some(parse_size_range(value, line_no)?),
        "remote" | "remote_work" => {
            prefs.remote = RemoteTolerance::parse(value)
                .ok_or_else(|| syntax(line_no, format!("unknown remote tolerance '{value}'")))?
        }
        "salary_floor" | "min_salary" => {
            prefs.salary_floor = Some(
                parse_amount(value)
                    .ok_or_else(|| syntax(line_no, format!("invalid salary '{value}'")))?,
            )
        }
        "locations" | "location" => prefs.locations.extend(split_list(value)),
        "soft_skills" | "soft_skill_affinities" => prefs.soft_skill_affinities.extend(split_list(value)),
        "available_from" | "availability" => {
            prefs.available_from = Some(
                parse_date(value)
                    .ok_or_else(|| syntax(line_no, format!("invalid date '{value}'")))?,
            )
        }
        "max_commute_minutes" | "max_commute" => {
            prefs.max_commute_minutes = Some(
                value
                    .trim_end_matches("min")
                    .trim()
                    .parse()
                    .map_err(|_| syntax(line_no, format!("invalid commute '{value}'")))?,
            )
        }
        other => return Err(syntax(line_no, format!("unknown preference '{other}'"))),
    }
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_present(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "present" | "current" | "now")
}

/// Accepts `YYYY-MM-DD` or `YYYY-MM` (first of the month).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
}

/// `90000`, `90,000`, `90k`, `$90k`.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let lower = cleaned.to_lowercase();
    let amount = match lower.strip_suffix('k') {
        Some(thousands) => thousands.trim().parse::<f64>().ok().map(|v| v * 1000.0),
        None => lower.parse::<f64>().ok(),
    };
    amount.filter(|v| v.is_finite() && *v >= 0.0)
}

/// `50-500`, `50+`, or a single number meaning at least that many.
fn parse_size_range(raw: &str, line_no: usize) -> Result<SizeRange, ProfileError> {
    let invalid = || syntax(line_no, format!("invalid company size '{raw}'"));
    let raw = raw.trim();
    if let Some((lo, hi)) = raw.split_once('-') {
        let min: u32 = lo.trim().parse().map_err(|_| invalid())?;
        let max: u32 = hi.trim().parse().map_err(|_| invalid())?;
        if max < min {
            return Err(invalid());
        }
        return Ok(SizeRange { min, max: Some(max) });
    }
    let min: u32 = raw.trim_end_matches('+').trim().parse().map_err(|_| invalid())?;
    Ok(SizeRange { min, max: None })
}
