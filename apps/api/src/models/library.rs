use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::models::skills::{normalize_skill, normalize_soft_skill};

/// A named resume + cover-letter template pair sharing a skill focus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub resume: PathBuf,
    pub cover_letter: PathBuf,
    pub skills: BTreeSet<String>,
    pub soft_skills: BTreeSet<String>,
}

impl Category {
    pub fn skill_overlap(&self, matched: &BTreeSet<String>) -> usize {
        self.skills.intersection(matched).count()
    }

    pub fn soft_skill_overlap(&self, mentioned: &BTreeSet<String>) -> usize {
        self.soft_skills.intersection(mentioned).count()
    }
}

/// Category label → documents. Ordered by label so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryLibrary {
    pub categories: BTreeMap<String, Category>,
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    categories: BTreeMap<String, CategoryFile>,
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    resume: PathBuf,
    cover_letter: PathBuf,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    soft_skills: Vec<String>,
}

impl CategoryLibrary {
    /// Loads the library JSON. Relative document paths resolve against the
    /// directory containing the library file.
    pub fn load(path: &Path) -> Result<Self, MatchError> {
        let text = std::fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&text, base)
    }

    pub fn from_json(text: &str, base_dir: &Path) -> Result<Self, MatchError> {
        let file: LibraryFile = serde_json::from_str(text)
            .map_err(|e| MatchError::InvalidLibrary(format!("malformed library JSON: {e}")))?;

        let mut categories = BTreeMap::new();
        for (label, raw) in file.categories {
            let label = label.trim().to_string();
            if label.is_empty() {
                return Err(MatchError::InvalidLibrary(
                    "category label cannot be empty".to_string(),
                ));
            }
            let category = Category {
                resume: resolve(base_dir, raw.resume),
                cover_letter: resolve(base_dir, raw.cover_letter),
                skills: raw
                    .skills
                    .iter()
                    .map(|s| normalize_skill(s))
                    .filter(|s| !s.is_empty())
                    .collect(),
                soft_skills: raw
                    .soft_skills
                    .iter()
                    .map(|s| normalize_soft_skill(s))
                    .filter(|s| !s.is_empty())
                    .collect(),
            };
            if categories.insert(label.clone(), category).is_some() {
                return Err(MatchError::InvalidLibrary(format!(
                    "category '{label}' is declared twice"
                )));
            }
        }

        Ok(Self { categories })
    }

    /// Checks the library is usable for a run with the given fallback.
    pub fn validate(&self, fallback: Option<&str>) -> Result<(), MatchError> {
        if self.categories.is_empty() {
            return Err(MatchError::InvalidLibrary(
                "library declares no categories".to_string(),
            ));
        }
        if let Some(label) = fallback {
            if !self.categories.contains_key(label) {
                return Err(MatchError::InvalidLibrary(format!(
                    "fallback category '{label}' is not in the library"
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&Category> {
        self.categories.get(label)
    }

    /// Every technical skill any category declares.
    pub fn skill_vocabulary(&self) -> BTreeSet<String> {
        self.categories
            .values()
            .flat_map(|c| c.skills.iter().cloned())
            .collect()
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"{
        "categories": {
            "backend": {
                "resume": "backend/resume.pdf",
                "cover_letter": "backend/letter.txt",
                "skills": ["Python", "SQL", "postgres"],
                "soft_skills": ["Team Player"]
            },
            "frontend": {
                "resume": "/abs/frontend.pdf",
                "cover_letter": "frontend/letter.txt",
                "skills": ["JS", "CSS"]
            }
        }
    }"#;

    #[test]
    fn test_library_normalizes_skills_and_resolves_paths() {
        let library = CategoryLibrary::from_json(LIBRARY, Path::new("/lib")).unwrap();
        let backend = library.get("backend").unwrap();
        assert!(backend.skills.contains("postgresql"));
        assert!(backend.soft_skills.contains("teamwork"));
        assert_eq!(backend.resume, PathBuf::from("/lib/backend/resume.pdf"));

        let frontend = library.get("frontend").unwrap();
        assert_eq!(frontend.resume, PathBuf::from("/abs/frontend.pdf"));
        assert!(frontend.skills.contains("javascript"));
    }

    #[test]
    fn test_malformed_library_is_invalid() {
        let err = CategoryLibrary::from_json("{not json", Path::new(".")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_validate_rejects_unknown_fallback() {
        let library = CategoryLibrary::from_json(LIBRARY, Path::new(".")).unwrap();
        assert!(library.validate(Some("backend")).is_ok());
        assert!(library.validate(Some("data")).unwrap_err().is_fatal());
    }

    #[test]
    fn test_validate_rejects_empty_library() {
        let library = CategoryLibrary::from_json(r#"{"categories": {}}"#, Path::new(".")).unwrap();
        assert!(library.validate(None).is_err());
    }

    #[test]
    fn test_skill_vocabulary_unions_categories() {
        let library = CategoryLibrary::from_json(LIBRARY, Path::new(".")).unwrap();
        let vocab = library.skill_vocabulary();
        assert!(vocab.contains("python"));
        assert!(vocab.contains("css"));
        assert_eq!(vocab.len(), 5);
    }
}
