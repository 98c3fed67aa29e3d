//! Customizer: copies the selected documents into the output directory under
//! templated names and rewrites the cover letter's soft-skill placeholders.
//!
//! `plan_outputs` derives the two destination paths without touching the
//! filesystem, so the run driver can check paths across the whole batch
//! before `customize` writes anything.
//!
//! Every write goes through a temp file in the output directory that is then
//! persisted in place, so a reader never sees a half-written document.

use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::MatchError;
use crate::matching::options::RunOptions;
use crate::matching::selector::Selection;
use crate::models::library::{Category, CategoryLibrary};
use crate::models::offering::Offering;
use crate::offering::soft_skill_frequency;

lazy_static! {
    static ref SOFT_SKILL_SPAN: Regex = Regex::new(r"\{\{\s*soft_skill\s*\}\}").unwrap();
    static ref COMPANY_SPAN: Regex = Regex::new(r"\{\{\s*company\s*\}\}").unwrap();
    static ref POSITION_SPAN: Regex = Regex::new(r"\{\{\s*position\s*\}\}").unwrap();
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputPlan {
    pub resume: PathBuf,
    pub cover_letter: PathBuf,
}

impl OutputPlan {
    pub fn paths(&self) -> [&Path; 2] {
        [&self.resume, &self.cover_letter]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationOutcome {
    pub resume_output_path: PathBuf,
    pub cover_letter_output_path: PathBuf,
    /// Offering phrases written into `{{soft_skill}}` spans, in letter order.
    pub inserted_phrases: Vec<String>,
    /// Spans that received the neutral default phrase.
    pub default_fills: usize,
}

/// Cover letter text after placeholder substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLetter {
    pub text: String,
    pub inserted_phrases: Vec<String>,
    pub default_fills: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

/// Derives both destination paths. No filesystem access.
pub fn plan_outputs(
    selection: &Selection,
    offering: &Offering,
    library: &CategoryLibrary,
    options: &RunOptions,
) -> Result<OutputPlan, MatchError> {
    let resume_source = &category(library, &selection.resume_category)?.resume;
    let letter_source = &category(library, &selection.cover_letter_category)?.cover_letter;

    let resume_name = options.resume_template.render(
        &offering.company,
        &offering.position,
        extension(resume_source),
    )?;
    let letter_name = options.cover_letter_template.render(
        &offering.company,
        &offering.position,
        extension(letter_source),
    )?;

    let plan = OutputPlan {
        resume: options.output_dir.join(resume_name),
        cover_letter: options.output_dir.join(letter_name),
    };
    if plan.resume == plan.cover_letter {
        return Err(MatchError::OutputCollision(plan.cover_letter));
    }
    Ok(plan)
}

fn category<'a>(library: &'a CategoryLibrary, label: &str) -> Result<&'a Category, MatchError> {
    library
        .get(label)
        .ok_or_else(|| MatchError::InvalidLibrary(format!("selected category '{label}' is not in the library")))
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter rendering
// ────────────────────────────────────────────────────────────────────────────

/// Offering soft skills, most frequent in the description first, ties by label.
pub fn ranked_soft_skills(offering: &Offering) -> Vec<String> {
    let mut ranked: Vec<(usize, &String)> = offering
        .soft_skills_mentioned
        .iter()
        .map(|skill| (soft_skill_frequency(&offering.raw_description, skill), skill))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked.into_iter().map(|(_, skill)| skill.clone()).collect()
}

/// Fills `{{soft_skill}}` spans one phrase each, in ranked order; leftover
/// spans get `neutral_phrase`. Then fills `{{company}}` and `{{position}}`.
pub fn render_cover_letter(template: &str, offering: &Offering, neutral_phrase: &str) -> RenderedLetter {
    let ranked = ranked_soft_skills(offering);
    let mut next = ranked.iter();
    let mut inserted_phrases = Vec::new();
    let mut default_fills = 0;

    let text = SOFT_SKILL_SPAN.replace_all(template, |_: &Captures| match next.next() {
        Some(phrase) => {
            inserted_phrases.push(phrase.clone());
            phrase.clone()
        }
        None => {
            default_fills += 1;
            neutral_phrase.to_string()
        }
    });
    let text = COMPANY_SPAN.replace_all(&text, NoExpand(offering.company.trim()));
    let text = POSITION_SPAN.replace_all(&text, NoExpand(offering.position.trim()));

    RenderedLetter {
        text: text.into_owned(),
        inserted_phrases,
        default_fills,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Writing
// ────────────────────────────────────────────────────────────────────────────

/// Writes the customized resume and cover letter for one offering.
pub fn customize(
    selection: &Selection,
    offering: &Offering,
    library: &CategoryLibrary,
    options: &RunOptions,
) -> Result<CustomizationOutcome, MatchError> {
    let plan = plan_outputs(selection, offering, library, options)?;
    apply_plan(&plan, selection, offering, library, options)
}

/// Reads both sources, then writes both outputs.
///
/// Nothing is written unless both sources are readable and neither output
/// exists (or `overwrite` is set). If the cover letter fails to land, the
/// resume written just before it is removed.
fn apply_plan(
    plan: &OutputPlan,
    selection: &Selection,
    offering: &Offering,
    library: &CategoryLibrary,
    options: &RunOptions,
) -> Result<CustomizationOutcome, MatchError> {
    let resume_source = &category(library, &selection.resume_category)?.resume;
    let letter_source = &category(library, &selection.cover_letter_category)?.cover_letter;

    let resume_bytes = read_source(resume_source)?;
    let letter_bytes = read_source(letter_source)?;
    let template =
        String::from_utf8(letter_bytes).map_err(|_| MatchError::TemplateEncoding(letter_source.clone()))?;

    let letter = render_cover_letter(&template, offering, &options.neutral_phrase);

    std::fs::create_dir_all(&options.output_dir).map_err(|e| MatchError::io(&options.output_dir, e))?;
    if !options.overwrite {
        if let Some(existing) = plan.paths().into_iter().find(|p| p.exists()) {
            return Err(MatchError::OutputCollision(existing.to_path_buf()));
        }
    }

    write_atomic(&plan.resume, &resume_bytes, options.overwrite)?;
    if let Err(err) = write_atomic(&plan.cover_letter, letter.text.as_bytes(), options.overwrite) {
        if let Err(cleanup) = std::fs::remove_file(&plan.resume) {
            warn!(path = %plan.resume.display(), error = %cleanup, "Failed to remove resume after cover letter write failed");
        }
        return Err(err);
    }

    debug!(
        resume = %plan.resume.display(),
        cover_letter = %plan.cover_letter.display(),
        inserted = letter.inserted_phrases.len(),
        default_fills = letter.default_fills,
        "Documents customized"
    );

    Ok(CustomizationOutcome {
        resume_output_path: plan.resume.clone(),
        cover_letter_output_path: plan.cover_letter.clone(),
        inserted_phrases: letter.inserted_phrases,
        default_fills: letter.default_fills,
    })
}

fn read_source(path: &Path) -> Result<Vec<u8>, MatchError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        IoErrorKind::NotFound => MatchError::DocumentNotFound(path.to_path_buf()),
        _ => MatchError::io(path, e),
    })
}

fn write_atomic(path: &Path, bytes: &[u8], overwrite: bool) -> Result<(), MatchError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| MatchError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| MatchError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| MatchError::io(tmp.path(), e))?;

    let persisted = if overwrite {
        tmp.persist(path)
    } else {
        tmp.persist_noclobber(path)
    };
    persisted.map(|_| ()).map_err(|e| match e.error.kind() {
        IoErrorKind::AlreadyExists => MatchError::OutputCollision(path.to_path_buf()),
        _ => MatchError::io(path, e.error),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::errors::ErrorKind;

    const LETTER: &str = "Dear {{company}},\n\nI bring {{soft_skill}} and {{ soft_skill }} to the {{position}} role, \
                          along with {{soft_skill}}.\n";

    struct Fixture {
        _dir: TempDir,
        library: CategoryLibrary,
        options: RunOptions,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("backend.pdf"), b"%PDF-1.4 \x00\x01 resume bytes").unwrap();
        fs::write(docs.join("backend.txt"), LETTER).unwrap();

        let library = CategoryLibrary::from_json(
            r#"{"categories": {"backend": {
                "resume": "backend.pdf", "cover_letter": "backend.txt", "skills": ["python"]
            }}}"#,
            &docs,
        )
        .unwrap();
        let options = RunOptions::new(dir.path().join("out"), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        Fixture {
            _dir: dir,
            library,
            options,
        }
    }

    fn selection() -> Selection {
        Selection {
            resume_category: "backend".to_string(),
            cover_letter_category: "backend".to_string(),
            resume_overlap: 1,
            cover_letter_overlap: 1,
            fallback_used: false,
        }
    }

    fn offering(soft: &[&str], description: &str) -> Offering {
        Offering {
            company: "Acme/Corp".to_string(),
            position: "Backend Engineer".to_string(),
            soft_skills_mentioned: soft.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            raw_description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_uses_templates_and_keeps_extensions() {
        let f = fixture();
        let plan = plan_outputs(&selection(), &offering(&[], ""), &f.library, &f.options).unwrap();
        assert_eq!(
            plan.resume,
            f.options.output_dir.join("Acme Corp - Backend Engineer - Resume.pdf")
        );
        assert_eq!(
            plan.cover_letter,
            f.options.output_dir.join("Acme Corp - Backend Engineer - Cover Letter.txt")
        );
    }

    #[test]
    fn test_identical_templates_collide() {
        let f = fixture();
        let mut options = f.options.clone();
        options.cover_letter_template = options.resume_template.clone();
        let mut library = f.library.clone();
        let backend = library.categories.get_mut("backend").unwrap();
        backend.cover_letter = backend.resume.clone();
        let err = plan_outputs(&selection(), &offering(&[], ""), &library, &options).unwrap_err();
        assert!(matches!(err, MatchError::OutputCollision(_)));
    }

    #[test]
    fn test_render_ranks_by_frequency_then_label() {
        let offer = offering(
            &["communication", "teamwork", "ownership"],
            "Strong communication. Great communicator. Team player. Take ownership.",
        );
        let letter = render_cover_letter(LETTER, &offer, "professionalism");
        assert_eq!(letter.inserted_phrases, vec!["communication", "ownership", "teamwork"]);
        assert_eq!(letter.default_fills, 0);
        assert!(letter.text.starts_with("Dear Acme/Corp,"));
        assert!(letter.text.contains("I bring communication and ownership to the Backend Engineer role"));
    }

    #[test]
    fn test_render_fills_leftover_spans_with_neutral_phrase() {
        let offer = offering(&["teamwork"], "Team player wanted.");
        let letter = render_cover_letter(LETTER, &offer, "professionalism");
        assert_eq!(letter.inserted_phrases, vec!["teamwork"]);
        assert_eq!(letter.default_fills, 2);
        assert!(letter.text.contains("along with professionalism."));
    }

    #[test]
    fn test_render_never_exceeds_spans_or_invents_phrases() {
        let soft = ["communication", "teamwork", "ownership", "creativity", "leadership"];
        let offer = offering(&soft, "");
        let letter = render_cover_letter(LETTER, &offer, "professionalism");
        assert_eq!(letter.inserted_phrases.len(), 3);
        assert!(letter
            .inserted_phrases
            .iter()
            .all(|p| offer.soft_skills_mentioned.contains(p)));
    }

    #[test]
    fn test_render_without_spans_inserts_nothing() {
        let offer = offering(&["teamwork"], "Team player.");
        let letter = render_cover_letter("Plain letter.", &offer, "professionalism");
        assert!(letter.inserted_phrases.is_empty());
        assert_eq!(letter.default_fills, 0);
        assert_eq!(letter.text, "Plain letter.");
    }

    #[test]
    fn test_customize_writes_both_documents() {
        let f = fixture();
        let offer = offering(&["teamwork"], "Team player.");
        let outcome = customize(&selection(), &offer, &f.library, &f.options).unwrap();

        let resume = fs::read(&outcome.resume_output_path).unwrap();
        assert_eq!(resume, b"%PDF-1.4 \x00\x01 resume bytes");
        let letter = fs::read_to_string(&outcome.cover_letter_output_path).unwrap();
        assert!(letter.contains("I bring teamwork and professionalism"));
        assert!(!letter.contains("{{"));
        assert_eq!(outcome.default_fills, 2);
    }

    #[test]
    fn test_existing_output_is_a_collision_and_untouched() {
        let f = fixture();
        let offer = offering(&[], "");
        let plan = plan_outputs(&selection(), &offer, &f.library, &f.options).unwrap();
        fs::create_dir_all(&f.options.output_dir).unwrap();
        fs::write(&plan.resume, b"keep me").unwrap();

        let err = customize(&selection(), &offer, &f.library, &f.options).unwrap_err();
        assert!(matches!(err, MatchError::OutputCollision(ref p) if p == &plan.resume));
        assert_eq!(fs::read(&plan.resume).unwrap(), b"keep me");
        assert!(!plan.cover_letter.exists());
    }

    #[test]
    fn test_overwrite_replaces_existing_output() {
        let f = fixture();
        let mut options = f.options.clone();
        options.overwrite = true;
        let offer = offering(&[], "");
        let first = customize(&selection(), &offer, &f.library, &options).unwrap();
        let second = customize(&selection(), &offer, &f.library, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            fs::read(&second.resume_output_path).unwrap(),
            b"%PDF-1.4 \x00\x01 resume bytes"
        );
    }

    #[test]
    fn test_failed_cover_letter_write_removes_resume() {
        let f = fixture();
        let mut options = f.options.clone();
        options.overwrite = true;
        let offer = offering(&[], "");
        let plan = plan_outputs(&selection(), &offer, &f.library, &options).unwrap();
        // A non-empty directory squatting on the letter path cannot be replaced.
        fs::create_dir_all(plan.cover_letter.join("occupied")).unwrap();

        let err = customize(&selection(), &offer, &f.library, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!plan.resume.exists());
        assert!(plan.cover_letter.is_dir());
    }

    #[test]
    fn test_missing_source_fails_before_writing() {
        let f = fixture();
        let mut library = f.library.clone();
        library.categories.get_mut("backend").unwrap().cover_letter = PathBuf::from("/nope/letter.txt");
        let err = customize(&selection(), &offering(&[], ""), &library, &f.options).unwrap_err();
        assert!(matches!(err, MatchError::DocumentNotFound(_)));
        assert!(!f.options.output_dir.exists());
    }

    #[test]
    fn test_non_utf8_letter_is_rejected() {
        let f = fixture();
        let letter_path = f.library.get("backend").unwrap().cover_letter.clone();
        fs::write(&letter_path, [0xff, 0xfe, 0x00]).unwrap();
        let err = customize(&selection(), &offering(&[], ""), &f.library, &f.options).unwrap_err();
        assert!(matches!(err, MatchError::TemplateEncoding(_)));
    }
}
