//! Document Selector: picks the resume and cover-letter categories for a
//! scored offering.
//!
//! Pure: reads the RankResult, the offering and the library, nothing else.

use serde::{Deserialize, Serialize};

use crate::errors::{DocumentKind, MatchError};
use crate::matching::options::RunOptions;
use crate::matching::scoring::RankResult;
use crate::models::library::{Category, CategoryLibrary};
use crate::models::offering::Offering;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Chosen categories. Both labels always exist in the library they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub resume_category: String,
    pub cover_letter_category: String,
    /// Overlap that won each choice; 0 when the fallback was used.
    pub resume_overlap: usize,
    pub cover_letter_overlap: usize,
    pub fallback_used: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Selection algorithm
// ────────────────────────────────────────────────────────────────────────────

/// Selects resume and cover-letter categories independently.
///
/// Algorithm:
/// 1. Resume: overlap = |category skills ∩ matched skills|
/// 2. Cover letter: resume overlap + |category soft skills ∩ offering soft skills|
/// 3. Highest overlap wins; ties → larger declared coverage → smaller label
/// 4. Zero overlap everywhere → configured fallback, else `NoMatchingCategory`
pub fn select(
    rank: &RankResult,
    offering: &Offering,
    library: &CategoryLibrary,
    options: &RunOptions,
) -> Result<Selection, MatchError> {
    let matched = &rank.matched_skills;
    let soft = &offering.soft_skills_mentioned;

    let resume = best_category(
        library,
        |c| c.skill_overlap(matched),
        |c| c.skills.len(),
    );
    let cover_letter = best_category(
        library,
        |c| c.skill_overlap(matched) + c.soft_skill_overlap(soft),
        |c| c.skills.len() + c.soft_skills.len(),
    );

    let mut fallback_used = false;
    let (resume_category, resume_overlap) = match resume {
        Some(found) => found,
        None => {
            fallback_used = true;
            (fallback(library, options, DocumentKind::Resume)?, 0)
        }
    };
    let (cover_letter_category, cover_letter_overlap) = match cover_letter {
        Some(found) => found,
        None => {
            fallback_used = true;
            (fallback(library, options, DocumentKind::CoverLetter)?, 0)
        }
    };

    Ok(Selection {
        resume_category,
        cover_letter_category,
        resume_overlap,
        cover_letter_overlap,
        fallback_used,
    })
}

/// Best category with positive overlap, or `None`.
fn best_category(
    library: &CategoryLibrary,
    overlap: impl Fn(&Category) -> usize,
    coverage: impl Fn(&Category) -> usize,
) -> Option<(String, usize)> {
    library
        .categories
        .iter()
        .map(|(label, category)| (label, overlap(category), coverage(category)))
        .filter(|(_, overlap, _)| *overlap > 0)
        .min_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.cmp(b.0))
        })
        .map(|(label, overlap, _)| (label.clone(), overlap))
}

fn fallback(
    library: &CategoryLibrary,
    options: &RunOptions,
    kind: DocumentKind,
) -> Result<String, MatchError> {
    let label = options
        .fallback_category
        .as_deref()
        .ok_or(MatchError::NoMatchingCategory(kind))?;
    if library.get(label).is_none() {
        return Err(MatchError::InvalidLibrary(format!(
            "fallback category '{label}' is not in the library"
        )));
    }
    Ok(label.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
