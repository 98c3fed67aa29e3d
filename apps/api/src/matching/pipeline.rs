//! Run driver: takes a batch of raw offerings through
//! normalize → score → select → plan → customize → assemble.
//!
//! Flow:
//! 1. Validate the library against the run options (fatal on failure)
//! 2. Plan every offering in parallel on the blocking pool
//! 3. Reject duplicated output paths across the batch (first in input order wins)
//! 4. Customize the surviving plans in parallel, assemble report rows
//! 5. Order rows by Candidate Rank, failures by input order
//!
//! A failed offering is recorded in `failures` and never stops the others.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{ErrorKind, MatchError};
use crate::matching::customizer::{customize, plan_outputs, OutputPlan};
use crate::matching::options::RunOptions;
use crate::matching::report::{assemble, ReportRow};
use crate::matching::scoring::{RankResult, RankScorer};
use crate::matching::selector::{select, Selection};
use crate::models::library::CategoryLibrary;
use crate::models::offering::{Offering, RawOffering};
use crate::models::profile::Profile;
use crate::offering::{normalize_offering, SkillVocabulary};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Everything loaded once at startup and shared read-only by every run.
pub struct RunContext {
    pub profile: Profile,
    pub library: CategoryLibrary,
    pub scorer: Arc<dyn RankScorer>,
    /// Builtin terms + profile skills + library skills.
    pub vocabulary: SkillVocabulary,
}

impl RunContext {
    pub fn new(profile: Profile, library: CategoryLibrary, scorer: Arc<dyn RankScorer>) -> Self {
        let extra = profile
            .skills
            .keys()
            .cloned()
            .chain(library.skill_vocabulary())
            .collect::<Vec<_>>();
        let vocabulary = SkillVocabulary::new(extra);
        Self {
            profile,
            library,
            scorer,
            vocabulary,
        }
    }
}

/// One skipped offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub offering: String,
    pub kind: ErrorKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Reference date used for experience recency.
    pub as_of: NaiveDate,
    /// Ordered by candidate score, then experience recency, then input order.
    pub rows: Vec<ReportRow>,
    /// Ordered by input position.
    pub failures: Vec<Failure>,
    /// Offerings received.
    pub processed: usize,
    /// Offerings that produced no row.
    pub skipped: usize,
}

/// Score + selection for one offering without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingPreview {
    pub offering: Offering,
    pub rank: RankResult,
    pub selection: Option<Selection>,
    pub outputs: Option<OutputPlan>,
    /// Why no selection or output plan could be made.
    pub selection_error: Option<String>,
}

struct Planned {
    index: usize,
    label: String,
    offering: Offering,
    rank: RankResult,
    selection: Selection,
    plan: OutputPlan,
}

// ────────────────────────────────────────────────────────────────────────────
// Per-offering steps (synchronous, run on the blocking pool)
// ────────────────────────────────────────────────────────────────────────────

fn plan_offering(
    ctx: &RunContext,
    options: &RunOptions,
    index: usize,
    raw: &RawOffering,
) -> Result<Planned, MatchError> {
    let offering = normalize_offering(raw, &ctx.vocabulary)?;
    let rank = ctx.scorer.score(&ctx.profile, &offering, &options.scoring)?;
    let selection = select(&rank, &offering, &ctx.library, options)?;
    let plan = plan_outputs(&selection, &offering, &ctx.library, options)?;
    Ok(Planned {
        index,
        label: offering.label(),
        offering,
        rank,
        selection,
        plan,
    })
}

fn customize_planned(
    ctx: &RunContext,
    options: &RunOptions,
    planned: &Planned,
) -> Result<ReportRow, MatchError> {
    // Re-derives the same paths that passed the batch collision check.
    let outcome = customize(&planned.selection, &planned.offering, &ctx.library, options)?;
    assemble(
        &planned.rank,
        &planned.selection,
        &outcome,
        &planned.offering,
        &ctx.profile.preferences,
    )
}

/// Normalizes and scores one raw offering, then previews its selection.
///
/// Offering-level selection errors are reported in the preview; data and
/// configuration errors propagate.
pub fn preview_offering(
    ctx: &RunContext,
    options: &RunOptions,
    raw: &RawOffering,
) -> Result<OfferingPreview, MatchError> {
    let offering = normalize_offering(raw, &ctx.vocabulary)?;
    let rank = ctx.scorer.score(&ctx.profile, &offering, &options.scoring)?;

    let planned = select(&rank, &offering, &ctx.library, options).and_then(|selection| {
        let plan = plan_outputs(&selection, &offering, &ctx.library, options)?;
        Ok((selection, plan))
    });
    let (selection, outputs, selection_error) = match planned {
        Ok((selection, plan)) => (Some(selection), Some(plan), None),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => (None, None, Some(e.to_string())),
    };

    Ok(OfferingPreview {
        offering,
        rank,
        selection,
        outputs,
        selection_error,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Run driver
// ────────────────────────────────────────────────────────────────────────────

/// Runs the whole batch. Only configuration errors fail the call; everything
/// scoped to one offering lands in `RunReport::failures`.
pub async fn run_pipeline(
    ctx: Arc<RunContext>,
    options: Arc<RunOptions>,
    offerings: Vec<RawOffering>,
) -> Result<RunReport, MatchError> {
    ctx.library.validate(options.fallback_category.as_deref())?;

    let run_id = Uuid::new_v4();
    let processed = offerings.len();
    info!(%run_id, offerings = processed, as_of = %options.scoring.as_of, "Run started");

    let mut failures: Vec<(usize, Failure)> = Vec::new();

    // ── Plan ────────────────────────────────────────────────────────────────
    let mut planning = JoinSet::new();
    for (index, raw) in offerings.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        let options = Arc::clone(&options);
        planning.spawn_blocking(move || {
            let result = plan_offering(&ctx, &options, index, &raw);
            (index, raw.label(), result)
        });
    }

    let mut planned: Vec<Planned> = Vec::new();
    while let Some(joined) = planning.join_next().await {
        match joined {
            Ok((_, _, Ok(p))) => planned.push(p),
            Ok((index, label, Err(e))) => {
                if e.is_fatal() {
                    return Err(e);
                }
                failures.push((index, record_failure(label, &e)));
            }
            Err(join_err) => {
                error!(%run_id, error = %join_err, "Planning task failed");
                failures.push((usize::MAX, internal_failure(join_err)));
            }
        }
    }
    planned.sort_by_key(|p| p.index);

    // ── Run-level collision check ───────────────────────────────────────────
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
    let mut accepted: Vec<Planned> = Vec::with_capacity(planned.len());
    for p in planned {
        let taken = p.plan.paths().into_iter().find(|path| claimed.contains_key(*path));
        if let Some(path) = taken {
            let err = MatchError::OutputCollision(path.to_path_buf());
            failures.push((p.index, record_failure(p.label.clone(), &err)));
            continue;
        }
        for path in p.plan.paths() {
            claimed.insert(path.to_path_buf(), p.index);
        }
        accepted.push(p);
    }

    // ── Customize + assemble ────────────────────────────────────────────────
    let mut customizing = JoinSet::new();
    for p in accepted {
        let ctx = Arc::clone(&ctx);
        let options = Arc::clone(&options);
        customizing.spawn_blocking(move || {
            let result = customize_planned(&ctx, &options, &p);
            (p.index, p.label, result)
        });
    }

    let mut rows: Vec<(usize, ReportRow)> = Vec::new();
    while let Some(joined) = customizing.join_next().await {
        match joined {
            Ok((index, _, Ok(row))) => rows.push((index, row)),
            Ok((index, label, Err(e))) => failures.push((index, record_failure(label, &e))),
            Err(join_err) => {
                error!(%run_id, error = %join_err, "Customization task failed");
                failures.push((usize::MAX, internal_failure(join_err)));
            }
        }
    }

    rows.sort_by_key(|(index, _)| *index);
    let mut rows: Vec<ReportRow> = rows.into_iter().map(|(_, row)| row).collect();
    rows.sort_by(compare_rows);

    failures.sort_by_key(|(index, _)| *index);
    let failures: Vec<Failure> = failures.into_iter().map(|(_, f)| f).collect();

    info!(
        %run_id,
        processed,
        rows = rows.len(),
        skipped = failures.len(),
        "Run complete"
    );

    Ok(RunReport {
        run_id,
        generated_at: Utc::now(),
        as_of: options.scoring.as_of,
        skipped: failures.len(),
        rows,
        failures,
        processed,
    })
}

/// Candidate score descending, then experience recency. Used with a stable
/// sort over input-ordered rows.
fn compare_rows(a: &ReportRow, b: &ReportRow) -> Ordering {
    b.candidate_score
        .total_cmp(&a.candidate_score)
        .then_with(|| b.experience_recency.total_cmp(&a.experience_recency))
}

fn record_failure(label: String, err: &MatchError) -> Failure {
    let kind = err.kind();
    if kind == ErrorKind::Internal {
        error!(offering = %label, error = ?err, "Offering failed unexpectedly");
    } else {
        warn!(offering = %label, kind = ?kind, reason = %err, "Offering skipped");
    }
    Failure {
        offering: label,
        kind,
        reason: err.to_string(),
    }
}

fn internal_failure(err: tokio::task::JoinError) -> Failure {
    Failure {
        offering: "<unknown offering>".to_string(),
        kind: ErrorKind::Internal,
        reason: format!("worker task failed: {err}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
