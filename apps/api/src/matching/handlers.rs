//! Axum route handlers for the Matching API.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::matching::pipeline::{preview_offering, run_pipeline, OfferingPreview, RunReport};
use crate::models::library::CategoryLibrary;
use crate::models::offering::RawOffering;
use crate::models::profile::Profile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub offering: RawOffering,
}

/// Exactly one of `offerings` / `offerings_path` must be given.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunRequest {
    pub offerings: Option<Vec<RawOffering>>,
    /// Relative to OFFERINGS_DIR.
    pub offerings_path: Option<String>,
    /// Overrides OVERWRITE_OUTPUTS for this run.
    pub overwrite: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub report: RunReport,
    /// Where the report sink put the report, if anywhere.
    pub report_path: Option<PathBuf>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json(state.context.profile.clone())
}

/// GET /api/v1/categories
pub async fn handle_get_categories(State(state): State<AppState>) -> Json<CategoryLibrary> {
    Json(state.context.library.clone())
}

/// POST /api/v1/offerings/score
///
/// Normalizes and scores one offering and previews its document selection.
/// Writes nothing.
pub async fn handle_score_offering(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<OfferingPreview>, AppError> {
    let options = state.config.run_options(Utc::now().date_naive(), None);
    let preview = preview_offering(&state.context, &options, &request.offering)?;
    Ok(Json(preview))
}

/// POST /api/v1/runs
///
/// Runs the full pipeline over a batch and hands the report to the sink.
/// Per-offering failures are part of a 200 response; only configuration
/// problems fail the request.
pub async fn handle_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let offerings = match (request.offerings, request.offerings_path) {
        (Some(offerings), None) => offerings,
        (None, Some(path)) => {
            if path.trim().is_empty() {
                return Err(AppError::Validation("offerings_path cannot be empty".to_string()));
            }
            state
                .offering_source
                .load(&path)
                .await
                .map_err(|e| AppError::Validation(format!("{e:#}")))?
        }
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "provide either offerings or offerings_path, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::Validation(
                "one of offerings or offerings_path is required".to_string(),
            ))
        }
    };

    let options = state
        .config
        .run_options(Utc::now().date_naive(), request.overwrite);
    info!(
        offerings = offerings.len(),
        overwrite = options.overwrite,
        "Run requested"
    );

    let report = run_pipeline(Arc::clone(&state.context), Arc::new(options), offerings).await?;

    // The outputs already exist at this point; a sink failure must not hide the report.
    let report_path = match state.report_sink.publish(&report).await {
        Ok(path) => path,
        Err(e) => {
            error!(run_id = %report.run_id, error = ?e, "Report sink failed");
            None
        }
    };

    Ok(Json(RunResponse {
        report,
        report_path,
    }))
}
