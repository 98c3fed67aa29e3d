mod adapters;
mod config;
mod errors;
mod matching;
mod models;
mod offering;
mod profile;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::adapters::{JsonFileOfferingSource, JsonReportSink, NullReportSink, ReportSink};
use crate::config::Config;
use crate::matching::pipeline::RunContext;
use crate::matching::scoring::WeightedRankScorer;
use crate::models::library::CategoryLibrary;
use crate::profile::load_profile;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobFit API v{}", env!("CARGO_PKG_VERSION"));

    // Load the profile once; it is read-only for the life of the process
    let profile = load_profile(&config.profile_path)
        .with_context(|| format!("Failed to load profile from {}", config.profile_path.display()))?;

    // Load and validate the category library (a bad library or fallback is fatal)
    let library = CategoryLibrary::load(&config.category_library_path).with_context(|| {
        format!(
            "Failed to load category library from {}",
            config.category_library_path.display()
        )
    })?;
    library
        .validate(config.fallback_category.as_deref())
        .context("Category library is not usable")?;
    info!(
        categories = library.categories.len(),
        fallback = config.fallback_category.as_deref().unwrap_or("none"),
        "Category library loaded"
    );

    // Scorer (WeightedRankScorer by default) + shared run context
    let context = Arc::new(RunContext::new(profile, library, Arc::new(WeightedRankScorer)));
    info!(
        scorer = context.scorer.backend(),
        vocabulary_terms = context.vocabulary.len(),
        "Run context ready"
    );

    let report_sink: Arc<dyn ReportSink> = match &config.report_dir {
        Some(dir) => {
            let sink = JsonReportSink::new(dir);
            info!("Reports will be written to {}", sink.dir().display());
            Arc::new(sink)
        }
        None => {
            info!("REPORT_DIR not set; reports are returned but not persisted");
            Arc::new(NullReportSink)
        }
    };

    let offering_source = JsonFileOfferingSource::new(&config.offerings_dir);
    info!("Offering files are read from {}", offering_source.root().display());

    // Build app state
    let state = AppState {
        config: config.clone(),
        context,
        offering_source: Arc::new(offering_source),
        report_sink,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
