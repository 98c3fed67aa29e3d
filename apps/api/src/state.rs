use std::sync::Arc;

use crate::adapters::{OfferingSource, ReportSink};
use crate::config::Config;
use crate::matching::pipeline::RunContext;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Profile, category library, scorer and skill vocabulary, loaded once at startup.
    pub context: Arc<RunContext>,
    /// Pluggable offering loader for `offerings_path` run requests.
    pub offering_source: Arc<dyn OfferingSource>,
    /// Pluggable report destination. Default: JsonReportSink when REPORT_DIR is set.
    pub report_sink: Arc<dyn ReportSink>,
}
