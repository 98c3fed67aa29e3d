// Matching engine: scoring, document selection, customization and reporting.
// Pure steps (scoring, selection, planning, assembly) never touch the filesystem;
// only customizer::customize writes.

pub mod customizer;
pub mod handlers;
pub mod naming;
pub mod options;
pub mod pipeline;
pub mod recency;
pub mod report;
pub mod scoring;
pub mod selector;
