// Offering Model: raw search-API records → normalized offerings.
// Pure text processing, no network access happens here.

pub mod extractor;

pub use extractor::{normalize_offering, soft_skill_frequency, SkillVocabulary};
