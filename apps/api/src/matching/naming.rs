use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::errors::MatchError;

/// Char cap applied to each substituted identity component.
pub const MAX_COMPONENT_CHARS: usize = 60;

lazy_static! {
    static ref ILLEGAL_FILENAME_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1f\x7f]"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref IDENTITY_PLACEHOLDER: Regex = Regex::new(r"\{(company|position)\}").unwrap();
}

/// Makes untrusted text safe as part of a file name.
///
/// Strips path separators, reserved and control characters, collapses
/// whitespace, caps the length on a char boundary and drops leading/trailing
/// dots. May return an empty string.
pub fn sanitize_component(raw: &str) -> String {
    let stripped = ILLEGAL_FILENAME_CHARS.replace_all(raw, " ");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    let capped: String = collapsed.chars().take(MAX_COMPONENT_CHARS).collect();
    capped
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// Output file-name pattern with `{company}` and `{position}` placeholders,
/// e.g. `{company} - {position} - Resume`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    pattern: String,
}

impl NamingTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Renders a file name. `extension` is appended as-is (without the dot).
    pub fn render(
        &self,
        company: &str,
        position: &str,
        extension: Option<&str>,
    ) -> Result<String, MatchError> {
        let company = sanitize_component(company);
        if company.is_empty() {
            return Err(MatchError::MissingIdentity("company"));
        }
        let position = sanitize_component(position);
        if position.is_empty() {
            return Err(MatchError::MissingIdentity("position"));
        }

        // Single pass, so identity text containing "{position}" is not expanded.
        let stem = IDENTITY_PLACEHOLDER.replace_all(&self.pattern, |caps: &Captures| {
            match &caps[1] {
                "company" => company.clone(),
                _ => position.clone(),
            }
        });
        let stem = ILLEGAL_FILENAME_CHARS.replace_all(&stem, " ");
        let stem = WHITESPACE.replace_all(stem.trim(), " ");
        let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());

        Ok(match extension.filter(|e| !e.is_empty()) {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        })
    }
}
