//! Skill vocabulary: normalization, aliases and the soft-skill lexicon.
//!
//! Every skill comparison in the crate goes through `normalize_skill` on both
//! sides, so "JS", "js " and "JavaScript" all meet as `javascript`.

use lazy_static::lazy_static;
use regex::Regex;

/// Alias → canonical name. Lookup happens after lowercasing and whitespace collapse.
const SKILL_ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("node", "node.js"),
    ("nodejs", "node.js"),
    ("postgres", "postgresql"),
    ("psql", "postgresql"),
    ("k8s", "kubernetes"),
    ("golang", "go"),
    ("py", "python"),
    ("python3", "python"),
    ("amazon web services", "aws"),
    ("gcp", "google cloud"),
    ("ml", "machine learning"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("c sharp", "c#"),
];

/// Technical terms searched for in offering text in addition to whatever the
/// profile and category library declare.
pub const BUILTIN_TECH_SKILLS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "rust",
    "c++",
    "c#",
    "ruby",
    "php",
    "scala",
    "kotlin",
    "swift",
    "sql",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "kafka",
    "spark",
    "aws",
    "azure",
    "google cloud",
    "docker",
    "kubernetes",
    "terraform",
    "linux",
    "git",
    "react",
    "angular",
    "vue",
    "node.js",
    "django",
    "flask",
    "spring",
    "html",
    "css",
    "graphql",
    "machine learning",
    "tableau",
];

/// Skill names that are also everyday English words ("Spring 2027 start",
/// "a swift response"). In free text they only count in the title or on a
/// requirement line; an API-listed skill always counts.
pub const AMBIGUOUS_TECH_TERMS: &[&str] = &["go", "rust", "swift", "spring", "spark", "flask"];

pub fn is_ambiguous_term(canonical: &str) -> bool {
    AMBIGUOUS_TECH_TERMS.contains(&canonical)
}

/// Canonical soft skill → phrasings that count as a mention of it.
pub const SOFT_SKILL_LEXICON: &[(&str, &[&str])] = &[
    ("communication", &["communication", "communicator", "communicate"]),
    ("leadership", &["leadership", "lead a team", "leading teams"]),
    ("teamwork", &["teamwork", "team player", "team-oriented"]),
    ("collaboration", &["collaboration", "collaborative", "collaborate"]),
    ("problem solving", &["problem solving", "problem-solving", "solve problems"]),
    ("adaptability", &["adaptability", "adaptable", "flexible", "flexibility"]),
    ("attention to detail", &["attention to detail", "detail-oriented", "detail oriented"]),
    ("time management", &["time management", "prioritize", "prioritise"]),
    ("critical thinking", &["critical thinking", "analytical thinking", "analytical mindset"]),
    ("creativity", &["creativity", "creative"]),
    ("ownership", &["ownership", "take ownership", "accountable"]),
    ("mentoring", &["mentoring", "mentorship", "mentor"]),
    ("initiative", &["initiative", "self-starter", "proactive"]),
    ("customer focus", &["customer focus", "customer-focused", "customer-centric"]),
];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Lowercases, trims, collapses whitespace, strips wrapping punctuation and
/// resolves aliases. Returns an empty string for input with no skill text.
pub fn normalize_skill(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lowered, " ");
    let trimmed = collapsed.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '(' | ')' | '"' | '\'')
    });

    SKILL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Aliases that resolve to `canonical`, for searching free text.
pub fn aliases_of(canonical: &str) -> impl Iterator<Item = &'static str> + '_ {
    SKILL_ALIASES
        .iter()
        .filter(move |(_, target)| *target == canonical)
        .map(|(alias, _)| *alias)
}

/// Maps a soft-skill phrasing to its canonical lexicon entry, or to its
/// normalized self when the lexicon does not know it.
pub fn normalize_soft_skill(raw: &str) -> String {
    let normalized = normalize_skill(raw);
    SOFT_SKILL_LEXICON
        .iter()
        .find(|(canonical, synonyms)| *canonical == normalized || synonyms.contains(&normalized.as_str()))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Phrasings searched in text for a canonical soft skill. Unknown skills are
/// searched by their own name.
pub fn soft_skill_phrasings(canonical: &str) -> Vec<&str> {
    SOFT_SKILL_LEXICON
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, synonyms)| synonyms.to_vec())
        .unwrap_or_else(|| vec![canonical])
}
