use regex::Regex;
use std::sync::OnceLock;

// ============================================================================
// NAME / SEED CLEANING
// ============================================================================

fn seed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\(\[]\s*(\d{1,3})\s*[\)\]]\s*$").unwrap())
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[WL] of ").unwrap())
}

/// Extracts a trailing parenthesized/bracketed seed from a raw team label,
/// e.g. `"Generic U (3)"` -> `Some(3)`.
pub fn extract_seed(raw: &str) -> Option<u32> {
    seed_re()
        .captures(raw.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Strips the seed annotation and collapses whitespace, producing the
/// canonical team name.
pub fn clean_team_name(raw: &str) -> String {
    let stripped = seed_re().replace(raw.trim(), "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives a key-safe slug: lowercased, runs of non-alphanumerics collapsed
/// to a single hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

// ============================================================================
// TEAM-NAME NOISE FILTER
// ============================================================================
//
// Tournament pages mix genuine team names with navigation links, division
// selectors and bracket placeholder slots in the same anchor soup. There is
// no structural marker, so filtering is purely lexical.

/// Substrings that mark a label as navigation/page chrome rather than a team.
const NAME_STOPWORDS: &[&str] = &[
    "schedule",
    "pool",
    "bracket",
    "login",
    "log in",
    "sign up",
    "register",
    "donate",
    "match report",
    "winner of",
    "loser of",
    "view all",
    "back to",
    "standings",
    "rankings",
    "results",
    "contact",
    "about us",
    "privacy",
];

/// Exact (case-insensitive) division/label strings that show up as links.
const DIVISION_LABELS: &[&str] = &[
    "men",
    "women",
    "mixed",
    "open",
    "masters",
    "boys",
    "girls",
    "men's",
    "women's",
    "college men",
    "college women",
    "club men",
    "club women",
    "club mixed",
    "division i",
    "division iii",
];

/// Whether the label is an exact division/gender string rather than a team.
pub fn is_division_label(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    DIVISION_LABELS.iter().any(|&l| l == lower)
}

/// Three-layer filter: stopword substrings, exact division labels, and
/// bracket placeholder slots (`"W of A1"`, `"L of Q2"`).
pub fn is_noise_name(text: &str) -> bool {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    NAME_STOPWORDS.iter().any(|&w| lower.contains(w))
        || is_division_label(trimmed)
        || placeholder_re().is_match(trimmed)
}

/// Full acceptance test for a candidate team label: plausible length and not
/// filtered as noise. Dedup against already-seen names is the caller's job.
pub fn is_plausible_team_name(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() > 2 && trimmed.len() < 100 && !is_noise_name(trimmed)
}

// ============================================================================
// TESTS
// ============================================================================
