use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::dom::{Document, Node, Query};
use crate::names::{clean_team_name, extract_seed, is_noise_name};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One team's line in a pool-standings table.
#[derive(Debug, Clone, Serialize)]
pub struct PoolTeam {
    pub name: String,
    pub seed: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub point_diff: i32,
}

/// A pool with its standings rows.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStanding {
    pub name: String,
    pub teams: Vec<PoolTeam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchupStatus {
    Completed,
    Scheduled,
}

impl MatchupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchupStatus::Completed => "completed",
            MatchupStatus::Scheduled => "scheduled",
        }
    }
}

/// One pool-play game. Bracket games are excluded here; they live in the
/// bracket extractor's game tree instead.
#[derive(Debug, Clone, Serialize)]
pub struct Matchup {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: MatchupStatus,
}

/// A team's pool assignment, deduplicated across the whole schedule page.
#[derive(Debug, Clone, Serialize)]
pub struct PoolAssignment {
    pub name: String,
    pub pool: String,
    pub seed: Option<u32>,
}

/// Everything the pool/matchup extractor recovers from one schedule page.
#[derive(Debug)]
pub struct ScheduleExtract {
    pub pools: Vec<PoolStanding>,
    pub matchups: Vec<Matchup>,
    pub teams: Vec<PoolAssignment>,
}

const MAX_MATCHUPS: usize = 500;

/// Schedule-section type code the registry uses for bracket play.
const BRACKET_TYPE_CODE: &str = "3";

// ============================================================================
// REGEXES
// ============================================================================

fn pool_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^pool\s+([a-z])\b").unwrap())
}

/// Matches the `N-N` cells the registry uses both for W-L records in
/// standings tables and for scores in matchup rows.
fn dash_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").unwrap())
}

/// Venue cells ("Field 3") trail the teams in some matchup row layouts.
fn venue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(field|court|pitch)\s*\d+$").unwrap())
}

/// Section ids look like `<prefix>_<type>_<n>`; the type code separates
/// pool-play sections from bracket sections.
fn section_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]+_(\d+)_\d+$").unwrap())
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Parses a schedule page into pool standings, pool-play matchups and the
/// page-wide deduplicated team/pool assignments.
pub fn parse_schedule_page(html: &str) -> ScheduleExtract {
    let doc = Document::parse(html);

    let mut pools = pools_from_headings(&doc);
    if pools.is_empty() {
        pools = pools_from_tables(&doc);
    }

    let teams = assign_teams(&pools);
    let matchups = extract_matchups(&doc);

    ScheduleExtract { pools, matchups, teams }
}

// ============================================================================
// POOL STANDINGS — HEADER-DRIVEN PASS
// ============================================================================

/// Finds "Pool <Letter>" headings and adopts the first table in each
/// heading's parent container that yields at least one valid team row.
fn pools_from_headings(doc: &Document) -> Vec<PoolStanding> {
    let headings = doc.find_all(&Query::tags(&["h1", "h2", "h3", "h4", "h5", "h6"]));
    let mut pools = Vec::new();

    for heading in headings {
        let text = heading.text();
        let letter = match pool_heading_re().captures(&text) {
            Some(caps) => caps[1].to_uppercase(),
            None => continue,
        };
        let pool_name = format!("Pool {}", letter);
        if pools.iter().any(|p: &PoolStanding| p.name == pool_name) {
            continue;
        }

        let container = match heading.parent() {
            Some(parent) => parent,
            None => continue,
        };

        for table in container.find_all(&Query::tag("table")) {
            let teams = parse_pool_table(&table);
            if !teams.is_empty() {
                pools.push(PoolStanding { name: pool_name, teams });
                break;
            }
        }
    }

    pools
}

// ============================================================================
// POOL STANDINGS — TABLE-FALLBACK PASS
// ============================================================================

/// Treats every table as a candidate pool when no "Pool X" heading exists.
/// Requires two valid rows, stricter than the header-driven pass, since
/// nothing labels the table's intent.
fn pools_from_tables(doc: &Document) -> Vec<PoolStanding> {
    let mut pools: Vec<PoolStanding> = Vec::new();

    for table in doc.find_all(&Query::tag("table")) {
        // Tables inside id-tagged schedule sections are game listings.
        if in_schedule_section(&table) {
            continue;
        }

        let teams = parse_pool_table(&table);
        if teams.len() < 2 {
            continue;
        }

        let name = table
            .find_first(&Query::tag("caption"))
            .map(|c| c.text())
            .filter(|t| !t.is_empty())
            .or_else(|| preceding_heading(&table))
            .unwrap_or_else(|| generated_pool_name(pools.len()));

        pools.push(PoolStanding { name, teams });
    }

    pools
}

fn in_schedule_section(table: &Node) -> bool {
    let mut current = table.parent();
    while let Some(node) = current {
        if node.attr("id").is_some_and(|id| section_id_re().is_match(id)) {
            return true;
        }
        current = node.parent();
    }
    false
}

fn preceding_heading(table: &Node) -> Option<String> {
    table
        .prev_elements()
        .into_iter()
        .find(|el| matches!(el.tag(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
        .map(|el| el.text())
        .filter(|t| !t.is_empty())
}

fn generated_pool_name(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    format!("Pool {}", letter)
}

// ============================================================================
// STANDINGS ROWS
// ============================================================================

fn parse_pool_table(table: &Node) -> Vec<PoolTeam> {
    table
        .find_all(&Query::tag("tr"))
        .iter()
        .filter_map(parse_pool_row)
        .collect()
}

/// Header labels that disqualify a first cell from being a team name.
const ROW_HEADER_LABELS: &[&str] = &["team", "w-l", "record"];

fn parse_pool_row(row: &Node) -> Option<PoolTeam> {
    let cells = row.find_all(&Query::tag("td"));
    let first = cells.first()?;

    let raw = first.text();
    let name = clean_team_name(&raw);
    if name.len() <= 2 {
        return None;
    }
    let lower = name.to_lowercase();
    if ROW_HEADER_LABELS.iter().any(|&l| l == lower) {
        return None;
    }

    let (wins, losses) = cells
        .iter()
        .skip(1)
        .find_map(|cell| {
            let text = cell.text();
            let caps = dash_pair_re().captures(&text)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .unwrap_or((0, 0));

    Some(PoolTeam {
        name,
        seed: extract_seed(&raw),
        wins,
        losses,
        point_diff: 0,
    })
}

// ============================================================================
// TEAM ASSIGNMENTS
// ============================================================================

/// Flattens pool standings into a page-wide participant list. The same team
/// is kept once overall (case-insensitive) even when the source page repeats
/// it, while still appearing in each pool's own standings table.
fn assign_teams(pools: &[PoolStanding]) -> Vec<PoolAssignment> {
    let mut seen_lower = Vec::new();
    let mut assignments = Vec::new();

    for pool in pools {
        for team in &pool.teams {
            let lower = team.name.to_lowercase();
            if seen_lower.contains(&lower) {
                continue;
            }
            seen_lower.push(lower);
            assignments.push(PoolAssignment {
                name: team.name.clone(),
                pool: pool.name.clone(),
                seed: team.seed,
            });
        }
    }

    assignments
}

// ============================================================================
// MATCHUPS
// ============================================================================

/// Cell labels that are row chrome rather than team names.
const MATCHUP_IGNORE_LABELS: &[&str] = &[
    "home", "away", "time", "date", "field", "score", "status", "final", "round",
];

/// Scans id-tagged schedule sections for pool-play games. Sections carrying
/// the bracket type code are skipped; the bracket extractor owns those.
fn extract_matchups(doc: &Document) -> Vec<Matchup> {
    let mut matchups = Vec::new();

    for section in doc.find_all(&Query::any().with_attr("id")) {
        let id = section.attr("id").unwrap_or_default();
        let type_code = match section_id_re().captures(id) {
            Some(caps) => caps[1].to_string(),
            None => continue,
        };
        if type_code == BRACKET_TYPE_CODE {
            continue;
        }

        for row in section.find_all(&Query::tag("tr")) {
            if let Some(matchup) = parse_matchup_row(&row) {
                matchups.push(matchup);
                if matchups.len() >= MAX_MATCHUPS {
                    return matchups;
                }
            }
        }
    }

    matchups
}

fn parse_matchup_row(row: &Node) -> Option<Matchup> {
    let cells = row.find_all(&Query::tag("td"));
    if cells.is_empty() {
        return None;
    }

    let mut home_score = 0;
    let mut away_score = 0;
    for cell in &cells {
        if let Some(caps) = dash_pair_re().captures(&cell.text()) {
            home_score = caps[1].parse().unwrap_or(0);
            away_score = caps[2].parse().unwrap_or(0);
            break;
        }
    }

    let team_labels: Vec<String> = cells
        .iter()
        .map(|cell| clean_team_name(&cell.text()))
        .filter(|name| is_team_label(name))
        .collect();

    if team_labels.len() < 2 {
        return None;
    }

    let home_team = team_labels.first()?.clone();
    let away_team = team_labels.last()?.clone();

    let has_final_marker = row.text().to_lowercase().contains("final");
    let status = if has_final_marker || home_score > 0 || away_score > 0 {
        MatchupStatus::Completed
    } else {
        MatchupStatus::Scheduled
    };

    Some(Matchup {
        home_team,
        away_team,
        home_score,
        away_score,
        status,
    })
}

fn is_team_label(name: &str) -> bool {
    if name.len() <= 2 || dash_pair_re().is_match(name) {
        return false;
    }
    let lower = name.to_lowercase();
    if MATCHUP_IGNORE_LABELS.iter().any(|&l| l == lower) {
        return false;
    }
    if venue_re().is_match(&lower) {
        return false;
    }
    // Time-of-day cells ("10:00 AM") share a row with the teams.
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) && name.contains(':') {
        return false;
    }
    !is_noise_name(name)
}

// ============================================================================
// TESTS
// ============================================================================
