use std::collections::HashMap;
use std::error::Error;
use std::time::Duration;

use tracing::{info, warn};

use crate::brackets::parse_brackets;
use crate::fetcher;
use crate::names::slugify;
use crate::pools::parse_schedule_page;
use crate::rankings::fetch_all_rankings_pages;
use crate::season::derive_season;
use crate::sink::{
    MatchupRecord, RankedTeamRecord, RecordSink, TournamentRecord, TournamentTeamRecord,
};
use crate::tournament::{parse_tournament_page, LinkKind};
use crate::Division;

// ============================================================================
// SYNC WORKFLOWS
// ============================================================================
//
// Everything here is deliberately sequential: one fetch in flight at a time,
// with a fixed delay between dependent fetches. The delay is a politeness
// policy toward the registry, not a performance knob.

/// Pause between dependent fetches within one sync run.
pub const REQUEST_DELAY: Duration = Duration::from_millis(1750);

/// Pages smaller than this are treated as genuinely empty when an extractor
/// yields nothing; larger zero-yield pages get a markup-drift warning.
const SILENT_PAGE_THRESHOLD: usize = 2048;

#[derive(Debug)]
pub struct RankingsSyncReport {
    pub division: Division,
    pub season: i32,
    pub upserted: usize,
    pub reported_total: u32,
    /// Lowercased team name -> slug, for cross-referencing tournament teams
    /// against ranked teams later in the same run.
    pub team_slugs: HashMap<String, String>,
}

#[derive(Debug)]
pub struct TournamentSyncReport {
    pub slug: String,
    pub name: String,
    pub season: i32,
    pub teams: usize,
    pub pools: usize,
    pub matchups: usize,
    pub brackets: usize,
    pub champions: Vec<String>,
}

// ============================================================================
// DIVISION RANKINGS
// ============================================================================

/// Walks a division's full rankings pagination and upserts every ranked team.
/// Rankings pages can overlap across postbacks, so rows are deduplicated by
/// team name here before hitting the sink.
pub async fn sync_division_rankings(
    division: Division,
    sink: &mut dyn RecordSink,
) -> Result<RankingsSyncReport, Box<dyn Error>> {
    let url = division.rankings_url();
    let walk = fetch_all_rankings_pages(&url).await?;
    let season = derive_season("", None);

    let mut team_slugs = HashMap::new();
    let mut upserted = 0;

    for entry in walk.entries {
        let lower = entry.team_name.to_lowercase();
        if team_slugs.contains_key(&lower) {
            continue;
        }

        let slug = slugify(&entry.team_name);
        sink.upsert_ranked_team(RankedTeamRecord {
            slug: slug.clone(),
            name: entry.team_name,
            division: division.label().to_string(),
            region: entry.region,
            conference: entry.conference,
            ranking: entry.rank,
            rating: entry.rating,
            wins: entry.wins,
            losses: entry.losses,
            usau_url: entry.team_url,
            season,
        })?;

        team_slugs.insert(lower, slug);
        upserted += 1;
    }

    info!(
        division = division.label(),
        season,
        teams = upserted,
        reported_total = walk.reported_total,
        "rankings sync complete"
    );

    Ok(RankingsSyncReport {
        division,
        season,
        upserted,
        reported_total: walk.reported_total,
        team_slugs,
    })
}

// ============================================================================
// TOURNAMENT
// ============================================================================

/// Scrapes one tournament: landing page, then each discovered schedule page,
/// upserting the tournament, its teams with pool/seed assignments, and its
/// pool-play matchups. `team_slugs` is the ranked-team lookup from the same
/// run; teams not found there get a freshly derived slug.
///
/// A failed schedule-page fetch logs and skips that page; only a failed
/// landing-page fetch is fatal.
pub async fn sync_tournament(
    url: &str,
    sink: &mut dyn RecordSink,
    team_slugs: &HashMap<String, String>,
) -> Result<TournamentSyncReport, Box<dyn Error>> {
    let html = fetcher::fetch(url).await?;
    let summary = parse_tournament_page(&html, url);
    warn_if_silent(url, html.len(), summary.teams.len(), "landing-page teams");

    let season = derive_season(&summary.name, summary.start_date.as_deref());
    let slug = slugify(&summary.name);

    let gender_division = summary
        .schedule_links
        .iter()
        .find(|l| l.kind == LinkKind::Division)
        .map(|l| l.text.clone());

    sink.upsert_tournament(TournamentRecord {
        slug: slug.clone(),
        name: summary.name.clone(),
        usau_url: url.to_string(),
        start_date: summary.start_date.clone(),
        location: summary.location.clone(),
        competition_level: competition_level(&summary.name),
        gender_division,
        schedule_url: summary.schedule_links.first().map(|l| l.href.clone()),
        team_count: summary.teams.len() as u32,
        season,
    })?;

    // Registry links only appear on the landing page; remember them so the
    // pool-assignment upserts below do not drop them.
    let team_links: HashMap<String, String> = summary
        .teams
        .iter()
        .filter_map(|t| t.link.clone().map(|link| (t.name.to_lowercase(), link)))
        .collect();

    for team in &summary.teams {
        sink.upsert_tournament_team(team_record(&slug, &team.name, None, None, team.link.clone(), team_slugs))?;
    }

    let mut matchup_records = Vec::new();
    let mut pool_count = 0;
    let mut bracket_count = 0;
    let mut champions = Vec::new();
    let mut pages_fetched = 0;

    for link in &summary.schedule_links {
        tokio::time::sleep(REQUEST_DELAY).await;

        let page_html = match fetcher::fetch(&link.href).await {
            Ok(html) => html,
            Err(e) => {
                warn!(tournament = %summary.name, url = %link.href, error = %e,
                      "schedule page fetch failed, skipping");
                continue;
            }
        };
        pages_fetched += 1;

        let extract = parse_schedule_page(&page_html);
        let brackets = parse_brackets(&page_html);
        let yielded = extract.teams.len() + extract.matchups.len() + brackets.len();
        warn_if_silent(&link.href, page_html.len(), yielded, "schedule records");

        for assignment in &extract.teams {
            sink.upsert_tournament_team(team_record(
                &slug,
                &assignment.name,
                Some(assignment.pool.clone()),
                assignment.seed,
                team_links.get(&assignment.name.to_lowercase()).cloned(),
                team_slugs,
            ))?;
        }

        matchup_records.extend(extract.matchups.iter().map(|m| MatchupRecord {
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            home_score: m.home_score,
            away_score: m.away_score,
            status: m.status.as_str().to_string(),
        }));

        pool_count += extract.pools.len();
        bracket_count += brackets.len();
        champions.extend(brackets.into_iter().filter_map(|b| b.champion));
    }

    let matchup_count = matchup_records.len();
    store_matchups(sink, &slug, &summary.name, matchup_records, pages_fetched)?;

    let report = TournamentSyncReport {
        slug,
        name: summary.name,
        season,
        teams: summary.teams.len(),
        pools: pool_count,
        matchups: matchup_count,
        brackets: bracket_count,
        champions,
    };

    info!(
        tournament = %report.name,
        season = report.season,
        teams = report.teams,
        pools = report.pools,
        matchups = report.matchups,
        brackets = report.brackets,
        "tournament sync complete"
    );

    Ok(report)
}

fn team_record(
    tournament_slug: &str,
    team_name: &str,
    pool: Option<String>,
    seed: Option<u32>,
    usau_team_url: Option<String>,
    team_slugs: &HashMap<String, String>,
) -> TournamentTeamRecord {
    let team_slug = team_slugs
        .get(&team_name.to_lowercase())
        .cloned()
        .unwrap_or_else(|| slugify(team_name));

    TournamentTeamRecord {
        tournament_slug: tournament_slug.to_string(),
        team_slug,
        team_name: team_name.to_string(),
        pool,
        seed,
        usau_team_url,
    }
}

/// Replaces a tournament's stored matchups only when at least one schedule
/// page actually came back. A run where every fetch failed (or that found no
/// schedule links at all) keeps whatever the sink already holds.
fn store_matchups(
    sink: &mut dyn RecordSink,
    slug: &str,
    tournament_name: &str,
    records: Vec<MatchupRecord>,
    pages_fetched: usize,
) -> Result<(), Box<dyn Error>> {
    if pages_fetched == 0 {
        warn!(tournament = %tournament_name,
              "no schedule page fetched; leaving stored matchups untouched");
        return Ok(());
    }
    sink.replace_matchups(slug, records)
}

fn competition_level(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    if lower.contains("college") {
        Some("College".to_string())
    } else if lower.contains("club") {
        Some("Club".to_string())
    } else {
        None
    }
}

fn warn_if_silent(url: &str, html_len: usize, yielded: usize, kind: &str) {
    if yielded == 0 && html_len > SILENT_PAGE_THRESHOLD {
        warn!(url = %url, bytes = html_len, kind = kind,
              "page yielded zero records; possible markup drift");
    }
}

// ============================================================================
// TESTS
// ============================================================================
