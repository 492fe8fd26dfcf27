use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;

// ============================================================================
// DOWNSTREAM RECORDS
// ============================================================================
//
// The scrape pipeline hands normalized records to a persistence sink through
// this narrow contract. Records are keyed by slugs derived from names; the
// sink owns idempotence.

#[derive(Debug, Clone, Serialize)]
pub struct RankedTeamRecord {
    pub slug: String,
    pub name: String,
    pub division: String,
    pub region: String,
    pub conference: String,
    pub ranking: u32,
    pub rating: f64,
    pub wins: u32,
    pub losses: u32,
    pub usau_url: Option<String>,
    pub season: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TournamentRecord {
    pub slug: String,
    pub name: String,
    pub usau_url: String,
    pub start_date: Option<String>,
    pub location: Option<String>,
    pub competition_level: Option<String>,
    pub gender_division: Option<String>,
    pub schedule_url: Option<String>,
    pub team_count: u32,
    pub season: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TournamentTeamRecord {
    pub tournament_slug: String,
    pub team_slug: String,
    pub team_name: String,
    pub pool: Option<String>,
    pub seed: Option<u32>,
    pub usau_team_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchupRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: String,
}

// ============================================================================
// SINK CONTRACT
// ============================================================================

/// Where scraped records land. Upserts are idempotent on their keys; matchups
/// are replaced wholesale per tournament since they have no stable identity.
pub trait RecordSink {
    fn upsert_ranked_team(&mut self, record: RankedTeamRecord) -> Result<(), Box<dyn Error>>;

    fn upsert_tournament(&mut self, record: TournamentRecord) -> Result<(), Box<dyn Error>>;

    /// Keyed by (tournament_slug, team_name).
    fn upsert_tournament_team(&mut self, record: TournamentTeamRecord) -> Result<(), Box<dyn Error>>;

    fn replace_matchups(
        &mut self,
        tournament_slug: &str,
        matchups: Vec<MatchupRecord>,
    ) -> Result<(), Box<dyn Error>>;
}

// ============================================================================
// IN-MEMORY SINK
// ============================================================================

/// Sink that records everything in memory. Used by tests and by the CLI,
/// which exports the collected records afterward.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub ranked_teams: Vec<RankedTeamRecord>,
    pub tournaments: Vec<TournamentRecord>,
    pub tournament_teams: Vec<TournamentTeamRecord>,
    pub matchups: HashMap<String, Vec<MatchupRecord>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }
}

impl RecordSink for MemorySink {
    fn upsert_ranked_team(&mut self, record: RankedTeamRecord) -> Result<(), Box<dyn Error>> {
        match self.ranked_teams.iter_mut().find(|r| r.slug == record.slug) {
            Some(existing) => *existing = record,
            None => self.ranked_teams.push(record),
        }
        Ok(())
    }

    fn upsert_tournament(&mut self, record: TournamentRecord) -> Result<(), Box<dyn Error>> {
        match self.tournaments.iter_mut().find(|r| r.slug == record.slug) {
            Some(existing) => *existing = record,
            None => self.tournaments.push(record),
        }
        Ok(())
    }

    fn upsert_tournament_team(&mut self, record: TournamentTeamRecord) -> Result<(), Box<dyn Error>> {
        let found = self.tournament_teams.iter_mut().find(|r| {
            r.tournament_slug == record.tournament_slug && r.team_name == record.team_name
        });
        match found {
            Some(existing) => *existing = record,
            None => self.tournament_teams.push(record),
        }
        Ok(())
    }

    fn replace_matchups(
        &mut self,
        tournament_slug: &str,
        matchups: Vec<MatchupRecord>,
    ) -> Result<(), Box<dyn Error>> {
        self.matchups.insert(tournament_slug.to_string(), matchups);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
