pub mod brackets;
pub mod dom;
pub mod fetcher;
pub mod names;
pub mod output;
pub mod pools;
pub mod rankings;
pub mod season;
pub mod sink;
pub mod sync;
pub mod tournament;

use std::fmt;
use std::str::FromStr;

// ============================================================================
// SITE CONSTANTS
// ============================================================================

/// Root of the tournament registry all absolute-path hrefs resolve against.
pub const SITE_ROOT: &str = "https://play.usaultimate.org";

// ============================================================================
// DIVISIONS
// ============================================================================

/// A rankings division on the registry. Invalid division names are rejected
/// here, before any fetch happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Division {
    CollegeMen,
    CollegeWomen,
    ClubMen,
    ClubWomen,
    ClubMixed,
}

impl Division {
    pub const ALL: [Division; 5] = [
        Division::CollegeMen,
        Division::CollegeWomen,
        Division::ClubMen,
        Division::ClubWomen,
        Division::ClubMixed,
    ];

    /// The registry's identifier for this division.
    pub fn label(&self) -> &'static str {
        match self {
            Division::CollegeMen => "College-Men",
            Division::CollegeWomen => "College-Women",
            Division::ClubMen => "Club-Men",
            Division::ClubWomen => "Club-Women",
            Division::ClubMixed => "Club-Mixed",
        }
    }

    /// URL of the first page of this division's ranked-team listing.
    pub fn rankings_url(&self) -> String {
        format!("{}/teams/events/team_rankings/?RankSet={}", SITE_ROOT, self.label())
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Division, String> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "college-men" => Ok(Division::CollegeMen),
            "college-women" => Ok(Division::CollegeWomen),
            "club-men" => Ok(Division::ClubMen),
            "club-women" => Ok(Division::ClubWomen),
            "club-mixed" => Ok(Division::ClubMixed),
            _ => Err(format!(
                "unknown division '{}'; expected one of: college-men, college-women, \
                 club-men, club-women, club-mixed",
                s
            )),
        }
    }
}

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use brackets::{parse_brackets, Bracket, BracketGame, BracketSide, ScoreSlot};
pub use fetcher::{fetch, post_form, reencode_query};
pub use names::{clean_team_name, extract_seed, slugify};
pub use pools::{parse_schedule_page, Matchup, MatchupStatus, PoolStanding, ScheduleExtract};
pub use rankings::{fetch_all_rankings_pages, parse_rankings_page, PageWalk, RankingEntry};
pub use season::derive_season;
pub use sink::{MemorySink, RecordSink};
pub use sync::{sync_division_rankings, sync_tournament};
pub use tournament::{parse_tournament_page, ScheduleLink, TeamRef, TournamentSummary};

// ============================================================================
// TESTS
// ============================================================================
