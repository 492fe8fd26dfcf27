use std::error::Error;
use std::fs::File;

use crate::sink::{MemorySink, RankedTeamRecord};

const RANKINGS_CSV_FILE: &str = "rankings.csv";
const TEAMS_CSV_FILE: &str = "tournament_teams.csv";
const MATCHUPS_CSV_FILE: &str = "matchups.csv";

// ============================================================================
// RANKINGS CSV
// ============================================================================

/// Writes ranked-team records to rankings.csv.
pub fn write_rankings_csv(records: &[RankedTeamRecord]) -> Result<(), Box<dyn Error>> {
    let file = File::create(RANKINGS_CSV_FILE)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "rank", "team", "slug", "division", "region", "conference", "rating", "wins", "losses",
        "season", "usau_url",
    ])?;

    for record in records {
        writer.write_record(&[
            record.ranking.to_string(),
            record.name.clone(),
            record.slug.clone(),
            record.division.clone(),
            record.region.clone(),
            record.conference.clone(),
            format!("{:.2}", record.rating),
            record.wins.to_string(),
            record.losses.to_string(),
            record.season.to_string(),
            record.usau_url.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    println!("Rankings written to {}", RANKINGS_CSV_FILE);
    Ok(())
}

// ============================================================================
// TOURNAMENT CSV
// ============================================================================

/// Writes a sync run's tournament teams and matchups to CSV files.
pub fn write_tournament_csv(sink: &MemorySink) -> Result<(), Box<dyn Error>> {
    let file = File::create(TEAMS_CSV_FILE)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(["tournament", "team", "slug", "pool", "seed", "usau_team_url"])?;
    for record in &sink.tournament_teams {
        writer.write_record(&[
            record.tournament_slug.clone(),
            record.team_name.clone(),
            record.team_slug.clone(),
            record.pool.clone().unwrap_or_default(),
            record.seed.map(|s| s.to_string()).unwrap_or_default(),
            record.usau_team_url.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    println!("Teams written to {}", TEAMS_CSV_FILE);

    let file = File::create(MATCHUPS_CSV_FILE)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "tournament", "home_team", "home_score", "away_score", "away_team", "status",
    ])?;
    for (tournament_slug, matchups) in &sink.matchups {
        for matchup in matchups {
            writer.write_record(&[
                tournament_slug.clone(),
                matchup.home_team.clone(),
                matchup.home_score.to_string(),
                matchup.away_score.to_string(),
                matchup.away_team.clone(),
                matchup.status.clone(),
            ])?;
        }
    }
    writer.flush()?;
    println!("Matchups written to {}", MATCHUPS_CSV_FILE);

    Ok(())
}
