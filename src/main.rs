use std::collections::HashMap;
use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use usau_scraper::{output, sync_division_rankings, sync_tournament, Division, MemorySink};

#[derive(Parser)]
#[command(name = "usau_scraper", about = "Scrape USAU rankings and tournament structure")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a division's full ranked-team listing
    Rankings {
        /// Division name, e.g. college-men or club-mixed, or "all"
        division: String,
        /// Also write rankings.csv
        #[arg(long)]
        csv: bool,
    },
    /// Scrape one tournament's teams, pools, matchups and brackets
    Tournament {
        /// Tournament landing-page URL
        url: String,
        /// Also write tournament_teams.csv and matchups.csv
        #[arg(long)]
        csv: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("usau_scraper=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Rankings { division, csv } => {
            let divisions: Vec<Division> = if division.eq_ignore_ascii_case("all") {
                Division::ALL.to_vec()
            } else {
                vec![division.parse()?]
            };

            let mut sink = MemorySink::new();
            for (i, division) in divisions.into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(usau_scraper::sync::REQUEST_DELAY).await;
                }
                let report = sync_division_rankings(division, &mut sink).await?;

                println!("\n{} rankings (season {})", report.division, report.season);
                println!("{:-<72}", "");
                for team in sink.ranked_teams.iter().filter(|t| t.division == division.label()) {
                    println!(
                        "{:>3}. {:<40} {:>8.2}  {:>2}-{:<2} {}",
                        team.ranking, team.name, team.rating, team.wins, team.losses, team.region
                    );
                }
                println!(
                    "\nUpserted {} teams (listing reported {})",
                    report.upserted, report.reported_total
                );
            }

            if csv {
                output::write_rankings_csv(&sink.ranked_teams)?;
            }
        }
        Command::Tournament { url, csv } => {
            let mut sink = MemorySink::new();
            let report = sync_tournament(&url, &mut sink, &HashMap::new()).await?;

            println!("\n{} (season {})", report.name, report.season);
            println!("{:-<72}", "");
            for team in &sink.tournament_teams {
                println!(
                    "  {:<40} {:<10} {}",
                    team.team_name,
                    team.pool.as_deref().unwrap_or("-"),
                    team.seed.map(|s| format!("({})", s)).unwrap_or_default()
                );
            }
            println!(
                "\n{} teams, {} pools, {} matchups, {} brackets",
                report.teams, report.pools, report.matchups, report.brackets
            );
            for champion in &report.champions {
                println!("Champion: {}", champion);
            }

            if csv {
                output::write_tournament_csv(&sink)?;
            }
        }
    }

    Ok(())
}
