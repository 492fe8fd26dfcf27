use usau_scraper::dom::Document;
use usau_scraper::pools::MatchupStatus;
use usau_scraper::rankings::{form_tokens, parse_rankings_page, postback_targets};
use usau_scraper::tournament::LinkKind;
use usau_scraper::{parse_brackets, parse_schedule_page, parse_tournament_page, ScoreSlot};

const RANKINGS_PAGE: &str = include_str!("fixtures/rankings_page.html");
const TOURNAMENT_PAGE: &str = include_str!("fixtures/tournament_page.html");
const SCHEDULE_PAGE: &str = include_str!("fixtures/schedule_page.html");

const TOURNAMENT_URL: &str = "https://play.usaultimate.org/events/Test-Invite-2025";

// ============================================================================
// RANKINGS
// ============================================================================

#[test]
fn test_rankings_page_rows_and_total() {
    let page = parse_rankings_page(RANKINGS_PAGE);

    assert_eq!(page.total, Some(30));
    assert_eq!(page.entries.len(), 3);

    let first = &page.entries[0];
    assert_eq!(first.rank, 1);
    assert_eq!(first.team_name, "Generic U");
    assert_eq!(first.rating, 2514.33);
    assert_eq!((first.wins, first.losses), (18, 2));
    assert_eq!(first.region, "Southwest");
    assert_eq!(first.conference, "SW D-I");
    assert_eq!(
        first.team_url.as_deref(),
        Some("https://play.usaultimate.org/teams/events/Eventteam/?TeamId=t1")
    );

    // Row without an anchor falls back to the cell text; an unparseable wins
    // cell defaults to zero.
    let third = &page.entries[2];
    assert_eq!(third.team_name, "Third Coast");
    assert!(third.team_url.is_none());
    assert_eq!((third.wins, third.losses), (0, 5));
}

#[test]
fn test_rankings_pagination_plan() {
    let doc = Document::parse(RANKINGS_PAGE);

    let targets = postback_targets(&doc);
    assert_eq!(targets.len(), 3);
    assert_eq!(targets[0].page, 2);
    assert_eq!(targets[0].target, "ctl00$gvRankings");
    assert_eq!(targets[0].argument, "Page$2");
    assert_eq!(targets[2].page, 0); // the "..." expander

    let tokens = form_tokens(&doc).expect("fixture carries a view-state token");
    assert_eq!(tokens.view_state, "dDwtMTQ4OTIyNzMxMjs7Pg==");
    assert_eq!(tokens.view_state_generator, "CA0B0334");
}

// ============================================================================
// TOURNAMENT LANDING PAGE
// ============================================================================

#[test]
fn test_tournament_landing_page() {
    let summary = parse_tournament_page(TOURNAMENT_PAGE, TOURNAMENT_URL);

    assert_eq!(summary.name, "Test Invite 2025");
    assert_eq!(summary.start_date.as_deref(), Some("3/1/2025"));
    assert_eq!(summary.location.as_deref(), Some("Stevinson, CA"));

    // Navigation, the duplicate, and the bracket placeholder are filtered out;
    // the anchor-less cell team is kept.
    let names: Vec<&str> = summary.teams.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Generic U", "State College", "Third Coast", "Lone Star"]);
    assert!(summary.teams[0].link.as_deref().unwrap().contains("TeamId=a1"));
    assert!(summary.teams[3].link.is_none());

    assert_eq!(summary.schedule_links.len(), 3);
    assert_eq!(summary.schedule_links[0].kind, LinkKind::Division);
    assert_eq!(summary.schedule_links[0].text, "Men");
    assert_eq!(summary.schedule_links[1].kind, LinkKind::Division);
    assert_eq!(summary.schedule_links[2].kind, LinkKind::Schedule);
    assert_eq!(
        summary.schedule_links[2].href,
        format!("{}/pool-play", TOURNAMENT_URL)
    );
}

// ============================================================================
// SCHEDULE PAGE (pools + matchups + brackets)
// ============================================================================

#[test]
fn test_schedule_page_end_to_end() {
    let extract = parse_schedule_page(SCHEDULE_PAGE);

    // One pool from the "Pool A" heading; the header row is rejected.
    assert_eq!(extract.pools.len(), 1);
    let pool = &extract.pools[0];
    assert_eq!(pool.name, "Pool A");
    assert_eq!(pool.teams.len(), 3);
    assert_eq!(pool.teams[0].name, "Generic U");
    assert_eq!(pool.teams[0].seed, Some(1));
    assert_eq!((pool.teams[0].wins, pool.teams[0].losses), (2, 0));

    // Three pool-play games, all completed (two by marker, one by score);
    // the bracket section's game is not counted here.
    assert_eq!(extract.matchups.len(), 3);
    assert!(extract
        .matchups
        .iter()
        .all(|m| m.status == MatchupStatus::Completed));
    assert_eq!(extract.matchups[0].home_team, "Generic U");
    assert_eq!(extract.matchups[0].away_team, "State College");
    assert_eq!((extract.matchups[0].home_score, extract.matchups[0].away_score), (13, 7));
    assert_eq!((extract.matchups[2].home_score, extract.matchups[2].away_score), (11, 9));

    // Page-wide team assignments: each pool team once, tagged with its pool.
    assert_eq!(extract.teams.len(), 3);
    assert!(extract.teams.iter().all(|t| t.pool == "Pool A"));
}

#[test]
fn test_schedule_page_bracket() {
    let brackets = parse_brackets(SCHEDULE_PAGE);

    assert_eq!(brackets.len(), 1);
    let bracket = &brackets[0];
    assert_eq!(bracket.name, "Championship Bracket");
    assert_eq!(bracket.rounds, vec!["Final"]);
    assert_eq!(bracket.games.len(), 1);

    let game = &bracket.games[0];
    assert_eq!(game.game_id, "game_401");
    assert!(game.next_game_id.is_none());
    assert_eq!(game.home.team, "Generic U");
    assert_eq!(game.home.seed, Some(1));
    assert_eq!(game.home.score, Some(ScoreSlot::Points(15)));
    assert!(game.home.won);

    // Terminal decided game crowns the champion.
    assert_eq!(bracket.champion.as_deref(), Some("Generic U"));
}
