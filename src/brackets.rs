use serde::Serialize;

use crate::dom::{Document, Node, Query};
use crate::names::{clean_team_name, extract_seed};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A score slot on a bracket game. The slot legitimately carries non-numeric
/// text on real pages ("W", "F", "BYE"), so unparseable values are kept raw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreSlot {
    Points(i64),
    Text(String),
}

/// One side (home or away) of a bracket game.
#[derive(Debug, Clone, Serialize)]
pub struct BracketSide {
    pub team: String,
    pub team_raw: String,
    pub seed: Option<u32>,
    pub score: Option<ScoreSlot>,
    pub won: bool,
}

/// One game in an elimination bracket. `next_game_id` is the tree edge toward
/// the game this one's winner feeds.
#[derive(Debug, Clone, Serialize)]
pub struct BracketGame {
    pub game_id: String,
    pub next_game_id: Option<String>,
    pub round: String,
    pub bracket_name: String,
    pub home: BracketSide,
    pub away: BracketSide,
    pub status: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
}

/// One named elimination bracket: rounds in first-seen document order, its
/// games, and the champion when a terminal game is decided.
#[derive(Debug, Serialize)]
pub struct Bracket {
    pub name: String,
    pub rounds: Vec<String>,
    pub games: Vec<BracketGame>,
    pub champion: Option<String>,
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extracts every bracket slide on a schedule page. A page can carry several
/// (championship plus consolation); each is extracted independently.
pub fn parse_brackets(html: &str) -> Vec<Bracket> {
    let doc = Document::parse(html);
    let mut brackets = Vec::new();

    for slide in doc.find_all(&Query::any().with_class_fragment("slides")) {
        let name = match slide.find_first(&Query::any().with_class_fragment("slide_hdr")) {
            Some(hdr) => hdr.text(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }

        if let Some(bracket) = parse_slide(&slide, name) {
            brackets.push(bracket);
        }
    }

    brackets
}

fn parse_slide(slide: &Node, name: String) -> Option<Bracket> {
    let mut rounds: Vec<String> = Vec::new();
    let mut games = Vec::new();

    for (col_index, column) in slide
        .find_all(&Query::any().with_class_fragment("bracket_col"))
        .into_iter()
        .enumerate()
    {
        let round = column
            .find_first(&Query::any().with_class_fragment("col_hdr"))
            .map(|hdr| hdr.text())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Round {}", col_index + 1));

        // Record each round label the first time it is seen; this preserves
        // stage order without assuming a known round count.
        if !rounds.contains(&round) {
            rounds.push(round.clone());
        }

        for game_node in column.find_all(&Query::any().with_class_fragment("bracket_game")) {
            if let Some(game) = parse_game(&game_node, &round, &name) {
                games.push(game);
            }
        }
    }

    if games.is_empty() {
        return None;
    }

    let champion = infer_champion(&games);

    Some(Bracket { name, rounds, games, champion })
}

fn parse_game(node: &Node, round: &str, bracket_name: &str) -> Option<BracketGame> {
    let game_id = node.attr("id")?.to_string();
    let next_game_id = node
        .attr("data-relation")
        .map(str::to_string)
        .filter(|r| !r.is_empty());

    let home = parse_side(node, "top_area")?;
    let away = parse_side(node, "btm_area")?;

    Some(BracketGame {
        game_id,
        next_game_id,
        round: round.to_string(),
        bracket_name: bracket_name.to_string(),
        home,
        away,
        status: side_text(node, "status"),
        date: side_text(node, "date"),
        location: side_text(node, "location"),
    })
}

fn parse_side(game: &Node, area_class: &'static str) -> Option<BracketSide> {
    let side = game.find_first(&Query::any().with_class_fragment(area_class))?;

    let team_raw = side
        .find_first(&Query::any().with_class_fragment("team"))
        .map(|t| t.text())
        .unwrap_or_else(|| side.text());

    let score = side
        .find_first(&Query::any().with_class_fragment("score"))
        .map(|s| s.text())
        .filter(|s| !s.is_empty())
        .map(parse_score);

    Some(BracketSide {
        team: clean_team_name(&team_raw),
        seed: extract_seed(&team_raw),
        team_raw,
        score,
        won: side.class_contains("winner"),
    })
}

fn parse_score(raw: String) -> ScoreSlot {
    match raw.parse::<i64>() {
        Ok(points) => ScoreSlot::Points(points),
        Err(_) => ScoreSlot::Text(raw),
    }
}

fn side_text(game: &Node, class_fragment: &'static str) -> Option<String> {
    game.find_first(&Query::any().with_class_fragment(class_fragment))
        .map(|n| n.text())
        .filter(|t| !t.is_empty())
}

/// The final is the game with no outgoing relation and a decided side; that
/// side's cleaned team name is the bracket champion.
fn infer_champion(games: &[BracketGame]) -> Option<String> {
    games
        .iter()
        .filter(|g| g.next_game_id.is_none())
        .find_map(|game| {
            let winner = if game.home.won {
                &game.home.team
            } else if game.away.won {
                &game.away.team
            } else {
                return None;
            };
            if winner.is_empty() {
                None
            } else {
                Some(winner.clone())
            }
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket_html(final_home_class: &str, final_away_class: &str) -> String {
        format!(
            r#"
            <div class="slides">
                <h3 class="slide_hdr">Championship Bracket</h3>
                <div class="bracket_col">
                    <h4 class="col_hdr">Semifinals</h4>
                    <div class="bracket_game" id="game_101" data-relation="game_201">
                        <div class="top_area winner">
                            <span class="team">Generic U (1)</span><span class="score">13</span>
                        </div>
                        <div class="btm_area">
                            <span class="team">State College (4)</span><span class="score">8</span>
                        </div>
                        <span class="status">Final</span>
                        <span class="date">Sat 10:00 AM</span>
                        <span class="location">Field 3</span>
                    </div>
                    <div class="bracket_game" id="game_102" data-relation="game_201">
                        <div class="top_area">
                            <span class="team">Third Coast (2)</span><span class="score">BYE</span>
                        </div>
                        <div class="btm_area winner">
                            <span class="team">Lone Star (3)</span><span class="score">11</span>
                        </div>
                    </div>
                </div>
                <div class="bracket_col">
                    <h4 class="col_hdr">Final</h4>
                    <div class="bracket_game" id="game_201">
                        <div class="{final_home}">
                            <span class="team">Generic U (1)</span><span class="score">15</span>
                        </div>
                        <div class="{final_away}">
                            <span class="team">Lone Star (3)</span><span class="score">10</span>
                        </div>
                    </div>
                </div>
            </div>
            "#,
            final_home = final_home_class,
            final_away = final_away_class,
        )
    }

    #[test]
    fn test_rounds_in_first_seen_order() {
        let brackets = parse_brackets(&bracket_html("top_area winner", "btm_area"));
        assert_eq!(brackets.len(), 1);
        assert_eq!(brackets[0].name, "Championship Bracket");
        assert_eq!(brackets[0].rounds, vec!["Semifinals", "Final"]);
        assert_eq!(brackets[0].games.len(), 3);
    }

    #[test]
    fn test_game_fields_and_tree_edges() {
        let brackets = parse_brackets(&bracket_html("top_area winner", "btm_area"));
        let semi = &brackets[0].games[0];
        assert_eq!(semi.game_id, "game_101");
        assert_eq!(semi.next_game_id.as_deref(), Some("game_201"));
        assert_eq!(semi.round, "Semifinals");
        assert_eq!(semi.home.team, "Generic U");
        assert_eq!(semi.home.team_raw, "Generic U (1)");
        assert_eq!(semi.home.seed, Some(1));
        assert_eq!(semi.home.score, Some(ScoreSlot::Points(13)));
        assert!(semi.home.won);
        assert!(!semi.away.won);
        assert_eq!(semi.status.as_deref(), Some("Final"));
        assert_eq!(semi.location.as_deref(), Some("Field 3"));

        let bye = &brackets[0].games[1];
        assert_eq!(bye.home.score, Some(ScoreSlot::Text("BYE".to_string())));

        let final_game = &brackets[0].games[2];
        assert!(final_game.next_game_id.is_none());
    }

    #[test]
    fn test_champion_from_decided_terminal_game() {
        let brackets = parse_brackets(&bracket_html("top_area winner", "btm_area"));
        assert_eq!(brackets[0].champion.as_deref(), Some("Generic U"));

        let away_wins = parse_brackets(&bracket_html("top_area", "btm_area winner"));
        assert_eq!(away_wins[0].champion.as_deref(), Some("Lone Star"));
    }

    #[test]
    fn test_undecided_terminal_game_leaves_champion_unset() {
        let brackets = parse_brackets(&bracket_html("top_area", "btm_area"));
        assert!(brackets[0].champion.is_none());
    }

    #[test]
    fn test_multiple_brackets_extracted_independently() {
        let html = format!(
            "{}{}",
            bracket_html("top_area winner", "btm_area"),
            r#"
            <div class="slides">
                <h3 class="slide_hdr">Consolation Bracket</h3>
                <div class="bracket_col">
                    <div class="bracket_game" id="game_301">
                        <div class="top_area"><span class="team">State College</span></div>
                        <div class="btm_area winner"><span class="team">Third Coast</span></div>
                    </div>
                </div>
            </div>
            "#
        );
        let brackets = parse_brackets(&html);
        assert_eq!(brackets.len(), 2);
        assert_eq!(brackets[1].name, "Consolation Bracket");
        assert_eq!(brackets[1].rounds, vec!["Round 1"]);
        assert_eq!(brackets[1].champion.as_deref(), Some("Third Coast"));
    }

    #[test]
    fn test_untitled_slide_skipped() {
        let html = r#"
            <div class="slides">
                <div class="bracket_col">
                    <div class="bracket_game" id="g1">
                        <div class="top_area"><span class="team">Alpha Club</span></div>
                        <div class="btm_area"><span class="team">Beta Club</span></div>
                    </div>
                </div>
            </div>
        "#;
        assert!(parse_brackets(html).is_empty());
    }
}
