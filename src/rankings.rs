use std::error::Error;

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::dom::{Document, Node, Query};
use crate::fetcher;
use crate::names::clean_team_name;
use crate::SITE_ROOT;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One row of a division's ranked-team listing.
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub team_name: String,
    pub rating: f64,
    pub wins: u32,
    pub losses: u32,
    pub region: String,
    pub conference: String,
    pub team_url: Option<String>,
}

/// A single parsed rankings page: its rows plus the "Rows: X-Y of N" total
/// when the page reports one.
#[derive(Debug)]
pub struct RankingsPage {
    pub entries: Vec<RankingEntry>,
    pub total: Option<u32>,
}

/// Result of walking a division's full pagination.
#[derive(Debug)]
pub struct RankingsWalk {
    pub entries: Vec<RankingEntry>,
    pub reported_total: u32,
}

/// A pagination link discovered on the first page: the page number it claims
/// to lead to plus the postback target/argument encoded in its href.
#[derive(Debug, Clone, PartialEq)]
pub struct PostbackTarget {
    pub page: u32,
    pub target: String,
    pub argument: String,
}

/// Hidden web-forms state lifted from a rankings page. Every POST must carry
/// all three or the server replays page 1.
#[derive(Debug, Clone)]
pub struct FormTokens {
    pub view_state: String,
    pub view_state_generator: String,
    pub event_validation: String,
}

impl FormTokens {
    /// Builds the full POST body for one pagination step.
    pub fn into_fields(self, target: &PostbackTarget) -> Vec<(String, String)> {
        vec![
            ("__EVENTTARGET".to_string(), target.target.clone()),
            ("__EVENTARGUMENT".to_string(), target.argument.clone()),
            ("__VIEWSTATE".to_string(), self.view_state),
            ("__VIEWSTATEGENERATOR".to_string(), self.view_state_generator),
            ("__EVENTVALIDATION".to_string(), self.event_validation),
        ]
    }
}

// ============================================================================
// ROW EXTRACTION
// ============================================================================

fn total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Rows:\s*(\d+)\s*[-\u{2013}]\s*(\d+)\s*of\s*(\d+)").unwrap())
}

fn postback_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__doPostBack\('([^']*)'\s*,\s*'([^']*)'\)").unwrap())
}

/// Parses one rankings-table page into entries plus the reported row total.
pub fn parse_rankings_page(html: &str) -> RankingsPage {
    let doc = Document::parse(html);

    let entries = doc
        .find_all(&Query::tag("tr"))
        .iter()
        .filter_map(parse_ranking_row)
        .collect();

    let total = total_re()
        .captures(&doc.root().text())
        .and_then(|c| c.get(3))
        .and_then(|m| m.as_str().parse().ok());

    RankingsPage { entries, total }
}

/// Parses one table row into a ranking entry.
///
/// Requires at least 8 cells; an unparseable rank or rating rejects the row
/// (which is also what filters header and footer rows). Region/conference
/// come from fixed columns 6 and 7 — the registry's layout has been stable
/// for years, and this sync is best-effort, so no header validation is done;
/// a column reorder upstream would misattribute those two fields silently.
fn parse_ranking_row(row: &Node) -> Option<RankingEntry> {
    let cells = row.find_all(&Query::tag("td"));
    if cells.len() < 8 {
        return None;
    }

    let rank: u32 = cells[0].text().parse().ok()?;

    let (team_name, team_url) = match cells[1].find_first(&Query::tag("a")) {
        Some(anchor) => (
            clean_team_name(&anchor.text()),
            anchor.attr("href").map(resolve_site_href),
        ),
        None => (clean_team_name(&cells[1].text()), None),
    };

    let rating: f64 = cells[2].text().parse().ok().filter(|r: &f64| r.is_finite())?;

    let wins = cells[cells.len() - 2].text().parse().unwrap_or(0);
    let losses = cells[cells.len() - 1].text().parse().unwrap_or(0);

    Some(RankingEntry {
        rank,
        team_name,
        rating,
        wins,
        losses,
        region: cells[6].text(),
        conference: cells[7].text(),
        team_url,
    })
}

fn resolve_site_href(href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", SITE_ROOT, href)
    } else {
        href.to_string()
    }
}

// ============================================================================
// POSTBACK DISCOVERY
// ============================================================================

/// Finds pagination links: postback anchors whose visible text is a bare page
/// number greater than 1, or an ellipsis expander. Document order.
pub fn postback_targets(doc: &Document) -> Vec<PostbackTarget> {
    let mut targets = Vec::new();

    for anchor in doc.find_all(&Query::tag("a").with_attr("href")) {
        let href = match anchor.attr("href") {
            Some(h) if h.contains("__doPostBack") => h,
            _ => continue,
        };

        let text = anchor.text();
        let page = if text == "..." || text == "\u{2026}" {
            0 // expander link; page unknown until followed
        } else {
            match text.parse::<u32>() {
                Ok(n) if n > 1 => n,
                _ => continue,
            }
        };

        if let Some(caps) = postback_re().captures(href) {
            targets.push(PostbackTarget {
                page,
                target: caps[1].to_string(),
                argument: caps[2].to_string(),
            });
        }
    }

    targets
}

/// Lifts the hidden view-state tokens from a page. `None` when `__VIEWSTATE`
/// is absent, which the driver treats as an expired session.
pub fn form_tokens(doc: &Document) -> Option<FormTokens> {
    let view_state = hidden_input(doc, "__VIEWSTATE")?;

    Some(FormTokens {
        view_state,
        view_state_generator: hidden_input(doc, "__VIEWSTATEGENERATOR").unwrap_or_default(),
        event_validation: hidden_input(doc, "__EVENTVALIDATION").unwrap_or_default(),
    })
}

fn hidden_input(doc: &Document, name: &str) -> Option<String> {
    doc.find_all(&Query::tag("input").with_attr("name"))
        .into_iter()
        .find(|input| input.attr("name") == Some(name))
        .and_then(|input| input.attr("value"))
        .map(str::to_string)
}

// ============================================================================
// PAGINATION DRIVER
// ============================================================================

/// Additional pages fetched beyond the first, regardless of how many postback
/// links the page advertises. Bounds load on the registry.
const MAX_EXTRA_PAGES: usize = 11;

/// Incremental walk over a listing's postback pagination.
///
/// The walk itself never touches the network: it plans each POST from the
/// current page's postback links and view-state tokens, and absorbs whatever
/// response the caller fetched. `fetch_all_rankings_pages` drives it over the
/// real transport.
pub struct PageWalk {
    entries: Vec<RankingEntry>,
    reported_total: u32,
    targets: std::vec::IntoIter<PostbackTarget>,
    current_html: Option<String>,
    posts_planned: usize,
}

impl PageWalk {
    /// Starts a walk from the first (GET) page of a listing.
    pub fn start(first_html: String) -> PageWalk {
        let first_page = parse_rankings_page(&first_html);
        let entries = first_page.entries;
        let reported_total = first_page.total.unwrap_or(entries.len() as u32);

        let covered = entries.is_empty() || entries.len() as u32 >= reported_total;
        let targets = if covered {
            Vec::new()
        } else {
            postback_targets(&Document::parse(&first_html))
        };

        PageWalk {
            entries,
            reported_total,
            targets: targets.into_iter(),
            current_html: (!covered).then_some(first_html),
            posts_planned: 0,
        }
    }

    /// Plans the next pagination POST: the target plus the full form body,
    /// with the view-state tokens lifted from the current page. `None` ends
    /// the walk — no targets left, the extra-page cap reached, or the hidden
    /// tokens gone (expired session).
    pub fn next_post(&mut self) -> Option<(PostbackTarget, Vec<(String, String)>)> {
        if self.posts_planned >= MAX_EXTRA_PAGES {
            self.current_html = None;
        }
        let html = self.current_html.take()?;
        let target = self.targets.next()?;

        let tokens = match form_tokens(&Document::parse(&html)) {
            Some(tokens) => tokens,
            None => {
                debug!("view-state token missing, session likely expired; ending walk");
                return None;
            }
        };

        self.posts_planned += 1;
        let fields = tokens.into_fields(&target);
        Some((target, fields))
    }

    /// Absorbs one fetched page. Returns `false` when the walk should stop:
    /// the page had no rows, or the reported total is now covered.
    pub fn absorb_page(&mut self, html: String) -> bool {
        let page = parse_rankings_page(&html);
        if page.entries.is_empty() {
            return false;
        }

        self.entries.extend(page.entries);
        if self.entries.len() as u32 >= self.reported_total {
            return false;
        }

        self.current_html = Some(html);
        true
    }

    /// Everything accumulated so far, partial or complete.
    pub fn finish(self) -> RankingsWalk {
        RankingsWalk {
            entries: self.entries,
            reported_total: self.reported_total,
        }
    }
}

/// Walks every page of a division's rankings listing.
///
/// GETs the first page, then re-POSTs the captured view-state tokens for each
/// discovered postback link. A missing token or an empty page ends the walk
/// normally; a fetch error logs and returns whatever accumulated — this is a
/// best-effort cache refresh, not a transactional import.
pub async fn fetch_all_rankings_pages(url: &str) -> Result<RankingsWalk, Box<dyn Error>> {
    let first_html = fetcher::fetch(url).await?;
    let mut walk = PageWalk::start(first_html);

    while let Some((target, fields)) = walk.next_post() {
        let html = match fetcher::post_form(url, &fields).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, page = target.page, error = %e,
                      "rankings page fetch failed, keeping partial results");
                break;
            }
        };

        if !walk.absorb_page(html) {
            break;
        }
    }

    Ok(walk.finish())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row_html(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<table><tr>{}</tr></table>", tds)
    }

    #[test]
    fn test_valid_row_parses() {
        let html = row_html(&[
            "1",
            r#"<a href="/teams/events/Eventteam/?TeamId=x1">Generic U</a>"#,
            "2514.33",
            "x",
            "x",
            "x",
            "Southwest",
            "SW D-I",
            "18",
            "2",
        ]);
        let page = parse_rankings_page(&html);
        assert_eq!(page.entries.len(), 1);

        let entry = &page.entries[0];
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.team_name, "Generic U");
        assert_eq!(entry.rating, 2514.33);
        assert_eq!(entry.wins, 18);
        assert_eq!(entry.losses, 2);
        assert_eq!(entry.region, "Southwest");
        assert_eq!(entry.conference, "SW D-I");
        assert_eq!(
            entry.team_url.as_deref(),
            Some("https://play.usaultimate.org/teams/events/Eventteam/?TeamId=x1")
        );
    }

    #[test]
    fn test_short_row_rejected() {
        let html = row_html(&["1", "Generic U", "2514.33", "Southwest", "SW D-I", "18", "2"]);
        assert!(parse_rankings_page(&html).entries.is_empty());
    }

    #[test]
    fn test_header_row_rejected() {
        let html = row_html(&["Rank", "Team", "Rating", "a", "b", "c", "Region", "Conf", "W", "L"]);
        assert!(parse_rankings_page(&html).entries.is_empty());
    }

    #[test]
    fn test_bad_rating_rejected() {
        let html = row_html(&["1", "Generic U", "n/a", "x", "x", "x", "SW", "SW D-I", "18", "2"]);
        assert!(parse_rankings_page(&html).entries.is_empty());
    }

    #[test]
    fn test_unparseable_record_defaults_to_zero() {
        let html = row_html(&["4", "Generic U", "1800.1", "x", "x", "x", "SW", "SW D-I", "-", "-"]);
        let page = parse_rankings_page(&html);
        assert_eq!(page.entries[0].wins, 0);
        assert_eq!(page.entries[0].losses, 0);
    }

    #[test]
    fn test_total_extraction() {
        let html = "<div><span>Rows: 1-20 of 312</span></div>";
        assert_eq!(parse_rankings_page(html).total, Some(312));
    }

    #[test]
    fn test_postback_targets() {
        let html = r#"
            <div class="pager">
                <span>1</span>
                <a href="javascript:__doPostBack('gv','Page$2')">2</a>
                <a href="javascript:__doPostBack('gv','Page$3')">3</a>
                <a href="javascript:__doPostBack('gv','Page$11')">...</a>
                <a href="/teams/">Teams</a>
            </div>
        "#;
        let doc = Document::parse(html);
        let targets = postback_targets(&doc);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].page, 2);
        assert_eq!(targets[0].target, "gv");
        assert_eq!(targets[0].argument, "Page$2");
        assert_eq!(targets[2].page, 0); // ellipsis expander
    }

    #[test]
    fn test_form_tokens_require_viewstate() {
        let with = Document::parse(
            r#"<form>
                <input type="hidden" name="__VIEWSTATE" value="abc" />
                <input type="hidden" name="__VIEWSTATEGENERATOR" value="def" />
                <input type="hidden" name="__EVENTVALIDATION" value="ghi" />
            </form>"#,
        );
        let tokens = form_tokens(&with).unwrap();
        assert_eq!(tokens.view_state, "abc");
        assert_eq!(tokens.event_validation, "ghi");

        let without = Document::parse(r#"<form><input name="other" value="x" /></form>"#);
        assert!(form_tokens(&without).is_none());
    }

    #[test]
    fn test_post_fields_carry_target_and_tokens() {
        let tokens = FormTokens {
            view_state: "vs".into(),
            view_state_generator: "gen".into(),
            event_validation: "ev".into(),
        };
        let target = PostbackTarget {
            page: 2,
            target: "gv".into(),
            argument: "Page$2".into(),
        };
        let fields = tokens.into_fields(&target);
        assert_eq!(fields[0], ("__EVENTTARGET".to_string(), "gv".to_string()));
        assert_eq!(fields[1].1, "Page$2");
        assert_eq!(fields[2].1, "vs");
    }

    /// Builds one listing page: `rows` ranked rows starting at `first_rank`,
    /// a "Rows: X-Y of N" span, pager links for pages 2..=`pager_pages`, and
    /// optionally the hidden view-state inputs.
    fn listing_page(first_rank: u32, rows: u32, total: u32, pager_pages: u32, viewstate: bool) -> String {
        let mut html = String::new();
        if viewstate {
            html.push_str(r#"<input type="hidden" name="__VIEWSTATE" value="vs" />"#);
            html.push_str(r#"<input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />"#);
            html.push_str(r#"<input type="hidden" name="__EVENTVALIDATION" value="ev" />"#);
        }
        html.push_str(&format!(
            "<span>Rows: {}-{} of {}</span><table>",
            first_rank,
            first_rank + rows - 1,
            total
        ));
        for rank in first_rank..first_rank + rows {
            html.push_str(&format!(
                "<tr><td>{rank}</td><td>Team {rank}</td><td>1500.5</td><td>x</td><td>x</td>\
                 <td>x</td><td>SW</td><td>SW D-I</td><td>3</td><td>1</td></tr>"
            ));
        }
        html.push_str("</table>");
        for page in 2..=pager_pages {
            html.push_str(&format!(
                r#"<a href="javascript:__doPostBack('gv','Page${page}')">{page}</a>"#
            ));
        }
        html
    }

    #[test]
    fn test_walk_single_page_plans_no_posts() {
        // "Rows: 1-50 of 50": the first page covers the total, no POST happens.
        let mut walk = PageWalk::start(listing_page(1, 50, 50, 4, true));
        assert!(walk.next_post().is_none());

        let result = walk.finish();
        assert_eq!(result.entries.len(), 50);
        assert_eq!(result.reported_total, 50);
    }

    #[test]
    fn test_walk_absorbs_until_total_covered() {
        let mut walk = PageWalk::start(listing_page(1, 2, 6, 5, true));

        let (target, fields) = walk.next_post().unwrap();
        assert_eq!(target.page, 2);
        assert_eq!(fields[0], ("__EVENTTARGET".to_string(), "gv".to_string()));
        assert!(walk.absorb_page(listing_page(3, 2, 6, 5, true)));

        let (target, _) = walk.next_post().unwrap();
        assert_eq!(target.page, 3);
        // Third page covers the reported total.
        assert!(!walk.absorb_page(listing_page(5, 2, 6, 5, true)));

        let result = walk.finish();
        assert_eq!(result.entries.len(), 6);
        assert_eq!(result.entries[4].rank, 5);
    }

    #[test]
    fn test_walk_stops_on_empty_page_keeping_partials() {
        let mut walk = PageWalk::start(listing_page(1, 2, 10, 4, true));
        assert!(walk.next_post().is_some());
        assert!(!walk.absorb_page("<div>No results found.</div>".to_string()));

        // First page's rows survive the early stop.
        let result = walk.finish();
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.reported_total, 10);
    }

    #[test]
    fn test_walk_stops_when_viewstate_disappears() {
        let mut walk = PageWalk::start(listing_page(1, 2, 10, 4, true));
        assert!(walk.next_post().is_some());
        // Second page comes back without hidden form state: expired session.
        assert!(walk.absorb_page(listing_page(3, 2, 10, 4, false)));
        assert!(walk.next_post().is_none());
        assert_eq!(walk.finish().entries.len(), 4);
    }

    #[test]
    fn test_walk_caps_extra_pages() {
        // Listing advertising far more pages than the cap allows.
        let mut walk = PageWalk::start(listing_page(1, 2, 1000, 30, true));

        let mut posts = 0;
        while walk.next_post().is_some() {
            posts += 1;
            let first_rank = 1 + posts * 2;
            assert!(walk.absorb_page(listing_page(first_rank, 2, 1000, 30, true)));
        }

        assert_eq!(posts, 11);
        assert_eq!(walk.finish().entries.len(), 24);
    }
}
