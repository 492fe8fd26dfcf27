use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::dom::{Document, Query};
use crate::names::{clean_team_name, is_division_label, is_plausible_team_name};
use crate::SITE_ROOT;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A participant team reference from a tournament landing page.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRef {
    pub name: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Division,
    Schedule,
}

/// A candidate schedule/division link discovered on the landing page.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleLink {
    pub text: String,
    pub href: String,
    pub kind: LinkKind,
}

/// Everything extracted from one tournament landing page.
#[derive(Debug)]
pub struct TournamentSummary {
    pub name: String,
    pub teams: Vec<TeamRef>,
    pub schedule_links: Vec<ScheduleLink>,
    pub start_date: Option<String>,
    pub location: Option<String>,
}

/// Caps bound the noise from unrelated page links.
const MAX_TEAMS: usize = 50;
const MAX_SCHEDULE_LINKS: usize = 5;

const SCHEDULE_KEYWORDS: &[&str] = &["schedule", "pool", "bracket"];
const DIVISION_HREF_HINTS: &[&str] = &["/schedule/", "/men/", "/women/", "/mixed/"];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2})\b").unwrap())
}

// ============================================================================
// LANDING PAGE EXTRACTION
// ============================================================================

/// Parses a tournament landing page into its name, participant teams and
/// candidate schedule links. Pure function of the HTML; `url` only anchors
/// relative hrefs.
pub fn parse_tournament_page(html: &str, url: &str) -> TournamentSummary {
    let doc = Document::parse(html);

    TournamentSummary {
        name: extract_name(&doc),
        teams: extract_teams(&doc, url),
        schedule_links: extract_schedule_links(&doc, url),
        start_date: extract_start_date(&doc),
        location: extract_location(&doc),
    }
}

fn extract_name(doc: &Document) -> String {
    if let Some(h1) = doc.find_first(&Query::tag("h1")) {
        let text = h1.text();
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(title) = doc.find_first(&Query::tag("title")) {
        let text = title.text();
        let pre_pipe = text.split('|').next().unwrap_or("").trim();
        if !pre_pipe.is_empty() {
            return pre_pipe.to_string();
        }
    }

    "Unknown Tournament".to_string()
}

fn extract_start_date(doc: &Document) -> Option<String> {
    date_re()
        .captures(&doc.root().text())
        .map(|c| c[1].to_string())
}

fn extract_location(doc: &Document) -> Option<String> {
    doc.find_first(&Query::any().with_class_fragment("location"))
        .map(|node| node.text())
        .filter(|text| !text.is_empty())
}

// ============================================================================
// SCHEDULE LINKS
// ============================================================================

fn classify_schedule_link(text: &str, href: &str) -> Option<LinkKind> {
    let lower_text = text.to_lowercase();
    let lower_href = href.to_lowercase();

    if is_division_label(text) && DIVISION_HREF_HINTS.iter().any(|h| lower_href.contains(h)) {
        return Some(LinkKind::Division);
    }

    if SCHEDULE_KEYWORDS
        .iter()
        .any(|k| lower_text.contains(k) || lower_href.contains(k))
    {
        return Some(LinkKind::Schedule);
    }

    None
}

fn extract_schedule_links(doc: &Document, page_url: &str) -> Vec<ScheduleLink> {
    let mut links = Vec::new();
    let mut seen_hrefs = Vec::new();

    for anchor in doc.find_all(&Query::tag("a").with_attr("href")) {
        let href = match anchor.attr("href") {
            Some(h) if !h.is_empty() && !h.starts_with("javascript:") => h,
            _ => continue,
        };
        let text = anchor.text();

        let kind = match classify_schedule_link(&text, href) {
            Some(kind) => kind,
            None => continue,
        };

        let resolved = resolve_href(href, page_url);
        if seen_hrefs.contains(&resolved) {
            continue;
        }
        seen_hrefs.push(resolved.clone());

        links.push(ScheduleLink { text, href: resolved, kind });
        if links.len() >= MAX_SCHEDULE_LINKS {
            break;
        }
    }

    links
}

/// Resolves a possibly-relative href against the site root (absolute paths)
/// or the tournament page URL (relative paths).
pub fn resolve_href(href: &str, page_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", SITE_ROOT, href)
    } else {
        format!("{}/{}", page_url.trim_end_matches('/'), href)
    }
}

// ============================================================================
// PARTICIPANT TEAMS
// ============================================================================

fn extract_teams(doc: &Document, page_url: &str) -> Vec<TeamRef> {
    let mut teams: Vec<TeamRef> = Vec::new();
    let mut seen_lower = Vec::new();

    // Team-shaped anchors first (they carry the registry link), then
    // cell-like elements flagged with a team class but no anchor.
    let anchors = doc.find_all(&Query::tag("a").with_attr("href"));
    let cells = doc.find_all(&Query::tags(&["td", "li", "div", "span"]).with_class_fragment("team"));

    for anchor in anchors {
        let href = anchor.attr("href").unwrap_or_default();
        if !href.to_lowercase().contains("/teams/") && !anchor.class_contains("team") {
            continue;
        }

        push_team(
            &mut teams,
            &mut seen_lower,
            &anchor.text(),
            Some(resolve_href(href, page_url)),
        );
        if teams.len() >= MAX_TEAMS {
            return teams;
        }
    }

    for cell in cells {
        if cell.find_first(&Query::tag("a")).is_some() {
            continue; // the anchor pass already saw it
        }
        push_team(&mut teams, &mut seen_lower, &cell.text(), None);
        if teams.len() >= MAX_TEAMS {
            break;
        }
    }

    teams
}

fn push_team(teams: &mut Vec<TeamRef>, seen_lower: &mut Vec<String>, raw: &str, link: Option<String>) {
    if !is_plausible_team_name(raw) {
        return;
    }

    let name = clean_team_name(raw);
    let lower = name.to_lowercase();
    if name.len() <= 2 || seen_lower.contains(&lower) {
        return;
    }

    seen_lower.push(lower);
    teams.push(TeamRef { name, link });
}

// ============================================================================
// TESTS
// ============================================================================
