use serde::Serialize;

use crate::model::board::{Board, Deliverable, Lane, Milestone};
use crate::ops::filter::Health;
use crate::parse::title::extract_outcome;
use crate::util::unicode::{pad_to_width, truncate_to_width};

/// Cells given to a card title in one-line listings
const TITLE_CELLS: usize = 48;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LaneJson<'a> {
    #[serde(flatten)]
    pub lane: &'a Lane,
    pub deliverables: usize,
}

#[derive(Serialize)]
pub struct LaneStatsJson<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub group: &'a str,
    pub stats: Health,
}

#[derive(Serialize)]
pub struct StatsJson<'a> {
    pub lanes: Vec<LaneStatsJson<'a>>,
    pub totals: Health,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditJson<'a> {
    pub deliverable: &'a Deliverable,
    /// Whether the remote patch was applied
    pub written_back: bool,
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Status marker, or a check for finished cards
fn card_marker(d: &Deliverable) -> char {
    if d.is_done { '✓' } else { d.status.marker() }
}

/// One card as a single line
pub fn format_card_line(d: &Deliverable) -> String {
    let title = pad_to_width(&truncate_to_width(&d.title, TITLE_CELLS), TITLE_CELLS);
    let date = d.delivery_date.as_deref().unwrap_or("-");
    format!(
        "{} {}  {}  {:<10}  {}  [{}]",
        card_marker(d),
        d.quarter_id,
        title,
        date,
        d.owner,
        d.id
    )
}

/// Lane banner for grouped listings
pub fn format_lane_header(lane: &Lane) -> String {
    match &lane.subtitle {
        Some(sub) => format!("== {} ({}) - {} ==", lane.title, lane.id, sub),
        None => format!("== {} ({}) ==", lane.title, lane.id),
    }
}

/// Cards grouped under their lanes, in lane order. Lanes with no cards are
/// left out.
pub fn format_board(board: &Board, cards: &[&Deliverable]) -> Vec<String> {
    let mut lines = Vec::new();
    for lane in &board.lanes {
        let in_lane: Vec<&&Deliverable> = cards.iter().filter(|d| d.lane_id == lane.id).collect();
        if in_lane.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format_lane_header(lane));
        for d in in_lane {
            lines.push(format_card_line(d));
        }
    }
    lines
}

pub fn format_milestone_line(m: &Milestone) -> String {
    format!("{} {}  {:<12}  {}", m.status.marker(), m.quarter_id, m.date, m.title)
}

/// Full card view
pub fn format_card_detail(board: &Board, d: &Deliverable) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{} {}", card_marker(d), d.title));
    lines.push(format!("id: {}", d.id));

    let lane = board
        .lane(&d.lane_id)
        .map(|l| format!("{} ({})", l.title, l.id))
        .unwrap_or_else(|| d.lane_id.clone());
    lines.push(format!("lane: {}", lane));
    lines.push(format!("quarter: {}", d.quarter_id));

    let status = if d.is_done {
        format!("{} (done)", d.status)
    } else {
        d.status.to_string()
    };
    lines.push(format!("status: {}", status));
    lines.push(format!("owner: {}", d.owner));
    lines.push(format!(
        "delivery date: {}",
        d.delivery_date.as_deref().unwrap_or("TBD")
    ));
    if let Some(b) = &d.blocker {
        lines.push(format!("blocker: {}", b));
    }
    if let Some(m) = &d.milestone_title {
        lines.push(format!("milestone: {}", extract_outcome(m)));
    }
    if let Some(url) = &d.wiki_url {
        lines.push(format!("wiki: {}", url));
    }
    if !d.notes.is_empty() {
        lines.push("notes:".to_string());
        for line in d.notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// Health counts as a compact row
pub fn format_health(h: &Health) -> String {
    format!(
        "{:>4}  {:>4}● {:>4}◐ {:>4}○ {:>4}✓",
        h.total, h.on_track, h.at_risk, h.blocked, h.done
    )
}

pub fn format_lane_line(lane: &Lane, count: usize) -> String {
    format!("  {} ({}) [{}]  {} cards", lane.title, lane.id, lane.group, count)
}
