use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Serialize;

use crate::model::board::{Board, Deliverable, Status, UNASSIGNED};

/// Status filter. `Done` selects finished cards; the others select open
/// cards with that health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Health(Status),
    Done,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "on-track" | "ontrack" => Ok(StatusFilter::Health(Status::OnTrack)),
            "at-risk" | "atrisk" => Ok(StatusFilter::Health(Status::AtRisk)),
            "blocked" => Ok(StatusFilter::Health(Status::Blocked)),
            "done" => Ok(StatusFilter::Done),
            other => Err(format!(
                "unknown status \"{}\" (expected on-track, at-risk, blocked or done)",
                other
            )),
        }
    }
}

/// Criteria for narrowing the board. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct BoardFilter {
    /// Case-insensitive substring of title or owner
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
    /// Exact owner, case-insensitive
    pub owner: Option<String>,
    /// Lane group, case-insensitive
    pub group: Option<String>,
    pub lane: Option<String>,
}

impl BoardFilter {
    pub fn matches(&self, board: &Board, d: &Deliverable) -> bool {
        if let Some(q) = &self.search {
            let q = q.to_lowercase();
            if !d.title.to_lowercase().contains(&q) && !d.owner.to_lowercase().contains(&q) {
                return false;
            }
        }
        match self.status {
            Some(StatusFilter::Done) if !d.is_done => return false,
            Some(StatusFilter::Health(s)) if d.is_done || d.status != s => return false,
            _ => {}
        }
        if let Some(owner) = &self.owner
            && !d.owner.eq_ignore_ascii_case(owner.trim())
        {
            return false;
        }
        if let Some(lane) = &self.lane
            && &d.lane_id != lane
        {
            return false;
        }
        if let Some(group) = &self.group {
            let lane_group = board.lane(&d.lane_id).map(|l| l.group.as_str());
            if !lane_group.is_some_and(|g| g.eq_ignore_ascii_case(group.trim())) {
                return false;
            }
        }
        true
    }
}

/// Cards passing `filter`, in board order
pub fn filter_board<'a>(board: &'a Board, filter: &BoardFilter) -> Vec<&'a Deliverable> {
    board
        .deliverables
        .iter()
        .filter(|d| filter.matches(board, d))
        .collect()
}

/// Card counts by health. Finished cards count only as done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub total: usize,
    pub on_track: usize,
    pub at_risk: usize,
    pub blocked: usize,
    pub done: usize,
}

pub fn health<'a>(cards: impl IntoIterator<Item = &'a Deliverable>) -> Health {
    let mut h = Health::default();
    for d in cards {
        h.total += 1;
        if d.is_done {
            h.done += 1;
            continue;
        }
        match d.status {
            Status::OnTrack => h.on_track += 1,
            Status::AtRisk => h.at_risk += 1,
            Status::Blocked => h.blocked += 1,
        }
    }
    h
}

/// Distinct assigned owners, sorted
pub fn unique_owners(board: &Board) -> Vec<String> {
    board
        .deliverables
        .iter()
        .map(|d| d.owner.as_str())
        .filter(|o| *o != UNASSIGNED && !o.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Dated cards first, earliest first; undated cards keep their order at the end
pub fn sort_by_date(cards: &mut [&Deliverable]) {
    cards.sort_by(|a, b| match (&a.delivery_date, &b.delivery_date) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
