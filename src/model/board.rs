use serde::{Deserialize, Serialize};

use super::config::{LaneConfig, QuarterConfig};

/// Placeholder owner when no owner line is found
pub const UNASSIGNED: &str = "Unassigned";

/// Display date for milestones without an extractable date
pub const TBD: &str = "TBD";

/// Health of a deliverable or milestone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    OnTrack,
    AtRisk,
    Blocked,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::OnTrack => "on-track",
            Status::AtRisk => "at-risk",
            Status::Blocked => "blocked",
        }
    }

    /// Single-cell marker used in terminal listings
    pub fn marker(self) -> char {
        match self {
            Status::OnTrack => '●',
            Status::AtRisk => '◐',
            Status::Blocked => '○',
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured workstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lane {
    pub id: String,
    pub title: String,
    pub group: String,
    pub subtitle: Option<String>,
    pub wiki_url: Option<String>,
}

impl From<&LaneConfig> for Lane {
    fn from(c: &LaneConfig) -> Self {
        Lane {
            id: c.id.clone(),
            title: c.title.clone(),
            group: c.group.clone(),
            subtitle: c.subtitle.clone(),
            wiki_url: c.wiki_url.clone(),
        }
    }
}

/// A calendar-quarter column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quarter {
    /// e.g. `2026-Q1`
    pub id: String,
    /// e.g. `Q1`
    pub label: String,
    pub year: i32,
}

impl Quarter {
    /// Quarter number 1..=4 taken from the label
    pub fn number(&self) -> Option<u32> {
        self.label
            .trim()
            .trim_start_matches(['Q', 'q'])
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=4).contains(n))
    }
}

impl From<&QuarterConfig> for Quarter {
    fn from(c: &QuarterConfig) -> Self {
        Quarter {
            id: c.id.clone(),
            label: c.label.clone(),
            year: c.year,
        }
    }
}

/// A top-level roadmap milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Source heading block id
    pub id: String,
    pub title: String,
    pub quarter_id: String,
    /// Display date (`Jan 10, 2026`, `Q1 2026` or `TBD`)
    pub date: String,
    pub status: Status,
}

/// A deliverable card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    /// Source marker block id, or a local id for user-created cards
    pub id: String,
    pub title: String,
    pub owner: String,
    pub lane_id: String,
    pub quarter_id: String,
    pub status: Status,
    pub is_done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_title: Option<String>,

    // --- Remote anchors for write-back ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date_block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_block_id: Option<String>,
}

impl Deliverable {
    /// A fresh card with defaults for everything but placement
    pub fn new(id: String, title: String, lane_id: String, quarter_id: String) -> Self {
        Deliverable {
            id,
            title,
            owner: UNASSIGNED.to_string(),
            lane_id,
            quarter_id,
            status: Status::OnTrack,
            is_done: false,
            delivery_date: None,
            blocker: None,
            notes: String::new(),
            wiki_url: None,
            milestone_id: None,
            milestone_title: None,
            owner_block_id: None,
            delivery_date_block_id: None,
            parent_block_id: None,
        }
    }
}

/// In-memory session state for one view. Replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    pub view: String,
    pub lanes: Vec<Lane>,
    pub quarters: Vec<Quarter>,
    pub milestones: Vec<Milestone>,
    pub deliverables: Vec<Deliverable>,
}

impl Board {
    pub fn find(&self, id: &str) -> Option<&Deliverable> {
        self.deliverables.iter().find(|d| d.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Deliverable> {
        self.deliverables.iter_mut().find(|d| d.id == id)
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == id)
    }

    pub fn quarter(&self, id: &str) -> Option<&Quarter> {
        self.quarters.iter().find(|q| q.id == id)
    }
}
