use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::model::block::{BlockKind, BlockNode};
use crate::model::board::{Lane, Status};

static LANE_HEADER_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z]\d+[a-z]?\s*[-–]\s+").unwrap());

static LANE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(([A-Z][0-9]+[a-z]?(?:\.\d+)?)\)").unwrap());

static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*\)").unwrap());

/// The semantic role of one block, decided by type first and text second
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRole {
    /// Child page whose title names a lane. Its children are a nested document.
    LanePage { lane_id: String },
    /// Synced block. Its children are read as if inline at its position.
    Synced,
    /// Top-level heading that opens a milestone
    Milestone,
    /// Lane heading shaped like `A8b - Title`. Its children hold
    /// `Deliverable:` lines.
    LaneHeader { lane_id: String },
    /// Heading that names a lane without the header shape. Switches the
    /// running lane only.
    LaneContext { lane_id: String },
    /// Sub-heading mentioning "checkpoint"
    Checkpoint,
    /// Any block whose text starts with "deliverable"
    DeliverableLine,
    /// Supporting detail, consumed by the nearest preceding marker
    Content,
}

impl BlockRole {
    pub fn is_marker(&self) -> bool {
        matches!(self, BlockRole::Checkpoint | BlockRole::DeliverableLine)
    }
}

/// Classify a block in priority order. `text` is the block's plain text
/// (or child-page title).
pub fn classify(block: &BlockNode, text: &str, lanes: &LaneResolver) -> BlockRole {
    match block.kind {
        BlockKind::ChildPage => {
            if let Some(lane) = lanes.resolve(text) {
                return BlockRole::LanePage {
                    lane_id: lane.id.clone(),
                };
            }
        }
        BlockKind::SyncedBlock => return BlockRole::Synced,
        BlockKind::Heading1 => return BlockRole::Milestone,
        BlockKind::Heading2 => {
            if let Some(lane) = lanes.resolve(text) {
                let lane_id = lane.id.clone();
                return if is_lane_header_shape(text) {
                    BlockRole::LaneHeader { lane_id }
                } else {
                    BlockRole::LaneContext { lane_id }
                };
            }
        }
        BlockKind::Heading3 if text.to_lowercase().contains("checkpoint") => {
            return BlockRole::Checkpoint;
        }
        _ => {}
    }
    if is_deliverable_line(text) {
        BlockRole::DeliverableLine
    } else {
        BlockRole::Content
    }
}

/// Whether text opens with the word "deliverable"
pub fn is_deliverable_line(text: &str) -> bool {
    text.trim_start().to_lowercase().starts_with("deliverable")
}

/// Marker test that needs no lane lookup. Used to close sibling windows.
pub fn is_marker(block: &BlockNode, text: &str) -> bool {
    (block.kind == BlockKind::Heading3 && text.to_lowercase().contains("checkpoint"))
        || is_deliverable_line(text)
}

/// Blocks that always close a deliverable's sibling window
pub fn ends_window(block: &BlockNode) -> bool {
    block.kind.is_heading() || matches!(block.kind, BlockKind::Divider | BlockKind::SyncedBlock)
}

/// `A8b - Gaming Use Case`, `S1 – Demo Sales`
pub fn is_lane_header_shape(text: &str) -> bool {
    LANE_HEADER_SHAPE.is_match(text.trim())
}

/// Metadata labels recognized on sibling lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Engineering,
    Owner,
    DeliveryDate,
    Status,
    Blocker,
}

/// Which metadata label, if any, a sibling line carries. Labels that must
/// open the line win over labels found anywhere in it.
pub fn classify_field(text: &str) -> Option<MetaField> {
    let lower = text.trim().to_lowercase();
    if lower.starts_with("owner:") {
        Some(MetaField::Owner)
    } else if lower.starts_with("status:") {
        Some(MetaField::Status)
    } else if lower.starts_with("blocker:") || lower.starts_with("blocker ") {
        Some(MetaField::Blocker)
    } else if lower.contains("engineering deliverable") {
        Some(MetaField::Engineering)
    } else if lower.contains("delivery date") || lower.contains("delivery:") {
        Some(MetaField::DeliveryDate)
    } else {
        None
    }
}

const BLOCKED_WORDS: &[&str] = &["red", "🔴", "blocked", "<80%"];
const AT_RISK_WORDS: &[&str] = &["yellow", "amber", "🟡", "🟠", "at risk", ">80%"];

/// Map a status line onto a health value. Anything unrecognized is on-track.
pub fn status_from_text(text: &str) -> Status {
    let lower = text.to_lowercase();
    if BLOCKED_WORDS.iter().any(|w| lower.contains(w)) {
        Status::Blocked
    } else if AT_RISK_WORDS.iter().any(|w| lower.contains(w)) {
        Status::AtRisk
    } else {
        Status::OnTrack
    }
}

/// Resolves free text to one of a view's lanes
#[derive(Debug, Clone)]
pub struct LaneResolver {
    lanes: Vec<Lane>,
    keywords: Vec<(String, Vec<String>)>,
    /// (uppercased code, lane index), longest code first
    codes: Vec<(String, usize)>,
}

impl LaneResolver {
    pub fn new(lanes: &[Lane], keywords: &IndexMap<String, Vec<String>>) -> Self {
        let mut codes: Vec<(String, usize)> = lanes
            .iter()
            .enumerate()
            .filter_map(|(i, lane)| {
                LANE_CODE
                    .captures(&lane.title)
                    .map(|c| (c[1].to_uppercase(), i))
            })
            .collect();
        // stable, so equal-length codes keep lane order
        codes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        LaneResolver {
            lanes: lanes.to_vec(),
            keywords: keywords
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            codes,
        }
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn get(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == id)
    }

    /// Resolve text to a lane: keyword table, then exact id, then embedded
    /// code, then display name with parentheticals stripped.
    pub fn resolve(&self, text: &str) -> Option<&Lane> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.by_keyword(text)
            .or_else(|| self.get(text))
            .or_else(|| self.by_code(text))
            .or_else(|| self.by_name(text))
    }

    fn by_keyword(&self, text: &str) -> Option<&Lane> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(kw, _)| !kw.is_empty() && lower.contains(kw.as_str()))
            .find_map(|(_, ids)| ids.iter().find_map(|id| self.get(id)))
    }

    fn by_code(&self, text: &str) -> Option<&Lane> {
        let upper = text.to_uppercase();
        self.codes
            .iter()
            .find(|(code, _)| upper.contains(code.as_str()))
            .map(|(_, i)| &self.lanes[*i])
    }

    fn by_name(&self, text: &str) -> Option<&Lane> {
        let clean = strip_parenthetical(text);
        if clean.is_empty() {
            return None;
        }
        self.lanes.iter().find(|lane| {
            let name = strip_parenthetical(&lane.title);
            !name.is_empty() && (name.contains(&clean) || clean.contains(&name))
        })
    }
}

fn strip_parenthetical(text: &str) -> String {
    PARENTHETICAL
        .replace(&text.to_lowercase(), "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{Payload, RichTextRun};

    fn lane(id: &str, title: &str) -> Lane {
        Lane {
            id: id.into(),
            title: title.into(),
            group: "G".into(),
            subtitle: None,
            wiki_url: None,
        }
    }

    fn resolver() -> LaneResolver {
        let lanes = vec![
            lane("lane-a8", "Inference Runtime (A8)"),
            lane("lane-a8b", "Gaming Demo (A8b)"),
            lane("lane-b3", "Marketing (B3)"),
            lane("lane-dac", "DAC & Inspection"),
            lane("lane-indexer", "Blockchain Indexer (A1)"),
        ];
        let mut kw = IndexMap::new();
        kw.insert("dac".to_string(), vec!["lane-dac".to_string()]);
        kw.insert("inspection".to_string(), vec!["lane-dac".to_string()]);
        kw.insert(
            "marketing".to_string(),
            vec!["lane-missing".to_string(), "lane-b3".to_string()],
        );
        LaneResolver::new(&lanes, &kw)
    }

    fn block(kind: BlockKind, text: &str) -> BlockNode {
        BlockNode {
            id: "b".into(),
            kind,
            has_children: false,
            payload: Payload::RichText {
                runs: vec![RichTextRun::text(text)],
            },
        }
    }

    #[test]
    fn test_keyword_wins_over_code() {
        let r = resolver();
        // "A1" would match the indexer lane by code
        let lane = r.resolve("DAC Inspection Report A1").unwrap();
        assert_eq!(lane.id, "lane-dac");
    }

    #[test]
    fn test_keyword_skips_lanes_outside_view() {
        let r = resolver();
        assert_eq!(r.resolve("Product marketing push").unwrap().id, "lane-b3");
    }

    #[test]
    fn test_longest_code_first() {
        let r = resolver();
        assert_eq!(r.resolve("A8b - Gaming Use Case").unwrap().id, "lane-a8b");
        assert_eq!(r.resolve("A8 - Serving").unwrap().id, "lane-a8");
    }

    #[test]
    fn test_exact_id_and_name() {
        let r = resolver();
        assert_eq!(r.resolve("lane-indexer").unwrap().id, "lane-indexer");
        assert_eq!(r.resolve("Gaming Demo").unwrap().id, "lane-a8b");
        assert_eq!(r.resolve("Inference Runtime (old)").unwrap().id, "lane-a8");
        assert!(r.resolve("Unrelated words").is_none());
        assert!(r.resolve("   ").is_none());
        // all-parenthetical text must not match every lane
        assert!(r.resolve("(draft)").is_none());
    }

    #[test]
    fn test_classify_priority() {
        let r = resolver();
        assert_eq!(classify(&block(BlockKind::Heading1, "Deliverable soon"), "Deliverable soon", &r), BlockRole::Milestone);
        assert_eq!(
            classify(&block(BlockKind::Heading2, "A8b - Gaming"), "A8b - Gaming", &r),
            BlockRole::LaneHeader { lane_id: "lane-a8b".into() }
        );
        assert_eq!(
            classify(&block(BlockKind::Heading2, "Gaming Demo"), "Gaming Demo", &r),
            BlockRole::LaneContext { lane_id: "lane-a8b".into() }
        );
        assert_eq!(classify(&block(BlockKind::Heading2, "Misc"), "Misc", &r), BlockRole::Content);
        assert_eq!(
            classify(&block(BlockKind::Heading3, "Checkpoint 1: Ship"), "Checkpoint 1: Ship", &r),
            BlockRole::Checkpoint
        );
        assert_eq!(classify(&block(BlockKind::Heading3, "Notes"), "Notes", &r), BlockRole::Content);
        assert_eq!(
            classify(&block(BlockKind::Paragraph, "deliverable: docs"), "deliverable: docs", &r),
            BlockRole::DeliverableLine
        );
        // checkpoint wording only counts on sub-headings
        assert_eq!(
            classify(&block(BlockKind::Paragraph, "Checkpoint 1: Ship"), "Checkpoint 1: Ship", &r),
            BlockRole::Content
        );
    }

    #[test]
    fn test_classify_pages_and_synced() {
        let r = resolver();
        let page = BlockNode {
            id: "p".into(),
            kind: BlockKind::ChildPage,
            has_children: true,
            payload: Payload::ChildPage {
                title: "Marketing (B3)".into(),
            },
        };
        assert_eq!(
            classify(&page, "Marketing (B3)", &r),
            BlockRole::LanePage { lane_id: "lane-b3".into() }
        );
        assert_eq!(classify(&page, "Meeting notes", &r), BlockRole::Content);
        let synced = BlockNode {
            id: "s".into(),
            kind: BlockKind::SyncedBlock,
            has_children: true,
            payload: Payload::Empty,
        };
        assert_eq!(classify(&synced, "", &r), BlockRole::Synced);
    }

    #[test]
    fn test_window_boundaries() {
        assert!(ends_window(&block(BlockKind::Heading2, "x")));
        assert!(ends_window(&block(BlockKind::Divider, "")));
        assert!(ends_window(&block(BlockKind::SyncedBlock, "")));
        assert!(!ends_window(&block(BlockKind::Toggle, "x")));
        assert!(is_marker(&block(BlockKind::Paragraph, "Deliverable 2: x"), "Deliverable 2: x"));
    }

    #[test]
    fn test_field_labels() {
        assert_eq!(classify_field("Owner: @Sam"), Some(MetaField::Owner));
        assert_eq!(classify_field("Delivery date: 2026-01-05"), Some(MetaField::DeliveryDate));
        assert_eq!(classify_field("Target delivery: March"), Some(MetaField::DeliveryDate));
        assert_eq!(classify_field("Status: Red"), Some(MetaField::Status));
        assert_eq!(classify_field("Blocker: infra"), Some(MetaField::Blocker));
        assert_eq!(classify_field("blocker waiting"), Some(MetaField::Blocker));
        assert_eq!(classify_field("Engineering deliverable: PR"), Some(MetaField::Engineering));
        assert_eq!(classify_field("Blockers are listed below"), None);
        assert_eq!(classify_field("Some note"), None);
    }

    #[test]
    fn test_prefixed_labels_beat_embedded_ones() {
        assert_eq!(
            classify_field("Blocker: vendor delivery date slipped"),
            Some(MetaField::Blocker)
        );
        assert_eq!(
            classify_field("Status: red, delivery: unclear"),
            Some(MetaField::Status)
        );
        assert_eq!(
            classify_field("Owner: engineering deliverable lead"),
            Some(MetaField::Owner)
        );
        assert_eq!(
            classify_field("Revised delivery date: 2026-02-01"),
            Some(MetaField::DeliveryDate)
        );
    }

    #[test]
    fn test_status_synonyms() {
        assert_eq!(status_from_text("Status: Red"), Status::Blocked);
        assert_eq!(status_from_text("Status: <80% confidence"), Status::Blocked);
        assert_eq!(status_from_text("Status: 🟠"), Status::AtRisk);
        assert_eq!(status_from_text("Status: at risk"), Status::AtRisk);
        assert_eq!(status_from_text("Status: >80%"), Status::AtRisk);
        assert_eq!(status_from_text("Status: green"), Status::OnTrack);
        assert_eq!(status_from_text("Status: ?"), Status::OnTrack);
    }
}
