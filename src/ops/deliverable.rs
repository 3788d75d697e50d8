use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::model::block::{BlockKind, BlockNode, Mention, RichTextRun};
use crate::model::board::{Deliverable, Quarter, Status, UNASSIGNED};
use crate::ops::collect::Collector;
use crate::ops::traverse::TraversalContext;
use crate::parse::classify::{
    LaneResolver, MetaField, classify_field, ends_window, is_marker, status_from_text,
};
use crate::parse::dates::{
    bucket_date, find_iso_date, iso, normalize_mention_date, parse_natural_date,
};
use crate::parse::rich_text::{first_link, plain_text};
use crate::parse::title::marker_title;

static OWNER_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^owner[:\s]*").unwrap());

static DELIVERY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:delivery\s*date[:\s]*|delivery[:\s]*)(.+)").unwrap()
});

static BLOCKER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^blocker[:\s]*").unwrap());

static ENGINEERING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^engineering deliverable[:\s]*").unwrap());

/// An "engineering deliverable" line and the link it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engineering {
    pub text: String,
    pub link: Option<String>,
}

/// Metadata read from a marker and its sibling window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub owner: Option<String>,
    pub owner_block_id: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_date_block_id: Option<String>,
    pub status: Status,
    pub blocker: Option<String>,
    pub engineering: Option<Engineering>,
    /// Indices into the window of blocks not consumed as metadata
    pub notes: Vec<usize>,
}

/// Read metadata from a window of siblings. The first line carrying each
/// label supplies the value. Every labelled line is consumed; all others
/// are left as notes.
pub fn extract_fields(marker_text: &str, window: &[&BlockNode], web_base: &str) -> Fields {
    let mut fields = Fields {
        delivery_date: find_iso_date(marker_text),
        ..Fields::default()
    };
    let mut status_seen = false;

    for (i, block) in window.iter().enumerate() {
        if !block.is_text_bearing() {
            fields.notes.push(i);
            continue;
        }
        let runs = block.runs();
        let text = plain_text(runs);
        match classify_field(&text) {
            Some(MetaField::Engineering) => {
                if fields.engineering.is_none() {
                    fields.engineering = Some(Engineering {
                        text: ENGINEERING_LABEL.replace(text.trim(), "").trim().to_string(),
                        link: first_link(runs, web_base),
                    });
                }
            }
            Some(MetaField::Owner) => {
                if fields.owner.is_none() {
                    fields.owner = Some(owner_from_line(runs, &text));
                    fields.owner_block_id = writable_anchor(block);
                }
            }
            Some(MetaField::DeliveryDate) => {
                if fields.delivery_date.is_none()
                    && let Some(date) = date_from_line(runs, &text)
                {
                    fields.delivery_date = Some(date);
                    if let Some(id) = writable_anchor(block) {
                        fields.delivery_date_block_id = Some(id);
                    }
                } else if fields.delivery_date_block_id.is_none() {
                    fields.delivery_date_block_id = writable_anchor(block);
                }
            }
            Some(MetaField::Status) => {
                if !status_seen {
                    fields.status = status_from_text(&text);
                    status_seen = true;
                }
            }
            Some(MetaField::Blocker) => {
                if fields.blocker.is_none() {
                    let rest = BLOCKER_LABEL.replace(text.trim(), "").trim().to_string();
                    fields.blocker = (!rest.is_empty()).then_some(rest);
                }
            }
            None => fields.notes.push(i),
        }
    }
    fields
}

/// A metadata line can be patched later only when it is a paragraph
fn writable_anchor(block: &BlockNode) -> Option<String> {
    (block.kind == BlockKind::Paragraph).then(|| block.id.clone())
}

/// Owner from an `Owner:` line: a user mention's name, else a page
/// mention's text, else whatever follows the label.
pub fn owner_from_line(runs: &[RichTextRun], text: &str) -> String {
    let from_mention = runs.iter().find_map(|run| match &run.mention {
        Some(Mention::User { name }) => Some(
            name.clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| run.plain_text.clone()),
        ),
        Some(Mention::Page { .. }) => Some(run.plain_text.clone()),
        _ => None,
    });
    let owner = match from_mention {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => OWNER_LABEL.replace(text.trim(), "").trim().to_string(),
    };
    if owner.is_empty() {
        UNASSIGNED.to_string()
    } else {
        owner
    }
}

/// Date from a delivery-date line: a date mention, else an embedded ISO
/// date, else free text after the label.
pub fn date_from_line(runs: &[RichTextRun], text: &str) -> Option<NaiveDate> {
    let mention = runs.iter().find_map(|run| match &run.mention {
        Some(Mention::Date { start }) => find_iso_date(&normalize_mention_date(start)),
        _ => None,
    });
    mention.or_else(|| find_iso_date(text)).or_else(|| {
        DELIVERY_LABEL
            .captures(text)
            .and_then(|c| parse_natural_date(c[1].trim()))
    })
}

/// The blocks after a marker that belong to it: everything up to the next
/// marker, heading, divider or synced block.
pub fn sibling_window(blocks: &[BlockNode]) -> &[BlockNode] {
    let end = blocks
        .iter()
        .position(|b| ends_window(b) || is_marker(b, &plain_text(b.runs())))
        .unwrap_or(blocks.len());
    &blocks[..end]
}

/// Builds deliverable cards from marker blocks
pub struct DeliverableBuilder<'a> {
    collector: &'a Collector<'a>,
    quarters: &'a [Quarter],
    lanes: &'a LaneResolver,
}

impl<'a> DeliverableBuilder<'a> {
    pub fn new(collector: &'a Collector<'a>, quarters: &'a [Quarter], lanes: &'a LaneResolver) -> Self {
        DeliverableBuilder {
            collector,
            quarters,
            lanes,
        }
    }

    /// Build one card from a marker and its sibling window. The marker's own
    /// children are read after the window. Returns None for noise titles.
    pub async fn build(
        &self,
        marker: &BlockNode,
        window: &[BlockNode],
        ctx: &TraversalContext,
        parent_block_id: Option<&str>,
        depth: usize,
    ) -> Option<Deliverable> {
        let text = plain_text(marker.runs());
        let Some(title) = marker_title(&text) else {
            debug!(block = %marker.id, text = %text, "marker title too short, skipped");
            return None;
        };

        let nested = if marker.has_children {
            self.collector.fetch_children(&marker.id, depth).await
        } else {
            Vec::new()
        };
        let nested = sibling_window(&nested);

        let blocks: Vec<&BlockNode> = window.iter().chain(nested.iter()).collect();
        let fields = extract_fields(&text, &blocks, self.collector.web_base());

        let mut lines = Vec::new();
        if let Some(eng) = &fields.engineering {
            lines.push(format!("🔧 Engineering: {}", eng.text));
            if let Some(link) = &eng.link {
                lines.push(format!("🔗 {}", link));
            }
        }
        for &i in &fields.notes {
            // nested blocks sit one level below the window
            let block_depth = if i < window.len() { depth } else { depth + 1 };
            lines.extend(self.collector.block_lines(blocks[i], 0, block_depth).await);
        }

        let quarter_id = fields
            .delivery_date
            .and_then(|d| bucket_date(d, self.quarters))
            .map(|q| q.id.clone())
            .unwrap_or_else(|| ctx.quarter_id.clone());

        let mut d = Deliverable::new(marker.id.clone(), title, ctx.lane_id.clone(), quarter_id);
        d.owner = fields.owner.unwrap_or_else(|| UNASSIGNED.to_string());
        d.status = fields.status;
        d.delivery_date = fields.delivery_date.map(iso);
        d.blocker = fields.blocker;
        d.notes = lines.join("\n").trim().to_string();
        d.wiki_url = self.lanes.get(&ctx.lane_id).and_then(|l| l.wiki_url.clone());
        d.milestone_id = ctx.milestone_id.clone();
        d.milestone_title = ctx.milestone_title.clone();
        d.owner_block_id = fields.owner_block_id;
        d.delivery_date_block_id = fields.delivery_date_block_id;
        d.parent_block_id = parent_block_id.map(str::to_string);

        debug!(
            id = %d.id,
            title = %d.title,
            lane = %d.lane_id,
            quarter = %d.quarter_id,
            "deliverable"
        );
        Some(d)
    }
}
