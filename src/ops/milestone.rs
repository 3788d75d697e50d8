use tracing::debug;

use crate::model::block::BlockNode;
use crate::model::board::{Milestone, Quarter, Status, TBD};
use crate::ops::traverse::TraversalContext;
use crate::parse::dates::{bucket_date, find_iso_date, find_quarter, short_form};

/// Build a milestone from a top-level heading and move the running context
/// onto it. Quarter comes from an embedded ISO date when it lands in a
/// configured column, else from a loose `Qn YYYY` mention, else stays put.
pub fn build_milestone(
    block: &BlockNode,
    text: &str,
    quarters: &[Quarter],
    ctx: &mut TraversalContext,
) -> Milestone {
    let mut quarter_id = ctx.quarter_id.clone();
    let date = if let Some(d) = find_iso_date(text) {
        if let Some(q) = bucket_date(d, quarters) {
            quarter_id = q.id.clone();
        }
        short_form(d)
    } else if let Some(q) = find_quarter(text, quarters) {
        quarter_id = q.id.clone();
        format!("{} {}", q.label, q.year)
    } else {
        TBD.to_string()
    };

    ctx.quarter_id = quarter_id.clone();
    ctx.milestone_id = Some(block.id.clone());
    ctx.milestone_title = Some(text.to_string());

    debug!(id = %block.id, quarter = %quarter_id, date = %date, "milestone");
    Milestone {
        id: block.id.clone(),
        title: text.to_string(),
        quarter_id,
        date,
        status: Status::OnTrack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{BlockKind, Payload, RichTextRun};

    fn quarters() -> Vec<Quarter> {
        ["2025-Q4", "2026-Q1", "2026-Q2"]
            .iter()
            .map(|id| Quarter {
                id: id.to_string(),
                label: id[5..].to_string(),
                year: id[..4].parse().unwrap(),
            })
            .collect()
    }

    fn heading(text: &str) -> BlockNode {
        BlockNode {
            id: "h1".into(),
            kind: BlockKind::Heading1,
            has_children: false,
            payload: Payload::RichText {
                runs: vec![RichTextRun::text(text)],
            },
        }
    }

    fn ctx() -> TraversalContext {
        TraversalContext {
            lane_id: "lane-a".into(),
            quarter_id: "2025-Q4".into(),
            milestone_id: None,
            milestone_title: None,
        }
    }

    #[test]
    fn test_iso_date_sets_quarter() {
        let mut c = ctx();
        let text = "by 2026-01-10 Launch Beta";
        let m = build_milestone(&heading(text), text, &quarters(), &mut c);
        assert_eq!(m.quarter_id, "2026-Q1");
        assert_eq!(m.date, "Jan 10, 2026");
        assert_eq!(m.status, Status::OnTrack);
        assert_eq!(c.quarter_id, "2026-Q1");
        assert_eq!(c.milestone_id.as_deref(), Some("h1"));
        assert_eq!(c.milestone_title.as_deref(), Some(text));
    }

    #[test]
    fn test_unconfigured_date_keeps_running_quarter() {
        let mut c = ctx();
        let text = "GA 2028-06-01";
        let m = build_milestone(&heading(text), text, &quarters(), &mut c);
        assert_eq!(m.quarter_id, "2025-Q4");
        assert_eq!(m.date, "Jun 1, 2028");
        assert_eq!(c.quarter_id, "2025-Q4");
    }

    #[test]
    fn test_loose_quarter_and_tbd() {
        let mut c = ctx();
        let text = "Milestone 2: Scale (Q2 2026)";
        let m = build_milestone(&heading(text), text, &quarters(), &mut c);
        assert_eq!(m.quarter_id, "2026-Q2");
        assert_eq!(m.date, "Q2 2026");

        let text = "Someday";
        let m = build_milestone(&heading(text), text, &quarters(), &mut c);
        assert_eq!(m.quarter_id, "2026-Q2");
        assert_eq!(m.date, TBD);
    }
}
