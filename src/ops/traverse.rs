use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info};

use crate::io::client::{ApiError, BlockSource};
use crate::io::config_io::{quarters as configured_quarters, view_lanes};
use crate::model::block::{BlockKind, BlockNode};
use crate::model::board::{Board, Deliverable, Lane, Milestone, Quarter};
use crate::model::config::{BoardConfig, ViewConfig};
use crate::ops::collect::Collector;
use crate::ops::deliverable::{DeliverableBuilder, sibling_window};
use crate::ops::milestone::build_milestone;
use crate::parse::block_text;
use crate::parse::classify::{BlockRole, LaneResolver, classify, is_deliverable_line};

/// The only fatal condition of a board load
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not load root page {page_id}: {source}")]
    RootFetch {
        page_id: String,
        #[source]
        source: ApiError,
    },
}

/// Running placement carried from block to block: the lane, quarter and
/// milestone that the next deliverable inherits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalContext {
    pub lane_id: String,
    pub quarter_id: String,
    pub milestone_id: Option<String>,
    pub milestone_title: Option<String>,
}

impl TraversalContext {
    /// First lane, first quarter, no milestone
    pub fn start(lanes: &[Lane], quarters: &[Quarter]) -> Self {
        TraversalContext {
            lane_id: lanes.first().map(|l| l.id.clone()).unwrap_or_default(),
            quarter_id: quarters.first().map(|q| q.id.clone()).unwrap_or_default(),
            milestone_id: None,
            milestone_title: None,
        }
    }
}

/// Records produced by a traversal, in document order
#[derive(Debug, Default)]
pub struct Harvest {
    pub milestones: Vec<Milestone>,
    pub deliverables: Vec<Deliverable>,
}

/// Which blocks a container range is read for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Milestones, lanes, checkpoints and deliverable lines
    Full,
    /// `Deliverable:` lines only (the children of a lane header)
    DeliverablesOnly,
}

pub struct Traversal<'a> {
    collector: Collector<'a>,
    quarters: &'a [Quarter],
    lanes: &'a LaneResolver,
}

impl<'a> Traversal<'a> {
    pub fn new(collector: Collector<'a>, quarters: &'a [Quarter], lanes: &'a LaneResolver) -> Self {
        Traversal {
            collector,
            quarters,
            lanes,
        }
    }

    /// Read one container's range of blocks, appending to `out`. The same
    /// routine serves the root page, synced blocks, lane pages and lane
    /// headers. Returns the context as it stands after the range.
    pub fn collect_deliverables_from<'b>(
        &'b self,
        blocks: &'b [BlockNode],
        ctx: TraversalContext,
        grammar: Grammar,
        parent: Option<&'b str>,
        depth: usize,
        out: &'b mut Harvest,
    ) -> BoxFuture<'b, TraversalContext> {
        async move {
            let builder = DeliverableBuilder::new(&self.collector, self.quarters, self.lanes);
            let mut ctx = ctx;

            for (i, block) in blocks.iter().enumerate() {
                let text = block_text(block);

                if grammar == Grammar::DeliverablesOnly {
                    if block.kind == BlockKind::SyncedBlock {
                        let children = self.children_of(block, depth).await;
                        ctx = self
                            .collect_deliverables_from(&children, ctx, grammar, Some(&block.id), depth + 1, out)
                            .await;
                    } else if is_deliverable_line(&text)
                        && let Some(d) = builder.build(block, &[], &ctx, parent, depth).await
                    {
                        push_deliverable(d, &mut ctx, out);
                    }
                    continue;
                }

                let role = classify(block, &text, self.lanes);
                debug!(block = %block.id, kind = ?block.kind, role = ?role, "classified");
                match role {
                    BlockRole::LanePage { lane_id } => {
                        ctx.lane_id = lane_id;
                        // a page is its own document; its context stays inside
                        let children = self.children_of(block, depth).await;
                        self.collect_deliverables_from(
                            &children,
                            ctx.clone(),
                            Grammar::Full,
                            Some(&block.id),
                            depth + 1,
                            out,
                        )
                        .await;
                    }
                    BlockRole::Synced => {
                        let children = self.children_of(block, depth).await;
                        ctx = self
                            .collect_deliverables_from(&children, ctx, Grammar::Full, Some(&block.id), depth + 1, out)
                            .await;
                    }
                    BlockRole::Milestone => {
                        out.milestones
                            .push(build_milestone(block, &text, self.quarters, &mut ctx));
                    }
                    BlockRole::LaneHeader { lane_id } => {
                        ctx.lane_id = lane_id;
                        let children = self.children_of(block, depth).await;
                        ctx = self
                            .collect_deliverables_from(
                                &children,
                                ctx,
                                Grammar::DeliverablesOnly,
                                parent,
                                depth + 1,
                                out,
                            )
                            .await;
                    }
                    BlockRole::LaneContext { lane_id } => {
                        ctx.lane_id = lane_id;
                    }
                    BlockRole::Checkpoint | BlockRole::DeliverableLine => {
                        let window = sibling_window(&blocks[i + 1..]);
                        if let Some(d) = builder.build(block, window, &ctx, parent, depth).await {
                            push_deliverable(d, &mut ctx, out);
                        }
                    }
                    BlockRole::Content => {}
                }
            }
            ctx
        }
        .boxed()
    }

    async fn children_of(&self, block: &BlockNode, depth: usize) -> Vec<BlockNode> {
        if block.has_children {
            self.collector.fetch_children(&block.id, depth).await
        } else {
            Vec::new()
        }
    }
}

/// A dated card moves the running quarter to its own
fn push_deliverable(d: Deliverable, ctx: &mut TraversalContext, out: &mut Harvest) {
    if d.delivery_date.is_some() {
        ctx.quarter_id = d.quarter_id.clone();
    }
    out.deliverables.push(d);
}

/// Fetch a view's root page and rebuild its board from scratch. Only a
/// failure to fetch the root page is an error; every deeper failure just
/// leaves that subtree empty.
pub async fn load_board(
    source: &dyn BlockSource,
    config: &BoardConfig,
    view: &ViewConfig,
) -> Result<Board, LoadError> {
    let lanes = view_lanes(config, view);
    let quarters = configured_quarters(config);
    let resolver = LaneResolver::new(&lanes, &config.keywords);

    let root = source
        .children(&view.root_page)
        .await
        .map_err(|e| LoadError::RootFetch {
            page_id: view.root_page.clone(),
            source: e,
        })?;

    let collector = Collector::new(source, &config.api.web_base, config.parse.max_depth);
    let traversal = Traversal::new(collector, &quarters, &resolver);
    let mut out = Harvest::default();
    traversal
        .collect_deliverables_from(
            &root,
            TraversalContext::start(&lanes, &quarters),
            Grammar::Full,
            None,
            0,
            &mut out,
        )
        .await;

    info!(
        view = %view.id,
        blocks = root.len(),
        milestones = out.milestones.len(),
        deliverables = out.deliverables.len(),
        "board loaded"
    );

    Ok(Board {
        view: view.id.clone(),
        lanes,
        quarters,
        milestones: out.milestones,
        deliverables: out.deliverables,
    })
}
