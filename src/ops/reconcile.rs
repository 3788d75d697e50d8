use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::io::client::{ApiError, BlockSource};
use crate::model::block::BlockKind;
use crate::parse::dates::long_form;
use crate::parse::rich_text::plain_text;

/// A remote patch queued after a local edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBack {
    /// Replace the text of an anchor block captured at parse time
    Patch { block_id: String, text: String },
    /// Rewrite the delivery-date line found by a fresh scan of the
    /// deliverable's children. The parse-time anchor is used when the scan
    /// finds nothing.
    RelocateDate {
        deliverable_id: String,
        date: NaiveDate,
        fallback_block_id: Option<String>,
    },
}

/// `Owner: <name>`
pub fn owner_line(owner: &str) -> String {
    format!("Owner: {}", owner)
}

/// `Delivery Date: March 15, 2026`, or `Delivery Date: TBD` when cleared
pub fn delivery_line(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("Delivery Date: {}", long_form(d)),
        None => "Delivery Date: TBD".to_string(),
    }
}

/// First paragraph child of `deliverable_id` that mentions a delivery date
pub async fn find_delivery_date_block(
    source: &dyn BlockSource,
    deliverable_id: &str,
) -> Result<Option<String>, ApiError> {
    let children = source.children(deliverable_id).await?;
    Ok(children
        .iter()
        .find(|b| {
            b.kind == BlockKind::Paragraph
                && plain_text(b.runs()).to_lowercase().contains("delivery date")
        })
        .map(|b| b.id.clone()))
}

/// Perform one write-back. Returns the patched block id, or None when there
/// was no anchor to write to.
pub async fn apply(source: &dyn BlockSource, write: &WriteBack) -> Result<Option<String>, ApiError> {
    match write {
        WriteBack::Patch { block_id, text } => {
            source.update_paragraph(block_id, text).await?;
            Ok(Some(block_id.clone()))
        }
        WriteBack::RelocateDate {
            deliverable_id,
            date,
            fallback_block_id,
        } => {
            let target = match find_delivery_date_block(source, deliverable_id).await {
                Ok(Some(id)) => Some(id),
                Ok(None) => fallback_block_id.clone(),
                Err(e) => {
                    debug!(deliverable = %deliverable_id, error = %e, "child scan failed");
                    fallback_block_id.clone()
                }
            };
            let Some(block_id) = target else {
                return Ok(None);
            };
            source
                .update_paragraph(&block_id, &delivery_line(Some(*date)))
                .await?;
            Ok(Some(block_id))
        }
    }
}

/// How a submitted write-back ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied { block_id: String },
    /// No anchor block to write to
    Skipped,
    Failed { error: String },
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}

/// Runs write-backs in the background. Local state is already updated when
/// a write is submitted; failures are logged and never rolled back.
#[derive(Clone)]
pub struct Reconciler {
    source: Arc<dyn BlockSource>,
}

impl Reconciler {
    pub fn new(source: Arc<dyn BlockSource>) -> Self {
        Reconciler { source }
    }

    /// Spawn the write. The outcome is logged, then handed back through
    /// the join handle.
    pub fn submit(&self, write: WriteBack) -> JoinHandle<WriteOutcome> {
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match apply(source.as_ref(), &write).await {
                Ok(Some(block_id)) => {
                    info!(block = %block_id, "write-back applied");
                    WriteOutcome::Applied { block_id }
                }
                Ok(None) => {
                    debug!(?write, "no anchor block, write-back skipped");
                    WriteOutcome::Skipped
                }
                Err(e) => {
                    warn!(error = %e, ?write, "write-back failed");
                    WriteOutcome::Failed { error: e.to_string() }
                }
            }
        })
    }
}
