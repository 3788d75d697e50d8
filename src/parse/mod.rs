pub mod classify;
pub mod dates;
pub mod rich_text;
pub mod title;

pub use classify::{BlockRole, LaneResolver, MetaField, classify, classify_field};
pub use rich_text::{linked_text, plain_text};
pub use title::{extract_outcome, marker_title, strip_marker_prefix};

use crate::model::block::BlockNode;

/// The text a block is classified by: its plain rich text, or the title of a
/// child page.
pub fn block_text(block: &BlockNode) -> String {
    match block.child_page_title() {
        Some(title) => title.to_string(),
        None => plain_text(block.runs()),
    }
}
