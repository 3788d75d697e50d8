use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::io::client::BlockSource;
use crate::model::block::{BlockKind, BlockNode, RichTextRun};
use crate::parse::rich_text::{
    display_text, first_link, is_placeholder, linked_text_with, page_url,
    unresolved_page_mentions,
};

/// Walks nested blocks (toggles, sub-bullets, pages) and renders them as
/// indented note lines. Fetch failures and the depth limit both end a
/// subtree quietly.
pub struct Collector<'a> {
    source: &'a dyn BlockSource,
    web_base: &'a str,
    max_depth: usize,
}

impl<'a> Collector<'a> {
    pub fn new(source: &'a dyn BlockSource, web_base: &'a str, max_depth: usize) -> Self {
        Collector {
            source,
            web_base,
            max_depth,
        }
    }

    pub fn web_base(&self) -> &'a str {
        self.web_base
    }

    /// Children of `block_id` fetched at nesting `depth`. Empty at or past
    /// the depth limit, or when the fetch fails.
    pub async fn fetch_children(&self, block_id: &str, depth: usize) -> Vec<BlockNode> {
        if depth >= self.max_depth {
            debug!(block = block_id, depth, "depth limit reached");
            return Vec::new();
        }
        match self.source.children(block_id).await {
            Ok(children) => children,
            Err(e) => {
                warn!(block = block_id, error = %e, "could not fetch children");
                Vec::new()
            }
        }
    }

    /// Note lines for everything under `block_id`
    pub fn collect<'b>(
        &'b self,
        block_id: &'b str,
        indent: usize,
        depth: usize,
    ) -> BoxFuture<'b, Vec<String>> {
        async move {
            let children = self.fetch_children(block_id, depth).await;
            self.render_all(&children, indent, depth + 1).await
        }
        .boxed()
    }

    /// Note lines for a run of sibling blocks
    pub fn render_all<'b>(
        &'b self,
        blocks: &'b [BlockNode],
        indent: usize,
        depth: usize,
    ) -> BoxFuture<'b, Vec<String>> {
        async move {
            let mut lines = Vec::new();
            for block in blocks {
                lines.extend(self.block_lines(block, indent, depth).await);
            }
            lines
        }
        .boxed()
    }

    /// Note lines for one block and whatever is nested under it
    pub async fn block_lines(&self, block: &BlockNode, indent: usize, depth: usize) -> Vec<String> {
        let pad = "  ".repeat(indent);
        match &block.kind {
            BlockKind::Toggle => self.toggle_lines(block, indent, depth).await,
            BlockKind::ChildPage => match block.child_page_title() {
                Some(title) if !title.trim().is_empty() => vec![format!("{}📄 {}", pad, title)],
                _ => Vec::new(),
            },
            BlockKind::LinkToPage => match block.linked_page_id() {
                Some(page_id) => vec![format!("{}📄 {}", pad, self.page_label(page_id).await)],
                None => Vec::new(),
            },
            // Synced content reads as if it were written here
            BlockKind::SyncedBlock => {
                if block.has_children {
                    self.collect(&block.id, indent, depth).await
                } else {
                    Vec::new()
                }
            }
            kind => {
                let mut lines = Vec::new();
                if block.is_text_bearing() {
                    let text = self.linked_text(block.runs()).await;
                    if !text.trim().is_empty() {
                        lines.push(format!("{}{}{}", pad, line_prefix(kind), text));
                    }
                }
                if block.has_children {
                    lines.extend(self.collect(&block.id, indent + 1, depth).await);
                }
                lines
            }
        }
    }

    /// A toggle renders as a `▸ title` header with its link and contents
    /// indented below. A toggle without a title of its own borrows the first
    /// page it contains; failing that its contents stand alone.
    async fn toggle_lines(&self, block: &BlockNode, indent: usize, depth: usize) -> Vec<String> {
        let pad = "  ".repeat(indent);
        let runs = block.runs();
        let children = if block.has_children {
            self.fetch_children(&block.id, depth).await
        } else {
            Vec::new()
        };

        let mut title = self.toggle_title(runs).await;
        if title.is_empty() {
            title = self.title_from_children(&children).await.unwrap_or_default();
        }
        let link = first_link(runs, self.web_base);

        let mut lines = Vec::new();
        let body_indent = if title.is_empty() {
            indent
        } else {
            lines.push(format!("{}▸ {}", pad, title));
            indent + 1
        };
        if let Some(url) = link {
            lines.push(format!("{}🔗 {}", "  ".repeat(body_indent), url));
        }
        lines.extend(self.render_all(&children, body_indent, depth + 1).await);
        lines
    }

    /// Toggle header text, with placeholder page mentions replaced by the
    /// fetched page title. Empty when nothing names the toggle.
    async fn toggle_title(&self, runs: &[RichTextRun]) -> String {
        let titles = self.resolve_titles(runs).await;
        let text: String = runs
            .iter()
            .map(|r| display_text(r, &titles))
            .collect();
        let text = text.trim();
        if is_placeholder(text) {
            String::new()
        } else {
            text.to_string()
        }
    }

    async fn title_from_children(&self, children: &[BlockNode]) -> Option<String> {
        for child in children {
            if let Some(title) = child.child_page_title()
                && !is_placeholder(title)
            {
                return Some(title.to_string());
            }
            if let Some(page_id) = child.linked_page_id()
                && let Some(title) = self.page_title(page_id).await
            {
                return Some(title);
            }
        }
        None
    }

    /// Linked rendering of runs, resolving placeholder page mentions
    pub async fn linked_text(&self, runs: &[RichTextRun]) -> String {
        let titles = self.resolve_titles(runs).await;
        linked_text_with(runs, self.web_base, &titles)
    }

    /// Fetched titles for page mentions whose text does not name the page
    pub async fn resolve_titles(&self, runs: &[RichTextRun]) -> HashMap<String, String> {
        let mut titles = HashMap::new();
        for page_id in unresolved_page_mentions(runs) {
            if titles.contains_key(&page_id) {
                continue;
            }
            if let Some(title) = self.page_title(&page_id).await {
                titles.insert(page_id, title);
            }
        }
        titles
    }

    /// A page's title, or None when the fetch fails or the page is unnamed
    pub async fn page_title(&self, page_id: &str) -> Option<String> {
        match self.source.page_title(page_id).await {
            Ok(title) if !is_placeholder(&title) => Some(title),
            Ok(_) => None,
            Err(e) => {
                warn!(page = page_id, error = %e, "could not resolve page title");
                None
            }
        }
    }

    /// Page title when it resolves, else the raw page link
    async fn page_label(&self, page_id: &str) -> String {
        match self.page_title(page_id).await {
            Some(title) => title,
            None => page_url(page_id, self.web_base),
        }
    }
}

/// Marker put in front of a note line for each block kind
pub fn line_prefix(kind: &BlockKind) -> &'static str {
    match kind {
        BlockKind::BulletedListItem => "• ",
        BlockKind::NumberedListItem => "∙ ",
        BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => "▪ ",
        _ => "",
    }
}
