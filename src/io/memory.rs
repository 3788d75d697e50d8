use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::io::client::{ApiError, BlockSource};
use crate::model::block::{BlockKind, BlockNode, Payload, RichTextRun};

/// Error loading a block dump from disk
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse block dump: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// On-disk shape of a block dump
#[derive(Debug, Default, Deserialize)]
struct Dump {
    /// Parent id → raw child block objects, in document order
    #[serde(default)]
    blocks: HashMap<String, Vec<Value>>,
    #[serde(default)]
    pages: HashMap<String, PageEntry>,
    /// Ids whose fetches and patches fail with a server error
    #[serde(default)]
    failing: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    title: String,
}

#[derive(Debug, Default)]
struct State {
    children: HashMap<String, Vec<BlockNode>>,
    patches: Vec<(String, String)>,
}

/// Block tree held in memory. Serves offline replays (`--fixture`) and tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<State>,
    titles: HashMap<String, String>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dump of the form
    /// `{"blocks": {parent: [block…]}, "pages": {id: {"title": …}}, "failing": [id…]}`
    pub fn from_json_str(text: &str) -> Result<Self, FixtureError> {
        let dump: Dump = serde_json::from_str(text)?;
        let children = dump
            .blocks
            .into_iter()
            .map(|(parent, raw)| {
                let blocks = raw.iter().filter_map(BlockNode::from_json).collect();
                (parent, blocks)
            })
            .collect();
        Ok(MemorySource {
            state: Mutex::new(State {
                children,
                patches: Vec::new(),
            }),
            titles: dump
                .pages
                .into_iter()
                .map(|(id, p)| (id, p.title))
                .collect(),
            failing: dump.failing.into_iter().collect(),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = fs::read_to_string(path).map_err(|e| FixtureError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text)
    }

    /// Set the children of `parent`, replacing any already present
    pub fn with_children(self, parent: &str, blocks: Vec<BlockNode>) -> Self {
        self.lock().children.insert(parent.to_string(), blocks);
        self
    }

    pub fn with_page(mut self, page_id: &str, title: &str) -> Self {
        self.titles.insert(page_id.to_string(), title.to_string());
        self
    }

    /// Make every call touching `id` fail
    pub fn with_failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Patches applied so far, as (block id, new text)
    pub fn patches(&self) -> Vec<(String, String)> {
        self.lock().patches.clone()
    }

    /// Number of children/page fetches served (failed ones included)
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failing(&self, id: &str) -> Result<(), ApiError> {
        if self.failing.contains(id) {
            return Err(ApiError::Http {
                status: 502,
                body: format!("simulated failure for {}", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BlockSource for MemorySource {
    async fn children(&self, block_id: &str) -> Result<Vec<BlockNode>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing(block_id)?;
        Ok(self
            .lock()
            .children
            .get(block_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn page_title(&self, page_id: &str) -> Result<String, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing(page_id)?;
        self.titles
            .get(page_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(page_id.to_string()))
    }

    async fn update_paragraph(&self, block_id: &str, text: &str) -> Result<(), ApiError> {
        self.check_failing(block_id)?;
        let mut state = self.lock();
        let block = state
            .children
            .values_mut()
            .flat_map(|blocks| blocks.iter_mut())
            .find(|b| b.id == block_id)
            .ok_or_else(|| ApiError::NotFound(block_id.to_string()))?;
        if block.kind != BlockKind::Paragraph {
            return Err(ApiError::Http {
                status: 400,
                body: format!("block {} is not a paragraph", block_id),
            });
        }
        block.payload = Payload::RichText {
            runs: vec![RichTextRun::text(text)],
        };
        state.patches.push((block_id.to_string(), text.to_string()));
        Ok(())
    }
}
