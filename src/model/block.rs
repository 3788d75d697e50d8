use serde::Serialize;
use serde_json::Value;

/// The type tag of a remote block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Paragraph,
    BulletedListItem,
    NumberedListItem,
    Toggle,
    Callout,
    Quote,
    ChildPage,
    LinkToPage,
    SyncedBlock,
    Divider,
    /// Any type we do not model (tables, images, embeds, ...)
    Other(String),
}

impl BlockKind {
    /// Map the remote `type` string onto a kind
    pub fn from_type(s: &str) -> BlockKind {
        match s {
            "heading_1" => BlockKind::Heading1,
            "heading_2" => BlockKind::Heading2,
            "heading_3" => BlockKind::Heading3,
            "paragraph" => BlockKind::Paragraph,
            "bulleted_list_item" => BlockKind::BulletedListItem,
            "numbered_list_item" => BlockKind::NumberedListItem,
            "toggle" => BlockKind::Toggle,
            "callout" => BlockKind::Callout,
            "quote" => BlockKind::Quote,
            "child_page" => BlockKind::ChildPage,
            "link_to_page" => BlockKind::LinkToPage,
            "synced_block" => BlockKind::SyncedBlock,
            "divider" => BlockKind::Divider,
            other => BlockKind::Other(other.to_string()),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3
        )
    }
}

/// One mention attached to a rich-text run. A run carries at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mention {
    User { name: Option<String> },
    Page { page_id: String },
    Date { start: String },
    Url { url: String },
    LinkPreview { url: String },
}

/// A single inline text run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RichTextRun {
    pub plain_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention: Option<Mention>,
}

impl RichTextRun {
    /// A run holding only plain text
    pub fn text(s: &str) -> Self {
        RichTextRun {
            plain_text: s.to_string(),
            href: None,
            mention: None,
        }
    }

    /// Convert a remote run. Missing or odd fields degrade to empty values.
    pub fn from_json(value: &Value) -> RichTextRun {
        let plain_text = value
            .get("plain_text")
            .and_then(Value::as_str)
            .or_else(|| {
                value
                    .get("text")
                    .and_then(|t| t.get("content"))
                    .and_then(Value::as_str)
            })
            .unwrap_or_default()
            .to_string();
        let href = value
            .get("href")
            .and_then(Value::as_str)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        let mention = if value.get("type").and_then(Value::as_str) == Some("mention") {
            value.get("mention").and_then(mention_from_json)
        } else {
            None
        };
        RichTextRun {
            plain_text,
            href,
            mention,
        }
    }
}

fn mention_from_json(m: &Value) -> Option<Mention> {
    let kind = m.get("type").and_then(Value::as_str)?;
    let body = m.get(kind);
    let str_at = |key: &str| {
        body.and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    match kind {
        "user" => Some(Mention::User {
            name: str_at("name"),
        }),
        "page" => str_at("id").map(|page_id| Mention::Page { page_id }),
        "date" => str_at("start").map(|start| Mention::Date { start }),
        // `url` mentions carry the url directly under the mention object
        "url" => m
            .get("url")
            .and_then(Value::as_str)
            .map(|url| Mention::Url {
                url: url.to_string(),
            }),
        "link_preview" => str_at("url").map(|url| Mention::LinkPreview { url }),
        _ => None,
    }
}

/// Type-specific block content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    RichText { runs: Vec<RichTextRun> },
    ChildPage { title: String },
    LinkToPage { page_id: Option<String> },
    Empty,
}

/// Read-only view of one remote block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockNode {
    pub id: String,
    pub kind: BlockKind,
    pub has_children: bool,
    pub payload: Payload,
}

impl BlockNode {
    /// Convert a remote block object. Returns None only when it has no id.
    pub fn from_json(value: &Value) -> Option<BlockNode> {
        let id = value.get("id").and_then(Value::as_str)?.to_string();
        let type_str = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let kind = BlockKind::from_type(type_str);
        let has_children = value
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = value.get(type_str);

        let payload = match kind {
            BlockKind::ChildPage => Payload::ChildPage {
                title: body
                    .and_then(|b| b.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            BlockKind::LinkToPage => Payload::LinkToPage {
                page_id: body
                    .and_then(|b| b.get("page_id"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            _ => match body.and_then(|b| b.get("rich_text")).and_then(Value::as_array) {
                Some(runs) => Payload::RichText {
                    runs: runs.iter().map(RichTextRun::from_json).collect(),
                },
                None => Payload::Empty,
            },
        };

        Some(BlockNode {
            id,
            kind,
            has_children,
            payload,
        })
    }

    /// Rich-text runs, or an empty slice for non-text blocks
    pub fn runs(&self) -> &[RichTextRun] {
        match &self.payload {
            Payload::RichText { runs } => runs,
            _ => &[],
        }
    }

    /// Whether the block carries a rich-text payload at all
    pub fn is_text_bearing(&self) -> bool {
        matches!(self.payload, Payload::RichText { .. })
    }

    /// Child-page title, if this is a child page
    pub fn child_page_title(&self) -> Option<&str> {
        match &self.payload {
            Payload::ChildPage { title } => Some(title),
            _ => None,
        }
    }

    /// Target page id, if this is a link-to-page block
    pub fn linked_page_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::LinkToPage { page_id } => page_id.as_deref(),
            _ => None,
        }
    }
}
