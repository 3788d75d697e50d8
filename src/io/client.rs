use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::model::block::BlockNode;
use crate::model::config::ApiConfig;
use crate::parse::rich_text::UNTITLED;

/// Error type for remote block API calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("remote API returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no API token: set ${0} or point api.base_url at a proxy")]
    MissingToken(String),
    #[error("no such block or page: {0}")]
    NotFound(String),
}

/// The three remote operations the board needs. Everything above this trait
/// is transport-agnostic.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Children of a block or page, first page only
    async fn children(&self, block_id: &str) -> Result<Vec<BlockNode>, ApiError>;

    /// Title property of a page
    async fn page_title(&self, page_id: &str) -> Result<String, ApiError>;

    /// Replace a paragraph block's text with a single plain run
    async fn update_paragraph(&self, block_id: &str, text: &str) -> Result<(), ApiError>;
}

/// HTTP client for the hosted document API (or a forwarding proxy in front
/// of it)
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    version: String,
    token: Option<String>,
    page_size: usize,
}

impl NotionClient {
    pub fn new(api: &ApiConfig, token: Option<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(50))
            .build()?;
        Ok(NotionClient {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            version: api.version.clone(),
            token,
            page_size: api.page_size,
        })
    }

    /// Build a client, reading the token from the configured environment
    /// variable. A missing token is allowed only when `base_url` points
    /// somewhere other than the hosted API (a proxy injects it).
    pub fn from_env(api: &ApiConfig) -> Result<Self, ApiError> {
        let token = std::env::var(&api.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() && api.base_url.contains("api.notion.com") {
            return Err(ApiError::MissingToken(api.token_env.clone()));
        }
        Self::new(api, token)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .request(method, format!("{}/v1/{}", self.base_url, path))
            .header("Notion-Version", &self.version);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder, id: &str) -> Result<Value, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl BlockSource for NotionClient {
    async fn children(&self, block_id: &str) -> Result<Vec<BlockNode>, ApiError> {
        let id = format_block_id(block_id);
        let req = self
            .request(reqwest::Method::GET, &format!("blocks/{}/children", id))
            .query(&[("page_size", self.page_size.to_string())]);
        let value = self.send(req, &id).await?;
        if value.get("has_more").and_then(Value::as_bool) == Some(true) {
            debug!(block = %id, "children truncated at page size {}", self.page_size);
        }
        Ok(blocks_from_results(&value))
    }

    async fn page_title(&self, page_id: &str) -> Result<String, ApiError> {
        let id = format_block_id(page_id);
        let req = self.request(reqwest::Method::GET, &format!("pages/{}", id));
        let value = self.send(req, &id).await?;
        Ok(title_from_page(&value))
    }

    async fn update_paragraph(&self, block_id: &str, text: &str) -> Result<(), ApiError> {
        let id = format_block_id(block_id);
        let req = self
            .request(reqwest::Method::PATCH, &format!("blocks/{}", id))
            .json(&paragraph_patch(text));
        self.send(req, &id).await?;
        Ok(())
    }
}

/// Convert a children listing. Entries without an id are dropped.
pub fn blocks_from_results(value: &Value) -> Vec<BlockNode> {
    value
        .get("results")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(BlockNode::from_json).collect())
        .unwrap_or_default()
}

/// Title of a page object: the text of whichever property has type `title`
pub fn title_from_page(page: &Value) -> String {
    let title = page
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props
                .values()
                .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        })
        .and_then(|p| p.get("title"))
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Request body replacing a paragraph's rich text with one plain run
pub fn paragraph_patch(text: &str) -> Value {
    json!({
        "paragraph": {
            "rich_text": [{ "type": "text", "text": { "content": text } }]
        }
    })
}

/// Dashless 32-character ids are expanded to the 8-4-4-4-12 form. Anything
/// else is returned unchanged.
pub fn format_block_id(id: &str) -> String {
    if id.len() != 32 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return id.to_string();
    }
    format!(
        "{}-{}-{}-{}-{}",
        &id[..8],
        &id[8..12],
        &id[12..16],
        &id[16..20],
        &id[20..]
    )
}
