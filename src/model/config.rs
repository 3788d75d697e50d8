use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Configuration from stickyboard.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub quarters: Vec<QuarterConfig>,
    #[serde(default)]
    pub views: Vec<ViewConfig>,
    #[serde(default)]
    pub lanes: Vec<LaneConfig>,
    /// Shorthand phrases mapped to candidate lane ids, checked in file order
    #[serde(default)]
    pub keywords: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Default: see src/templates/board.toml
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the protocol-version header
    #[serde(default = "default_version")]
    pub version: String,
    /// Environment variable holding the bearer token. A forwarding proxy
    /// that injects the credential needs none.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Children per fetch. Pagination past the first page is not followed.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Base used to build human-facing page links
    #[serde(default = "default_web_base")]
    pub web_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            version: default_version(),
            token_env: default_token_env(),
            page_size: default_page_size(),
            web_base: default_web_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Maximum nesting followed when collecting toggle/nested content
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            max_depth: default_max_depth(),
        }
    }
}

/// Default: see src/templates/board.toml
fn default_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_version() -> String {
    "2022-06-28".to_string()
}

fn default_token_env() -> String {
    "NOTION_API_KEY".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_web_base() -> String {
    "https://www.notion.so".to_string()
}

fn default_max_depth() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterConfig {
    /// e.g. `2026-Q1`
    pub id: String,
    /// e.g. `Q1`
    pub label: String,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub id: String,
    /// Root page whose children are the roadmap document
    pub root_page: String,
    /// Which lane set this view uses
    pub lanes: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    pub id: String,
    pub title: String,
    pub group: String,
    /// Lane set name, matched against `ViewConfig::lanes`
    pub set: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub wiki_url: Option<String>,
}
