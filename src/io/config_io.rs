use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::board::{Lane, Quarter};
use crate::model::config::{BoardConfig, ViewConfig};

/// Config file name looked for in the working directory and its parents
pub const CONFIG_FILE: &str = "stickyboard.toml";

/// Commented starter config written by `sb init`
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/board.toml");

/// Largest page size the remote API accepts
const MAX_PAGE_SIZE: usize = 100;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no stickyboard.toml found in this directory or any parent (run `sb init`)")]
    NotFound,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse stickyboard.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("unknown view \"{0}\"")]
    UnknownView(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Find the config by walking up from `start`
pub fn discover_config(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Read, parse and validate a config file
pub fn load_config(path: &Path) -> Result<BoardConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<BoardConfig, ConfigError> {
    let config: BoardConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

/// Structural checks the traversal relies on
pub fn validate(config: &BoardConfig) -> Result<(), ConfigError> {
    if config.quarters.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one [[quarters]] entry is required".into(),
        ));
    }
    let mut seen = HashSet::new();
    for q in &config.quarters {
        let expected = format!("{}-{}", q.year, q.label.trim().to_uppercase());
        if Quarter::from(q).number().is_none() || q.id != expected {
            return Err(ConfigError::Invalid(format!(
                "quarter \"{}\" must look like YYYY-Qn and agree with its label and year",
                q.id
            )));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate quarter \"{}\"", q.id)));
        }
    }

    if config.views.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one [[views]] entry is required".into(),
        ));
    }
    let mut seen = HashSet::new();
    for view in &config.views {
        if !seen.insert(view.id.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate view \"{}\"", view.id)));
        }
        if view.root_page.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "view \"{}\" has no root_page",
                view.id
            )));
        }
        if !config.lanes.iter().any(|l| l.set == view.lanes) {
            return Err(ConfigError::Invalid(format!(
                "view \"{}\" uses lane set \"{}\" which has no lanes",
                view.id, view.lanes
            )));
        }
    }

    let mut seen = HashSet::new();
    for lane in &config.lanes {
        if !seen.insert((lane.set.as_str(), lane.id.as_str())) {
            return Err(ConfigError::Invalid(format!(
                "duplicate lane \"{}\" in set \"{}\"",
                lane.id, lane.set
            )));
        }
    }

    if config.api.page_size == 0 || config.api.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid(format!(
            "api.page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// The requested view, else the one marked default, else the first
pub fn select_view<'a>(
    config: &'a BoardConfig,
    id: Option<&str>,
) -> Result<&'a ViewConfig, ConfigError> {
    match id {
        Some(id) => config
            .views
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| ConfigError::UnknownView(id.to_string())),
        None => config
            .views
            .iter()
            .find(|v| v.default)
            .or_else(|| config.views.first())
            .ok_or_else(|| ConfigError::Invalid("no views configured".into())),
    }
}

/// Lanes of a view's lane set, in config order
pub fn view_lanes(config: &BoardConfig, view: &ViewConfig) -> Vec<Lane> {
    config
        .lanes
        .iter()
        .filter(|l| l.set == view.lanes)
        .map(Lane::from)
        .collect()
}

pub fn quarters(config: &BoardConfig) -> Vec<Quarter> {
    config.quarters.iter().map(Quarter::from).collect()
}

/// Write the starter config into `dir`. Refuses to overwrite unless `force`.
pub fn write_template(dir: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    atomic_write(&path, CONFIG_TEMPLATE.as_bytes())?;
    Ok(path)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn minimal() -> &'static str {
        r#"
[[quarters]]
id = "2026-Q1"
label = "Q1"
year = 2026

[[views]]
id = "main"
root_page = "root"
lanes = "core"

[[lanes]]
id = "lane-a"
title = "Alpha (A1)"
group = "Core"
set = "core"
"#
    }

    #[test]
    fn test_template_parses_and_validates() {
        let config = parse_config(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.quarters.len(), 8);
        assert_eq!(select_view(&config, None).unwrap().id, "cef");
        let cere = select_view(&config, Some("cere")).unwrap();
        let lanes = view_lanes(&config, cere);
        assert!(lanes.iter().all(|l| l.id != "lane-b3"));
        assert!(lanes.iter().any(|l| l.id == "lane-dac"));
        // keyword order is file order
        assert_eq!(config.keywords.keys().next().map(String::as_str), Some("demo sales"));
        assert_eq!(config.api.page_size, 100);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = parse_config(minimal()).unwrap();
        assert_eq!(config.api.base_url, "https://api.notion.com");
        assert_eq!(config.api.token_env, "NOTION_API_KEY");
        assert_eq!(config.parse.max_depth, 10);
        assert!(config.keywords.is_empty());
        // no default flag: first view
        assert_eq!(select_view(&config, None).unwrap().id, "main");
        assert!(matches!(
            select_view(&config, Some("nope")),
            Err(ConfigError::UnknownView(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let bad_quarter = minimal().replace("id = \"2026-Q1\"", "id = \"Q1-2026\"");
        assert!(matches!(parse_config(&bad_quarter), Err(ConfigError::Invalid(_))));

        let empty_set = minimal().replace("lanes = \"core\"", "lanes = \"other\"");
        assert!(matches!(parse_config(&empty_set), Err(ConfigError::Invalid(_))));

        let no_quarters = minimal().replace("[[quarters]]\nid = \"2026-Q1\"\nlabel = \"Q1\"\nyear = 2026\n", "");
        assert!(matches!(parse_config(&no_quarters), Err(ConfigError::Invalid(_))));

        let big_page = format!("[api]\npage_size = 500\n{}", minimal());
        assert!(matches!(parse_config(&big_page), Err(ConfigError::Invalid(_))));

        assert!(matches!(parse_config("quarters = 3"), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), minimal()).unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let found = discover_config(&nested).unwrap();
        assert_eq!(found, tmp.path().join(CONFIG_FILE));

        let empty = TempDir::new().unwrap();
        // a stray config above the temp root would make this flaky, so only
        // check that discovery never returns a path inside the empty dir
        if let Ok(p) = discover_config(empty.path()) {
            assert!(!p.starts_with(empty.path()));
        }
    }

    #[test]
    fn test_write_template_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = write_template(tmp.path(), false).unwrap();
        assert!(load_config(&path).is_ok());
        assert!(write_template(tmp.path(), false).is_err());
        assert!(write_template(tmp.path(), true).is_ok());
    }
}
