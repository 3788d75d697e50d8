use std::sync::LazyLock;

use regex::Regex;

static CHECKPOINT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^checkpoint(?:\s*\d[\d.]*\s*:?|\s*:)\s*").unwrap());

static DELIVERABLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^deliverable(?:\s*\d[\d.]*\s*:?|\s*:)\s*").unwrap());

static CODE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z]{1,3}\d+(\.\d+)?\s*[:–-]\s*").unwrap());

static MILESTONE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^milestone\s+\d+\s*[:–-]\s*").unwrap());

static TRAILING_BY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+by\s+\d{4}-\d{2}-\d{2}\s*$").unwrap());

/// Titles at or under this many characters are treated as noise
pub const MIN_TITLE_CHARS: usize = 3;

/// Strip a leading `Checkpoint 1:` / `Deliverable:` / `Deliverable 2.1:`
/// prefix from marker text. The label needs a number or a colon after it,
/// so `Deliverables for launch` is left alone.
pub fn strip_marker_prefix(text: &str) -> String {
    let text = text.trim();
    let stripped = CHECKPOINT_PREFIX.replace(text, "");
    let stripped = DELIVERABLE_PREFIX.replace(&stripped, "");
    stripped.trim().to_string()
}

/// Marker title with its prefix removed, or None when what remains is too
/// short to be a real title.
pub fn marker_title(text: &str) -> Option<String> {
    let title = strip_marker_prefix(text);
    (title.chars().count() > MIN_TITLE_CHARS).then_some(title)
}

/// The outcome phrase of a title, for compact display:
/// `CP0.1 : Get ROB to Work` → `Get ROB to Work`,
/// `Milestone 0: Everything Works` → `Everything Works`,
/// `Launch by 2026-01-10` → `Launch`.
pub fn extract_outcome(title: &str) -> String {
    let cleaned = CODE_PREFIX.replace(title.trim(), "");
    let cleaned = MILESTONE_PREFIX.replace(&cleaned, "");
    let cleaned = TRAILING_BY_DATE.replace(&cleaned, "");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_checkpoint_forms() {
        assert_eq!(strip_marker_prefix("Checkpoint 1: Ship API"), "Ship API");
        assert_eq!(strip_marker_prefix("checkpoint 2.3 Ship API"), "Ship API");
        assert_eq!(strip_marker_prefix("CHECKPOINT: Ship API"), "Ship API");
    }

    #[test]
    fn test_strip_deliverable_forms() {
        assert_eq!(strip_marker_prefix("Deliverable: Pricing page"), "Pricing page");
        assert_eq!(strip_marker_prefix("Deliverable 4: Pricing page"), "Pricing page");
        assert_eq!(strip_marker_prefix("deliverable 1.2: Pricing page"), "Pricing page");
    }

    #[test]
    fn test_plural_words_are_not_prefixes() {
        assert_eq!(strip_marker_prefix("Deliverables for launch"), "Deliverables for launch");
        assert_eq!(strip_marker_prefix("Checkpoints review"), "Checkpoints review");
        assert_eq!(strip_marker_prefix("Deliverable tracking sheet"), "Deliverable tracking sheet");
        assert_eq!(marker_title("Deliverables for launch"), Some("Deliverables for launch".into()));
    }

    #[test]
    fn test_short_titles_are_noise() {
        assert_eq!(marker_title("Checkpoint 3: API"), None);
        assert_eq!(marker_title("Deliverable: "), None);
        assert_eq!(marker_title("Deliverable: Docs"), Some("Docs".into()));
        // counted in characters, not bytes
        assert_eq!(marker_title("Checkpoint 1: ✓✓✓"), None);
    }

    #[test]
    fn test_extract_outcome() {
        assert_eq!(extract_outcome("CP0.1 : Get ROB to Work"), "Get ROB to Work");
        assert_eq!(extract_outcome("DS1.1 - Data Pipeline"), "Data Pipeline");
        assert_eq!(extract_outcome("Milestone 0: Everything Works"), "Everything Works");
        assert_eq!(extract_outcome("Launch Beta by 2026-01-10"), "Launch Beta");
        assert_eq!(extract_outcome("Plain title"), "Plain title");
    }
}
