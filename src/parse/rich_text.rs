use std::collections::HashMap;

use crate::model::block::{Mention, RichTextRun};

/// Placeholder title the remote API reports for unnamed or unresolved pages
pub const UNTITLED: &str = "Untitled";

/// Plain concatenation of every run's text
pub fn plain_text(runs: &[RichTextRun]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

/// Text with embedded links rendered as `[text](url)`. User mentions show
/// the person's name.
pub fn linked_text(runs: &[RichTextRun], web_base: &str) -> String {
    linked_text_with(runs, web_base, &HashMap::new())
}

/// Like `linked_text`, but page mentions whose text is empty or `Untitled`
/// take their display text from `titles` (page id → resolved title).
pub fn linked_text_with(
    runs: &[RichTextRun],
    web_base: &str,
    titles: &HashMap<String, String>,
) -> String {
    runs.iter()
        .map(|run| {
            let text = display_text(run, titles);
            match link_target(run, web_base) {
                Some(url) => format!("[{}]({})", text, url),
                None => text,
            }
        })
        .collect()
}

/// Display text of one run, preferring mention-derived text over a blank
/// or `Untitled` plain text.
pub fn display_text(run: &RichTextRun, titles: &HashMap<String, String>) -> String {
    match &run.mention {
        Some(Mention::User { name: Some(name) }) if !name.is_empty() => name.clone(),
        Some(Mention::Page { page_id }) if is_placeholder(&run.plain_text) => titles
            .get(page_id)
            .cloned()
            .unwrap_or_else(|| run.plain_text.clone()),
        _ => run.plain_text.clone(),
    }
}

/// Anchor target for a run. An explicit href wins over any mention url.
pub fn link_target(run: &RichTextRun, web_base: &str) -> Option<String> {
    if let Some(href) = &run.href {
        return Some(absolute_href(href, web_base));
    }
    match &run.mention {
        Some(Mention::Page { page_id }) => Some(page_url(page_id, web_base)),
        Some(Mention::Url { url }) | Some(Mention::LinkPreview { url }) => Some(url.clone()),
        _ => None,
    }
}

/// First link found in a run sequence
pub fn first_link(runs: &[RichTextRun], web_base: &str) -> Option<String> {
    runs.iter().find_map(|r| link_target(r, web_base))
}

/// Page ids mentioned in runs whose own text does not name the page
pub fn unresolved_page_mentions(runs: &[RichTextRun]) -> Vec<String> {
    runs.iter()
        .filter_map(|r| match &r.mention {
            Some(Mention::Page { page_id }) if is_placeholder(&r.plain_text) => {
                Some(page_id.clone())
            }
            _ => None,
        })
        .collect()
}

/// Human-facing url of a page: web base plus the dashless id
pub fn page_url(page_id: &str, web_base: &str) -> String {
    format!("{}/{}", web_base.trim_end_matches('/'), page_id.replace('-', ""))
}

fn absolute_href(href: &str, web_base: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", web_base.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

/// Empty, whitespace-only, or the `Untitled` sentinel
pub fn is_placeholder(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t == UNTITLED
}
