//! HTML cleaning and link selection.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never reaches the cleaned output.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "header", "footer", "nav"];

/// Path fragments that mark navigation/account pages, not content.
pub const EXCLUDED_PATH_SEGMENTS: &[&str] = &[
    "login", "signup", "register", "contact", "about", "terms", "privacy",
];

/// Anchor phrases that mark navigation links, not content.
pub const NAV_PHRASES: &[&str] = &["sign in", "log in", "register", "contact", "about us"];

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Title and visible text of a parsed HTML document.
#[derive(Debug, Clone)]
pub struct CleanedHtml {
    pub title: String,
    pub text: String,
}

/// Extract the page title and visible text, with `script`/`style`/
/// `header`/`footer`/`nav` content removed and whitespace collapsed.
pub fn clean_html(html: &str) -> CleanedHtml {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let mut raw = String::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let stripped = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| STRIPPED_ELEMENTS.contains(&e.name()))
                .unwrap_or(false)
        });
        if !stripped {
            raw.push_str(text);
            raw.push('\n');
        }
    }

    CleanedHtml {
        title,
        text: collapse_whitespace(&raw),
    }
}

/// Strip each line, break on double-space runs, and drop blanks.
fn collapse_whitespace(raw: &str) -> String {
    raw.lines()
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// All `<a href>` targets with their anchor text, in document order.
pub fn extract_links(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let anchor = el.text().collect::<String>();
            Some((href.to_string(), anchor.trim().to_string()))
        })
        .collect()
}

/// Select in-domain content links: resolved to absolute URLs, fragments
/// cleared, navigation targets and short/navigation anchors dropped,
/// deduplicated in first-seen order, capped at `max_links`.
pub fn filter_links(base: &Url, links: &[(String, String)], max_links: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for (href, anchor) in links {
        if kept.len() >= max_links {
            break;
        }

        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let lower = href.to_lowercase();
        if lower.starts_with("javascript:") || lower.starts_with("mailto:") {
            continue;
        }

        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        if resolved.host_str() != base.host_str() {
            continue;
        }

        let path = resolved.path().to_lowercase();
        if EXCLUDED_PATH_SEGMENTS.iter().any(|seg| path.contains(seg)) {
            continue;
        }

        let anchor = anchor.trim();
        if anchor.chars().count() <= 5 {
            continue;
        }
        let anchor_lower = anchor.to_lowercase();
        if NAV_PHRASES.iter().any(|p| anchor_lower.contains(p)) {
            continue;
        }

        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            kept.push(resolved);
        }
    }

    kept
}
