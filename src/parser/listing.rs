use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::BASE_URL;

/// Upper bound for the "page X of Y" marker.
const MAX_TOTAL_PAGES: u32 = 50;

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+de\s+(\d+)").unwrap());

/// Complaint links of one list page, in first-seen order, at most `cap`.
///
/// Only links under `<BASE_URL>/<company_slug>/` whose URL carries an
/// underscore id segment count; navigation links under the same namespace
/// (`/sobre/`, `/lista-reclamacoes/`) have none.
pub fn complaint_urls(markdown: &str, company_slug: &str, cap: usize) -> Vec<String> {
    if cap == 0 {
        return Vec::new();
    }

    let pattern = format!(
        r"\[([^\]]+)\]\(({}/{}/[^)]+)\)",
        regex::escape(BASE_URL),
        regex::escape(company_slug)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("Invalid link pattern for {}: {}", company_slug, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut matches = 0usize;

    for caps in re.captures_iter(markdown) {
        matches += 1;
        let url = &caps[2];
        if !url.contains('_') || seen.contains(url) {
            continue;
        }
        seen.insert(url.to_string());
        urls.push(url.to_string());
        if urls.len() >= cap {
            break;
        }
    }

    debug!(
        "{} link matches for {}, kept {} complaint URLs",
        matches,
        company_slug,
        urls.len()
    );
    urls
}

/// Total page count from a "X de Y" marker, capped at 50.
pub fn total_pages(markdown: &str) -> Option<u32> {
    let caps = PAGE_MARKER_RE.captures(markdown)?;
    let total = caps[2].parse::<u32>().ok()?;
    Some(total.min(MAX_TOTAL_PAGES))
}

// ── Tests ──
