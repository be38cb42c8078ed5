use std::sync::LazyLock;

use regex::Regex;

use crate::models::Complaint;

/// Status reported when no status marker is found.
pub const UNKNOWN_STATUS: &str = "Desconhecido";

/// Longer candidates are body text caught by a loose pattern, not a status.
const MAX_STATUS_LEN: usize = 50;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*ID:\*\*\s*(\d+)").unwrap());
static URL_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_([a-zA-Z0-9]+)/?$").unwrap());
static STATUS_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // ![Reclamação respondida](icon.svg) followed by the status text
        Regex::new(r"!\[Reclamação[^\]]*\]\([^)]+\)\s*\n+([^\n\[]+)").unwrap(),
        // "Status da reclamação:", an icon line, then the status text
        Regex::new(r"Status da reclamação:\s*\n+[^\n]*\n+([^\n]+)").unwrap(),
    ]
});
static LOCATION_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[Reclamar dessa empresa\][^\n]*\n+([^\n]+)\n+(\d{2}/\d{2}/\d{4}[^\n]*)").unwrap()
});
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}/\d{2}/\d{4}\s+às\s+\d{2}:\d{2})").unwrap());
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\*\*ID:\*\*\s*\d+\s*\n+",
        r"(?:Status da reclamação:[^\n]*\n+[^\n]*\n+)?",
        r"([^\n]+(?:\n+[^\n]+)*?)",
        r"(?:\n+Deixe sua rea|\n+Compartilhe|\n+\[RA Ads\])",
    ))
    .unwrap()
});
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").unwrap());
static NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());

/// Build a complaint from the markdown of its detail page.
///
/// Fields degrade independently to empty/`None`/`Desconhecido`. Only a
/// missing title makes the page unusable, in which case `None` is returned.
/// Tags, chat and final consideration live in the HTML; see `parser::html`.
pub fn parse_complaint(markdown: &str, url: &str) -> Option<Complaint> {
    let title = extract_title(markdown)?;
    let (location, date) = extract_location_date(markdown);

    Some(Complaint {
        id: extract_id(markdown, url),
        title,
        description: extract_description(markdown),
        status: extract_status(markdown),
        date,
        location,
        tags: Vec::new(),
        chat: Vec::new(),
        final_consideration: None,
        url: url.to_string(),
    })
}

pub fn extract_title(markdown: &str) -> Option<String> {
    TITLE_RE
        .captures(markdown)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Labeled `**ID:**` field, falling back to the trailing `_<id>` of the URL.
pub fn extract_id(markdown: &str, url: &str) -> String {
    if let Some(caps) = ID_RE.captures(markdown) {
        return caps[1].to_string();
    }
    URL_ID_RE
        .captures(url)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

pub fn extract_status(markdown: &str) -> String {
    STATUS_RES
        .iter()
        .filter_map(|re| re.captures(markdown))
        .map(|c| c[1].trim().to_string())
        .find(|s| !s.is_empty() && s.chars().count() < MAX_STATUS_LEN)
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
}

/// `(location, date)`. The location is only known when it sits right above
/// the date under the "Reclamar dessa empresa" link.
pub fn extract_location_date(markdown: &str) -> (Option<String>, String) {
    if let Some(caps) = LOCATION_DATE_RE.captures(markdown) {
        let location = Some(caps[1].trim().to_string()).filter(|l| !l.is_empty());
        return (location, caps[2].trim().to_string());
    }

    let date = DATE_RE
        .captures(markdown)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    (None, date)
}

/// Body text between the ID field and the reaction/share/ad markers, as a
/// single line with images removed.
pub fn extract_description(markdown: &str) -> String {
    let Some(caps) = DESCRIPTION_RE.captures(markdown) else {
        return String::new();
    };
    let text = IMAGE_RE.replace_all(caps[1].trim(), "");
    NEWLINES_RE.replace_all(&text, " ").trim().to_string()
}

// ── Tests ──
