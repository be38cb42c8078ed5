//! DOM extractors for the parts of a complaint page that the markdown
//! rendering flattens away: tags, the consumer/company thread and the final
//! evaluation.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::{ChatMessage, Complaint, FinalConsideration};

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static TAG_LIST_SEL: LazyLock<Selector> = LazyLock::new(|| sel("ul[class*='sc-']"));
static LI_SEL: LazyLock<Selector> = LazyLock::new(|| sel("li"));
static INTERACTION_LIST_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel("div[data-testid='complaint-interaction-list']"));
static INTERACTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel("div[data-testid='complaint-interaction']"));
static EVALUATION_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel("div[data-testid='complaint-evaluation-interaction']"));
static DEAL_AGAIN_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel("div[data-testid='complaint-deal-again']"));
static FINAL_ANSWER_SEL: LazyLock<Selector> = LazyLock::new(|| sel("h2[type='FINAL_ANSWER']"));
static OWNER_SEL: LazyLock<Selector> = LazyLock::new(|| sel("h2"));
static STYLED_SPAN_SEL: LazyLock<Selector> = LazyLock::new(|| sel("span[class*='sc-']"));
static SPAN_SEL: LazyLock<Selector> = LazyLock::new(|| sel("span"));
static P_SEL: LazyLock<Selector> = LazyLock::new(|| sel("p"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Fill tags, chat and final consideration of a markdown-built complaint.
pub fn enrich(mut complaint: Complaint, html: &str) -> Complaint {
    let document = Html::parse_document(html);
    complaint.tags = tags(&document);
    complaint.chat = chat(&document);
    complaint.final_consideration = final_consideration(&document);
    complaint
}

pub fn tags(document: &Html) -> Vec<String> {
    document
        .select(&TAG_LIST_SEL)
        .next()
        .map(|list| {
            list.select(&LI_SEL)
                .map(text_of)
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Thread messages, without the consumer's final answer (reported separately).
pub fn chat(document: &Html) -> Vec<ChatMessage> {
    let Some(list) = document.select(&INTERACTION_LIST_SEL).next() else {
        return Vec::new();
    };

    list.select(&INTERACTION_SEL)
        .filter(|container| container.select(&FINAL_ANSWER_SEL).next().is_none())
        .filter_map(|container| {
            let owner = container.select(&OWNER_SEL).next()?;
            let message = container.select(&P_SEL).next()?;
            let date = container
                .select(&STYLED_SPAN_SEL)
                .next()
                .map(text_of)
                .unwrap_or_default();
            Some(ChatMessage {
                owner: text_of(owner),
                date,
                message: text_of(message),
            })
        })
        .collect()
}

pub fn final_consideration(document: &Html) -> Option<FinalConsideration> {
    let evaluation = document.select(&EVALUATION_SEL).next()?;

    let message = evaluation
        .select(&INTERACTION_SEL)
        .next()
        .and_then(|m| m.select(&P_SEL).next())
        .map(text_of);
    let date = evaluation.select(&SPAN_SEL).next().map(text_of);
    let would_do_business_again = evaluation.select(&DEAL_AGAIN_SEL).next().map(text_of);

    // rating is the last number in the block
    let block_text = evaluation.text().collect::<Vec<_>>().join(" ");
    let service_note = NUMBER_RE
        .find_iter(&block_text)
        .last()
        .map(|m| m.as_str().to_string());

    Some(FinalConsideration {
        message,
        service_note,
        would_do_business_again,
        date,
    })
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

// ── Tests ──
