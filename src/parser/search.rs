use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::models::CompanyInfo;

/// Maximum number of companies returned by a search.
pub const MAX_RESULTS: usize = 10;

static COMPANY_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https://www\.reclameaqui\.com\.br/empresa/([^/\)]+)/?)\)").unwrap()
});

/// Companies linked from a search results page.
///
/// The same company shows up several times with different labels; each slug
/// is kept once, under the longest label seen, at the position where the
/// slug first appeared.
pub fn parse_companies(markdown: &str) -> Vec<CompanyInfo> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut matches = 0usize;

    for caps in COMPANY_LINK_RE.captures_iter(markdown) {
        matches += 1;
        let slug = &caps[3];
        let name = caps[1].trim();

        if !is_valid_slug(slug) || !is_valid_name(name) {
            debug!("Skipping search candidate {:?} ({})", name, slug);
            continue;
        }

        match index.get(slug) {
            Some(&i) => {
                if name.chars().count() > order[i].1.chars().count() {
                    order[i].1 = name.to_string();
                }
            }
            None => {
                index.insert(slug.to_string(), order.len());
                order.push((slug.to_string(), name.to_string()));
            }
        }
    }

    info!("{} company links, {} distinct companies", matches, order.len());

    order
        .into_iter()
        .take(MAX_RESULTS)
        .map(|(slug, name)| CompanyInfo {
            name,
            slug,
            total_complaints: None,
        })
        .collect()
}

/// Rejects list pages, one-letter slugs and sponsored `ra-` entries.
fn is_valid_slug(slug: &str) -> bool {
    !slug.contains("lista-reclamacoes") && slug.chars().count() > 1 && !slug.starts_with("ra-")
}

/// Rejects short labels and labels carrying markdown escape artifacts.
fn is_valid_name(name: &str) -> bool {
    name.chars().count() > 2 && !name.contains("**") && !name.contains('\\') && !name.contains('%')
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/search_nubank.md").unwrap()
    }

    #[test]
    fn longest_label_wins() {
        let companies = parse_companies(&fixture());
        let nubank: Vec<_> = companies.iter().filter(|c| c.slug == "nubank").collect();
        assert_eq!(nubank.len(), 1);
        assert_eq!(nubank[0].name, "Nubank S.A. - Conta e Cartão");
    }

    #[test]
    fn order_of_first_appearance() {
        let slugs: Vec<String> = parse_companies(&fixture())
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["nubank", "banco-inter", "picpay"]);
    }

    #[test]
    fn later_longer_label_updates_in_place() {
        let companies = parse_companies(&fixture());
        assert_eq!(companies[1].name, "Banco Inter S.A.");
        assert!(companies.iter().all(|c| c.total_complaints.is_none()));
    }

    #[test]
    fn invalid_candidates_dropped() {
        let slugs: Vec<String> = parse_companies(&fixture())
            .into_iter()
            .map(|c| c.slug)
            .collect();
        for rejected in ["nubank-cartao", "ra-parceiro-digital", "picpay-ofertas", "x"] {
            assert!(!slugs.contains(&rejected.to_string()), "{rejected}");
        }
    }

    #[test]
    fn truncated_to_ten() {
        let md: String = (0..15)
            .map(|i| format!("[Empresa {i}](https://www.reclameaqui.com.br/empresa/empresa-{i}/)\n"))
            .collect();
        let companies = parse_companies(&md);
        assert_eq!(companies.len(), MAX_RESULTS);
        assert_eq!(companies[0].slug, "empresa-0");
        assert_eq!(companies[9].slug, "empresa-9");
    }

    #[test]
    fn empty_markdown() {
        assert!(parse_companies("").is_empty());
    }
}
