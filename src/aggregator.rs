use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::fetcher::{PageFetcher, PageFormat};
use crate::models::{CompanyInfo, Complaint, ComplaintsResponse, StatusFilter};
use crate::parser::{detail, html, listing, search, BASE_URL};

/// Hard ceiling on list pages visited per request.
const MAX_LIST_PAGES: u32 = 10;
/// Complaints shown per list page, for the total estimate.
const COMPLAINTS_PER_PAGE: u32 = 10;
const DEFAULT_SEARCH_WAIT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub struct ScraperOptions {
    /// Fetch each complaint's HTML as well, for tags, chat and evaluation.
    pub fetch_html_details: bool,
    /// Render delay for the search page, which fills in client-side.
    pub search_wait: Duration,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            fetch_html_details: false,
            search_wait: DEFAULT_SEARCH_WAIT,
        }
    }
}

/// Walks list pages, complaint pages and search results through a
/// [`PageFetcher`]. Holds no state between calls.
pub struct ComplaintScraper<F> {
    fetcher: F,
    options: ScraperOptions,
}

impl<F: PageFetcher> ComplaintScraper<F> {
    pub fn new(fetcher: F, options: ScraperOptions) -> Self {
        Self { fetcher, options }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Latest complaints of a company, newest first as listed by the site.
    pub async fn get_complaints(
        &self,
        company_slug: &str,
        limit: usize,
        status: Option<StatusFilter>,
    ) -> ComplaintsResponse {
        info!(
            "Scraping {} (limit {}, status {})",
            company_slug,
            limit,
            status.map(|s| s.as_str()).unwrap_or("all")
        );

        let urls = self.complaint_urls(company_slug, limit, status).await;
        info!("Found {} complaint URLs", urls.len());

        let mut complaints: Vec<Complaint> = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            info!("Processing {}/{}: {}", i + 1, urls.len(), url);
            if let Some(complaint) = self.scrape_complaint(url).await {
                complaints.push(complaint);
            }
        }

        let total_pages = self.total_pages(company_slug).await;

        ComplaintsResponse {
            company: CompanyInfo {
                name: company_name(company_slug),
                slug: company_slug.to_string(),
                total_complaints: Some(total_pages * COMPLAINTS_PER_PAGE),
            },
            total_returned: complaints.len(),
            complaints,
            scraped_at: Utc::now(),
        }
    }

    /// Collect up to `limit` complaint URLs across list pages.
    ///
    /// Stops at the first page that adds nothing new, at the first failed
    /// fetch, or after `MAX_LIST_PAGES`. An empty page is taken as the end of
    /// the list even if it was a provider hiccup; there are no retries.
    pub async fn complaint_urls(
        &self,
        company_slug: &str,
        limit: usize,
        status: Option<StatusFilter>,
    ) -> Vec<String> {
        let fragment = status.map(|s| s.query_fragment()).unwrap_or_default();
        let mut urls: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page = 1;

        while urls.len() < limit && page <= MAX_LIST_PAGES {
            let list_url = list_page_url(company_slug, page, &fragment);
            let markdown = match self
                .fetcher
                .fetch(&list_url, PageFormat::Markdown, None)
                .await
            {
                Ok(md) => md,
                Err(e) => {
                    error!("Failed to collect URLs from page {}: {}", page, e);
                    break;
                }
            };

            // A page cannot repeat more than `limit` earlier URLs, so asking
            // for `limit` leaves room for every new one still needed.
            let remaining = limit - urls.len();
            let fresh: Vec<String> = listing::complaint_urls(&markdown, company_slug, limit)
                .into_iter()
                .filter(|url| seen.insert(url.clone()))
                .take(remaining)
                .collect();

            if fresh.is_empty() {
                warn!("No new complaint URLs on page {}", page);
                break;
            }

            info!("Page {}: {} URLs", page, fresh.len());
            urls.extend(fresh);
            page += 1;
        }

        urls
    }

    /// Page count from the "X de Y" marker of the first list page; 1 when
    /// it cannot be determined. Informational only.
    pub async fn total_pages(&self, company_slug: &str) -> u32 {
        let url = format!("{}/empresa/{}/lista-reclamacoes/", BASE_URL, company_slug);
        match self.fetcher.fetch(&url, PageFormat::Markdown, None).await {
            Ok(markdown) => listing::total_pages(&markdown).unwrap_or(1),
            Err(e) => {
                error!("Failed to read total pages: {}", e);
                1
            }
        }
    }

    /// One complaint, or `None` when the page could not be fetched or has
    /// no title.
    pub async fn scrape_complaint(&self, url: &str) -> Option<Complaint> {
        let markdown = match self.fetcher.fetch(url, PageFormat::Markdown, None).await {
            Ok(md) => md,
            Err(e) => {
                error!("Skipping {}: {}", url, e);
                return None;
            }
        };
        if markdown.trim().is_empty() {
            warn!("Empty markdown for {}", url);
            return None;
        }

        let Some(complaint) = detail::parse_complaint(&markdown, url) else {
            warn!("Title not found: {}", url);
            return None;
        };

        if !self.options.fetch_html_details {
            return Some(complaint);
        }

        match self.fetcher.fetch(url, PageFormat::Html, None).await {
            Ok(page) if !page.trim().is_empty() => Some(html::enrich(complaint, &page)),
            Ok(_) => {
                warn!("Empty HTML for {}, keeping markdown fields only", url);
                Some(complaint)
            }
            Err(e) => {
                warn!("HTML fetch failed for {}, keeping markdown fields only: {}", url, e);
                Some(complaint)
            }
        }
    }

    /// Companies matching a free-text query, at most 10.
    pub async fn search_companies(&self, query: &str) -> Result<Vec<CompanyInfo>> {
        let url = reqwest::Url::parse_with_params(&format!("{}/busca/", BASE_URL), &[("q", query)])
            .context("Failed to build search URL")?;

        info!("Searching companies: {}", query);
        let markdown = match self
            .fetcher
            .fetch(url.as_str(), PageFormat::Markdown, Some(self.options.search_wait))
            .await
        {
            Ok(md) => md,
            Err(e) => {
                error!("Search failed: {}", e);
                return Ok(Vec::new());
            }
        };

        if markdown.trim().is_empty() {
            warn!("No markdown returned for search '{}'", query);
            return Ok(Vec::new());
        }

        let companies = search::parse_companies(&markdown);
        for c in &companies {
            info!("Company found: {} ({})", c.name, c.slug);
        }
        Ok(companies)
    }
}

fn list_page_url(company_slug: &str, page: u32, status_fragment: &str) -> String {
    format!(
        "{}/empresa/{}/lista-reclamacoes/?pagina={}{}",
        BASE_URL, company_slug, page, status_fragment
    )
}

/// Display name guessed from the slug: "magazine-luiza" → "Magazine Luiza".
fn company_name(slug: &str) -> String {
    let mut name = String::with_capacity(slug.len());
    let mut in_word = false;
    for ch in slug.chars() {
        let ch = if ch == '-' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if in_word {
                name.extend(ch.to_lowercase());
            } else {
                name.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            name.push(ch);
            in_word = false;
        }
    }
    name
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::fake::FakeFetcher;
    use crate::parser::detail::UNKNOWN_STATUS;

    const PIX: &str = "https://www.reclameaqui.com.br/nubank/pix-nao-caiu-na-conta_Ab12Cd34Ef56/";
    const CHARGE: &str =
        "https://www.reclameaqui.com.br/nubank/cobranca-indevida-no-cartao_Xk3pQ9aB1cDe/";
    const BLOCKED: &str = "https://www.reclameaqui.com.br/nubank/cartao-bloqueado-sem-aviso_ABC123/";
    const LIMIT: &str =
        "https://www.reclameaqui.com.br/nubank/limite-reduzido-sem-explicacao_Zz9Yy8Xx7Ww6/";

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    fn page(slug: &str, n: u32) -> String {
        list_page_url(slug, n, "")
    }

    fn links(slug: &str, ids: &[&str]) -> String {
        ids.iter()
            .map(|id| format!("[Reclamação {id}]({BASE_URL}/{slug}/titulo-{id}_{id}/)\n"))
            .collect()
    }

    fn scraper(fetcher: FakeFetcher) -> ComplaintScraper<FakeFetcher> {
        ComplaintScraper::new(fetcher, ScraperOptions::default())
    }

    #[tokio::test]
    async fn pagination_accumulates_until_empty_page() {
        let s = scraper(
            FakeFetcher::new()
                .markdown(&page("acme", 1), &links("acme", &["A1", "A2", "A3"]))
                .markdown(&page("acme", 2), &links("acme", &["A3", "B1", "B2"]))
                .markdown(&page("acme", 3), "nada por aqui"),
        );
        let urls = s.complaint_urls("acme", 10, None).await;
        assert_eq!(urls.len(), 5);
        assert!(urls[3].ends_with("_B1/"));
        // page 4 never requested
        assert_eq!(s.fetcher.fetched_urls().len(), 3);
    }

    #[tokio::test]
    async fn pagination_stops_at_limit() {
        let s = scraper(
            FakeFetcher::new()
                .markdown(&page("acme", 1), &links("acme", &["A1", "A2", "A3"]))
                .markdown(&page("acme", 2), &links("acme", &["B1", "B2", "B3"])),
        );
        let urls = s.complaint_urls("acme", 4, None).await;
        assert_eq!(urls.len(), 4);
        assert!(urls[3].ends_with("_B1/"));
        assert_eq!(s.fetcher.fetched_urls().len(), 2);
    }

    #[tokio::test]
    async fn pagination_stops_on_fetch_error() {
        let s = scraper(
            FakeFetcher::new()
                .markdown(&page("acme", 1), &links("acme", &["A1"]))
                .failing(&page("acme", 2)),
        );
        assert_eq!(s.complaint_urls("acme", 10, None).await.len(), 1);
    }

    #[tokio::test]
    async fn pagination_page_ceiling() {
        let mut fetcher = FakeFetcher::new();
        for n in 1..=12 {
            let id = format!("P{n}");
            fetcher = fetcher.markdown(&page("acme", n), &links("acme", &[id.as_str()]));
        }
        let s = scraper(fetcher);
        let urls = s.complaint_urls("acme", 100, None).await;
        assert_eq!(urls.len(), MAX_LIST_PAGES as usize);
        assert_eq!(s.fetcher.fetched_urls().len(), MAX_LIST_PAGES as usize);
    }

    #[tokio::test]
    async fn status_filter_reaches_list_url() {
        let s = scraper(FakeFetcher::new());
        s.complaint_urls("acme", 5, Some(StatusFilter::NotSolved)).await;
        assert_eq!(
            s.fetcher.fetched_urls(),
            vec![format!("{BASE_URL}/empresa/acme/lista-reclamacoes/?pagina=1&status=NOT_SOLVED")]
        );
    }

    #[tokio::test]
    async fn get_complaints_skips_failed_and_untitled_pages() {
        let fetcher = FakeFetcher::new()
            .markdown(&page("nubank", 1), &fixture("list_nubank.md"))
            .markdown(
                &format!("{BASE_URL}/empresa/nubank/lista-reclamacoes/"),
                &fixture("list_nubank.md"),
            )
            .failing(CHARGE)
            .markdown(PIX, &fixture("detail_pix.md"))
            .markdown(BLOCKED, &fixture("detail_labeled_status.md"))
            .markdown(LIMIT, &fixture("detail_no_title.md"));

        let response = scraper(fetcher).get_complaints("nubank", 10, None).await;

        assert_eq!(response.total_returned, 2);
        assert_eq!(response.complaints[0].url, PIX);
        assert_eq!(response.complaints[1].id, "ABC123");
        assert_eq!(response.company.name, "Nubank");
        assert_eq!(response.company.slug, "nubank");
        assert_eq!(response.company.total_complaints, Some(250));
    }

    #[tokio::test]
    async fn get_complaints_for_unknown_company_is_empty() {
        let response = scraper(FakeFetcher::new())
            .get_complaints("unknown-co", 5, None)
            .await;
        assert!(response.complaints.is_empty());
        assert_eq!(response.total_returned, 0);
        assert_eq!(response.company.name, "Unknown Co");
        assert_eq!(response.company.total_complaints, Some(10));
    }

    #[tokio::test]
    async fn html_details_enrich_when_enabled() {
        let fetcher = FakeFetcher::new()
            .markdown(PIX, &fixture("detail_pix.md"))
            .html(PIX, &fixture("detail_pix.html"));
        let s = ComplaintScraper::new(
            fetcher,
            ScraperOptions {
                fetch_html_details: true,
                ..Default::default()
            },
        );
        let c = s.scrape_complaint(PIX).await.unwrap();
        assert_eq!(c.tags, vec!["Cartão de crédito", "Pix", "Atendimento"]);
        assert_eq!(c.chat.len(), 2);
        assert_eq!(
            c.final_consideration.and_then(|f| f.service_note).as_deref(),
            Some("9")
        );
    }

    #[tokio::test]
    async fn missing_html_keeps_markdown_record() {
        let fetcher = FakeFetcher::new().markdown(BLOCKED, &fixture("detail_labeled_status.md"));
        let s = ComplaintScraper::new(
            fetcher,
            ScraperOptions {
                fetch_html_details: true,
                ..Default::default()
            },
        );
        let c = s.scrape_complaint(BLOCKED).await.unwrap();
        assert_eq!(c.status, "Resolvido");
        assert!(c.tags.is_empty());
    }

    #[tokio::test]
    async fn html_not_fetched_by_default() {
        let s = scraper(FakeFetcher::new().markdown(PIX, "# Título\n\nsem status"));
        let c = s.scrape_complaint(PIX).await.unwrap();
        assert_eq!(c.status, UNKNOWN_STATUS);
        assert!(s
            .fetcher
            .calls()
            .iter()
            .all(|(_, format, _)| *format == PageFormat::Markdown));
    }

    #[tokio::test]
    async fn search_waits_and_dedups() {
        let url = format!("{BASE_URL}/busca/?q=nubank");
        let s = scraper(FakeFetcher::new().markdown(&url, &fixture("search_nubank.md")));
        let companies = s.search_companies("nubank").await.unwrap();
        assert_eq!(companies.len(), 3);
        assert_eq!(companies[0].name, "Nubank S.A. - Conta e Cartão");
        let calls = s.fetcher.calls();
        assert_eq!(calls[0].2, Some(DEFAULT_SEARCH_WAIT));
    }

    #[tokio::test]
    async fn search_query_is_encoded() {
        let s = scraper(FakeFetcher::new());
        s.search_companies("magazine luiza").await.unwrap();
        assert_eq!(
            s.fetcher.fetched_urls(),
            vec![format!("{BASE_URL}/busca/?q=magazine+luiza")]
        );
    }

    #[tokio::test]
    async fn search_failure_is_empty() {
        let url = format!("{BASE_URL}/busca/?q=nubank");
        let s = scraper(FakeFetcher::new().failing(&url));
        assert!(s.search_companies("nubank").await.unwrap().is_empty());
    }

    #[test]
    fn company_names() {
        assert_eq!(company_name("magazine-luiza-loja-online"), "Magazine Luiza Loja Online");
        assert_eq!(company_name("itau"), "Itau");
        assert_eq!(company_name("99-taxis"), "99 Taxis");
        assert_eq!(company_name("c&a"), "C&A");
    }
}
