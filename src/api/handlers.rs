use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;

use super::auth::Authorized;
use super::error::ApiError;
use crate::fetcher::PageFetcher;
use crate::models::StatusFilter;
use crate::aggregator::ComplaintScraper;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;
const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Deserialize)]
pub struct ComplaintsQuery {
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Reclame Aqui Scraper API"
    }))
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn get_complaints<F: PageFetcher + 'static>(
    _auth: Authorized,
    scraper: web::Data<ComplaintScraper<F>>,
    path: web::Path<String>,
    query: web::Query<ComplaintsQuery>,
) -> Result<HttpResponse, ApiError> {
    let company_slug = path.into_inner();
    let limit = validate_limit(query.limit)?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<StatusFilter>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let response = scraper.get_complaints(&company_slug, limit, status).await;
    if response.complaints.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Nenhuma reclamação encontrada para '{}'",
            company_slug
        )));
    }

    info!("Returning {} complaints for {}", response.total_returned, company_slug);
    Ok(HttpResponse::Ok().json(response))
}

pub async fn search_companies<F: PageFetcher + 'static>(
    _auth: Authorized,
    scraper: web::Data<ComplaintScraper<F>>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let q = query.into_inner().q;
    if q.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::BadRequest(format!(
            "q must have at least {} characters",
            MIN_QUERY_LEN
        )));
    }

    let companies = scraper.search_companies(&q).await?;
    if companies.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Nenhuma empresa encontrada para '{}'",
            q
        )));
    }

    Ok(HttpResponse::Ok().json(companies))
}

fn validate_limit(limit: Option<i64>) -> Result<usize, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(limit as usize)
}
