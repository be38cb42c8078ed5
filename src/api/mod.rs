pub mod auth;
pub mod error;
pub mod handlers;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::fetcher::{PageFetcher, SpiderFetcher};
use crate::aggregator::ComplaintScraper;
use auth::AccessKey;
use error::ApiError;

/// Routes and extractor config, shared by the server and the tests.
pub fn configure<F: PageFetcher + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(handlers::root))
    .route("/health", web::get().to(handlers::health))
    .route(
        "/api/complaints/{company_slug}",
        web::get().to(handlers::get_complaints::<F>),
    )
    .route("/api/search", web::get().to(handlers::search_companies::<F>));
}

pub async fn serve(
    scraper: ComplaintScraper<SpiderFetcher>,
    access_key: AccessKey,
    host: &str,
    port: u16,
) -> Result<()> {
    if access_key.is_open() {
        warn!("API_KEY not configured, API is open");
    } else {
        info!("X-API-Key required on /api routes");
    }

    let scraper = web::Data::new(scraper);
    let access_key = web::Data::new(access_key);

    info!("Server will listen on {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(scraper.clone())
            .app_data(access_key.clone())
            .configure(configure::<SpiderFetcher>)
    })
    .bind((host, port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await?;

    Ok(())
}

// ── Tests ──
