mod aggregator;
mod api;
mod fetcher;
mod models;
mod parser;
mod settings;

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};

use aggregator::{ComplaintScraper, ScraperOptions};
use api::auth::AccessKey;
use fetcher::SpiderFetcher;
use models::StatusFilter;
use settings::Settings;

#[derive(Parser)]
#[command(name = "reclame_scraper", about = "Reclame Aqui complaint scraper via spider.cloud")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address (default: API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (default: API_PORT or 8000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Scrape the latest complaints of a company and print them as JSON
    Complaints {
        /// Company slug as used in the site URLs (e.g. "nubank", "magazine-luiza-loja-online")
        slug: String,
        /// Number of complaints (1-100)
        #[arg(short = 'n', long, default_value = "10", value_parser = clap::value_parser!(u16).range(1..=100))]
        limit: u16,
        /// Status filter: EVALUATED, NOT_SOLVED or SOLVED
        #[arg(short, long)]
        status: Option<StatusFilter>,
    },
    /// Search companies by name and print them as JSON
    Search {
        /// Search term (at least 2 characters)
        query: String,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let scraper = build_scraper(&settings)?;

    let result = match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.api_host.clone());
            let port = port.unwrap_or(settings.api_port);
            api::serve(scraper, AccessKey::new(settings.access_key()), &host, port).await
        }
        Commands::Complaints { slug, limit, status } => {
            let response = scraper.get_complaints(&slug, limit as usize, status).await;
            if response.complaints.is_empty() {
                eprintln!("No complaints found for '{}'.", slug);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Search { query } => {
            if query.chars().count() < 2 {
                anyhow::bail!("Search term must have at least 2 characters");
            }
            let companies = scraper.search_companies(&query).await?;
            if companies.is_empty() {
                eprintln!("No companies found for '{}'.", query);
            }
            println!("{}", serde_json::to_string_pretty(&companies)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_scraper(settings: &Settings) -> Result<ComplaintScraper<SpiderFetcher>> {
    let fetcher = SpiderFetcher::new(settings.spider_key())?;
    Ok(ComplaintScraper::new(
        fetcher,
        ScraperOptions {
            fetch_html_details: settings.fetch_html_details,
            search_wait: Duration::from_millis(settings.search_wait_ms),
        },
    ))
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
