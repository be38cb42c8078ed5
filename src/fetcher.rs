use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{json, Value};
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::{info, warn};

/// Shape of the content asked from the fetch provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageFormat {
    Markdown,
    Html,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("fetch provider failed for {url}: {message}")]
    Provider { url: String, message: String },
}

/// Anything that can turn a URL into rendered page text.
///
/// An empty string means the provider answered but had nothing usable;
/// callers treat it as "nothing to extract", not as a failure.
pub trait PageFetcher {
    fn fetch(
        &self,
        url: &str,
        format: PageFormat,
        wait: Option<Duration>,
    ) -> impl Future<Output = Result<String, FetchError>>;
}

/// spider.cloud backed fetcher.
pub struct SpiderFetcher {
    spider: Spider,
}

impl SpiderFetcher {
    pub fn new(api_key: &str) -> Result<Self> {
        let spider = Spider::new(Some(api_key.to_string()))
            .map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))?;
        Ok(Self { spider })
    }
}

impl PageFetcher for SpiderFetcher {
    async fn fetch(
        &self,
        url: &str,
        format: PageFormat,
        wait: Option<Duration>,
    ) -> Result<String, FetchError> {
        info!("Fetching ({:?}): {}", format, url);
        let params = request_params(format, wait);

        let start = Instant::now();
        let response = self
            .spider
            .scrape_url(url, Some(params), "application/json")
            .await;
        let elapsed = start.elapsed().as_millis();

        match response {
            Ok(value) => match content_from_response(value) {
                Some(content) => {
                    info!("Fetched {} chars in {}ms: {}", content.len(), elapsed, url);
                    Ok(content)
                }
                None => {
                    warn!("Unexpected provider response for {} ({}ms)", url, elapsed);
                    Ok(String::new())
                }
            },
            Err(e) => Err(FetchError::Provider {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

fn request_params(format: PageFormat, wait: Option<Duration>) -> RequestParams {
    let return_format = match format {
        PageFormat::Markdown => ReturnFormat::Markdown,
        PageFormat::Html => ReturnFormat::Raw,
    };
    let params = RequestParams {
        return_format: Some(ReturnFormatHandling::Single(return_format)),
        ..Default::default()
    };

    match wait {
        Some(delay) => with_delay(params, delay),
        None => params,
    }
}

/// Merge a fixed render delay into the request. Waits only apply to
/// browser-rendered requests, so the request type is switched to chrome too.
fn with_delay(params: RequestParams, delay: Duration) -> RequestParams {
    let merged = serde_json::to_value(&params).and_then(|mut value| {
        if let Some(obj) = value.as_object_mut() {
            obj.insert("request".into(), json!("chrome"));
            obj.insert(
                "wait_for".into(),
                json!({
                    "delay": {
                        "timeout": { "secs": delay.as_secs(), "nanos": delay.subsec_nanos() }
                    }
                }),
            );
        }
        serde_json::from_value::<RequestParams>(value)
    });

    match merged {
        Ok(p) => p,
        Err(e) => {
            warn!("Could not attach render delay, fetching without it: {}", e);
            params
        }
    }
}

/// Pull the page body out of a spider response: `[{"content": "...", ...}]`,
/// sometimes delivered as a JSON string.
fn content_from_response(value: Value) -> Option<String> {
    let parsed: Value = match value.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(value.clone()),
        None => value,
    };

    parsed
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .map(|c| c.to_string())
}

// ── Tests ──
