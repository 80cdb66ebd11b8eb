//! Wikipedia page scraping
//!
//! Pulls the lead paragraph and the `span.geo` coordinates out of a rendered
//! article. Used to enrich places that lack a summary or coordinates and for
//! the one-shot municipality scrape.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::PersistentCache;
use crate::config::WikiConfig;
use crate::http::{self, check_status};
use crate::models::{Coordinates, Municipality, Place};
use crate::{AssistantError, Result};

const SERVICE: &str = "Wikipedia";

/// What could be extracted from one article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiSummary {
    pub title: String,
    pub summary: Option<String>,
    pub coordinates: Option<Coordinates>,
}

pub struct WikiClient {
    client: ClientWithMiddleware,
    config: WikiConfig,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

impl WikiClient {
    pub fn new(config: WikiConfig) -> Result<Self> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
        )?;
        Ok(Self {
            client,
            config,
            cache: None,
            cache_ttl: Duration::ZERO,
        })
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PersistentCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Article URL: spaces become underscores, the rest is percent-encoded
    pub fn page_url(&self, title: &str) -> Result<Url> {
        let slug = title.trim().replace(' ', "_");
        let raw = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&slug)
        );
        Url::parse(&raw).map_err(|e| AssistantError::config(format!("Invalid wiki base URL: {e}")))
    }

    #[instrument(skip(self))]
    pub async fn fetch_summary(&self, title: &str) -> Result<WikiSummary> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AssistantError::validation("Page title cannot be empty"));
        }

        let cache_key = format!("wiki:{}", title.to_lowercase());
        if let Some(cache) = &self.cache {
            match cache.get::<WikiSummary>(&cache_key).await {
                Ok(Some(hit)) => {
                    debug!("Using cached article for '{}'", title);
                    return Ok(hit);
                }
                Ok(None) => {}
                Err(e) => warn!("Wiki cache read failed: {e}"),
            }
        }

        let url = self.page_url(title)?;
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| http::network_error(SERVICE, &e))?;
        let html = check_status(response, SERVICE)
            .await?
            .text()
            .await
            .map_err(|e| AssistantError::general(format!("Failed to read article body: {e}")))?;

        let summary = parse_page(title, &html);
        if summary.summary.is_none() {
            warn!("No lead paragraph found for '{}'", title);
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&cache_key, summary.clone(), self.cache_ttl).await {
                warn!("Wiki cache write failed: {e}");
            }
        }
        Ok(summary)
    }

    /// Scrape every name with bounded concurrency, keeping input order.
    /// Failed pages come back with neither summary nor coordinates.
    pub async fn scrape_municipalities(&self, names: &[String]) -> Vec<Municipality> {
        info!(
            "Scraping {} municipalities ({} at a time)",
            names.len(),
            self.config.concurrency
        );

        let results: Vec<Municipality> = stream::iter(names)
            .map(|name| async move {
                match self.fetch_summary(name).await {
                    Ok(page) => Municipality {
                        name: name.clone(),
                        coordinates: page.coordinates,
                        summary: page.summary,
                    },
                    Err(e) => {
                        warn!("Failed to scrape '{}': {}", name, e);
                        Municipality::new(name.clone())
                    }
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let complete = results
            .iter()
            .filter(|m| m.summary.is_some() && m.coordinates.is_some())
            .count();
        info!("Scraped {}/{} municipalities completely", complete, results.len());
        results
    }

    /// Fill a missing summary or missing coordinates from the place's article
    pub async fn enrich(&self, mut place: Place) -> Place {
        if place.summary.is_some() && place.coordinates.is_some() {
            return place;
        }
        match self.fetch_summary(&place.name).await {
            Ok(page) => {
                if place.summary.is_none() {
                    place.summary = page.summary;
                }
                if place.coordinates.is_none() {
                    place.coordinates = page.coordinates;
                }
            }
            Err(e) => warn!("Could not enrich '{}': {}", place.name, e),
        }
        place
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Extract the lead paragraph and coordinates from article HTML
#[must_use]
pub fn parse_page(title: &str, html: &str) -> WikiSummary {
    let document = Html::parse_document(html);

    let summary = selector(".mw-parser-output > p").and_then(|paragraphs| {
        document
            .select(&paragraphs)
            .map(|p| clean_text(&p.text().collect::<String>()))
            .find(|text| !text.is_empty())
    });

    let coordinates = selector("span.geo").and_then(|geo| {
        document
            .select(&geo)
            .find_map(|span| parse_geo(&span.text().collect::<String>()))
    });

    WikiSummary {
        title: title.to_string(),
        summary,
        coordinates,
    }
}

/// Parse the `"18.4655; -66.1057"` form used by `span.geo`
fn parse_geo(text: &str) -> Option<Coordinates> {
    let (lat, lon) = text.split_once(';')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    Coordinates::new(lat, lon).ok()
}

/// Footnote markers: `[1]`, `[a]`, `[note 2]`, `[citation needed]`
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:\d+|[a-z]|note \d+|citation needed)\]").expect("citation pattern is valid")
});

/// Drop citation markers and collapse whitespace
fn clean_text(text: &str) -> String {
    CITATION
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
