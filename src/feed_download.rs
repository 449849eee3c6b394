// src/feed_download.rs
use crate::errors::FeedError;
use crate::feed_factory::{FeedFactory, ParsedFeed};
use crate::quake::{Feed, FeedURL};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response};
use std::time::Duration;

pub const USGS_ALL_DAY_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson";

// ===== fetcher
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FeedError>;
}

// ===== Live http fetcher
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let client: Client =
            reqwest::Client::builder().user_agent(APP_USER_AGENT).timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        info!("HttpFeedFetcher: fetching {}", url);
        let response: Response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status()));
        }
        Ok(response.text().await?)
    }
}

// ===== Fake http fetcher for testing
pub struct FakeFetcher {
    pub response: Result<String, String>,
}

impl FakeFetcher {
    pub fn ok(body: &str) -> Self {
        Self { response: Ok(body.to_string()) }
    }

    pub fn failing(reason: &str) -> Self {
        Self { response: Err(reason.to_string()) }
    }
}

#[async_trait]
impl FeedFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FeedError> {
        self.response.clone().map_err(FeedError::Failed)
    }
}

pub fn validate_feed_url(url_str: &str) -> Result<url::Url, FeedError> {
    let parsed_url = url::Url::parse(url_str)
        .map_err(|parse_err| FeedError::InvalidUrl(format!("'{}': {}", url_str, parse_err)))?;

    if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
        return Err(FeedError::InvalidUrl(format!(
            "'{}': scheme '{}' is not http/https",
            url_str,
            parsed_url.scheme()
        )));
    }
    Ok(parsed_url)
}

pub async fn download_feed(
    url: &FeedURL,
    fetcher: &(dyn FeedFetcher + Send + Sync),
    factory: &FeedFactory,
) -> Result<Feed, FeedError> {
    info!("download_feed: Fetching content for URL: {}", url.as_str());
    let content: String = fetcher.fetch(url.as_str()).await?;
    debug!("download_feed: Content fetched, length: {}", content.len());
    let parsed = ParsedFeed::from_json(&content)?;

    let feed = factory.create_feed(parsed, url.as_str());
    info!("download_feed: {} events in feed", feed.quakes().len());
    Ok(feed)
}
