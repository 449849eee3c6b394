// src/quake.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// === FEED STRUCTURES ===
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedURL(String);

impl std::fmt::Display for FeedURL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for FeedURL {
    fn eq(&self, other: &Self) -> bool {
        // Normalize URLs by trimming trailing slashes
        let a = self.0.trim_end_matches('/');
        let b = other.0.trim_end_matches('/');
        a == b
    }
}

impl Eq for FeedURL {}

impl FeedURL {
    pub fn new(s: &str) -> Self {
        FeedURL(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for FeedURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// === EVENT STRUCTURES ===
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuakeID(String);

impl std::fmt::Display for QuakeID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl QuakeID {
    pub fn new(s: &str) -> Self {
        QuakeID(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Where an event happened. Longitude and latitude in degrees, depth in km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Epicenter {
    pub longitude: f64,
    pub latitude: f64,
    pub depth_km: Option<f64>,
}

impl Epicenter {
    pub fn new(longitude: f64, latitude: f64, depth_km: Option<f64>) -> Self {
        Self { longitude, latitude, depth_km }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quake {
    #[serde(rename = "id")]
    id: QuakeID,
    #[serde(rename = "epicenter")]
    epicenter: Option<Epicenter>,
    #[serde(rename = "magnitude")]
    magnitude: Option<f64>,
    #[serde(rename = "magnitude_type")]
    magnitude_type: Option<String>,
    #[serde(rename = "place")]
    place: String,
    #[serde(rename = "time")]
    time: Option<DateTime<Utc>>,
    #[serde(rename = "url")]
    url: Option<String>,
    #[serde(rename = "tsunami")]
    tsunami: bool,
}

impl Quake {
    pub fn new(
        id: QuakeID,
        epicenter: Option<Epicenter>,
        magnitude: Option<f64>,
        place: String,
        time: Option<DateTime<Utc>>,
        url: Option<String>,
    ) -> Self {
        Self { id, epicenter, magnitude, magnitude_type: None, place, time, url, tsunami: false }
    }

    // Builder methods for the optional USGS extras
    pub fn with_magnitude_type(mut self, magnitude_type: Option<String>) -> Self {
        self.magnitude_type = magnitude_type;
        self
    }

    pub fn with_tsunami(mut self, tsunami: bool) -> Self {
        self.tsunami = tsunami;
        self
    }

    pub fn id(&self) -> &QuakeID {
        &self.id
    }

    pub fn epicenter(&self) -> Option<&Epicenter> {
        self.epicenter.as_ref()
    }

    pub fn magnitude(&self) -> Option<f64> {
        self.magnitude
    }

    pub fn magnitude_type(&self) -> Option<&str> {
        self.magnitude_type.as_deref()
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn tsunami(&self) -> bool {
        self.tsunami
    }
}

/// One acquired snapshot of the event feed. Replaced wholesale on re-fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    #[serde(rename = "url")]
    url: FeedURL,
    #[serde(rename = "title")]
    title: Option<String>,
    #[serde(rename = "generated")]
    generated: Option<DateTime<Utc>>,
    #[serde(rename = "quakes")]
    quakes: Vec<Quake>,
    #[serde(rename = "fetched_at")]
    fetched_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(
        url: FeedURL,
        title: Option<String>,
        generated: Option<DateTime<Utc>>,
        quakes: Vec<Quake>,
    ) -> Self {
        Self { url, title, generated, quakes, fetched_at: Utc::now() }
    }

    pub fn url(&self) -> &FeedURL {
        &self.url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn generated(&self) -> Option<DateTime<Utc>> {
        self.generated
    }

    pub fn quakes(&self) -> &[Quake] {
        &self.quakes
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "Title       : {}", title)?;
        }
        writeln!(f, "URL         : {}", self.url)?;
        if let Some(generated) = &self.generated {
            writeln!(f, "Generated   : {}", generated)?;
        }
        writeln!(f, "Events      : {}", self.quakes.len())?;
        writeln!(f, "Fetched at  : {}", self.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_ignores_trailing_slash() {
        assert_eq!(FeedURL::new("https://example.com/feed/"), FeedURL::new("https://example.com/feed"));
        assert_ne!(FeedURL::new("https://example.com/a"), FeedURL::new("https://example.com/b"));
    }

    #[test]
    fn test_feed_display_lists_event_count() {
        let quake = Quake::new(
            QuakeID::new("us1"),
            Some(Epicenter::new(1.0, 2.0, Some(3.0))),
            Some(4.0),
            "Somewhere".to_string(),
            None,
            None,
        );
        let feed = Feed::new(
            FeedURL::new("https://example.com/feed"),
            Some("USGS All Earthquakes, Past Day".to_string()),
            None,
            vec![quake],
        );

        let rendered = feed.to_string();
        assert!(rendered.contains("USGS All Earthquakes, Past Day"));
        assert!(rendered.contains("Events      : 1"));
    }
}
