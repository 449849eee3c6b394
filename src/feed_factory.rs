// src/feed_factory.rs
use crate::errors::FeedError;
use crate::quake::{Epicenter, Feed, FeedURL, Quake, QuakeID};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;

// ===== Wire format of the USGS GeoJSON summary feed
// Everything is optional here: an incomplete feature is kept and later dropped by the filter.
// Features and metadata stay untyped until `create_feed`, so one ill-typed entry cannot sink the feed.

#[derive(Debug, Deserialize)]
pub struct ParsedFeed {
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub generated: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawFeature {
    pub id: Option<String>,
    pub geometry: Option<RawGeometry>,
    pub properties: Option<RawProperties>,
}

#[derive(Debug, Deserialize)]
pub struct RawGeometry {
    #[serde(default)]
    pub coordinates: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct RawProperties {
    pub mag: Option<f64>,
    pub place: Option<String>,
    pub time: Option<i64>,
    pub url: Option<String>,
    #[serde(rename = "magType")]
    pub mag_type: Option<String>,
    pub tsunami: Option<i64>,
}

impl ParsedFeed {
    pub fn from_json(content: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(content)?)
    }
}

pub fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

fn epicenter_from(geometry: &RawGeometry) -> Option<Epicenter> {
    match geometry.coordinates.as_slice() {
        [Some(lon), Some(lat), rest @ ..] if lon.is_finite() && lat.is_finite() => {
            let depth = rest.first().copied().flatten().filter(|d| d.is_finite());
            Some(Epicenter::new(*lon, *lat, depth))
        }
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct FeedFactory {
    event_limit: Option<usize>,
}

impl FeedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_limit(mut self, limit: usize) -> Self {
        self.event_limit = Some(limit);
        self
    }

    pub fn create_feed(&self, parsed: ParsedFeed, feed_url: &str) -> Feed {
        let mut quakes: Vec<Quake> = parsed
            .features
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<RawFeature>(value) {
                Ok(feature) => Some((index, feature)),
                Err(e) => {
                    warn!("FeedFactory: dropping feature {}: {}", index, e);
                    None
                }
            })
            .map(|(index, feature)| {
                // USGS always sends an id; fall back to the position so selection stays stable.
                let id = feature.id.unwrap_or_else(|| format!("feature-{}", index));
                let epicenter = feature.geometry.as_ref().and_then(epicenter_from);
                if epicenter.is_none() {
                    debug!("FeedFactory: feature {} has no usable geometry", id);
                }
                let properties = feature.properties;
                let (magnitude, place, time, url, mag_type, tsunami) = match properties {
                    Some(p) => (
                        p.mag,
                        p.place.unwrap_or_default(),
                        p.time.and_then(millis_to_utc),
                        p.url,
                        p.mag_type,
                        p.tsunami.unwrap_or(0) != 0,
                    ),
                    None => {
                        debug!("FeedFactory: feature {} has no properties", id);
                        (None, String::new(), None, None, None, false)
                    }
                };

                Quake::new(QuakeID::new(&id), epicenter, magnitude, place, time, url)
                    .with_magnitude_type(mag_type)
                    .with_tsunami(tsunami)
            })
            .collect();

        if let Some(limit) = self.event_limit {
            if quakes.len() > limit {
                warn!("FeedFactory: truncating {} events to {}", quakes.len(), limit);
                quakes.truncate(limit);
            }
        }

        let metadata: Option<RawMetadata> =
            parsed.metadata.and_then(|value| match serde_json::from_value(value) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!("FeedFactory: ignoring feed metadata: {}", e);
                    None
                }
            });
        let (title, generated) = match metadata {
            Some(meta) => (meta.title, meta.generated.and_then(millis_to_utc)),
            None => (None, None),
        };

        Feed::new(FeedURL::new(feed_url), title, generated, quakes)
    }
}
