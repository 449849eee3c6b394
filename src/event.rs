// src/event.rs
use crate::quake::Feed;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Emitted once the feed has been downloaded and parsed.
    FeedLoaded { feed: Feed, timestamp: DateTime<Utc> },

    /// Emitted when the download or parse failed. `reason` is the error's display text.
    FeedFailed { reason: String, timestamp: DateTime<Utc> },
}
