// src/config.rs
use crate::feed_download::USGS_ALL_DAY_URL;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

/// Earthquakes from the USGS past-day feed on a terminal world map.
#[derive(Debug, Clone, Parser)]
#[command(name = "quakeview", version, about)]
pub struct Config {
    /// GeoJSON feed to load
    #[arg(long, default_value = USGS_ALL_DAY_URL)]
    pub url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Only keep the first N events of the feed
    #[arg(long)]
    pub max_events: Option<usize>,

    /// Fit the map to the visible events only once, on first load
    #[arg(long)]
    pub fit_once: bool,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value = "quakeview.log")]
    pub log_file: PathBuf,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: USGS_ALL_DAY_URL.to_string(),
            timeout_secs: 10,
            max_events: None,
            fit_once: false,
            log_file: PathBuf::from("quakeview.log"),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
