use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use log::{debug, error, info};
use quakeview::app::{self, App, FitMode};
use quakeview::config::Config;
use quakeview::event::AppEvent;
use quakeview::feed_download::{FeedFetcher, HttpFeedFetcher, download_feed, validate_feed_url};
use quakeview::feed_factory::FeedFactory;
use quakeview::logging::setup_logger;
use quakeview::quake::FeedURL;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    setup_logger(config.log_level, &config.log_file)?;
    info!("quakeview starting with {:?}", config);

    validate_feed_url(&config.url)?;
    let fetcher: Arc<dyn FeedFetcher + Send + Sync> = Arc::new(HttpFeedFetcher::new(config.timeout())?);
    let factory = match config.max_events {
        Some(limit) => FeedFactory::new().with_event_limit(limit),
        None => FeedFactory::new(),
    };
    let url = FeedURL::new(&config.url);

    let (tx, rx) = mpsc::unbounded_channel::<AppEvent>();

    // One fetch, no retry. If the UI is gone by the time it resolves, the send fails and the result is dropped.
    tokio::spawn(async move {
        let event = match download_feed(&url, fetcher.as_ref(), &factory).await {
            Ok(feed) => AppEvent::FeedLoaded { feed, timestamp: Utc::now() },
            Err(e) => {
                error!("Feed download failed: {}", e);
                AppEvent::FeedFailed { reason: e.to_string(), timestamp: Utc::now() }
            }
        };
        if tx.send(event).is_err() {
            debug!("UI already closed, discarding feed result");
        }
    });

    let fit_mode = if config.fit_once { FitMode::FirstLoadOnly } else { FitMode::EveryChange };
    let app = App::new().with_fit_mode(fit_mode);

    // The UI loop blocks; keep it off the runtime's async workers
    tokio::task::block_in_place(|| app::start_ui(app, rx))?;

    info!("quakeview exiting");
    Ok(())
}
