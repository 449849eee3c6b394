// src/lib.rs
pub mod app;
pub mod config;
pub mod errors;
pub mod event;
pub mod feed_download;
pub mod feed_factory;
pub mod logging;
pub mod map_view;
pub mod pipeline;
pub mod quake;
pub mod ui;

pub mod widgets;
