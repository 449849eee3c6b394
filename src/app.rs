use crate::event::AppEvent;
use crate::map_view::{GeoBounds, MapView};
use crate::pipeline::{Marker, RenderOutput, Threshold, fit_viewport, render_feed};
use crate::quake::Feed;
use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use ratatui::{Terminal, backend::Backend, layout::Rect, widgets::ListState};
use std::io;
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

const PAN_FRACTION: f64 = 0.1;
const ZOOM_STEP: f64 = 0.5;

/// Acquisition state of the one feed download.
#[derive(Debug, Clone)]
pub enum FeedState {
    Pending,
    Loaded(Feed),
    Failed(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum FitMode {
    /// Re-frame the visible events every time the visible set is recomputed.
    #[default]
    EveryChange,
    /// Frame only the first non-empty visible set.
    FirstLoadOnly,
}

pub struct App {
    pub should_quit: bool,
    pub feed_state: FeedState,
    pub threshold: Threshold,
    pub map_view: MapView,
    pub markers: Vec<Marker>,
    pub visible_bounds: Option<GeoBounds>,
    pub selected_marker_index: Option<usize>,
    pub markers_list_state: ListState,
    pub show_details: bool,
    fit_mode: FitMode,
    has_fitted: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> App {
        App {
            should_quit: false,
            feed_state: FeedState::Pending,
            threshold: Threshold::default(),
            map_view: MapView::new(),
            markers: Vec::new(),
            visible_bounds: None,
            selected_marker_index: None,
            markers_list_state: ListState::default(),
            show_details: false,
            fit_mode: FitMode::default(),
            has_fitted: false,
        }
    }

    pub fn with_fit_mode(mut self, fit_mode: FitMode) -> Self {
        self.fit_mode = fit_mode;
        self
    }

    // ================================ Feed acquisition ===========================================

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::FeedLoaded { feed, timestamp } => {
                info!("App: feed with {} events loaded at {}", feed.quakes().len(), timestamp);
                self.feed_state = FeedState::Loaded(feed);
            }
            AppEvent::FeedFailed { reason, timestamp } => {
                warn!("App: feed failed at {}: {}", timestamp, reason);
                self.feed_state = FeedState::Failed(reason);
            }
        }
        self.recompute();
    }

    pub fn feed(&self) -> Option<&Feed> {
        match &self.feed_state {
            FeedState::Loaded(feed) => Some(feed),
            _ => None,
        }
    }

    pub fn status_text(&self) -> String {
        match &self.feed_state {
            FeedState::Pending => "Loading…".to_string(),
            FeedState::Failed(reason) => format!("Error: {}", reason),
            FeedState::Loaded(feed) => format!(
                "Loaded {} events — last update: {}",
                feed.quakes().len(),
                feed.fetched_at().with_timezone(&Local).format("%b %-d, %Y, %-I:%M:%S %p")
            ),
        }
    }

    // ================================ Visible set ================================================

    /// Re-runs the pipeline for the current feed and threshold, then re-frames the map.
    fn recompute(&mut self) {
        let output: RenderOutput = match &self.feed_state {
            FeedState::Loaded(feed) => render_feed(feed, self.threshold),
            FeedState::Pending | FeedState::Failed(_) => RenderOutput::default(),
        };

        let previous_id = self.selected_marker().map(|m| m.id.clone());
        self.markers = output.markers;
        self.visible_bounds = output.bounds;

        // Keep the selection on the same event while it stays visible
        let still_visible = previous_id.and_then(|id| self.markers.iter().position(|m| m.id == id));
        if still_visible.is_none() {
            // The popup belongs to its event and goes away with it
            self.show_details = false;
        }
        self.selected_marker_index =
            still_visible.or(if self.markers.is_empty() { None } else { Some(0) });
        self.markers_list_state.select(self.selected_marker_index);

        let should_fit = match self.fit_mode {
            FitMode::EveryChange => true,
            FitMode::FirstLoadOnly => !self.has_fitted,
        };
        if should_fit && fit_viewport(&mut self.map_view, self.visible_bounds.as_ref()) {
            self.has_fitted = true;
        }
    }

    pub fn set_threshold(&mut self, threshold: Threshold) {
        if threshold == self.threshold {
            return;
        }
        debug!("App: threshold {} -> {}", self.threshold, threshold);
        self.threshold = threshold;
        self.recompute();
    }

    // ================================ Marker selection ===========================================

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.selected_marker_index.and_then(|i| self.markers.get(i))
    }

    pub fn select_next_marker(&mut self) {
        if self.markers.is_empty() {
            self.selected_marker_index = None;
        } else {
            let len = self.markers.len();
            self.selected_marker_index = Some(self.selected_marker_index.map_or(0, |i| (i + 1) % len));
        }
        self.markers_list_state.select(self.selected_marker_index);
    }

    pub fn select_prev_marker(&mut self) {
        if self.markers.is_empty() {
            self.selected_marker_index = None;
        } else {
            let len = self.markers.len();
            self.selected_marker_index =
                Some(self.selected_marker_index.map_or(len - 1, |i| (i + len - 1) % len));
        }
        self.markers_list_state.select(self.selected_marker_index);
    }

    pub fn toggle_details(&mut self) {
        self.show_details = !self.show_details && self.selected_marker().is_some();
    }

    // ================================ Camera =====================================================

    pub fn fit_to_visible(&mut self) {
        fit_viewport(&mut self.map_view, self.visible_bounds.as_ref());
    }

    // --- Key Handler ---
    pub fn on_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.show_details = false,
            KeyCode::Right => self.set_threshold(self.threshold.step_up(1)),
            KeyCode::Left => self.set_threshold(self.threshold.step_down(1)),
            KeyCode::PageUp => self.set_threshold(self.threshold.step_up(10)),
            KeyCode::PageDown => self.set_threshold(self.threshold.step_down(10)),
            KeyCode::Home => self.set_threshold(Threshold::default()),
            KeyCode::End => self.set_threshold(Threshold::max()),
            KeyCode::Down => self.select_next_marker(),
            KeyCode::Up => self.select_prev_marker(),
            KeyCode::Enter => self.toggle_details(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.map_view.zoom_by(ZOOM_STEP),
            KeyCode::Char('-') => self.map_view.zoom_by(-ZOOM_STEP),
            KeyCode::Char('h') => self.map_view.pan(-PAN_FRACTION, 0.0),
            KeyCode::Char('l') => self.map_view.pan(PAN_FRACTION, 0.0),
            KeyCode::Char('k') => self.map_view.pan(0.0, PAN_FRACTION),
            KeyCode::Char('j') => self.map_view.pan(0.0, -PAN_FRACTION),
            KeyCode::Char('f') => self.fit_to_visible(),
            KeyCode::Char('0') => self.map_view.reset(),
            _ => {}
        }
    }
}

pub fn start_ui(app: App, events: UnboundedReceiver<AppEvent>) -> Result<()> {
    // Set up the terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = app;
    let mut events = events;
    let res = run_app_loop(&mut terminal, &mut app, &mut events);

    // Restore the terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

/// Sizes the camera to the current frame, then applies any feed results that arrived.
/// Layout goes first so a fit triggered by the feed uses the real panel size.
pub fn apply_pending_events(app: &mut App, frame_size: Rect, events: &mut UnboundedReceiver<AppEvent>) {
    crate::ui::prepare_ui_layout(app, frame_size);
    loop {
        match events.try_recv() {
            Ok(app_event) => app.handle_event(app_event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
}

pub fn run_app_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    while !app.should_quit {
        let frame_size = terminal.get_frame().size();
        apply_pending_events(app, frame_size, events);
        terminal.draw(|f| crate::ui::ui(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    app.on_key(key_event.code);
                }
            }
        }
    }

    Ok(())
}
