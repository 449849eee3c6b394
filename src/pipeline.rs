// src/pipeline.rs
//
// Feed + threshold -> markers + bounds. Everything here is pure except
// `fit_viewport`, which moves the camera of the surface it is handed.
use crate::map_view::{GeoBounds, LatLon, MapSurface};
use crate::quake::{Feed, Quake, QuakeID};
use chrono::{DateTime, Utc};
use log::debug;
use ratatui::style::Color;
use std::fmt;

pub const FIT_PADDING_PX: f64 = 40.0;
pub const MIN_RADIUS: f64 = 4.0;
pub const UTC_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// =================================== Threshold ===============================================

/// Minimum magnitude to display, 0.0 ..= 7.0 in steps of 0.1. Kept in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Threshold(u8);

impl Threshold {
    pub const MAX_TENTHS: u8 = 70;

    pub fn from_tenths(tenths: u8) -> Self {
        Threshold(tenths.min(Self::MAX_TENTHS))
    }

    pub fn max() -> Self {
        Threshold(Self::MAX_TENTHS)
    }

    pub fn tenths(&self) -> u8 {
        self.0
    }

    pub fn value(&self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub fn step_up(self, steps: u8) -> Self {
        Self::from_tenths(self.0.saturating_add(steps))
    }

    pub fn step_down(self, steps: u8) -> Self {
        Threshold(self.0.saturating_sub(steps))
    }

    /// Position on the slider, 0.0 ..= 1.0.
    pub fn ratio(&self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX_TENTHS)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

// =================================== Filter ==================================================

/// Events whose magnitude is at least `threshold`, in feed order. Events without
/// an epicenter or a magnitude never pass.
pub fn filter_by_magnitude(quakes: &[Quake], threshold: Threshold) -> Vec<&Quake> {
    let min = threshold.value();
    quakes
        .iter()
        .filter(|q| q.epicenter().is_some())
        .filter(|q| q.magnitude().is_some_and(|m| m >= min))
        .collect()
}

// =================================== Visual encoding =========================================

pub fn magnitude_radius(magnitude: f64) -> f64 {
    if magnitude <= 0.0 { MIN_RADIUS } else { 2f64.powf(magnitude / 1.5) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeBand {
    Minor,
    Light,
    Moderate,
    Strong,
    Major,
    Great,
}

impl MagnitudeBand {
    /// Highest band first so a value never falls through to a lower bucket.
    pub const DESCENDING: [(f64, MagnitudeBand); 5] = [
        (6.0, MagnitudeBand::Great),
        (5.0, MagnitudeBand::Major),
        (4.0, MagnitudeBand::Strong),
        (3.0, MagnitudeBand::Moderate),
        (2.0, MagnitudeBand::Light),
    ];

    pub const ALL: [MagnitudeBand; 6] = [
        MagnitudeBand::Minor,
        MagnitudeBand::Light,
        MagnitudeBand::Moderate,
        MagnitudeBand::Strong,
        MagnitudeBand::Major,
        MagnitudeBand::Great,
    ];

    pub fn from_magnitude(magnitude: f64) -> Self {
        Self::DESCENDING
            .iter()
            .find(|(min, _)| magnitude >= *min)
            .map(|(_, band)| *band)
            .unwrap_or(MagnitudeBand::Minor)
    }

    pub fn hex(&self) -> &'static str {
        match self {
            MagnitudeBand::Great => "#ff0033",
            MagnitudeBand::Major => "#ff6600",
            MagnitudeBand::Strong => "#ffaa00",
            MagnitudeBand::Moderate => "#ffcc00",
            MagnitudeBand::Light => "#a2ff00",
            MagnitudeBand::Minor => "#66ff66",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            MagnitudeBand::Great => Color::Rgb(0xff, 0x00, 0x33),
            MagnitudeBand::Major => Color::Rgb(0xff, 0x66, 0x00),
            MagnitudeBand::Strong => Color::Rgb(0xff, 0xaa, 0x00),
            MagnitudeBand::Moderate => Color::Rgb(0xff, 0xcc, 0x00),
            MagnitudeBand::Light => Color::Rgb(0xa2, 0xff, 0x00),
            MagnitudeBand::Minor => Color::Rgb(0x66, 0xff, 0x66),
        }
    }

    pub fn legend_label(&self) -> &'static str {
        match self {
            MagnitudeBand::Minor => "0–2",
            MagnitudeBand::Light => "2–3",
            MagnitudeBand::Moderate => "3–4",
            MagnitudeBand::Strong => "4–5",
            MagnitudeBand::Major => "5–6",
            MagnitudeBand::Great => "6+",
        }
    }
}

// =================================== Marker assembly =========================================

pub fn format_utc(time: DateTime<Utc>) -> String {
    time.format(UTC_TIME_FORMAT).to_string()
}

/// Display record for one event that passed the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: QuakeID,
    pub position: LatLon,
    pub radius: f64,
    pub band: MagnitudeBand,
    pub place: String,
    pub magnitude: f64,
    pub magnitude_type: Option<String>,
    pub depth_km: Option<f64>,
    pub time_utc: Option<String>,
    pub url: Option<String>,
    pub tsunami: bool,
}

impl Marker {
    /// `None` for events the filter would have rejected.
    pub fn from_quake(quake: &Quake) -> Option<Self> {
        let epicenter = quake.epicenter()?;
        let magnitude = quake.magnitude()?;
        Some(Self {
            id: quake.id().clone(),
            position: LatLon::new(epicenter.latitude, epicenter.longitude),
            radius: magnitude_radius(magnitude),
            band: MagnitudeBand::from_magnitude(magnitude),
            place: quake.place().to_string(),
            magnitude,
            magnitude_type: quake.magnitude_type().map(String::from),
            depth_km: epicenter.depth_km,
            time_utc: quake.time().map(format_utc),
            url: quake.url().map(String::from),
            tsunami: quake.tsunami(),
        })
    }

    pub fn depth_text(&self) -> String {
        match self.depth_km {
            Some(depth) => format!("{} km", depth),
            None => "unknown".to_string(),
        }
    }

    pub fn magnitude_text(&self) -> String {
        match &self.magnitude_type {
            Some(kind) => format!("{} {}", self.magnitude, kind),
            None => self.magnitude.to_string(),
        }
    }

    pub fn tooltip(&self) -> String {
        format!("Mag: {} | Depth: {}", self.magnitude, self.depth_text())
    }

    pub fn detail_lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Magnitude", self.magnitude_text()),
            ("Depth", self.depth_text()),
            ("Time", self.time_utc.clone().unwrap_or_else(|| "unknown".to_string())),
            ("Position", format!("{:.3}, {:.3}", self.position.lat, self.position.lon)),
        ];
        if self.tsunami {
            lines.push(("Tsunami", "flagged".to_string()));
        }
        if let Some(url) = &self.url {
            lines.push(("More info", url.clone()));
        }
        lines
    }
}

// =================================== Pipeline ================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub markers: Vec<Marker>,
    pub bounds: Option<GeoBounds>,
}

pub fn render_feed(feed: &Feed, threshold: Threshold) -> RenderOutput {
    let markers: Vec<Marker> = filter_by_magnitude(feed.quakes(), threshold)
        .into_iter()
        .filter_map(Marker::from_quake)
        .collect();
    let bounds = GeoBounds::from_points(markers.iter().map(|m| m.position));
    debug!(
        "render_feed: {} of {} events at threshold {}",
        markers.len(),
        feed.quakes().len(),
        threshold
    );
    RenderOutput { markers, bounds }
}

/// Frames `bounds` on the surface. Returns false, leaving the camera alone, when there is nothing to frame.
pub fn fit_viewport<S: MapSurface + ?Sized>(surface: &mut S, bounds: Option<&GeoBounds>) -> bool {
    match bounds {
        Some(bounds) => {
            surface.fit_bounds(bounds, FIT_PADDING_PX);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_view::MapView;
    use crate::quake::{Epicenter, FeedURL};

    fn quake(id: &str, magnitude: Option<f64>, lat: f64, lon: f64) -> Quake {
        Quake::new(
            QuakeID::new(id),
            Some(Epicenter::new(lon, lat, Some(10.0))),
            magnitude,
            format!("place {}", id),
            DateTime::<Utc>::from_timestamp_millis(1_728_995_000_000),
            Some(format!("https://earthquake.usgs.gov/earthquakes/eventpage/{}", id)),
        )
    }

    fn three_event_feed() -> Feed {
        Feed::new(
            FeedURL::new("http://example.com/feed"),
            None,
            None,
            vec![
                quake("a", Some(1.0), 61.2, -150.5),
                quake("b", Some(4.5), -33.4, -70.6),
                quake("c", Some(6.2), 38.3, 142.1),
            ],
        )
    }

    #[derive(Default)]
    struct RecordingSurface {
        fits: Vec<(GeoBounds, f64)>,
    }

    impl MapSurface for RecordingSurface {
        fn fit_bounds(&mut self, bounds: &GeoBounds, padding_px: f64) {
            self.fits.push((*bounds, padding_px));
        }
    }

    #[test]
    fn test_threshold_steps_and_clamps() {
        let t = Threshold::default();
        assert_eq!(t.value(), 0.0);
        assert_eq!(t.step_down(1), t);
        assert_eq!(t.step_up(45).value(), 4.5);
        assert_eq!(t.step_up(200), Threshold::max());
        assert_eq!(Threshold::max().value(), 7.0);
        assert_eq!(Threshold::from_tenths(99), Threshold::max());
        assert_eq!(Threshold::from_tenths(35).to_string(), "3.5");
    }

    #[test]
    fn test_filter_keeps_order_and_applies_threshold() {
        let feed = three_event_feed();
        let ids = |t: Threshold| -> Vec<String> {
            filter_by_magnitude(feed.quakes(), t).iter().map(|q| q.id().to_string()).collect()
        };

        assert_eq!(ids(Threshold::default()), vec!["a", "b", "c"]);
        assert_eq!(ids(Threshold::from_tenths(45)), vec!["b", "c"]);
        assert_eq!(ids(Threshold::from_tenths(50)), vec!["c"]);
        assert!(ids(Threshold::max()).is_empty());
    }

    #[test]
    fn test_filter_drops_incomplete_events() {
        let no_geometry = Quake::new(QuakeID::new("x"), None, Some(5.0), String::new(), None, None);
        let no_magnitude = quake("y", None, 0.0, 0.0);
        let zero = quake("z", Some(0.0), 0.0, 0.0);
        let negative = quake("n", Some(-0.5), 0.0, 0.0);
        let quakes = vec![no_geometry, no_magnitude, zero, negative];

        let kept: Vec<&str> = filter_by_magnitude(&quakes, Threshold::default())
            .iter()
            .map(|q| q.id().as_str())
            .collect();
        assert_eq!(kept, vec!["z"]);
    }

    #[test]
    fn test_radius() {
        assert_eq!(magnitude_radius(0.0), MIN_RADIUS);
        assert_eq!(magnitude_radius(-1.2), MIN_RADIUS);
        assert_eq!(magnitude_radius(1.5), 2.0);
        assert_eq!(magnitude_radius(6.0), 16.0);

        let mut previous = magnitude_radius(0.1);
        for tenths in 2..=70 {
            let r = magnitude_radius(f64::from(tenths) / 10.0);
            assert!(r >= previous);
            previous = r;
        }
    }

    #[test]
    fn test_color_bands() {
        let cases = [
            (-1.0, MagnitudeBand::Minor),
            (0.0, MagnitudeBand::Minor),
            (1.99, MagnitudeBand::Minor),
            (2.0, MagnitudeBand::Light),
            (2.9, MagnitudeBand::Light),
            (3.0, MagnitudeBand::Moderate),
            (4.0, MagnitudeBand::Strong),
            (4.99, MagnitudeBand::Strong),
            (5.0, MagnitudeBand::Major),
            (6.0, MagnitudeBand::Great),
            (9.1, MagnitudeBand::Great),
        ];
        for (magnitude, band) in cases {
            assert_eq!(MagnitudeBand::from_magnitude(magnitude), band, "magnitude {}", magnitude);
        }
        assert_eq!(MagnitudeBand::Great.hex(), "#ff0033");
        assert_eq!(MagnitudeBand::Minor.hex(), "#66ff66");
        assert_eq!(MagnitudeBand::from_magnitude(f64::NAN), MagnitudeBand::Minor);
    }

    #[test]
    fn test_three_event_scenario() {
        let feed = three_event_feed();
        let mut surface = RecordingSurface::default();

        let all = render_feed(&feed, Threshold::default());
        assert_eq!(all.markers.len(), 3);
        assert!(fit_viewport(&mut surface, all.bounds.as_ref()));

        let strong = render_feed(&feed, Threshold::from_tenths(50));
        assert_eq!(strong.markers.len(), 1);
        assert_eq!(strong.markers[0].id, QuakeID::new("c"));
        let bounds = strong.bounds.unwrap();
        assert!(bounds.is_point());
        assert_eq!(bounds.center(), LatLon::new(38.3, 142.1));
        assert!(fit_viewport(&mut surface, strong.bounds.as_ref()));

        let none = render_feed(&feed, Threshold::max());
        assert!(none.markers.is_empty());
        assert!(none.bounds.is_none());
        assert!(!fit_viewport(&mut surface, none.bounds.as_ref()));

        assert_eq!(surface.fits.len(), 2);
        assert!(surface.fits.iter().all(|(_, padding)| *padding == FIT_PADDING_PX));
    }

    #[test]
    fn test_empty_set_leaves_camera_untouched() {
        let feed = three_event_feed();
        let mut view = MapView::new();

        let visible = render_feed(&feed, Threshold::from_tenths(40));
        fit_viewport(&mut view, visible.bounds.as_ref());
        let before = view.clone();

        let empty = render_feed(&feed, Threshold::max());
        fit_viewport(&mut view, empty.bounds.as_ref());
        assert_eq!(view, before);
    }

    #[test]
    fn test_marker_round_trip() {
        let source = quake("us7000", Some(4.5), -33.4, -70.6).with_magnitude_type(Some("mww".to_string()));
        let marker = Marker::from_quake(&source).unwrap();

        assert_eq!(marker.place, source.place());
        assert_eq!(Some(marker.magnitude), source.magnitude());
        assert_eq!(marker.depth_km, source.epicenter().unwrap().depth_km);
        assert_eq!(marker.url.as_deref(), source.url());
        assert_eq!(marker.time_utc.as_deref(), Some("Tue, 15 Oct 2024 12:23:20 GMT"));
        assert_eq!(marker.position, LatLon::new(-33.4, -70.6));
        assert_eq!(marker.band, MagnitudeBand::Strong);
        assert_eq!(marker.tooltip(), "Mag: 4.5 | Depth: 10 km");
        assert_eq!(marker.magnitude_text(), "4.5 mww");
    }

    #[test]
    fn test_marker_requires_position_and_magnitude() {
        let no_geometry = Quake::new(QuakeID::new("x"), None, Some(5.0), String::new(), None, None);
        assert!(Marker::from_quake(&no_geometry).is_none());
        assert!(Marker::from_quake(&quake("y", None, 0.0, 0.0)).is_none());
    }
}
