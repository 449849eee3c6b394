// src/map_view.rs
//
// The map surface: a camera over an equirectangular world map. Positions are
// degrees, surface sizes are nominal pixels (a terminal cell counts as
// CELL_WIDTH_PX x CELL_HEIGHT_PX).
use log::debug;
use ratatui::layout::Rect;

pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Web-map tile size; zoom z shows 360 degrees over TILE_SIZE_PX * 2^z pixels.
const TILE_SIZE_PX: f64 = 256.0;

pub const DEFAULT_CENTER: LatLon = LatLon { lat: 20.0, lon: 0.0 };
pub const DEFAULT_ZOOM: f64 = 2.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Smallest lat/lon rectangle containing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// `None` for an empty set; a single point gives a zero-area bound.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLon>,
    {
        points.into_iter().fold(None, |acc: Option<GeoBounds>, p| {
            Some(match acc {
                None => GeoBounds { south: p.lat, west: p.lon, north: p.lat, east: p.lon },
                Some(b) => GeoBounds {
                    south: b.south.min(p.lat),
                    west: b.west.min(p.lon),
                    north: b.north.max(p.lat),
                    east: b.east.max(p.lon),
                },
            })
        })
    }

    pub fn center(&self) -> LatLon {
        LatLon::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn is_point(&self) -> bool {
        self.lat_span() == 0.0 && self.lon_span() == 0.0
    }

    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lon >= self.west && p.lon <= self.east
    }
}

/// Anything with a camera that can be told to frame a region.
pub trait MapSurface {
    fn fit_bounds(&mut self, bounds: &GeoBounds, padding_px: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    center: LatLon,
    zoom: f64,
    width_px: f64,
    height_px: f64,
}

impl Default for MapView {
    fn default() -> Self {
        // 80x24 until the first layout pass tells us otherwise
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            width_px: 80.0 * CELL_WIDTH_PX,
            height_px: 24.0 * CELL_HEIGHT_PX,
        }
    }
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn size_px(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    /// Called from the layout pass with the inner area of the map panel.
    pub fn set_area(&mut self, area: Rect) {
        self.width_px = f64::from(area.width.max(1)) * CELL_WIDTH_PX;
        self.height_px = f64::from(area.height.max(1)) * CELL_HEIGHT_PX;
    }

    pub fn degrees_per_px(&self) -> f64 {
        360.0 / (TILE_SIZE_PX * 2f64.powf(self.zoom))
    }

    /// ([west, east], [south, north]) currently on screen.
    pub fn visible_bounds(&self) -> ([f64; 2], [f64; 2]) {
        let dpp = self.degrees_per_px();
        let half_w = self.width_px * dpp / 2.0;
        let half_h = self.height_px * dpp / 2.0;
        (
            [self.center.lon - half_w, self.center.lon + half_w],
            [self.center.lat - half_h, self.center.lat + half_h],
        )
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan by a fraction of the visible extent. Positive `dx` moves east, positive `dy` north.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let ([west, east], [south, north]) = self.visible_bounds();
        let lat = self.center.lat + dy * (north - south);
        let lon = self.center.lon + dx * (east - west);
        self.center = LatLon::new(lat.clamp(-90.0, 90.0), wrap_longitude(lon));
    }

    pub fn reset(&mut self) {
        self.center = DEFAULT_CENTER;
        self.zoom = DEFAULT_ZOOM;
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

impl MapSurface for MapView {
    fn fit_bounds(&mut self, bounds: &GeoBounds, padding_px: f64) {
        let usable_w = (self.width_px - 2.0 * padding_px).max(1.0);
        let usable_h = (self.height_px - 2.0 * padding_px).max(1.0);

        self.zoom = if bounds.is_point() {
            MAX_ZOOM
        } else {
            let dpp = (bounds.lon_span() / usable_w).max(bounds.lat_span() / usable_h);
            (360.0 / (TILE_SIZE_PX * dpp)).log2().clamp(MIN_ZOOM, MAX_ZOOM)
        };
        self.center = bounds.center();
        debug!(
            "MapView: fit {:?} with padding {} -> center {:?}, zoom {:.2}",
            bounds, padding_px, self.center, self.zoom
        );
    }
}
