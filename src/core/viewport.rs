use crate::core::constants::{MAX_ZOOM, TILE_SIZE};
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const EARTH_RADIUS: f64 = 6378137.0;

/// The visible map region the data contract is queried with: bounding box in
/// degrees plus the integer zoom level.
///
/// A viewport always satisfies `north > south` and `east > west`; there is no
/// antimeridian handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
    zoom: u8,
}

impl Viewport {
    pub fn new(north: f64, south: f64, east: f64, west: f64, zoom: u8) -> Result<Self> {
        let finite = [north, south, east, west].iter().all(|v| v.is_finite());
        if !finite || north <= south || east <= west {
            return Err(Error::InvalidViewport(format!(
                "n={north} s={south} e={east} w={west}"
            )));
        }

        Ok(Self {
            north,
            south,
            east,
            west,
            zoom: zoom.min(MAX_ZOOM),
        })
    }

    pub fn from_bounds(bounds: &LatLngBounds, zoom: u8) -> Result<Self> {
        Self::new(
            bounds.north(),
            bounds.south(),
            bounds.east(),
            bounds.west(),
            zoom,
        )
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn bounds(&self) -> LatLngBounds {
        LatLngBounds::from_coords(self.south, self.west, self.north, self.east)
    }

    pub fn center(&self) -> LatLng {
        self.bounds().center()
    }
}

/// Rounds a fractional map zoom to the integer level used by queries
pub fn snap_zoom(zoom: f64) -> u8 {
    if !zoom.is_finite() {
        return 0;
    }
    zoom.round().clamp(0.0, MAX_ZOOM as f64) as u8
}

/// The host map's camera: centre, fractional zoom and container size in
/// pixels. Mirrors what the mapping engine reports so the core can hit-test
/// clicks and compute visible bounds without asking it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
    pub size: Point,
}

impl MapView {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center: LatLng::new(LatLng::clamp_lat(center.lat), center.lng),
            zoom: zoom.clamp(0.0, MAX_ZOOM as f64),
            size,
        }
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates (Web Mercator, EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let world = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let meters = lat_lng.to_mercator();
        let circumference = 2.0 * PI * EARTH_RADIUS;

        Point::new(
            (meters.x + PI * EARTH_RADIUS) / circumference * world,
            (PI * EARTH_RADIUS - meters.y) / circumference * world,
        )
    }

    /// Unprojects world pixel coordinates back to LatLng
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let world = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let circumference = 2.0 * PI * EARTH_RADIUS;

        let x = pixel.x / world * circumference - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - pixel.y / world * circumference;
        LatLng::from_mercator(Point::new(x, y))
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let origin = self.project(&self.center, None);
        let projected = self.project(lat_lng, None);
        projected
            .subtract(&origin)
            .add(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts container pixel coordinates back to a geographical coordinate
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let origin = self.project(&self.center, None);
        let world = pixel
            .subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
            .add(&origin);
        self.unproject(&world, None)
    }

    /// Gets the visible bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Snapshot of the visible area as a query viewport
    pub fn viewport(&self) -> Result<Viewport> {
        Viewport::from_bounds(&self.bounds(), snap_zoom(self.zoom))
    }

    /// Centre and zoom that make `bounds` fit inside the container minus
    /// `padding` pixels on every side. Only whole zoom levels are tried.
    pub fn fit_bounds(&self, bounds: &LatLngBounds, padding: f64) -> (LatLng, f64) {
        let available = Point::new(
            (self.size.x - 2.0 * padding).max(1.0),
            (self.size.y - 2.0 * padding).max(1.0),
        );
        let nw = LatLng::new(bounds.north(), bounds.west());
        let se = LatLng::new(bounds.south(), bounds.east());

        let mut best_zoom = 0.0;
        for level in 0..=MAX_ZOOM {
            let zoom = level as f64;
            let top_left = self.project(&nw, Some(zoom));
            let bottom_right = self.project(&se, Some(zoom));

            let width = (bottom_right.x - top_left.x).abs();
            let height = (bottom_right.y - top_left.y).abs();
            if width <= available.x && height <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        (bounds.center(), best_zoom)
    }

    /// Gets the resolution in meters per pixel at the current zoom level
    pub fn resolution(&self) -> f64 {
        2.0 * PI * EARTH_RADIUS / (TILE_SIZE as f64 * self.scale())
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_rejects_inverted_bounds() {
        assert!(Viewport::new(54.72, 54.70, 20.50, 20.40, 14).is_ok());
        assert!(matches!(
            Viewport::new(54.70, 54.72, 20.50, 20.40, 14),
            Err(Error::InvalidViewport(_))
        ));
        assert!(Viewport::new(54.72, 54.70, 20.40, 20.50, 14).is_err());
        assert!(Viewport::new(54.72, 54.72, 20.50, 20.40, 14).is_err());
        assert!(Viewport::new(f64::NAN, 54.70, 20.50, 20.40, 14).is_err());
    }

    #[test]
    fn test_snap_zoom() {
        assert_eq!(snap_zoom(12.4), 12);
        assert_eq!(snap_zoom(12.5), 13);
        assert_eq!(snap_zoom(-3.0), 0);
        assert_eq!(snap_zoom(30.0), MAX_ZOOM);
        assert_eq!(snap_zoom(f64::NAN), 0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let view = MapView::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center = view.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center.lat.abs() < 0.01);
        assert!(center.lng.abs() < 0.01);

        let target = LatLng::new(54.71, 20.45);
        let view = MapView::new(target, 14.0, Point::new(1024.0, 768.0));
        let pixel = view.lat_lng_to_pixel(&target);
        assert!((pixel.x - 512.0).abs() < 1e-6);
        assert!((pixel.y - 384.0).abs() < 1e-6);
    }

    #[test]
    fn test_visible_bounds_surround_center() {
        let view = MapView::new(LatLng::new(54.71, 20.45), 12.0, Point::new(800.0, 600.0));
        let bounds = view.bounds();
        assert!(bounds.is_valid());
        assert!(bounds.contains(&view.center));

        let viewport = view.viewport().unwrap();
        assert_eq!(viewport.zoom(), 12);
        assert!(viewport.north() > viewport.south());
    }

    #[test]
    fn test_fit_bounds_picks_largest_fitting_zoom() {
        let view = MapView::new(LatLng::new(54.71, 20.45), 8.0, Point::new(800.0, 600.0));
        let target = LatLngBounds::from_coords(54.70, 20.40, 54.72, 20.50);

        let (center, zoom) = view.fit_bounds(&target, 50.0);
        assert_eq!(center, target.center());

        let fitted = MapView::new(center, zoom, view.size);
        let visible = fitted.bounds();
        assert!(visible.contains(&target.south_west));
        assert!(visible.contains(&target.north_east));

        // 0.1 degrees of longitude is ~582 px wide at z13 and ~1165 px at z14
        assert_eq!(zoom, 13.0);
    }
}
