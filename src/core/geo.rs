use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Web Mercator projection constants
const EARTH_RADIUS: f64 = 6378137.0;
const MAX_LATITUDE: f64 = 85.0511287798;

/// A geographical coordinate.
///
/// On the wire a coordinate is a `[lat, lon]` pair, which is how parcel rings,
/// cluster centres and cluster bounds are encoded by the listings backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Calculates the distance to another LatLng using the Haversine formula
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }

    /// Clamps latitude to the range Web Mercator can project
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Converts to Web Mercator projection (EPSG:3857), in meters
    pub fn to_mercator(&self) -> Point {
        let lat = Self::clamp_lat(self.lat);
        let x = self.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;
        Point::new(x, y)
    }

    /// Creates LatLng from Web Mercator coordinates
    pub fn from_mercator(point: Point) -> Self {
        let lng = (point.x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(lat_lng: LatLng) -> Self {
        [lat_lng.lat, lat_lng.lng]
    }
}

// geo works in (x, y) = (lng, lat)
impl From<LatLng> for geo_types::Coord<f64> {
    fn from(lat_lng: LatLng) -> Self {
        geo_types::Coord {
            x: lat_lng.lng,
            y: lat_lng.lat,
        }
    }
}

impl From<LatLng> for geo_types::Point<f64> {
    fn from(lat_lng: LatLng) -> Self {
        geo_types::Point::new(lat_lng.lng, lat_lng.lat)
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A bounding box of geographical coordinates.
///
/// Serialized as `[[south, west], [north, east]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[LatLng; 2]", into = "[LatLng; 2]")]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Smallest bounds containing every point, `None` for an empty slice
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    /// Checks if the bounds contain a point (edges included)
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Checks if the bounds intersect with another bounds
    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        !(other.north_east.lat < self.south_west.lat
            || other.south_west.lat > self.north_east.lat
            || other.north_east.lng < self.south_west.lng
            || other.south_west.lng > self.north_east.lng)
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Gets the span of the bounds
    pub fn span(&self) -> LatLng {
        LatLng::new(
            self.north_east.lat - self.south_west.lat,
            self.north_east.lng - self.south_west.lng,
        )
    }

    /// Returns the union of this bounds with another bounds
    pub fn union(&self, other: &LatLngBounds) -> LatLngBounds {
        let south = self.south_west.lat.min(other.south_west.lat);
        let west = self.south_west.lng.min(other.south_west.lng);
        let north = self.north_east.lat.max(other.north_east.lat);
        let east = self.north_east.lng.max(other.north_east.lng);

        LatLngBounds::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// True when both corners are valid and the box has a positive extent on
    /// both axes
    pub fn is_valid(&self) -> bool {
        self.south_west.is_valid()
            && self.north_east.is_valid()
            && self.north_east.lat > self.south_west.lat
            && self.north_east.lng > self.south_west.lng
    }
}

impl From<[LatLng; 2]> for LatLngBounds {
    fn from(corners: [LatLng; 2]) -> Self {
        Self::new(corners[0], corners[1])
    }
}

impl From<LatLngBounds> for [LatLng; 2] {
    fn from(bounds: LatLngBounds) -> Self {
        [bounds.south_west, bounds.north_east]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(54.7104, 20.4522);
        assert_eq!(coord.lat, 54.7104);
        assert_eq!(coord.lng, 20.4522);
        assert!(coord.is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_lat_lng_distance() {
        let kaliningrad = LatLng::new(54.7104, 20.4522);
        let zelenogradsk = LatLng::new(54.9600, 20.4750);
        let distance = kaliningrad.distance_to(&zelenogradsk);

        // Roughly 27.8 km due north
        assert!((distance - 27_800.0).abs() < 500.0);
    }

    #[test]
    fn test_lat_lng_wire_format_is_pair() {
        let coord: LatLng = serde_json::from_str("[54.71, 20.45]").unwrap();
        assert_eq!(coord, LatLng::new(54.71, 20.45));
        assert_eq!(serde_json::to_string(&coord).unwrap(), "[54.71,20.45]");
    }

    #[test]
    fn test_bounds_wire_format() {
        let bounds: LatLngBounds =
            serde_json::from_str("[[54.70, 20.40], [54.72, 20.50]]").unwrap();
        assert_eq!(bounds.south(), 54.70);
        assert_eq!(bounds.west(), 20.40);
        assert_eq!(bounds.north(), 54.72);
        assert_eq!(bounds.east(), 20.50);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = LatLngBounds::from_coords(54.0, 20.0, 55.0, 21.0);
        assert!(bounds.contains(&LatLng::new(54.5, 20.5)));
        assert!(bounds.contains(&LatLng::new(54.0, 20.0)));
        assert!(!bounds.contains(&LatLng::new(55.5, 20.5)));
    }

    #[test]
    fn test_bounds_from_points() {
        assert!(LatLngBounds::from_points(&[]).is_none());

        let bounds = LatLngBounds::from_points(&[
            LatLng::new(54.70, 20.45),
            LatLng::new(54.72, 20.40),
            LatLng::new(54.71, 20.50),
        ])
        .unwrap();
        assert_eq!(bounds, LatLngBounds::from_coords(54.70, 20.40, 54.72, 20.50));
        assert_eq!(bounds.center(), LatLng::new(54.71, 20.45));
    }

    #[test]
    fn test_bounds_validity() {
        assert!(LatLngBounds::from_coords(54.0, 20.0, 55.0, 21.0).is_valid());
        assert!(!LatLngBounds::from_coords(55.0, 20.0, 54.0, 21.0).is_valid());
        assert!(!LatLngBounds::from_coords(54.0, 21.0, 55.0, 20.0).is_valid());
    }

    #[test]
    fn test_mercator_round_trip() {
        let coord = LatLng::new(54.7104, 20.4522);
        let back = LatLng::from_mercator(coord.to_mercator());
        assert!((back.lat - coord.lat).abs() < 1e-9);
        assert!((back.lng - coord.lng).abs() < 1e-9);
    }
}
