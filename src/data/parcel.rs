use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of a land parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(pub u64);

/// Backend identifier of a listing (a sale offer grouping parcels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    #[default]
    Active,
    Sold,
    Reserved,
}

impl ParcelStatus {
    /// Human-readable status for the detail panel
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Sold => "Sold",
            Self::Reserved => "Reserved",
        }
    }
}

/// Listing summary embedded by the admin endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRef {
    pub id: ListingId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub is_published: bool,
}

/// One land parcel as delivered by a viewport query. Parcels are snapshots:
/// every applied response replaces the previous list wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,
    #[serde(default)]
    pub cadastral_number: Option<String>,
    /// Square meters
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: ParcelStatus,
    /// `None` means the parcel is not bound to any listing
    #[serde(default)]
    pub listing_id: Option<ListingId>,
    #[serde(default)]
    pub listing: Option<ListingRef>,
    /// Outer ring as `[lat, lon]` pairs; empty when the parcel has no geometry
    #[serde(default)]
    pub polygon_coords: Vec<LatLng>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub price_public: Option<u64>,
}

impl Parcel {
    /// Minimal parcel, mostly useful for tests and in-memory sources
    pub fn new(id: u64, polygon_coords: Vec<LatLng>) -> Self {
        Self {
            id: ParcelId(id),
            cadastral_number: None,
            area: None,
            address: None,
            status: ParcelStatus::Active,
            listing_id: None,
            listing: None,
            polygon_coords,
            comment: None,
            price_public: None,
        }
    }

    pub fn with_cadastral_number(mut self, number: impl Into<String>) -> Self {
        self.cadastral_number = Some(number.into());
        self
    }

    pub fn with_listing(mut self, listing_id: u64) -> Self {
        self.listing_id = Some(ListingId(listing_id));
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_price(mut self, price: u64) -> Self {
        self.price_public = Some(price);
        self
    }

    pub fn has_geometry(&self) -> bool {
        !self.polygon_coords.is_empty()
    }

    pub fn is_assigned(&self) -> bool {
        self.listing_id.is_some()
    }

    /// Bounding box of the ring, `None` without geometry
    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(&self.polygon_coords)
    }

    /// Centre of the bounding box. Lasso containment and labels use this
    /// point, not the area centroid.
    pub fn center(&self) -> Option<LatLng> {
        self.bounds().map(|b| b.center())
    }

    /// The ring as a `geo` polygon in (lng, lat) order
    pub fn polygon(&self) -> Option<geo::Polygon<f64>> {
        if self.polygon_coords.len() < 3 {
            return None;
        }
        let ring: Vec<geo::Coord<f64>> = self.polygon_coords.iter().map(|&c| c.into()).collect();
        Some(geo::Polygon::new(geo::LineString::from(ring), vec![]))
    }

    /// Area in sotki (hundreds of square meters)
    pub fn area_sotki(&self) -> Option<f64> {
        self.area.map(|a| a / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(54.70, 20.40),
            LatLng::new(54.70, 20.42),
            LatLng::new(54.72, 20.42),
            LatLng::new(54.72, 20.40),
        ]
    }

    #[test]
    fn test_decode_admin_item() {
        let json = r#"{
            "id": 17,
            "cadastral_number": "39:05:010203:45",
            "area": 1200.0,
            "address": null,
            "price_public": 1500000,
            "comment": null,
            "status": "reserved",
            "listing_id": 3,
            "listing": {"id": 3, "slug": "lot-3", "title": "Lot 3", "is_published": true},
            "polygon_coords": [[54.70, 20.40], [54.70, 20.42], [54.72, 20.42]]
        }"#;

        let parcel: Parcel = serde_json::from_str(json).unwrap();
        assert_eq!(parcel.id, ParcelId(17));
        assert_eq!(parcel.status, ParcelStatus::Reserved);
        assert_eq!(parcel.listing_id, Some(ListingId(3)));
        assert_eq!(parcel.listing.as_ref().map(|l| l.slug.as_str()), Some("lot-3"));
        assert_eq!(parcel.polygon_coords.len(), 3);
        assert_eq!(parcel.area_sotki(), Some(12.0));
    }

    #[test]
    fn test_decode_public_item_without_status() {
        let json = r#"{"id": 5, "polygon_coords": [], "listing_id": null}"#;
        let parcel: Parcel = serde_json::from_str(json).unwrap();
        assert_eq!(parcel.status, ParcelStatus::Active);
        assert!(!parcel.has_geometry());
        assert!(!parcel.is_assigned());
        assert!(parcel.bounds().is_none());
        assert!(parcel.polygon().is_none());
    }

    #[test]
    fn test_center_is_bounds_center() {
        let parcel = Parcel::new(1, square());
        assert_eq!(parcel.center(), Some(LatLng::new(54.71, 20.41)));
        assert!(parcel.polygon().is_some());
    }
}
