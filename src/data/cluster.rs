use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};

/// A server-computed aggregate of parcels shown at low zoom.
///
/// Clusters carry no identity across responses and are never selectable;
/// the only interaction is zooming to `bounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub center: LatLng,
    pub bounds: LatLngBounds,
    pub count: u64,
    /// `[min, max]` of public prices among members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<[u64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unassigned_count: Option<u64>,
}

impl Cluster {
    pub fn new(center: LatLng, bounds: LatLngBounds, count: u64) -> Self {
        Self {
            center,
            bounds,
            count,
            price_range: None,
            assigned_count: None,
            unassigned_count: None,
        }
    }

    /// Text drawn on the marker
    pub fn label(&self) -> String {
        self.count.to_string()
    }
}
