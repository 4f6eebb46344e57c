use crate::data::{cluster::Cluster, parcel::Parcel};
use serde::{Deserialize, Serialize};

/// What a response asks the map to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Individual parcel polygons
    Plots,
    /// Aggregated cluster markers
    Clusters,
}

/// Body of a viewport query.
///
/// Accepts both the admin shape (`items`, `total`, `mode`) and the public
/// catalog shape (`plots`, `total_in_viewport`, `zoom`, no `mode`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default, alias = "plots")]
    pub items: Vec<Parcel>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RenderMode>,
    /// Parcels matching the viewport on the server, which may exceed
    /// `items.len()` when the server caps the list
    #[serde(default, alias = "total_in_viewport")]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,
}

impl FetchResponse {
    pub fn plots(items: Vec<Parcel>) -> Self {
        let total = items.len() as u64;
        Self {
            items,
            clusters: Vec::new(),
            mode: Some(RenderMode::Plots),
            total,
            zoom: None,
        }
    }

    pub fn clusters(clusters: Vec<Cluster>) -> Self {
        let total = clusters.iter().map(|c| c.count).sum();
        Self {
            items: Vec::new(),
            clusters,
            mode: Some(RenderMode::Clusters),
            total,
            zoom: None,
        }
    }

    /// The declared mode, or when absent: clusters if any were sent,
    /// otherwise plots
    pub fn render_mode(&self) -> RenderMode {
        match self.mode {
            Some(mode) => mode,
            None if !self.clusters.is_empty() => RenderMode::Clusters,
            None => RenderMode::Plots,
        }
    }
}
