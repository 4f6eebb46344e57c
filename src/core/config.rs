//! Configuration for the parcel map controller
//!
//! Settings are grouped by the component that consumes them. Every group
//! deserializes with defaults for missing fields, so a JSON config only needs
//! to name what differs from the chosen [`MapProfile`].

use crate::core::constants::{
    FETCH_DEBOUNCE_MS, FIT_PADDING_PX, LABEL_MIN_ZOOM, LASSO_MIN_POINTS, MAX_ZOOM,
    URL_COORD_PRECISION, URL_SYNC_DEBOUNCE_MS,
};
use crate::render::style::{ParcelPalette, RadiusScale};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ADMIN_ENDPOINT: &str = "/api/admin/plots/map";
pub const CATALOG_ENDPOINT: &str = "/api/plots/viewport";

/// Which map the controller drives
#[derive(Debug, Clone, PartialEq)]
pub enum MapProfile {
    /// Back-office map: admin endpoint, parcels selectable
    Admin,
    /// Public catalog: public endpoint, read-only
    Catalog,
    Custom(PlotMapConfig),
}

impl MapProfile {
    pub fn resolve(&self) -> PlotMapConfig {
        match self {
            Self::Admin => PlotMapConfig::default(),
            Self::Catalog => PlotMapConfig {
                fetch: FetchConfig {
                    endpoint: CATALOG_ENDPOINT.to_string(),
                    ..FetchConfig::default()
                },
                selection: SelectionConfig {
                    enabled: false,
                    ..SelectionConfig::default()
                },
                ..PlotMapConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for MapProfile {
    fn default() -> Self {
        Self::Admin
    }
}

/// How responses that complete out of order are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePolicy {
    /// Every response is applied as it arrives; the last one to arrive wins
    LastApplied,
    /// Responses older than the newest applied one are discarded
    DropSuperseded,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self::LastApplied
    }
}

/// How the lasso decides that a parcel lies inside the drawn path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LassoContainment {
    /// Parcel centre inside the closed lasso polygon
    Polygon,
    /// Parcel centre inside the lasso's bounding box
    BoundingBox,
}

impl Default for LassoContainment {
    fn default() -> Self {
        Self::Polygon
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Scheme and host of the listings backend, e.g. `https://example.org`
    pub base_url: String,
    /// Path of the viewport endpoint
    pub endpoint: String,
    pub debounce_ms: u64,
    pub policy: ResponsePolicy,
    /// Per-request timeout; `None` waits for the transport
    pub request_timeout_ms: Option<u64>,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoint: ADMIN_ENDPOINT.to_string(),
            debounce_ms: FETCH_DEBOUNCE_MS,
            policy: ResponsePolicy::default(),
            request_timeout_ms: None,
            auth_token: None,
        }
    }
}

impl FetchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlSyncConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
    /// Decimal places for lat/lon
    pub precision: usize,
}

impl Default for UrlSyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: URL_SYNC_DEBOUNCE_MS,
            precision: URL_COORD_PRECISION,
        }
    }
}

impl UrlSyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Cadastral labels are drawn at or above this zoom
    pub label_min_zoom: u8,
    pub cluster_radius: RadiusScale,
    pub fit_padding_px: f64,
    pub palette: ParcelPalette,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            label_min_zoom: LABEL_MIN_ZOOM,
            cluster_radius: RadiusScale::default(),
            fit_padding_px: FIT_PADDING_PX,
            palette: ParcelPalette::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LassoConfig {
    pub min_points: usize,
    pub containment: LassoContainment,
}

impl Default for LassoConfig {
    fn default() -> Self {
        Self {
            min_points: LASSO_MIN_POINTS,
            containment: LassoContainment::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Clicks and lasso change the selection only when enabled
    pub enabled: bool,
    /// Drop selected ids that are absent from a newly applied response
    pub prune_on_refresh: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prune_on_refresh: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotMapConfig {
    pub fetch: FetchConfig,
    pub url_sync: UrlSyncConfig,
    pub render: RenderConfig,
    pub lasso: LassoConfig,
    pub selection: SelectionConfig,
}

impl PlotMapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if !self.fetch.endpoint.starts_with('/') {
            return invalid("fetch.endpoint must be an absolute path");
        }
        if reqwest::Url::parse(&self.fetch.base_url).is_err() {
            return invalid("fetch.base_url is not a valid URL");
        }
        if self.fetch.request_timeout_ms == Some(0) {
            return invalid("fetch.request_timeout_ms must be positive");
        }

        let radius = &self.render.cluster_radius;
        if !(radius.min_px > 0.0 && radius.max_px >= radius.min_px) {
            return invalid("render.cluster_radius needs 0 < min_px <= max_px");
        }
        if radius.saturation_count < 2 {
            return invalid("render.cluster_radius.saturation_count must be at least 2");
        }
        if self.render.label_min_zoom > MAX_ZOOM {
            return invalid("render.label_min_zoom is above the maximum zoom");
        }
        if self.render.fit_padding_px.is_nan() || self.render.fit_padding_px < 0.0 {
            return invalid("render.fit_padding_px must not be negative");
        }

        if self.lasso.min_points < LASSO_MIN_POINTS {
            return invalid("lasso.min_points must be at least 3");
        }
        if self.url_sync.precision > 15 {
            return invalid("url_sync.precision must be at most 15");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_resolve() {
        let admin = MapProfile::Admin.resolve();
        assert_eq!(admin.fetch.endpoint, ADMIN_ENDPOINT);
        assert!(admin.selection.enabled);
        assert_eq!(admin.fetch.debounce_ms, 300);
        assert_eq!(admin.url_sync.debounce_ms, 500);

        let catalog = MapProfile::Catalog.resolve();
        assert_eq!(catalog.fetch.endpoint, CATALOG_ENDPOINT);
        assert!(!catalog.selection.enabled);

        let mut custom = PlotMapConfig::default();
        custom.fetch.debounce_ms = 50;
        assert_eq!(MapProfile::Custom(custom.clone()).resolve(), custom);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlotMapConfig::from_json_str(
            r#"{
                "fetch": { "policy": "drop_superseded", "request_timeout_ms": 5000 },
                "lasso": { "containment": "bounding_box" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.fetch.policy, ResponsePolicy::DropSuperseded);
        assert_eq!(config.fetch.request_timeout(), Some(Duration::from_millis(5000)));
        assert_eq!(config.fetch.debounce(), Duration::from_millis(300));
        assert_eq!(config.lasso.containment, LassoContainment::BoundingBox);
        assert_eq!(config.lasso.min_points, 3);
        assert!(config.selection.prune_on_refresh);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PlotMapConfig::default();
        config.lasso.min_points = 2;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = PlotMapConfig::default();
        config.render.cluster_radius.min_px = 60.0;
        assert!(config.validate().is_err());

        let mut config = PlotMapConfig::default();
        config.fetch.endpoint = "api/plots".to_string();
        assert!(config.validate().is_err());

        assert!(PlotMapConfig::from_json_str(r#"{"fetch": {"base_url": "not a url"}}"#).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            PlotMapConfig::from_file("/nonexistent/plotmap.json"),
            Err(Error::Io(_))
        ));
    }
}
