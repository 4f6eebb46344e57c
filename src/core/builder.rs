//! Map builder for fluent configuration
//!
//! [`PlotMapBuilder`] assembles a [`PlotMap`] from a profile, an initial
//! camera (possibly restored from a shared URL), filters and collaborators.

use crate::{
    actions::Notifier,
    core::{
        config::{MapProfile, PlotMapConfig, ResponsePolicy},
        constants::{DEFAULT_CENTER, DEFAULT_ZOOM},
        geo::{LatLng, Point},
        map::PlotMap,
        viewport::MapView,
    },
    data::query::FilterParams,
    render::surface::MapSurface,
    url::ViewState,
    Error, Result,
};
use instant::Instant;
use std::sync::Arc;

/// Builder for creating and configuring [`PlotMap`] instances
pub struct PlotMapBuilder {
    profile: MapProfile,
    center: LatLng,
    zoom: f64,
    size: Option<Point>,
    base_url: Option<String>,
    auth_token: Option<String>,
    policy: Option<ResponsePolicy>,
    filters: FilterParams,
    notifier: Option<Arc<dyn Notifier>>,
    lasso: bool,
}

impl PlotMapBuilder {
    pub fn new() -> Self {
        Self {
            profile: MapProfile::default(),
            center: LatLng::from(DEFAULT_CENTER),
            zoom: DEFAULT_ZOOM,
            size: None,
            base_url: None,
            auth_token: None,
            policy: None,
            filters: FilterParams::default(),
            notifier: None,
            lasso: false,
        }
    }

    /// Set the configuration preset
    pub fn with_profile(mut self, profile: MapProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Use a complete configuration
    pub fn with_config(mut self, config: PlotMapConfig) -> Self {
        self.profile = MapProfile::Custom(config);
        self
    }

    /// Set the initial camera and the container size in pixels
    pub fn with_center_and_zoom(mut self, center: LatLng, zoom: f64, size: Point) -> Self {
        self.center = center;
        self.zoom = zoom;
        self.size = Some(size);
        self
    }

    pub fn with_size(mut self, size: Point) -> Self {
        self.size = Some(size);
        self
    }

    /// Override the initial camera with whatever `state` carries
    pub fn with_view_state(mut self, state: ViewState) -> Self {
        if let Some(center) = state.center {
            self.center = center;
        }
        if let Some(zoom) = state.zoom {
            self.zoom = zoom as f64;
        }
        self
    }

    /// Restore the initial camera from a shared link. An unparsable URL is
    /// logged and ignored.
    pub fn with_url(self, url: &str) -> Self {
        match ViewState::parse(url) {
            Ok(state) => self.with_view_state(state),
            Err(e) => {
                log::warn!("Not restoring view from URL: {e}");
                self
            }
        }
    }

    /// Backend origin, overriding the profile's
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_response_policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Filters sent with every viewport query
    pub fn with_filters(mut self, filters: FilterParams) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Request lasso mode from the start; it engages once parcels are shown
    pub fn with_lasso(mut self, enabled: bool) -> Self {
        self.lasso = enabled;
        self
    }

    /// The configuration `build` would use
    pub fn resolve_config(&self) -> PlotMapConfig {
        let mut config = self.profile.resolve();
        if let Some(base_url) = &self.base_url {
            config.fetch.base_url = base_url.clone();
        }
        if let Some(token) = &self.auth_token {
            config.fetch.auth_token = Some(token.clone());
        }
        if let Some(policy) = self.policy {
            config.fetch.policy = policy;
        }
        config
    }

    /// Build the map around `surface`. The map is not mounted yet.
    pub fn build<S: MapSurface>(self, surface: S) -> Result<PlotMap<S>> {
        let size = self
            .size
            .ok_or_else(|| Error::InvalidViewport("No container size specified".to_string()))?;
        if !self.center.is_valid() {
            return Err(Error::InvalidCoordinates(format!(
                "Initial centre {:?} is out of range",
                self.center
            )));
        }

        let config = self.resolve_config();
        let view = MapView::new(self.center, self.zoom, size);
        let mut map = PlotMap::new(config, surface, view)?;

        if let Some(notifier) = self.notifier {
            map.set_notifier(notifier);
        }
        // No viewport exists before mount, so this only stores the filters
        map.set_filters(self.filters, Instant::now());
        map.set_lasso_mode(self.lasso);

        Ok(map)
    }
}

impl Default for PlotMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience constructors for the two shipped maps
impl PlotMapBuilder {
    /// Back-office map with selection and bulk actions
    pub fn admin_map(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::new()
            .with_profile(MapProfile::Admin)
            .with_center_and_zoom(center, zoom, size)
    }

    /// Public catalog map: read-only, public endpoint
    pub fn catalog_map(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::new()
            .with_profile(MapProfile::Catalog)
            .with_center_and_zoom(center, zoom, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ADMIN_ENDPOINT, CATALOG_ENDPOINT};
    use crate::render::surface::RecordingSurface;

    fn size() -> Point {
        Point::new(800.0, 600.0)
    }

    #[test]
    fn test_builder_defaults_to_kaliningrad() {
        let map = PlotMapBuilder::new()
            .with_size(size())
            .build(RecordingSurface::new())
            .unwrap();
        assert_eq!(map.view().center, LatLng::new(54.7104, 20.4522));
        assert_eq!(map.view().zoom, 10.0);
        assert_eq!(map.config().fetch.endpoint, ADMIN_ENDPOINT);
    }

    #[test]
    fn test_missing_size_is_an_error() {
        let result = PlotMapBuilder::new().build(RecordingSurface::new());
        assert!(matches!(result, Err(Error::InvalidViewport(_))));
    }

    #[test]
    fn test_catalog_preset() {
        let builder = PlotMapBuilder::catalog_map(LatLng::new(54.95, 20.48), 12.0, size())
            .with_base_url("https://land.example.org");
        let config = builder.resolve_config();
        assert_eq!(config.fetch.endpoint, CATALOG_ENDPOINT);
        assert_eq!(config.fetch.base_url, "https://land.example.org");
        assert!(!config.selection.enabled);
    }

    #[test]
    fn test_url_restores_view() {
        let map = PlotMapBuilder::admin_map(LatLng::new(54.71, 20.45), 10.0, size())
            .with_url("https://admin.example.org/plots/map?lat=54.95&lon=20.22&zoom=15")
            .build(RecordingSurface::new())
            .unwrap();
        assert_eq!(map.view().center, LatLng::new(54.95, 20.22));
        assert_eq!(map.view().zoom, 15.0);

        // Garbage keeps the programmatic view
        let map = PlotMapBuilder::admin_map(LatLng::new(54.71, 20.45), 10.0, size())
            .with_url("https://admin.example.org/plots/map?lat=x&lon=y")
            .build(RecordingSurface::new())
            .unwrap();
        assert_eq!(map.view().center, LatLng::new(54.71, 20.45));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PlotMapConfig::default();
        config.fetch.endpoint = "no-leading-slash".to_string();
        let result = PlotMapBuilder::new()
            .with_config(config)
            .with_size(size())
            .build(RecordingSurface::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
