//! Shareable view state carried in the page URL as `lat`, `lon` and `zoom`
//! query parameters.

use crate::core::geo::LatLng;
use crate::core::viewport::{snap_zoom, Viewport};
use crate::{Error, Result};
use reqwest::Url;

const LAT_KEY: &str = "lat";
const LON_KEY: &str = "lon";
const ZOOM_KEY: &str = "zoom";

/// Map centre and zoom as read from or written to a URL. Either half may be
/// missing when parsed from a URL that lacks it or carries garbage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewState {
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
}

impl ViewState {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            center: Some(center),
            zoom: Some(zoom),
        }
    }

    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self::new(viewport.center(), viewport.zoom())
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.zoom.is_none()
    }

    /// Reads the view from `url`'s query. Invalid or out-of-range values are
    /// ignored rather than reported.
    pub fn from_url(url: &Url) -> Self {
        let mut lat = None;
        let mut lon = None;
        let mut zoom = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                LAT_KEY => lat = value.parse::<f64>().ok(),
                LON_KEY => lon = value.parse::<f64>().ok(),
                ZOOM_KEY => {
                    zoom = value
                        .parse::<f64>()
                        .ok()
                        .filter(|z| z.is_finite() && *z >= 0.0)
                        .map(snap_zoom)
                }
                _ => {}
            }
        }

        let center = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(LatLng::new(lat, lon)).filter(LatLng::is_valid),
            _ => None,
        };
        if center.is_none() && (lat.is_some() || lon.is_some()) {
            log::debug!("Ignoring invalid centre in {url}");
        }

        Self { center, zoom }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidConfig(format!("{url}: {e}")))?;
        Ok(Self::from_url(&url))
    }

    /// Writes the view into `url`, replacing previous `lat`/`lon`/`zoom`
    /// values and keeping every other query parameter in order
    pub fn apply_to(&self, url: &mut Url, precision: usize) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !matches!(k.as_ref(), LAT_KEY | LON_KEY | ZOOM_KEY))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        if let Some(center) = self.center {
            pairs.append_pair(LAT_KEY, &format!("{:.*}", precision, center.lat));
            pairs.append_pair(LON_KEY, &format!("{:.*}", precision, center.lng));
        }
        if let Some(zoom) = self.zoom {
            pairs.append_pair(ZOOM_KEY, &zoom.to_string());
        }
        drop(pairs);

        if url.query() == Some("") {
            url.set_query(None);
        }
    }

    /// `url` with this view merged into its query
    pub fn merge_into(&self, url: &str, precision: usize) -> Result<String> {
        let mut parsed = Url::parse(url).map_err(|e| Error::InvalidConfig(format!("{url}: {e}")))?;
        self.apply_to(&mut parsed, precision);
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_other_params() {
        let view = ViewState::new(LatLng::new(54.7104, 20.4522), 13);
        let merged = view
            .merge_into("https://example.org/map?district_id=3&lat=1&zoom=2", 6)
            .unwrap();
        assert_eq!(
            merged,
            "https://example.org/map?district_id=3&lat=54.710400&lon=20.452200&zoom=13"
        );
    }

    #[test]
    fn test_parse_back() {
        let view = ViewState::parse("https://example.org/map?lat=54.71&lon=20.45&zoom=12").unwrap();
        assert_eq!(view.center, Some(LatLng::new(54.71, 20.45)));
        assert_eq!(view.zoom, Some(12));
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let view = ViewState::parse("https://example.org/map?lat=abc&lon=20.45&zoom=14").unwrap();
        assert_eq!(view.center, None);
        assert_eq!(view.zoom, Some(14));

        let view = ViewState::parse("https://example.org/map?lat=95&lon=20&zoom=-3").unwrap();
        assert!(view.is_empty());

        let view = ViewState::parse("https://example.org/map").unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_empty_state_leaves_no_query() {
        let merged = ViewState::default()
            .merge_into("https://example.org/map?zoom=3", 6)
            .unwrap();
        assert_eq!(merged, "https://example.org/map");
    }
}
