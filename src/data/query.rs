use crate::core::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query keys owned by the viewport itself
const VIEWPORT_KEYS: [&str; 5] = ["north", "south", "east", "west", "zoom"];

/// Opaque key/value filters forwarded with every viewport query
/// (`district_id`, `settlements`, `price_min`, ...). The core never interprets
/// them; ordering is stable so identical filters produce identical URLs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams(BTreeMap<String, String>);

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a filter. Keys that collide with viewport parameters
    /// are ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        if VIEWPORT_KEYS.contains(&key.as_str()) {
            log::warn!("Ignoring filter {key:?}: reserved for the viewport");
        } else {
            self.0.insert(key, value.to_string());
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Everything one fetch sends: the viewport plus the filters active when it
/// was issued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportQuery {
    pub viewport: Viewport,
    pub filters: FilterParams,
}

impl ViewportQuery {
    pub fn new(viewport: Viewport, filters: FilterParams) -> Self {
        Self { viewport, filters }
    }

    /// `north, south, east, west, zoom` followed by the filters
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let v = &self.viewport;
        let mut pairs = vec![
            ("north".to_string(), v.north().to_string()),
            ("south".to_string(), v.south().to_string()),
            ("east".to_string(), v.east().to_string()),
            ("west".to_string(), v.west().to_string()),
            ("zoom".to_string(), v.zoom().to_string()),
        ];
        pairs.extend(
            self.filters
                .iter()
                .map(|(k, val)| (k.to_string(), val.to_string())),
        );
        pairs
    }
}
