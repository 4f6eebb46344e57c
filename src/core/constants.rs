//! Engine-wide defaults for the parcel map.
//! Every value here can be overridden through `PlotMapConfig`; these are what
//! the admin map ships with.

/// Square tile size in pixels, the base of the Web Mercator pixel space.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level a viewport may carry.
pub const MAX_ZOOM: u8 = 22;

/// Quiet period after the last viewport event before data is fetched.
pub const FETCH_DEBOUNCE_MS: u64 = 300;

/// Quiet period before the settled viewport is reflected into the URL.
pub const URL_SYNC_DEBOUNCE_MS: u64 = 500;

/// Cadastral labels are drawn from this zoom level up.
pub const LABEL_MIN_ZOOM: u8 = 16;

/// Cluster marker radius range in pixels.
pub const CLUSTER_MIN_RADIUS_PX: f64 = 14.0;
pub const CLUSTER_MAX_RADIUS_PX: f64 = 48.0;

/// Parcel count at which a cluster marker reaches its maximum radius.
pub const CLUSTER_SATURATION_COUNT: u64 = 1000;

/// Below this zoom the listings backend answers with clusters.
pub const CLUSTER_ZOOM_THRESHOLD: u8 = 13;

/// Upper bound on parcels returned for one viewport in detail mode.
pub const MAX_VIEWPORT_ITEMS: usize = 1000;

/// Padding in pixels used when fitting the map to a set of parcels.
pub const FIT_PADDING_PX: f64 = 50.0;

/// Lasso paths with fewer points are discarded.
pub const LASSO_MIN_POINTS: usize = 3;

/// Decimal places kept for lat/lon in shareable URLs.
pub const URL_COORD_PRECISION: usize = 6;

/// Initial map centre (Kaliningrad) and zoom when neither the host nor the
/// URL provides one.
pub const DEFAULT_CENTER: [f64; 2] = [54.7104, 20.4522];
pub const DEFAULT_ZOOM: f64 = 10.0;
