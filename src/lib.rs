//! # plotmap
//!
//! A headless, viewport-driven core for land-parcel maps.
//!
//! The crate owns everything between the mapping engine and the listings
//! backend: it turns settled pans and zooms into debounced viewport queries,
//! decides between clustered and per-parcel rendering from each response,
//! draws parcels and clusters through a [`MapSurface`](render::surface::MapSurface)
//! backend, and maintains the multi-select (click, modifier-click and freehand
//! lasso) used for bulk operations on parcels.
//!
//! The controller is [`PlotMap`]; it is synchronous and takes explicit time,
//! so hosts may drive it from any event loop. With the `tokio-runtime`
//! feature [`session::MapSession`] executes the fetches and bulk actions it
//! requests.

pub mod actions;
pub mod core;
pub mod data;
pub mod fetch;
pub mod input;
pub mod prelude;
pub mod render;
pub mod selection;
#[cfg(feature = "tokio-runtime")]
pub mod session;
pub mod url;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    builder::PlotMapBuilder,
    config::{MapProfile, PlotMapConfig},
    geo::{LatLng, LatLngBounds, Point},
    map::{MapNotification, PlotMap},
    viewport::{MapView, Viewport},
};

pub use data::{
    cluster::Cluster,
    parcel::{ListingId, Parcel, ParcelId, ParcelStatus},
    response::{FetchResponse, RenderMode},
};

pub use fetch::source::{HttpPlotSource, PlotSource};

pub use selection::{lasso::LassoState, SelectionSet};

pub use actions::{BulkAction, BulkActions, BulkOutcome, Notifier};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No parcels selected")]
    EmptySelection,

    #[error("Source error: {0}")]
    Source(String),
}

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
