//! Prelude module for common plotmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use plotmap::prelude::*;`

pub use crate::core::{
    builder::PlotMapBuilder,
    config::{
        FetchConfig, LassoConfig, LassoContainment, MapProfile, PlotMapConfig, RenderConfig,
        ResponsePolicy, SelectionConfig, UrlSyncConfig,
    },
    geo::{LatLng, LatLngBounds, Point},
    map::{BulkRequest, MapNotification, ParcelDetails, PlotMap, ViewportStats},
    tracker::ViewportTracker,
    viewport::{MapView, Viewport},
};

pub use crate::data::{
    cluster::Cluster,
    parcel::{ListingId, ListingRef, Parcel, ParcelId, ParcelStatus},
    query::{FilterParams, ViewportQuery},
    response::{FetchResponse, RenderMode},
};

pub use crate::input::events::{KeyModifiers, MapEvent, PointerEvent};

pub use crate::fetch::{
    coordinator::{FetchCoordinator, FetchOutcome, FetchTicket},
    debounce::Debounce,
    memory::InMemoryPlotSource,
    source::{HttpPlotSource, PlotSource},
};

pub use crate::render::{
    mode::{ModeResolver, ModeTransition},
    renderer::GeometryRenderer,
    style::{Color, ParcelPalette},
    surface::{Cursor, MapSurface, RecordingSurface, ShapeHandle},
};

pub use crate::selection::{
    lasso::{LassoEngine, LassoState},
    SelectionSet,
};

pub use crate::actions::{
    BulkAction, BulkActions, BulkOutcome, HttpBulkActions, ListingDraft, LogNotifier, Notifier,
};

pub use crate::url::ViewState;

#[cfg(feature = "tokio-runtime")]
pub use crate::session::{MapSession, SessionCommand};

pub use crate::{Error, Result};

pub use std::{sync::Arc, time::Duration};

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
