//! Wire-level data: parcels, clusters, the viewport response envelope and
//! the query that produces it.

pub mod cluster;
pub mod parcel;
pub mod query;
pub mod response;

pub use cluster::Cluster;
pub use parcel::{ListingId, ListingRef, Parcel, ParcelId, ParcelStatus};
pub use query::{FilterParams, ViewportQuery};
pub use response::{FetchResponse, RenderMode};
