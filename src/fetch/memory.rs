use crate::actions::{BulkActions, ListingDraft};
use crate::core::constants::{CLUSTER_ZOOM_THRESHOLD, MAX_VIEWPORT_ITEMS};
use crate::core::geo::{LatLng, LatLngBounds};
use crate::data::cluster::Cluster;
use crate::data::parcel::{ListingId, Parcel, ParcelId};
use crate::data::query::{FilterParams, ViewportQuery};
use crate::data::response::FetchResponse;
use crate::fetch::source::PlotSource;
use crate::prelude::HashSet;
use crate::{Error, Result};
use async_trait::async_trait;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// A parcel keyed by its bounding box in (lng, lat) space
#[derive(Debug, Clone)]
struct IndexedParcel {
    envelope: AABB<[f64; 2]>,
    parcel: Parcel,
}

impl IndexedParcel {
    fn new(parcel: Parcel) -> Option<Self> {
        let bounds = parcel.bounds()?;
        Some(Self {
            envelope: AABB::from_corners(
                [bounds.west(), bounds.south()],
                [bounds.east(), bounds.north()],
            ),
            parcel,
        })
    }
}

impl PartialEq for IndexedParcel {
    fn eq(&self, other: &Self) -> bool {
        self.parcel.id == other.parcel.id
    }
}

impl RTreeObject for IndexedParcel {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

struct Store {
    tree: RTree<IndexedParcel>,
    next_listing: u64,
}

/// [`PlotSource`] over an in-memory parcel list that answers like the
/// listings backend: parcels intersecting the viewport, grid clusters below
/// the cluster zoom threshold, at most `max_items` parcels above it.
///
/// It also implements [`BulkActions`] so bulk operations are visible on the
/// next fetch.
pub struct InMemoryPlotSource {
    store: RwLock<Store>,
    cluster_zoom_threshold: u8,
    max_items: usize,
}

impl InMemoryPlotSource {
    /// Parcels without geometry are not indexed, as the backend never returns
    /// them from a viewport query
    pub fn new(parcels: Vec<Parcel>) -> Self {
        let next_listing = parcels
            .iter()
            .filter_map(|p| p.listing_id.map(|l| l.0))
            .max()
            .unwrap_or(0)
            + 1;
        let indexed: Vec<IndexedParcel> = parcels.into_iter().filter_map(IndexedParcel::new).collect();

        Self {
            store: RwLock::new(Store {
                tree: RTree::bulk_load(indexed),
                next_listing,
            }),
            cluster_zoom_threshold: CLUSTER_ZOOM_THRESHOLD,
            max_items: MAX_VIEWPORT_ITEMS,
        }
    }

    pub fn with_cluster_zoom_threshold(mut self, zoom: u8) -> Self {
        self.cluster_zoom_threshold = zoom;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn len(&self) -> usize {
        self.store.read().map(|s| s.tree.size()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one parcel
    pub fn get(&self, id: ParcelId) -> Option<Parcel> {
        let store = self.store.read().ok()?;
        let found = store
            .tree
            .iter()
            .find(|p| p.parcel.id == id)
            .map(|p| p.parcel.clone());
        found
    }

    /// Answers a query synchronously
    pub fn query(&self, query: &ViewportQuery) -> Result<FetchResponse> {
        let store = self.read()?;
        let viewport = &query.viewport;
        let envelope = AABB::from_corners(
            [viewport.west(), viewport.south()],
            [viewport.east(), viewport.north()],
        );

        let mut matching: Vec<&Parcel> = store
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|p| &p.parcel)
            .filter(|p| matches_filters(p, &query.filters))
            .collect();
        matching.sort_by_key(|p| p.id);
        let total = matching.len() as u64;

        let mut response = if viewport.zoom() < self.cluster_zoom_threshold {
            FetchResponse::clusters(grid_clusters(&matching, viewport.zoom()))
        } else {
            FetchResponse::plots(
                matching
                    .into_iter()
                    .take(self.max_items)
                    .cloned()
                    .collect(),
            )
        };
        response.total = total;
        response.zoom = Some(viewport.zoom());
        Ok(response)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| Error::Source("parcel store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| Error::Source("parcel store lock poisoned".to_string()))
    }

    /// Applies `f` to every parcel in `ids`, returning how many were found
    fn update<F>(&self, ids: &[ParcelId], mut f: F) -> Result<u64>
    where
        F: FnMut(&mut Parcel),
    {
        let wanted: HashSet<ParcelId> = ids.iter().copied().collect();
        let mut store = self.write()?;

        let mut all: Vec<IndexedParcel> = store.tree.iter().cloned().collect();
        let mut updated = 0;
        for item in all.iter_mut().filter(|p| wanted.contains(&p.parcel.id)) {
            f(&mut item.parcel);
            updated += 1;
        }
        store.tree = RTree::bulk_load(all);
        Ok(updated)
    }
}

impl std::fmt::Debug for InMemoryPlotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPlotSource")
            .field("parcels", &self.len())
            .field("cluster_zoom_threshold", &self.cluster_zoom_threshold)
            .field("max_items", &self.max_items)
            .finish()
    }
}

#[async_trait]
impl PlotSource for InMemoryPlotSource {
    async fn fetch(&self, query: &ViewportQuery) -> Result<FetchResponse> {
        self.query(query)
    }
}

#[async_trait]
impl BulkActions for InMemoryPlotSource {
    async fn bulk_assign(&self, ids: &[ParcelId], listing: ListingId) -> Result<u64> {
        self.update(ids, |p| {
            p.listing_id = Some(listing);
            p.listing = None;
        })
    }

    async fn bulk_delete(&self, ids: &[ParcelId]) -> Result<u64> {
        let wanted: HashSet<ParcelId> = ids.iter().copied().collect();
        let mut store = self.write()?;

        let before = store.tree.size();
        let kept: Vec<IndexedParcel> = store
            .tree
            .iter()
            .filter(|p| !wanted.contains(&p.parcel.id))
            .cloned()
            .collect();
        store.tree = RTree::bulk_load(kept);
        Ok((before - store.tree.size()) as u64)
    }

    async fn create_listing(&self, draft: &ListingDraft, ids: &[ParcelId]) -> Result<ListingId> {
        let listing = {
            let mut store = self.write()?;
            let id = ListingId(store.next_listing);
            store.next_listing += 1;
            id
        };
        log::debug!("Created listing {listing} ({:?}) for {} parcels", draft.title, ids.len());
        self.bulk_assign(ids, listing).await?;
        Ok(listing)
    }
}

fn parse_filter<T: std::str::FromStr>(filters: &FilterParams, key: &str) -> Option<T> {
    filters.get(key).and_then(|raw| raw.trim().parse().ok())
}

fn matches_filters(parcel: &Parcel, filters: &FilterParams) -> bool {
    if let Some(min) = parse_filter::<u64>(filters, "price_min") {
        if parcel.price_public.map_or(true, |p| p < min) {
            return false;
        }
    }
    if let Some(max) = parse_filter::<u64>(filters, "price_max") {
        if parcel.price_public.map_or(true, |p| p > max) {
            return false;
        }
    }
    if let Some(min) = parse_filter::<f64>(filters, "area_min") {
        if parcel.area.map_or(true, |a| a < min) {
            return false;
        }
    }
    if let Some(max) = parse_filter::<f64>(filters, "area_max") {
        if parcel.area.map_or(true, |a| a > max) {
            return false;
        }
    }
    true
}

/// Cell edge in degrees for a zoom level: 0.5 at zoom 8, halving per level
fn grid_size(zoom: u8) -> f64 {
    0.5 / 2_f64.powi(zoom as i32 - 8)
}

#[derive(Default)]
struct Cell {
    bounds: Option<LatLngBounds>,
    count: u64,
    assigned: u64,
    prices: Option<[u64; 2]>,
}

/// Buckets parcel centres into a square grid. Cluster bounds and centre come
/// from the member centres, not the cell.
fn grid_clusters(parcels: &[&Parcel], zoom: u8) -> Vec<Cluster> {
    let size = grid_size(zoom);
    let mut cells: BTreeMap<(i64, i64), Cell> = BTreeMap::new();

    for parcel in parcels {
        let Some(center) = parcel.center() else {
            continue;
        };
        let key = (
            (center.lat / size).floor() as i64,
            (center.lng / size).floor() as i64,
        );
        let cell = cells.entry(key).or_default();

        match cell.bounds.as_mut() {
            Some(bounds) => bounds.extend(&center),
            None => cell.bounds = Some(LatLngBounds::new(center, center)),
        }
        cell.count += 1;
        if parcel.is_assigned() {
            cell.assigned += 1;
        }
        if let Some(price) = parcel.price_public {
            cell.prices = Some(match cell.prices {
                Some([lo, hi]) => [lo.min(price), hi.max(price)],
                None => [price, price],
            });
        }
    }

    cells
        .into_values()
        .filter_map(|cell| {
            let bounds = cell.bounds?;
            Some(Cluster {
                center: bounds.center(),
                bounds,
                count: cell.count,
                price_range: cell.prices,
                assigned_count: Some(cell.assigned),
                unassigned_count: Some(cell.count - cell.assigned),
            })
        })
        .collect()
}

/// Square parcel of `side` degrees with its south-west corner at `origin`
pub fn square_parcel(id: u64, origin: LatLng, side: f64) -> Parcel {
    Parcel::new(
        id,
        vec![
            origin,
            LatLng::new(origin.lat, origin.lng + side),
            LatLng::new(origin.lat + side, origin.lng + side),
            LatLng::new(origin.lat + side, origin.lng),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::viewport::Viewport;
    use crate::data::response::RenderMode;

    fn source() -> InMemoryPlotSource {
        InMemoryPlotSource::new(vec![
            square_parcel(1, LatLng::new(54.700, 20.400), 0.001).with_price(100),
            square_parcel(2, LatLng::new(54.702, 20.402), 0.001)
                .with_price(300)
                .with_listing(9),
            square_parcel(3, LatLng::new(54.950, 20.480), 0.001).with_area(1500.0),
            Parcel::new(4, vec![]),
        ])
    }

    fn query(zoom: u8, filters: FilterParams) -> ViewportQuery {
        ViewportQuery::new(Viewport::new(55.0, 54.6, 20.6, 20.3, zoom).unwrap(), filters)
    }

    #[test]
    fn test_geometry_less_parcels_are_not_indexed() {
        let source = source();
        assert_eq!(source.len(), 3);
        assert!(source.get(ParcelId(4)).is_none());
    }

    #[test]
    fn test_detail_mode_at_threshold() {
        let response = source().query(&query(13, FilterParams::new())).unwrap();
        assert_eq!(response.render_mode(), RenderMode::Plots);
        let ids: Vec<u64> = response.items.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(response.total, 3);
        assert_eq!(response.zoom, Some(13));
    }

    #[test]
    fn test_max_items_caps_list_not_total() {
        let response = source()
            .with_max_items(2)
            .query(&query(15, FilterParams::new()))
            .unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.total, 3);
    }

    #[test]
    fn test_grid_clusters_below_threshold() {
        let response = source().query(&query(10, FilterParams::new())).unwrap();
        assert_eq!(response.render_mode(), RenderMode::Clusters);
        assert!(response.items.is_empty());
        assert_eq!(response.clusters.len(), 2);

        let near = &response.clusters[0];
        assert_eq!(near.count, 2);
        assert_eq!(near.assigned_count, Some(1));
        assert_eq!(near.unassigned_count, Some(1));
        assert_eq!(near.price_range, Some([100, 300]));
        assert!(near.bounds.contains(&near.center));

        let far = &response.clusters[1];
        assert_eq!(far.count, 1);
        assert_eq!(far.price_range, None);
    }

    #[test]
    fn test_filters() {
        let response = source()
            .query(&query(14, FilterParams::new().with("price_min", 200)))
            .unwrap();
        let ids: Vec<u64> = response.items.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, [2]);

        let response = source()
            .query(&query(14, FilterParams::new().with("area_max", 2000)))
            .unwrap();
        let ids: Vec<u64> = response.items.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, [3]);
    }

    #[test]
    fn test_grid_size_halves_per_zoom() {
        assert_eq!(grid_size(8), 0.5);
        assert_eq!(grid_size(9), 0.25);
        assert_eq!(grid_size(7), 1.0);
    }

    #[tokio::test]
    async fn test_bulk_actions_are_visible_on_next_query() {
        let source = source();

        let updated = source.bulk_assign(&[ParcelId(1), ParcelId(99)], ListingId(5)).await.unwrap();
        assert_eq!(updated, 1);
        assert_eq!(source.get(ParcelId(1)).unwrap().listing_id, Some(ListingId(5)));

        let deleted = source.bulk_delete(&[ParcelId(2), ParcelId(3)]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(source.len(), 1);

        let listing = source
            .create_listing(&ListingDraft::new("Lot by the sea"), &[ParcelId(1)])
            .await
            .unwrap();
        assert_eq!(listing, ListingId(10));
        assert_eq!(source.get(ParcelId(1)).unwrap().listing_id, Some(listing));
    }
}
