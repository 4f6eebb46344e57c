use crate::core::config::RenderConfig;
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::MapView;
use crate::data::cluster::Cluster;
use crate::data::parcel::{Parcel, ParcelId};
use crate::prelude::HashMap;
use crate::render::surface::{MapSurface, ShapeHandle};
use crate::selection::SelectionSet;
use geo::Intersects;

struct RenderedParcel {
    polygon: ShapeHandle,
    label: Option<ShapeHandle>,
    /// `None` for rings too short to enclose anything
    geometry: Option<geo::Polygon<f64>>,
    bounds: LatLngBounds,
}

struct RenderedCluster {
    circle: ShapeHandle,
    label: ShapeHandle,
    center: LatLng,
    radius_px: f64,
    bounds: LatLngBounds,
}

/// Draws parcels and clusters onto a [`MapSurface`] and remembers what it
/// drew so clicks can be hit-tested.
///
/// Every pass removes all shapes of the kind it draws before drawing; there
/// is no diffing. Shape handles never leave the renderer.
pub struct GeometryRenderer {
    config: RenderConfig,
    parcels: HashMap<ParcelId, RenderedParcel>,
    draw_order: Vec<ParcelId>,
    clusters: Vec<RenderedCluster>,
}

impl GeometryRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            parcels: HashMap::default(),
            draw_order: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the detail layer with `parcels`. Parcels without geometry are
    /// skipped.
    pub fn render_parcels<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        parcels: &[Parcel],
        selection: &SelectionSet,
        zoom: u8,
    ) {
        self.clear_parcels(surface);

        let palette = &self.config.palette;
        let show_labels = zoom >= self.config.label_min_zoom;
        let label_style = palette.cadastral_label();
        let mut skipped = 0;

        for parcel in parcels {
            let Some(bounds) = parcel.bounds() else {
                skipped += 1;
                continue;
            };

            // A repeated id replaces the earlier drawing
            if let Some(previous) = self.parcels.remove(&parcel.id) {
                remove_parcel_shapes(surface, &previous);
                self.draw_order.retain(|id| *id != parcel.id);
            }

            let style = palette.parcel_style(selection.contains(&parcel.id), parcel.is_assigned());
            let polygon = surface.add_polygon(&parcel.polygon_coords, &style);

            let label = match (&parcel.cadastral_number, show_labels) {
                (Some(number), true) => {
                    Some(surface.add_label(bounds.center(), number, &label_style))
                }
                _ => None,
            };

            self.parcels.insert(
                parcel.id,
                RenderedParcel {
                    polygon,
                    label,
                    geometry: parcel.polygon(),
                    bounds,
                },
            );
            self.draw_order.push(parcel.id);
        }

        log::debug!(
            "Rendered {} parcels ({} without geometry)",
            self.draw_order.len(),
            skipped
        );
    }

    /// Replaces the cluster layer with `clusters`
    pub fn render_clusters<S: MapSurface + ?Sized>(&mut self, surface: &mut S, clusters: &[Cluster]) {
        self.clear_clusters(surface);

        let palette = &self.config.palette;
        let circle_style = palette.cluster_style();
        let label_style = palette.count_label();

        for cluster in clusters {
            let radius_px = self.config.cluster_radius.radius(cluster.count);
            let circle = surface.add_circle(cluster.center, radius_px, &circle_style);
            let label = surface.add_label(cluster.center, &cluster.label(), &label_style);

            self.clusters.push(RenderedCluster {
                circle,
                label,
                center: cluster.center,
                radius_px,
                bounds: cluster.bounds,
            });
        }

        log::debug!("Rendered {} clusters", self.clusters.len());
    }

    pub fn clear_parcels<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        for (_, rendered) in self.parcels.drain() {
            remove_parcel_shapes(surface, &rendered);
        }
        self.draw_order.clear();
    }

    pub fn clear_clusters<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        for rendered in self.clusters.drain(..) {
            surface.remove(rendered.circle);
            surface.remove(rendered.label);
        }
    }

    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        self.clear_parcels(surface);
        self.clear_clusters(surface);
    }

    /// Top-most rendered parcel whose polygon contains `at` (edges included)
    pub fn parcel_at(&self, at: LatLng) -> Option<ParcelId> {
        let point: geo::Point<f64> = at.into();
        self.draw_order.iter().rev().copied().find(|id| {
            self.parcels
                .get(id)
                .and_then(|r| r.geometry.as_ref())
                .map_or(false, |polygon| polygon.intersects(&point))
        })
    }

    /// Bounds of the top-most cluster marker under `pixel`
    pub fn cluster_at(&self, pixel: Point, view: &MapView) -> Option<LatLngBounds> {
        self.clusters
            .iter()
            .rev()
            .find(|c| view.lat_lng_to_pixel(&c.center).distance_to(&pixel) <= c.radius_px)
            .map(|c| c.bounds)
    }

    pub fn is_rendered(&self, id: &ParcelId) -> bool {
        self.parcels.contains_key(id)
    }

    /// Ids in drawing order
    pub fn rendered_parcels(&self) -> &[ParcelId] {
        &self.draw_order
    }

    pub fn parcel_count(&self) -> usize {
        self.draw_order.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Union of the bounds of every rendered parcel
    pub fn parcel_bounds(&self) -> Option<LatLngBounds> {
        self.parcels
            .values()
            .map(|r| r.bounds)
            .reduce(|a, b| a.union(&b))
    }
}

fn remove_parcel_shapes<S: MapSurface + ?Sized>(surface: &mut S, rendered: &RenderedParcel) {
    surface.remove(rendered.polygon);
    if let Some(label) = rendered.label {
        surface.remove(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::square_parcel;
    use crate::render::surface::RecordingSurface;

    fn renderer() -> GeometryRenderer {
        GeometryRenderer::new(RenderConfig::default())
    }

    #[test]
    fn test_parcels_without_geometry_are_skipped() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        let parcels = vec![
            square_parcel(1, LatLng::new(54.70, 20.40), 0.01),
            Parcel::new(2, vec![]),
        ];

        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 14);
        assert_eq!(renderer.rendered_parcels(), &[ParcelId(1)]);
        assert_eq!(surface.polygons().len(), 1);
        assert!(!renderer.is_rendered(&ParcelId(2)));
    }

    #[test]
    fn test_labels_only_at_label_zoom() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        let parcels = vec![
            square_parcel(1, LatLng::new(54.70, 20.40), 0.01).with_cadastral_number("39:05:1"),
            square_parcel(2, LatLng::new(54.72, 20.40), 0.01),
        ];

        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 15);
        assert!(surface.labels().is_empty());

        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 16);
        assert_eq!(surface.labels(), ["39:05:1"]);
        assert_eq!(surface.polygons().len(), 2);
    }

    #[test]
    fn test_selected_parcels_use_selected_style() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        let parcels = vec![square_parcel(1, LatLng::new(54.70, 20.40), 0.01).with_listing(3)];
        let mut selection = SelectionSet::new();
        selection.add(ParcelId(1));

        renderer.render_parcels(&mut surface, &parcels, &selection, 14);
        let (_, style) = surface.polygons()[0];
        assert_eq!(style.color.to_hex(), "#f59e0b");
        assert_eq!(style.weight, 3.0);
    }

    #[test]
    fn test_rerender_replaces_shapes() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        let parcels = vec![
            square_parcel(1, LatLng::new(54.70, 20.40), 0.01),
            square_parcel(1, LatLng::new(54.80, 20.40), 0.01),
        ];

        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 14);
        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 14);
        assert_eq!(surface.polygons().len(), 1);
        assert_eq!(renderer.parcel_count(), 1);
    }

    #[test]
    fn test_hit_testing_prefers_last_drawn() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        let parcels = vec![
            square_parcel(1, LatLng::new(54.70, 20.40), 0.02),
            square_parcel(2, LatLng::new(54.71, 20.41), 0.02),
        ];
        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 14);

        assert_eq!(renderer.parcel_at(LatLng::new(54.705, 20.405)), Some(ParcelId(1)));
        assert_eq!(renderer.parcel_at(LatLng::new(54.715, 20.415)), Some(ParcelId(2)));
        assert_eq!(renderer.parcel_at(LatLng::new(54.90, 20.90)), None);
    }

    #[test]
    fn test_clusters_and_hit_testing() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        let bounds = LatLngBounds::from_coords(54.70, 20.40, 54.72, 20.50);
        let clusters = vec![
            Cluster::new(LatLng::new(54.71, 20.45), bounds, 42),
            Cluster::new(LatLng::new(54.90, 20.45), bounds, 5000),
        ];

        renderer.render_clusters(&mut surface, &clusters);
        assert_eq!(surface.circles().len(), 2);
        assert_eq!(surface.circles()[1].1, 48.0);
        assert_eq!(surface.labels(), ["42", "5000"]);

        let view = MapView::new(LatLng::new(54.71, 20.45), 10.0, Point::new(800.0, 600.0));
        assert_eq!(renderer.cluster_at(Point::new(405.0, 300.0), &view), Some(bounds));
        assert_eq!(renderer.cluster_at(Point::new(10.0, 10.0), &view), None);

        renderer.clear(&mut surface);
        assert!(surface.is_empty());
        assert_eq!(renderer.cluster_count(), 0);
    }

    #[test]
    fn test_parcel_bounds_union() {
        let mut surface = RecordingSurface::new();
        let mut renderer = renderer();
        assert!(renderer.parcel_bounds().is_none());

        let parcels = vec![
            square_parcel(1, LatLng::new(54.70, 20.40), 0.01),
            square_parcel(2, LatLng::new(54.75, 20.45), 0.01),
        ];
        renderer.render_parcels(&mut surface, &parcels, &SelectionSet::new(), 14);

        let bounds = renderer.parcel_bounds().unwrap();
        assert_eq!(bounds.south(), 54.70);
        assert_eq!(bounds.west(), 20.40);
        assert!((bounds.north() - 54.76).abs() < 1e-9);
        assert!((bounds.east() - 20.46).abs() < 1e-9);
    }
}
