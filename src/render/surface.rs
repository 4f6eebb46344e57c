use crate::core::geo::{LatLng, LatLngBounds};
use crate::render::style::{CircleStyle, LabelStyle, LineStyle, PolygonStyle};
use std::collections::BTreeMap;

/// Opaque handle to a shape drawn on a [`MapSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
}

/// The drawing and camera operations the core needs from a mapping engine.
///
/// Handles returned here stay inside the renderer and lasso engine; the
/// surface only has to honour `remove` for handles it issued.
pub trait MapSurface: Send {
    fn add_polygon(&mut self, ring: &[LatLng], style: &PolygonStyle) -> ShapeHandle;
    fn add_circle(&mut self, center: LatLng, radius_px: f64, style: &CircleStyle) -> ShapeHandle;
    /// Permanent text centred on `at`
    fn add_label(&mut self, at: LatLng, text: &str, style: &LabelStyle) -> ShapeHandle;
    fn add_polyline(&mut self, points: &[LatLng], style: &LineStyle) -> ShapeHandle;
    fn extend_polyline(&mut self, handle: ShapeHandle, point: LatLng);
    fn remove(&mut self, handle: ShapeHandle);

    /// Enable or disable panning by drag
    fn set_dragging(&mut self, enabled: bool);
    fn set_cursor(&mut self, cursor: Cursor);
    /// Ask the engine to move its camera so `bounds` is visible. The engine
    /// reports the resulting view back through its usual move/zoom events.
    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: f64);
}

/// A shape as recorded by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon {
        ring: Vec<LatLng>,
        style: PolygonStyle,
    },
    Circle {
        center: LatLng,
        radius_px: f64,
        style: CircleStyle,
    },
    Label {
        at: LatLng,
        text: String,
        style: LabelStyle,
    },
    Polyline {
        points: Vec<LatLng>,
        style: LineStyle,
    },
}

/// Headless [`MapSurface`] that keeps every live shape and the engine state
/// the core asked for. Used by tests and as the model for painter backends.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    shapes: BTreeMap<ShapeHandle, Shape>,
    next_handle: u64,
    dragging: bool,
    cursor: Cursor,
    fit_requests: Vec<(LatLngBounds, f64)>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            shapes: BTreeMap::new(),
            next_handle: 1,
            dragging: true,
            cursor: Cursor::Default,
            fit_requests: Vec::new(),
        }
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, shape: Shape) -> ShapeHandle {
        let handle = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(handle, shape);
        handle
    }

    /// Live shapes in drawing order
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &Shape)> {
        self.shapes.iter().map(|(h, s)| (*h, s))
    }

    pub fn get(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn polygons(&self) -> Vec<(&[LatLng], &PolygonStyle)> {
        self.shapes
            .values()
            .filter_map(|s| match s {
                Shape::Polygon { ring, style } => Some((ring.as_slice(), style)),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> Vec<(LatLng, f64)> {
        self.shapes
            .values()
            .filter_map(|s| match s {
                Shape::Circle {
                    center, radius_px, ..
                } => Some((*center, *radius_px)),
                _ => None,
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.shapes
            .values()
            .filter_map(|s| match s {
                Shape::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn polylines(&self) -> Vec<(&[LatLng], &LineStyle)> {
        self.shapes
            .values()
            .filter_map(|s| match s {
                Shape::Polyline { points, style } => Some((points.as_slice(), style)),
                _ => None,
            })
            .collect()
    }

    pub fn dragging(&self) -> bool {
        self.dragging
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Every fit-bounds request in order, with its padding
    pub fn fit_requests(&self) -> &[(LatLngBounds, f64)] {
        &self.fit_requests
    }
}

impl MapSurface for RecordingSurface {
    fn add_polygon(&mut self, ring: &[LatLng], style: &PolygonStyle) -> ShapeHandle {
        self.insert(Shape::Polygon {
            ring: ring.to_vec(),
            style: *style,
        })
    }

    fn add_circle(&mut self, center: LatLng, radius_px: f64, style: &CircleStyle) -> ShapeHandle {
        self.insert(Shape::Circle {
            center,
            radius_px,
            style: *style,
        })
    }

    fn add_label(&mut self, at: LatLng, text: &str, style: &LabelStyle) -> ShapeHandle {
        self.insert(Shape::Label {
            at,
            text: text.to_string(),
            style: *style,
        })
    }

    fn add_polyline(&mut self, points: &[LatLng], style: &LineStyle) -> ShapeHandle {
        self.insert(Shape::Polyline {
            points: points.to_vec(),
            style: style.clone(),
        })
    }

    fn extend_polyline(&mut self, handle: ShapeHandle, point: LatLng) {
        match self.shapes.get_mut(&handle) {
            Some(Shape::Polyline { points, .. }) => points.push(point),
            _ => log::warn!("extend_polyline on unknown handle {handle:?}"),
        }
    }

    fn remove(&mut self, handle: ShapeHandle) {
        self.shapes.remove(&handle);
    }

    fn set_dragging(&mut self, enabled: bool) {
        self.dragging = enabled;
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: f64) {
        self.fit_requests.push((bounds, padding_px));
    }
}
