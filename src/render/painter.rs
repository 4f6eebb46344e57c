//! egui backend for the shape arena.
//!
//! [`EguiSurface`] records shapes like [`RecordingSurface`] and paints them
//! every frame through an [`egui::Painter`], projecting with the current
//! [`MapView`]. Dragging, cursor and fit-bounds requests are exposed for the
//! host widget to act on.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::core::viewport::MapView;
use crate::render::style::{CircleStyle, Color, LabelStyle, LineStyle, PolygonStyle};
use crate::render::surface::{Cursor, MapSurface, RecordingSurface, Shape, ShapeHandle};
use egui::{Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Stroke};
use geo::TriangulateEarcut;

#[derive(Debug, Default)]
pub struct EguiSurface {
    shapes: RecordingSurface,
    pending_fit: Option<(LatLngBounds, f64)>,
}

impl EguiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the widget should pan on drag
    pub fn dragging(&self) -> bool {
        self.shapes.dragging()
    }

    pub fn cursor_icon(&self) -> egui::CursorIcon {
        match self.shapes.cursor() {
            Cursor::Default => egui::CursorIcon::Default,
            Cursor::Crosshair => egui::CursorIcon::Crosshair,
        }
    }

    /// Takes the latest fit-bounds request, if the widget has not handled it
    pub fn take_fit_request(&mut self) -> Option<(LatLngBounds, f64)> {
        self.pending_fit.take()
    }

    /// Paints every live shape into `rect`
    pub fn paint(&self, painter: &Painter, view: &MapView, rect: Rect) {
        let to_screen = |lat_lng: &LatLng| -> Pos2 {
            let pixel = view.lat_lng_to_pixel(lat_lng);
            Pos2::new(rect.min.x + pixel.x as f32, rect.min.y + pixel.y as f32)
        };

        for (_, shape) in self.shapes.shapes() {
            match shape {
                Shape::Polygon { ring, style } => {
                    let points: Vec<Pos2> = ring.iter().map(to_screen).collect();
                    paint_polygon(painter, points, style);
                }
                Shape::Circle {
                    center,
                    radius_px,
                    style,
                } => paint_circle(painter, to_screen(center), *radius_px as f32, style),
                Shape::Label { at, text, style } => {
                    paint_label(painter, to_screen(at), text, style)
                }
                Shape::Polyline { points, style } => {
                    let points: Vec<Pos2> = points.iter().map(to_screen).collect();
                    paint_polyline(painter, points, style);
                }
            }
        }
    }
}

fn color32(color: Color, opacity: f32) -> Color32 {
    color.with_opacity(opacity).into()
}

fn paint_polygon(painter: &Painter, points: Vec<Pos2>, style: &PolygonStyle) {
    if points.len() < 3 {
        return;
    }
    let stroke = Stroke::new(style.weight, color32(style.color, 1.0));
    painter.add(egui::Shape::mesh(fill_mesh(
        &points,
        color32(style.color, style.fill_opacity),
    )));
    painter.add(egui::Shape::closed_line(points, stroke));
}

/// Triangulates a simple ring, concave or not, into a filled mesh
fn fill_mesh(points: &[Pos2], fill: Color32) -> Mesh {
    let ring: Vec<geo::Coord<f64>> = points
        .iter()
        .map(|p| geo::coord! { x: p.x as f64, y: p.y as f64 })
        .collect();
    let triangulation =
        geo::Polygon::new(geo::LineString::from(ring), vec![]).earcut_triangles_raw();

    let mut mesh = Mesh::default();
    for xy in triangulation.vertices.chunks_exact(2) {
        mesh.colored_vertex(Pos2::new(xy[0] as f32, xy[1] as f32), fill);
    }
    mesh.indices = triangulation
        .triangle_indices
        .iter()
        .map(|&i| i as u32)
        .collect();
    mesh
}

fn paint_circle(painter: &Painter, center: Pos2, radius: f32, style: &CircleStyle) {
    painter.circle(
        center,
        radius,
        color32(style.fill, style.fill_opacity),
        Stroke::new(style.weight, color32(style.stroke, 1.0)),
    );
}

fn paint_label(painter: &Painter, at: Pos2, text: &str, style: &LabelStyle) {
    let font = FontId::proportional(style.font_size);
    if let Some(background) = style.background {
        let galley = painter.layout_no_wrap(text.to_string(), font.clone(), style.text.into());
        let bg = Rect::from_center_size(at, galley.size() + egui::vec2(12.0, 4.0));
        painter.rect_filled(bg, 4.0, Color32::from(background));
    }
    painter.text(at, Align2::CENTER_CENTER, text, font, style.text.into());
}

fn paint_polyline(painter: &Painter, points: Vec<Pos2>, style: &LineStyle) {
    let stroke = Stroke::new(style.weight, color32(style.color, 1.0));
    match style.dash_pattern.as_slice() {
        [dash, gap, ..] => {
            painter.extend(egui::Shape::dashed_line(&points, stroke, *dash, *gap));
        }
        _ => {
            painter.add(egui::Shape::line(points, stroke));
        }
    }
}

impl MapSurface for EguiSurface {
    fn add_polygon(&mut self, ring: &[LatLng], style: &PolygonStyle) -> ShapeHandle {
        self.shapes.add_polygon(ring, style)
    }

    fn add_circle(&mut self, center: LatLng, radius_px: f64, style: &CircleStyle) -> ShapeHandle {
        self.shapes.add_circle(center, radius_px, style)
    }

    fn add_label(&mut self, at: LatLng, text: &str, style: &LabelStyle) -> ShapeHandle {
        self.shapes.add_label(at, text, style)
    }

    fn add_polyline(&mut self, points: &[LatLng], style: &LineStyle) -> ShapeHandle {
        self.shapes.add_polyline(points, style)
    }

    fn extend_polyline(&mut self, handle: ShapeHandle, point: LatLng) {
        self.shapes.extend_polyline(handle, point)
    }

    fn remove(&mut self, handle: ShapeHandle) {
        self.shapes.remove(handle)
    }

    fn set_dragging(&mut self, enabled: bool) {
        self.shapes.set_dragging(enabled)
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.shapes.set_cursor(cursor)
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, padding_px: f64) {
        self.pending_fit = Some((bounds, padding_px));
    }
}
