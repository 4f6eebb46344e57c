use crate::core::config::{LassoConfig, LassoContainment};
use crate::core::geo::{LatLng, LatLngBounds};
use crate::data::parcel::{Parcel, ParcelId};
use crate::render::style::LineStyle;
use crate::render::surface::{Cursor, MapSurface, ShapeHandle};
use geo::Intersects;

/// Lasso gesture state.
///
/// `Disabled` is the only state in which the map pans normally; entering any
/// other state turns dragging off and leaving them turns it back on.
#[derive(Debug, Clone, PartialEq)]
pub enum LassoState {
    Disabled,
    Idle,
    Drawing {
        path: Vec<LatLng>,
        guide: ShapeHandle,
    },
}

/// A finished lasso path, closed into a polygon
#[derive(Debug, Clone)]
pub struct LassoPolygon {
    polygon: geo::Polygon<f64>,
    bounds: LatLngBounds,
    containment: LassoContainment,
}

impl LassoPolygon {
    /// `None` for fewer than three points
    pub fn new(path: &[LatLng], containment: LassoContainment) -> Option<Self> {
        if path.len() < 3 {
            return None;
        }
        let bounds = LatLngBounds::from_points(path)?;
        let ring: Vec<geo::Coord<f64>> = path.iter().map(|&p| p.into()).collect();

        Some(Self {
            polygon: geo::Polygon::new(geo::LineString::from(ring), vec![]),
            bounds,
            containment,
        })
    }

    pub fn bounds(&self) -> LatLngBounds {
        self.bounds
    }

    pub fn contains(&self, point: &LatLng) -> bool {
        match self.containment {
            LassoContainment::BoundingBox => self.bounds.contains(point),
            LassoContainment::Polygon => {
                let point: geo::Point<f64> = (*point).into();
                self.polygon.intersects(&point)
            }
        }
    }

    /// Parcels with geometry whose bounds centre lies inside the lasso
    pub fn select(&self, parcels: &[Parcel]) -> Vec<ParcelId> {
        parcels
            .iter()
            .filter(|p| p.center().map_or(false, |c| self.contains(&c)))
            .map(|p| p.id)
            .collect()
    }
}

/// Drives the lasso gesture against a [`MapSurface`]: guide polyline while
/// drawing, dragging and cursor on entry and exit.
#[derive(Debug)]
pub struct LassoEngine {
    state: LassoState,
    config: LassoConfig,
    guide_style: LineStyle,
}

impl LassoEngine {
    pub fn new(config: LassoConfig, guide_style: LineStyle) -> Self {
        Self {
            state: LassoState::Disabled,
            config,
            guide_style,
        }
    }

    pub fn state(&self) -> &LassoState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, LassoState::Disabled)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, LassoState::Drawing { .. })
    }

    /// Entry action: no map dragging, crosshair cursor
    pub fn activate<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.is_active() {
            return;
        }
        surface.set_dragging(false);
        surface.set_cursor(Cursor::Crosshair);
        self.state = LassoState::Idle;
        log::debug!("Lasso activated");
    }

    /// Exit action: drop any path and guide, restore dragging and cursor
    pub fn deactivate<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        match std::mem::replace(&mut self.state, LassoState::Disabled) {
            LassoState::Disabled => return,
            LassoState::Drawing { guide, .. } => surface.remove(guide),
            LassoState::Idle => {}
        }
        surface.set_dragging(true);
        surface.set_cursor(Cursor::Default);
        log::debug!("Lasso deactivated");
    }

    pub fn pointer_down<S: MapSurface + ?Sized>(&mut self, surface: &mut S, at: LatLng) {
        match &self.state {
            LassoState::Disabled => return,
            // A down without the matching up restarts the gesture
            LassoState::Drawing { guide, .. } => surface.remove(*guide),
            LassoState::Idle => {}
        }
        let guide = surface.add_polyline(&[at], &self.guide_style);
        self.state = LassoState::Drawing {
            path: vec![at],
            guide,
        };
    }

    pub fn pointer_move<S: MapSurface + ?Sized>(&mut self, surface: &mut S, at: LatLng) {
        if let LassoState::Drawing { path, guide } = &mut self.state {
            path.push(at);
            surface.extend_polyline(*guide, at);
        }
    }

    /// Ends the gesture. Returns the closed polygon, or `None` when nothing
    /// was being drawn or the path is too short.
    pub fn pointer_up<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Option<LassoPolygon> {
        if !self.is_drawing() {
            return None;
        }
        let LassoState::Drawing { path, guide } =
            std::mem::replace(&mut self.state, LassoState::Idle)
        else {
            return None;
        };
        surface.remove(guide);

        if path.len() < self.config.min_points {
            log::debug!("Discarding lasso with {} points", path.len());
            return None;
        }
        LassoPolygon::new(&path, self.config.containment)
    }
}
