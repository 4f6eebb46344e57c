use crate::core::geo::{LatLng, Point};
use crate::core::viewport::{MapView, Viewport};
use crate::input::events::MapEvent;
use crate::Result;

type ViewportCallback = Box<dyn Fn(&Viewport) + Send + Sync>;

/// Follows the host map's camera and turns settled pans and zooms into
/// [`Viewport`]s.
///
/// Transient events only update the tracked view. A settled event emits the
/// visible viewport unless it equals the last one emitted, so an engine that
/// reports both `ZoomEnd` and `MoveEnd` for one camera change yields a single
/// viewport.
pub struct ViewportTracker {
    view: MapView,
    last_emitted: Option<Viewport>,
    listeners: Vec<ViewportCallback>,
}

impl ViewportTracker {
    pub fn new(view: MapView) -> Self {
        Self {
            view,
            last_emitted: None,
            listeners: Vec::new(),
        }
    }

    /// Register a listener called with every emitted viewport
    pub fn on_change<F>(&mut self, callback: F)
    where
        F: Fn(&Viewport) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(callback));
    }

    /// Emits the initial viewport unconditionally so the first fetch needs no
    /// interaction
    pub fn mount(&mut self) -> Result<Viewport> {
        let viewport = self.view.viewport()?;
        self.emit(viewport);
        Ok(viewport)
    }

    pub fn observe(&mut self, event: &MapEvent) -> Option<Viewport> {
        match *event {
            MapEvent::ViewChanged { center, zoom } => {
                self.view = MapView::new(center, zoom, self.view.size);
                None
            }
            MapEvent::MoveStart | MapEvent::ZoomStart => None,
            MapEvent::Resize { size } => {
                self.view.size = size;
                None
            }
            MapEvent::MoveEnd { center } => {
                self.view = MapView::new(center, self.view.zoom, self.view.size);
                self.settle()
            }
            MapEvent::ZoomEnd { zoom } => {
                self.view = MapView::new(self.view.center, zoom, self.view.size);
                self.settle()
            }
        }
    }

    fn settle(&mut self) -> Option<Viewport> {
        let viewport = match self.view.viewport() {
            Ok(viewport) => viewport,
            Err(e) => {
                log::warn!("Ignoring settled view: {e}");
                return None;
            }
        };

        if self.last_emitted == Some(viewport) {
            log::trace!("Viewport unchanged, not emitting");
            return None;
        }

        self.emit(viewport);
        Some(viewport)
    }

    fn emit(&mut self, viewport: Viewport) {
        log::debug!(
            "Viewport settled: n={:.5} s={:.5} e={:.5} w={:.5} z={}",
            viewport.north(),
            viewport.south(),
            viewport.east(),
            viewport.west(),
            viewport.zoom()
        );
        self.last_emitted = Some(viewport);
        for listener in &self.listeners {
            listener(&viewport);
        }
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn center(&self) -> LatLng {
        self.view.center
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    pub fn size(&self) -> Point {
        self.view.size
    }

    /// The last viewport emitted, if any
    pub fn current(&self) -> Option<Viewport> {
        self.last_emitted
    }
}
