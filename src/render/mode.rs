use crate::data::response::{FetchResponse, RenderMode};

/// Result of resolving one response's mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    /// `None` before the first applied response
    pub previous: Option<RenderMode>,
    pub current: RenderMode,
}

impl ModeTransition {
    /// True when the map switches between parcels and clusters
    pub fn is_flip(&self) -> bool {
        self.previous.map_or(false, |previous| previous != self.current)
    }

    pub fn entered(&self, mode: RenderMode) -> bool {
        self.current == mode && self.previous != Some(mode)
    }

    pub fn left(&self, mode: RenderMode) -> bool {
        self.previous == Some(mode) && self.current != mode
    }
}

/// Tracks the active render mode. The mode a response declares is trusted;
/// the zoom level is never consulted.
#[derive(Debug, Clone, Default)]
pub struct ModeResolver {
    current: Option<RenderMode>,
}

impl ModeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, response: &FetchResponse) -> ModeTransition {
        let current = response.render_mode();
        let transition = ModeTransition {
            previous: self.current.replace(current),
            current,
        };
        if transition.is_flip() {
            log::debug!("Render mode {:?} -> {:?}", transition.previous, current);
        }
        transition
    }

    pub fn current(&self) -> Option<RenderMode> {
        self.current
    }
}
