use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl KeyModifiers {
    pub const NONE: KeyModifiers = KeyModifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl, Cmd or Shift turn a click into a toggle
    pub fn is_multi_select(&self) -> bool {
        self.ctrl || self.meta || self.shift
    }
}

/// View events reported by the host mapping engine
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map view changed mid-gesture (animation frame, drag step)
    ViewChanged { center: LatLng, zoom: f64 },
    /// Pan started
    MoveStart,
    /// Pan ended
    MoveEnd { center: LatLng },
    /// Zoom started
    ZoomStart,
    /// Zoom ended
    ZoomEnd { zoom: f64 },
    /// Container resized
    Resize { size: Point },
}

impl MapEvent {
    /// Whether the view has come to rest
    pub fn is_settled(&self) -> bool {
        matches!(self, MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. })
    }
}

/// Pointer input in map coordinates, as the engine delivers it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { lat_lng: LatLng, pixel: Point },
    Move { lat_lng: LatLng, pixel: Point },
    Up { lat_lng: LatLng, pixel: Point },
    Click {
        lat_lng: LatLng,
        pixel: Point,
        modifiers: KeyModifiers,
    },
}

impl PointerEvent {
    pub fn lat_lng(&self) -> LatLng {
        match self {
            PointerEvent::Down { lat_lng, .. }
            | PointerEvent::Move { lat_lng, .. }
            | PointerEvent::Up { lat_lng, .. }
            | PointerEvent::Click { lat_lng, .. } => *lat_lng,
        }
    }

    pub fn pixel(&self) -> Point {
        match self {
            PointerEvent::Down { pixel, .. }
            | PointerEvent::Move { pixel, .. }
            | PointerEvent::Up { pixel, .. }
            | PointerEvent::Click { pixel, .. } => *pixel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_select_modifiers() {
        assert!(!KeyModifiers::NONE.is_multi_select());
        assert!(KeyModifiers::ctrl().is_multi_select());
        assert!(KeyModifiers::shift().is_multi_select());
        assert!(KeyModifiers {
            meta: true,
            ..KeyModifiers::NONE
        }
        .is_multi_select());
        assert!(!KeyModifiers {
            alt: true,
            ..KeyModifiers::NONE
        }
        .is_multi_select());
    }

    #[test]
    fn test_settled_events() {
        assert!(MapEvent::MoveEnd {
            center: LatLng::default()
        }
        .is_settled());
        assert!(MapEvent::ZoomEnd { zoom: 12.0 }.is_settled());
        assert!(!MapEvent::MoveStart.is_settled());
        assert!(!MapEvent::ViewChanged {
            center: LatLng::default(),
            zoom: 3.0
        }
        .is_settled());
    }

    #[test]
    fn test_pointer_accessors() {
        let event = PointerEvent::Click {
            lat_lng: LatLng::new(54.71, 20.45),
            pixel: Point::new(10.0, 20.0),
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(event.lat_lng(), LatLng::new(54.71, 20.45));
        assert_eq!(event.pixel(), Point::new(10.0, 20.0));
    }
}
