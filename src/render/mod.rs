pub mod mode;
pub mod renderer;
pub mod style;
pub mod surface;

#[cfg(feature = "egui")]
pub mod painter;

pub use mode::{ModeResolver, ModeTransition};
pub use renderer::GeometryRenderer;
pub use style::{Color, ParcelPalette};
pub use surface::{Cursor, MapSurface, RecordingSurface, ShapeHandle};
