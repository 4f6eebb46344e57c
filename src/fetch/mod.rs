//! Viewport-driven loading: debouncing, sequencing and the data sources
//! behind the network boundary.

pub mod coordinator;
pub mod debounce;
pub mod memory;
pub mod source;

pub use coordinator::{FetchCoordinator, FetchOutcome, FetchTicket};
pub use debounce::Debounce;
pub use memory::InMemoryPlotSource;
pub use source::{HttpPlotSource, PlotSource};
