mod dimensions;
mod display;
pub mod engine;
mod navigation;
mod options;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod scheduler;
mod session;
mod toolbar;
mod types;
mod viewer;

pub use dimensions::DimensionTracker;
pub use display::{CommittedFrame, DisplayRegion};
pub use engine::{DocumentEngine, DocumentHandle, PageRef};
pub use navigation::{Navigation, PageChange};
pub use options::*;
pub use scheduler::{
    Generation, GenerationTracker, RenderInputs, RenderJob, RenderOutcome, RenderRequest,
    RenderScheduler, RenderedPage, Schedule, fit_scale,
};
pub use session::{DocumentSession, OpenOutcome, OpenTicket};
pub use toolbar::{NavigationIntent, ToolbarState};
pub use types::*;
pub use viewer::{Refresh, ViewerState};
