//! Contract with the document decoding/rasterization engine.
//!
//! Every call is blocking; the runtime dispatches them to tokio's blocking
//! pool and observes completion from the orchestrating task.

use std::sync::Arc;

use crate::types::{
    DocumentLoadError, DocumentReference, PageFetchError, PageSize, RasterSurface, RenderError,
};

/// Opens documents by reference
pub trait DocumentEngine: Send + Sync + 'static {
    fn open(
        &self,
        reference: &DocumentReference,
    ) -> Result<Arc<dyn DocumentHandle>, DocumentLoadError>;
}

/// A successfully opened document.
///
/// Shared read-only with in-flight render jobs; only the document session
/// calls [`DocumentHandle::release`]. Releasing twice must be harmless.
pub trait DocumentHandle: Send + Sync {
    fn page_count(&self) -> usize;

    /// Fetch page metadata for a 1-based page number
    fn page(&self, page_number: usize) -> Result<Box<dyn PageRef>, PageFetchError>;

    fn release(&self);

    fn is_released(&self) -> bool;
}

/// One page of an open document
pub trait PageRef: Send {
    fn natural_size(&self) -> PageSize;

    fn render_at(&self, scale: f32) -> Result<RasterSurface, RenderError>;
}
