//! Fit-to-region render scheduling.
//!
//! Every change to the (document, page, region) inputs issues a new
//! generation. Render jobs capture their generation and the scheduler only
//! commits a completion whose generation is still the latest one, so a frame
//! for a stale page or size never reaches the display region no matter in
//! which order overlapping jobs finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::display::{CommittedFrame, DisplayRegion};
use crate::engine::DocumentHandle;
use crate::types::{
    DocumentId, PageSize, RasterSurface, RegionSize, RenderError, Result, ViewerError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

/// Latest issued generation, shared between the scheduler and its jobs
#[derive(Debug, Clone, Default)]
pub struct GenerationTracker {
    latest: Arc<AtomicU64>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest() == generation
    }
}

/// Uniform scale that fits `page` inside `region` on both axes.
///
/// Returns `None` when either size is not positive and finite.
pub fn fit_scale(page: PageSize, region: RegionSize) -> Option<f32> {
    if !page.is_valid() || !region.is_renderable() {
        return None;
    }
    Some((region.width / page.width).min(region.height / page.height))
}

/// Snapshot of everything that decides whether a render should happen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInputs {
    pub document: Option<DocumentId>,
    pub page_count: usize,
    pub page: Option<usize>,
    pub region: RegionSize,
}

impl RenderInputs {
    pub fn is_renderable(&self) -> bool {
        self.document.is_some()
            && self.page_count > 0
            && self.page.is_some()
            && self.region.is_renderable()
    }
}

/// One render attempt for a (document, page, region) tuple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub generation: Generation,
    pub document: DocumentId,
    pub page: usize,
    pub region: RegionSize,
}

/// Output of a render job that ran to completion
#[derive(Debug)]
pub struct RenderedPage {
    pub natural_size: PageSize,
    pub scale: f32,
    pub surface: RasterSurface,
}

/// Work for the blocking pool; owns everything it needs
pub struct RenderJob {
    pub request: RenderRequest,
    handle: Arc<dyn DocumentHandle>,
    tracker: GenerationTracker,
}

impl RenderJob {
    /// Fetch page metadata, then rasterize at the fit scale.
    ///
    /// Returns `Ok(None)` without rasterizing when the request was superseded
    /// while the page was being fetched.
    pub fn run(&self) -> Result<Option<RenderedPage>> {
        let page = self.handle.page(self.request.page)?;

        if !self.tracker.is_current(self.request.generation) {
            log::debug!(
                "Skipping raster of page {} for superseded request {:?}",
                self.request.page,
                self.request.generation
            );
            return Ok(None);
        }

        let natural_size = page.natural_size();
        let scale = fit_scale(natural_size, self.request.region).ok_or(
            RenderError::InvalidPageSize {
                width: natural_size.width,
                height: natural_size.height,
            },
        )?;

        let surface = page.render_at(scale)?;
        Ok(Some(RenderedPage {
            natural_size,
            scale,
            surface,
        }))
    }
}

/// Decision taken for one snapshot of the inputs
pub enum Schedule {
    Render(RenderJob),
    /// Inputs changed but cannot be rendered; earlier requests are invalidated
    Suppressed(Generation),
    /// Same inputs as the last decision
    Unchanged,
}

/// What happened to a finished render job
#[derive(Debug)]
pub enum RenderOutcome {
    Committed {
        frame: CommittedFrame,
        released: Option<CommittedFrame>,
    },
    Discarded(Generation),
    Failed {
        request: RenderRequest,
        error: ViewerError,
    },
}

/// Decides when to render and is the only writer of the display region
pub struct RenderScheduler {
    tracker: GenerationTracker,
    last_inputs: Option<RenderInputs>,
    display: DisplayRegion,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            tracker: GenerationTracker::new(),
            last_inputs: None,
            display: DisplayRegion::new(),
        }
    }

    pub fn tracker(&self) -> &GenerationTracker {
        &self.tracker
    }

    pub fn display(&self) -> &DisplayRegion {
        &self.display
    }

    pub fn issue(
        &mut self,
        inputs: RenderInputs,
        handle: Option<&Arc<dyn DocumentHandle>>,
    ) -> Schedule {
        if self.last_inputs == Some(inputs) {
            return Schedule::Unchanged;
        }
        self.last_inputs = Some(inputs);

        let generation = self.tracker.advance();
        match (inputs.document, inputs.page, handle) {
            (Some(document), Some(page), Some(handle)) if inputs.is_renderable() => {
                Schedule::Render(RenderJob {
                    request: RenderRequest {
                        generation,
                        document,
                        page,
                        region: inputs.region,
                    },
                    handle: Arc::clone(handle),
                    tracker: self.tracker.clone(),
                })
            }
            _ => {
                log::debug!("Render suppressed for {:?}: {:?}", generation, inputs);
                Schedule::Suppressed(generation)
            }
        }
    }

    pub fn complete(
        &mut self,
        request: RenderRequest,
        result: Result<Option<RenderedPage>>,
    ) -> RenderOutcome {
        if !self.tracker.is_current(request.generation) {
            log::debug!(
                "Discarding result of superseded request {:?} (latest {:?})",
                request.generation,
                self.tracker.latest()
            );
            return RenderOutcome::Discarded(request.generation);
        }

        match result {
            Ok(Some(rendered)) => {
                let frame = CommittedFrame {
                    request,
                    scale: rendered.scale,
                    natural_size: rendered.natural_size,
                    surface: Arc::new(rendered.surface),
                };
                let released = self.display.replace(frame.clone());
                RenderOutcome::Committed { frame, released }
            }
            Ok(None) => RenderOutcome::Discarded(request.generation),
            Err(error) => {
                log::warn!(
                    "Render of page {} failed, keeping last frame: {}",
                    request.page,
                    error
                );
                RenderOutcome::Failed { request, error }
            }
        }
    }

    /// Drop the displayed frame, e.g. once the document handle is gone
    pub fn clear_display(&mut self) -> Option<CommittedFrame> {
        self.display.clear()
    }

    /// Invalidate every outstanding request without issuing a new one
    pub fn invalidate(&mut self) -> Generation {
        self.last_inputs = None;
        self.tracker.advance()
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}
