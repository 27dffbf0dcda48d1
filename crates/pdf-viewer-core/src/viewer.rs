//! The viewer's state: one single-writer field per component and a single
//! place that decides whether a render should happen now.

use std::sync::Arc;

use crate::dimensions::DimensionTracker;
use crate::display::{CommittedFrame, DisplayRegion};
use crate::engine::DocumentHandle;
use crate::navigation::{Navigation, PageChange};
use crate::scheduler::{
    RenderInputs, RenderOutcome, RenderRequest, RenderScheduler, RenderedPage, Schedule,
};
use crate::session::{DocumentSession, OpenOutcome, OpenTicket};
use crate::toolbar::{NavigationIntent, ToolbarState};
use crate::types::{DocumentId, DocumentLoadError, DocumentReference, RegionSize, Result};

/// Result of re-evaluating the render inputs
pub struct Refresh {
    pub schedule: Schedule,
    /// Frame dropped because the document handle went away
    pub cleared: Option<CommittedFrame>,
}

#[derive(Default)]
pub struct ViewerState {
    session: DocumentSession,
    navigation: Navigation,
    dimensions: DimensionTracker,
    scheduler: RenderScheduler,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, reference: DocumentReference) -> Option<OpenTicket> {
        let ticket = self.session.open(reference)?;
        self.navigation.reset(0);
        Some(ticket)
    }

    pub fn finish_open(
        &mut self,
        ticket: &OpenTicket,
        result: std::result::Result<Arc<dyn DocumentHandle>, DocumentLoadError>,
    ) -> OpenOutcome {
        let outcome = self.session.finish_open(ticket, result);
        if let OpenOutcome::Loaded { page_count, .. } = outcome {
            self.navigation.reset(page_count);
        }
        outcome
    }

    pub fn close(&mut self) -> Option<DocumentId> {
        self.navigation.reset(0);
        self.session.close()
    }

    pub fn attach(&mut self, initial: RegionSize) -> RegionSize {
        self.dimensions.attach(initial)
    }

    /// Returns `true` when the size differs from the last one reported
    pub fn resize(&mut self, size: RegionSize) -> bool {
        self.dimensions.observe(size).is_some()
    }

    pub fn detach(&mut self) {
        self.dimensions.detach();
    }

    pub fn navigate(&mut self, intent: NavigationIntent) -> PageChange {
        intent.apply(&mut self.navigation)
    }

    pub fn inputs(&self) -> RenderInputs {
        RenderInputs {
            document: self.session.document(),
            page_count: self.session.page_count(),
            page: self.navigation.current(),
            region: self.dimensions.current(),
        }
    }

    /// Decide from the current snapshot whether to render now
    pub fn refresh(&mut self) -> Refresh {
        let cleared = if self.session.handle().is_none() {
            self.scheduler.clear_display()
        } else {
            None
        };

        let inputs = self.inputs();
        let schedule = self.scheduler.issue(inputs, self.session.handle());
        Refresh { schedule, cleared }
    }

    pub fn complete(
        &mut self,
        request: RenderRequest,
        result: Result<Option<RenderedPage>>,
    ) -> RenderOutcome {
        self.scheduler.complete(request, result)
    }

    /// Release the handle and the displayed frame; late completions become no-ops
    pub fn teardown(&mut self) -> Option<CommittedFrame> {
        self.session.close();
        self.navigation.reset(0);
        self.dimensions.detach();
        self.scheduler.invalidate();
        self.scheduler.clear_display()
    }

    pub fn toolbar(&self) -> ToolbarState {
        let document_name = self
            .session
            .reference()
            .map(|reference| reference.display_name().to_string());
        ToolbarState::new(document_name, &self.navigation, self.session.is_loading())
    }

    pub fn display(&self) -> &DisplayRegion {
        self.scheduler.display()
    }

    pub fn reference(&self) -> Option<&DocumentReference> {
        self.session.reference()
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.session.document()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }
}
