use std::sync::Arc;

use crate::scheduler::RenderRequest;
use crate::types::{PageSize, RasterSurface};

/// A surface together with the request it was rendered for
#[derive(Debug, Clone)]
pub struct CommittedFrame {
    pub request: RenderRequest,
    pub scale: f32,
    pub natural_size: PageSize,
    pub surface: Arc<RasterSurface>,
}

/// Holds at most one committed frame.
///
/// Only [`RenderScheduler`](crate::RenderScheduler) can write to it.
#[derive(Debug, Default)]
pub struct DisplayRegion {
    frame: Option<CommittedFrame>,
    commits: u64,
}

impl DisplayRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replace(&mut self, frame: CommittedFrame) -> Option<CommittedFrame> {
        self.commits += 1;
        self.frame.replace(frame)
    }

    pub(crate) fn clear(&mut self) -> Option<CommittedFrame> {
        self.frame.take()
    }

    pub fn frame(&self) -> Option<&CommittedFrame> {
        self.frame.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }

    /// Number of frames committed since creation
    pub fn commit_count(&self) -> u64 {
        self.commits
    }
}
