use crate::types::RegionSize;

/// Reports size changes of the display region.
///
/// Fires once on [`attach`](Self::attach) unconditionally, then only when the
/// width or height actually changed.
#[derive(Debug, Clone, Default)]
pub struct DimensionTracker {
    attached: bool,
    last: Option<RegionSize>,
}

impl DimensionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, initial: RegionSize) -> RegionSize {
        self.attached = true;
        self.last = Some(initial);
        initial
    }

    pub fn observe(&mut self, size: RegionSize) -> Option<RegionSize> {
        if !self.attached || self.last == Some(size) {
            return None;
        }
        self.last = Some(size);
        Some(size)
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Last reported size; zero before the region is attached
    pub fn current(&self) -> RegionSize {
        match (self.attached, self.last) {
            (true, Some(size)) => size,
            _ => RegionSize::ZERO,
        }
    }
}
