/// Current page of the viewer, saturating at both ends of the document.
///
/// Page numbers are 1-based. With no pages loaded every operation is a no-op
/// and [`current`](Self::current) is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    current: usize,
    page_count: usize,
}

/// Page after a navigation call, and whether it moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub page: usize,
    pub changed: bool,
}

impl Navigation {
    pub fn new() -> Self {
        Self {
            current: 1,
            page_count: 0,
        }
    }

    /// Back to page 1 for a newly adopted document
    pub fn reset(&mut self, page_count: usize) {
        self.current = 1;
        self.page_count = page_count;
    }

    pub fn current(&self) -> Option<usize> {
        (self.page_count > 0).then_some(self.current)
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn next(&mut self) -> PageChange {
        self.go_to(self.current.saturating_add(1))
    }

    pub fn previous(&mut self) -> PageChange {
        self.go_to(self.current.saturating_sub(1))
    }

    pub fn go_to(&mut self, page: usize) -> PageChange {
        if self.page_count == 0 {
            return PageChange {
                page: self.current,
                changed: false,
            };
        }

        let target = page.clamp(1, self.page_count);
        let changed = target != self.current;
        self.current = target;
        PageChange {
            page: target,
            changed,
        }
    }

    pub fn can_previous(&self) -> bool {
        self.page_count > 0 && self.current > 1
    }

    pub fn can_next(&self) -> bool {
        self.current < self.page_count
    }
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new()
    }
}
