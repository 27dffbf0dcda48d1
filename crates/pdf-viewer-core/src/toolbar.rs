use crate::navigation::{Navigation, PageChange};

/// Navigation request coming from the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIntent {
    Previous,
    Next,
    GoTo(usize),
}

impl NavigationIntent {
    pub fn apply(self, navigation: &mut Navigation) -> PageChange {
        match self {
            NavigationIntent::Previous => navigation.previous(),
            NavigationIntent::Next => navigation.next(),
            NavigationIntent::GoTo(page) => navigation.go_to(page),
        }
    }
}

/// What the navigation control surface displays
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolbarState {
    pub document_name: Option<String>,
    pub current_page: Option<usize>,
    pub total_pages: usize,
    pub can_previous: bool,
    pub can_next: bool,
    pub loading: bool,
}

impl ToolbarState {
    pub fn new(document_name: Option<String>, navigation: &Navigation, loading: bool) -> Self {
        Self {
            document_name,
            current_page: navigation.current(),
            total_pages: navigation.page_count(),
            can_previous: navigation.can_previous(),
            can_next: navigation.can_next(),
            loading,
        }
    }

    pub fn label(&self) -> String {
        match self.current_page {
            Some(page) => format!("Page {} of {}", page, self.total_pages),
            None if self.loading => "Loading...".to_string(),
            None => "No document".to_string(),
        }
    }
}
