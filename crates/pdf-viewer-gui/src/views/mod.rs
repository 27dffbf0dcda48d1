pub mod status;
pub mod viewer;

pub use status::{show_log_window, show_status_bar};
pub use viewer::{PageView, ToolbarAction, show_page, show_toolbar};
