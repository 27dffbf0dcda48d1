use eframe::egui;
use pdf_viewer_core::pdfium::PdfiumEngine;
use pdf_viewer_runtime::{
    AppLogger, DocumentReference, RegionSize, ToolbarState, Viewer, ViewerHandle, ViewerOptions,
    ViewerUpdate, spawn_viewer,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::views::{
    PageView, ToolbarAction, show_log_window, show_page, show_status_bar, show_toolbar,
};

const APP_TITLE: &str = "PDF Viewer";

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

pub struct PdfViewerApp {
    handle: ViewerHandle,
    update_rx: mpsc::UnboundedReceiver<ViewerUpdate>,
    toolbar: ToolbarState,
    page: PageView,
    /// Last region size sent to the worker; `None` until the first layout
    region: Option<RegionSize>,
    logger: AppLogger,
    show_log: bool,
    runtime: Option<tokio::runtime::Runtime>,
}

impl PdfViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Runtime,
        options: ViewerOptions,
        logger: AppLogger,
        initial: Option<DocumentReference>,
    ) -> Self {
        let Viewer {
            handle,
            mut updates,
            ..
        } = spawn_viewer(runtime.handle(), Arc::new(PdfiumEngine::new()), options);

        // Forward worker updates and wake the UI for each one
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let repaint = cc.egui_ctx.clone();
        runtime.spawn(async move {
            while let Some(update) = updates.recv().await {
                if update_tx.send(update).is_err() {
                    break;
                }
                repaint.request_repaint();
            }
        });

        if let Some(reference) = initial {
            handle.open(reference);
        }

        Self {
            handle,
            update_rx,
            toolbar: ToolbarState::default(),
            page: PageView::default(),
            region: None,
            logger,
            show_log: false,
            runtime: Some(runtime),
        }
    }

    fn open_path(&self, path: &Path) {
        if is_pdf(path) {
            self.handle.open(path);
        } else {
            log::warn!("Not a PDF file: {}", path.display());
        }
    }

    fn process_updates(&mut self, ctx: &egui::Context) {
        while let Ok(update) = self.update_rx.try_recv() {
            match update {
                ViewerUpdate::ToolbarChanged { toolbar } => self.toolbar = toolbar,
                ViewerUpdate::FrameCommitted { frame } => self.page.show_frame(ctx, &frame),
                ViewerUpdate::FrameCleared => self.page.clear(),
                ViewerUpdate::DocumentLoaded { reference, .. } => {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!(
                        "{} - {}",
                        reference.display_name(),
                        APP_TITLE
                    )));
                }
                ViewerUpdate::DocumentClosed { .. } | ViewerUpdate::DocumentLoadFailed { .. } => {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Title(APP_TITLE.to_string()));
                }
                ViewerUpdate::DocumentLoading { .. }
                | ViewerUpdate::RenderDiscarded { .. }
                | ViewerUpdate::RenderFailed { .. }
                | ViewerUpdate::Shutdown => {}
            }
        }
    }

    fn apply(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Open => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("PDF", &["pdf"])
                    .pick_file()
                {
                    self.open_path(&path);
                }
            }
            ToolbarAction::Previous => {
                self.handle.previous_page();
            }
            ToolbarAction::Next => {
                self.handle.next_page();
            }
            ToolbarAction::Close => {
                self.handle.close();
            }
            ToolbarAction::ToggleLog => self.show_log = !self.show_log,
        }
    }

    fn report_region(&mut self, size: RegionSize) {
        match self.region {
            None => {
                self.handle.attach(size.width, size.height);
            }
            Some(previous) if previous != size => {
                self.handle.resize(size.width, size.height);
            }
            Some(_) => return,
        }
        self.region = Some(size);
    }
}

impl eframe::App for PdfViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle drag-and-drop for PDF files
        let dropped: Vec<_> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if let Some(path) = dropped.first() {
            self.open_path(path);
        }

        let (previous, next) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft) || i.key_pressed(egui::Key::PageUp),
                i.key_pressed(egui::Key::ArrowRight) || i.key_pressed(egui::Key::PageDown),
            )
        });
        if previous {
            self.handle.previous_page();
        }
        if next {
            self.handle.next_page();
        }

        self.process_updates(ctx);

        let mut action = None;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            action = show_toolbar(ui, &self.toolbar);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            show_status_bar(ui, &self.logger);
        });

        let region = egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(ctx.style().visuals.extreme_bg_color))
            .show(ctx, |ui| show_page(ui, &self.page, self.toolbar.loading))
            .inner;
        self.report_region(region);

        if self.show_log {
            show_log_window(ctx, &self.logger, &mut self.show_log);
        }

        if let Some(action) = action {
            self.apply(action);
        }
    }
}

impl Drop for PdfViewerApp {
    fn drop(&mut self) {
        self.handle.detach();
        self.handle.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_secs(2));
        }
    }
}
