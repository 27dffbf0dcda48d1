#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use pdf_viewer_runtime::{AppLogger, DocumentReference, ViewerOptions};
use std::path::PathBuf;

mod app;
mod views;

#[derive(Parser)]
#[command(name = "pdfv-gui", about = "Fit-to-region PDF page viewer", version)]
struct Args {
    /// Document to open on startup
    document: Option<PathBuf>,

    /// Viewer options file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("pdfv-worker")
        .build()
        .context("Failed to start async runtime")?;

    let options = match &args.config {
        Some(path) => runtime
            .block_on(ViewerOptions::load(path))
            .with_context(|| format!("Failed to read options from {}", path.display()))?,
        None => ViewerOptions::default(),
    };

    let logger = AppLogger::new(options.log_capacity);
    logger.init()?;

    let initial = args.document.map(DocumentReference::from);
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 1000.0])
            .with_title("PDF Viewer")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Viewer",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(app::PdfViewerApp::new(
                cc, runtime, options, logger, initial,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))
}
