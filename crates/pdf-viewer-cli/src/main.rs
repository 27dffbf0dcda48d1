use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use pdf_viewer_core::pdfium::PdfiumEngine;
use pdf_viewer_core::{DocumentEngine, DocumentReference, PageSize};
use pdf_viewer_runtime::{AppLogger, ViewerOptions, ViewerUpdate, spawn_viewer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "pdfv", about = "Fit-to-region PDF page viewer", version)]
struct Cli {
    /// Viewer options file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the viewer log to stderr on exit
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and page sizes
    Info {
        /// Document path or file:// URL
        document: String,
    },

    /// Render one page fit into a region and save it as PNG
    Render {
        /// Document path or file:// URL
        document: String,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Region width in pixels
        #[arg(long, default_value = "800")]
        width: f32,

        /// Region height in pixels
        #[arg(long, default_value = "1000")]
        height: f32,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = match &cli.config {
        Some(path) => ViewerOptions::load(path)
            .await
            .with_context(|| format!("Failed to read options from {}", path.display()))?,
        None => ViewerOptions::default(),
    };

    let logger = AppLogger::with_level(options.log_capacity, LevelFilter::Debug);
    if cli.verbose {
        logger.init()?;
    }

    let result = match cli.command {
        Commands::Info { document } => info(DocumentReference::new(document)).await,
        Commands::Render {
            document,
            page,
            width,
            height,
            output,
            timeout_secs,
        } => {
            let reference = DocumentReference::new(document);
            let job = render(reference, page, width, height, &output, options);
            match tokio::time::timeout(Duration::from_secs(timeout_secs), job).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "Timed out after {}s waiting for page {}",
                    timeout_secs,
                    page
                )),
            }
        }
    };

    if cli.verbose {
        for entry in logger.entries() {
            eprintln!("{}", entry);
        }
    }

    result
}

async fn info(reference: DocumentReference) -> Result<()> {
    let name = reference.display_name().to_string();
    let sizes = tokio::task::spawn_blocking(move || -> Result<Vec<PageSize>> {
        let handle = PdfiumEngine::new().open(&reference)?;
        let sizes = (1..=handle.page_count())
            .map(|page| Ok(handle.page(page)?.natural_size()))
            .collect::<Result<Vec<_>>>();
        handle.release();
        sizes
    })
    .await??;

    println!("{}", name);
    println!("  Pages: {}", sizes.len());
    for (index, size) in sizes.iter().enumerate() {
        println!(
            "  Page {}: {:.1} x {:.1} pt",
            index + 1,
            size.width,
            size.height
        );
    }
    Ok(())
}

/// Wait for the viewer worker to finish, surfacing a panic as an error
async fn join_worker(task: JoinHandle<()>) -> Result<()> {
    task.await.context("Viewer worker stopped abnormally")
}

async fn render(
    reference: DocumentReference,
    page: usize,
    width: f32,
    height: f32,
    output: &Path,
    options: ViewerOptions,
) -> Result<()> {
    if page == 0 {
        bail!("Pages are numbered from 1");
    }

    let engine: Arc<dyn DocumentEngine> = Arc::new(PdfiumEngine::new());
    let mut viewer = spawn_viewer(&tokio::runtime::Handle::current(), engine, options);

    viewer.handle.attach(width, height);
    viewer.handle.open(reference.clone());

    let frame = loop {
        let Some(update) = viewer.updates.recv().await else {
            bail!("Viewer stopped unexpectedly");
        };
        match update {
            ViewerUpdate::DocumentLoaded { page_count, .. } => {
                if page > page_count {
                    viewer.handle.shutdown();
                    bail!("{} has {} pages, not {}", reference, page_count, page);
                }
                viewer.handle.go_to(page);
            }
            ViewerUpdate::DocumentLoadFailed { message, .. } => bail!(message),
            ViewerUpdate::RenderFailed {
                page: failed,
                message,
                ..
            } if failed == page => bail!(message),
            ViewerUpdate::FrameCommitted { frame } if frame.request.page == page => break frame,
            _ => {}
        }
    };

    viewer.handle.shutdown();
    join_worker(viewer.task).await?;

    let surface = &frame.surface;
    let image = image::RgbaImage::from_raw(surface.width, surface.height, surface.rgba.clone())
        .context("Rendered surface has an unexpected size")?;
    image
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Rendered page {} of {} at scale {:.3} ({}x{}) → {}",
        page,
        reference.display_name(),
        frame.scale,
        surface.width,
        surface.height,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_worker_panic_is_reported() {
        let task: JoinHandle<()> = tokio::spawn(async { panic!("worker crashed") });
        let error = join_worker(task).await.unwrap_err();
        assert!(error.to_string().contains("stopped abnormally"));
    }

    #[tokio::test]
    async fn test_clean_worker_exit() {
        let task = tokio::spawn(async {});
        assert!(join_worker(task).await.is_ok());
    }
}
