//! Document engine backed by pdfium.
//!
//! Pdfium bindings are not shared across threads, so every call binds the
//! library and reopens the file on whichever blocking thread runs it. The
//! library itself is not thread-safe: bind, load and render all happen while
//! holding one process-wide lock, so concurrent render jobs queue up here.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use pdfium_render::prelude::*;

use crate::engine::{DocumentEngine, DocumentHandle, PageRef};
use crate::types::{
    DocumentLoadError, DocumentReference, PageFetchError, PageSize, RasterSurface, RenderError,
};

static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive access to the pdfium library for the lifetime of the guard
pub(crate) fn pdfium_guard() -> MutexGuard<'static, ()> {
    // A panic inside a pdfium call leaves nothing behind worth protecting
    PDFIUM_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Initialize Pdfium, trying the vendored library first, then falling back to system
fn init_pdfium() -> Result<Pdfium, PdfiumError> {
    // Vendored copy lives under the workspace root when running from cargo
    let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    if let Some(vendor_path) = vendor_path {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

fn with_page<T>(
    path: &Path,
    index: u16,
    f: impl FnOnce(&PdfPage<'_>) -> Result<T, PdfiumError>,
) -> Result<T, PdfiumError> {
    let _guard = pdfium_guard();
    let pdfium = init_pdfium()?;
    let document = pdfium.load_pdf_from_file(path, None)?;
    let page = document.pages().get(index)?;
    let result = f(&page);
    result
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumEngine;

impl PdfiumEngine {
    pub fn new() -> Self {
        Self
    }

    /// Whether the pdfium library can be bound in this process
    pub fn is_available() -> bool {
        let _guard = pdfium_guard();
        match init_pdfium() {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Pdfium library unavailable: {}", e);
                false
            }
        }
    }
}

impl DocumentEngine for PdfiumEngine {
    fn open(
        &self,
        reference: &DocumentReference,
    ) -> Result<Arc<dyn DocumentHandle>, DocumentLoadError> {
        let path = reference.to_local_path()?;
        if !path.is_file() {
            return Err(DocumentLoadError::Fetch(format!(
                "{} is not a readable file",
                path.display()
            )));
        }

        let _guard = pdfium_guard();
        let pdfium =
            init_pdfium().map_err(|e| DocumentLoadError::EngineUnavailable(e.to_string()))?;
        let page_count = {
            let document = pdfium
                .load_pdf_from_file(&path, None)
                .map_err(|e| DocumentLoadError::Unsupported(e.to_string()))?;
            document.pages().len() as usize
        };

        log::info!("Opened {} ({} pages)", path.display(), page_count);
        Ok(Arc::new(PdfiumDocument {
            path,
            page_count,
            released: AtomicBool::new(false),
        }))
    }
}

struct PdfiumDocument {
    path: PathBuf,
    page_count: usize,
    released: AtomicBool,
}

impl DocumentHandle for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, page_number: usize) -> Result<Box<dyn PageRef>, PageFetchError> {
        if self.is_released() {
            return Err(PageFetchError::Released);
        }
        if page_number == 0 || page_number > self.page_count {
            return Err(PageFetchError::OutOfRange {
                page: page_number,
                page_count: self.page_count,
            });
        }

        let index = (page_number - 1) as u16;
        let size = with_page(&self.path, index, |page| {
            Ok(PageSize::new(page.width().value, page.height().value))
        })
        .map_err(|e| PageFetchError::Engine(e.to_string()))?;

        Ok(Box::new(PdfiumPage {
            path: self.path.clone(),
            index,
            size,
        }))
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            log::debug!("Released {}", self.path.display());
        }
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

struct PdfiumPage {
    path: PathBuf,
    index: u16,
    size: PageSize,
}

impl PageRef for PdfiumPage {
    fn natural_size(&self) -> PageSize {
        self.size
    }

    fn render_at(&self, scale: f32) -> Result<RasterSurface, RenderError> {
        with_page(&self.path, self.index, |page| {
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let bitmap = page.render_with_config(&config)?;
            Ok(RasterSurface::new(
                bitmap.width() as u32,
                bitmap.height() as u32,
                bitmap.as_rgba_bytes().to_vec(),
            ))
        })
        .map_err(|e| RenderError::Engine(e.to_string()))
    }
}
