#![cfg(feature = "pdfium")]

use pdf_viewer_core::pdfium::PdfiumEngine;
use pdf_viewer_core::{
    DocumentEngine, DocumentLoadError, DocumentReference, PageFetchError, RegionSize, fit_scale,
};
use std::io::Write;
use std::sync::Arc;
use std::thread;

/// Minimal single-page letter-size document
const SAMPLE_PDF: &[u8] = b"%PDF-1.4
1 0 obj
<<
/Type /Catalog
/Pages 2 0 R
>>
endobj
2 0 obj
<<
/Type /Pages
/Kids [3 0 R]
/Count 1
>>
endobj
3 0 obj
<<
/Type /Page
/Parent 2 0 R
/Resources <<
/Font <<
/F1 <<
/Type /Font
/Subtype /Type1
/BaseFont /Helvetica
>>
>>
>>
/MediaBox [0 0 612 792]
/Contents 4 0 R
>>
endobj
4 0 obj
<<
/Length 44
>>
stream
BT
/F1 24 Tf
100 700 Td
(Hello World) Tj
ET
endstream
endobj
xref
0 5
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000317 00000 n
trailer
<<
/Size 5
/Root 1 0 R
>>
startxref
410
%%EOF
";

fn pdfium_available() -> bool {
    let available = PdfiumEngine::is_available();
    if !available {
        eprintln!("skipping: pdfium library not found");
    }
    available
}

fn sample_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .unwrap();
    file.write_all(SAMPLE_PDF).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_open_and_render_fit_to_region() {
    if !pdfium_available() {
        return;
    }
    let file = sample_file();
    let engine = PdfiumEngine::new();

    let handle = engine.open(&DocumentReference::from(file.path())).unwrap();
    assert_eq!(handle.page_count(), 1);

    let page = handle.page(1).unwrap();
    let size = page.natural_size();
    assert!((size.width - 612.0).abs() < 0.5);
    assert!((size.height - 792.0).abs() < 0.5);

    let scale = fit_scale(size, RegionSize::new(300.0, 600.0)).unwrap();
    let surface = page.render_at(scale).unwrap();
    assert!(surface.width.abs_diff(300) <= 1);
    assert_eq!(surface.byte_len(), (surface.width * surface.height * 4) as usize);
    assert!(surface.rgba.iter().any(|&b| b != 0));

    handle.release();
    assert!(matches!(handle.page(1), Err(PageFetchError::Released)));
}

#[test]
fn test_overlapping_renders_from_many_threads() {
    if !pdfium_available() {
        return;
    }
    let file = sample_file();
    let handle = PdfiumEngine::new()
        .open(&DocumentReference::from(file.path()))
        .unwrap();

    // Resize churn keeps several jobs on the blocking pool at once
    let renders: Vec<_> = (0..6)
        .map(|i| {
            let handle = Arc::clone(&handle);
            thread::spawn(move || {
                let page = handle.page(1).unwrap();
                page.render_at(0.25 + 0.05 * i as f32).unwrap()
            })
        })
        .collect();

    for (i, render) in renders.into_iter().enumerate() {
        let surface = render.join().unwrap();
        let expected = (612.0 * (0.25 + 0.05 * i as f32)).round() as u32;
        assert!(surface.width.abs_diff(expected) <= 1);
        assert_eq!(surface.byte_len(), (surface.width * surface.height * 4) as usize);
    }
}

#[test]
fn test_out_of_range_page() {
    if !pdfium_available() {
        return;
    }
    let file = sample_file();
    let handle = PdfiumEngine::new()
        .open(&DocumentReference::from(file.path()))
        .unwrap();

    assert!(matches!(
        handle.page(2),
        Err(PageFetchError::OutOfRange {
            page: 2,
            page_count: 1
        })
    ));
    assert!(handle.page(0).is_err());
}

#[test]
fn test_missing_file_fails_to_load() {
    let result = PdfiumEngine::new().open(&DocumentReference::new("/definitely/not/here.pdf"));
    assert!(matches!(result, Err(DocumentLoadError::Fetch(_))));
}

#[test]
fn test_remote_reference_is_rejected() {
    let result = PdfiumEngine::new().open(&DocumentReference::new("https://example.com/a.pdf"));
    assert!(matches!(result, Err(DocumentLoadError::MalformedReference(_))));
}
