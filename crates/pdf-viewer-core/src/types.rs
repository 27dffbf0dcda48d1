use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Failure to turn a document reference into an open handle.
///
/// Fatal to that one load attempt; the viewer stays empty.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentLoadError {
    #[error("Malformed document reference: {0}")]
    MalformedReference(String),
    #[error("Failed to fetch document: {0}")]
    Fetch(String),
    #[error("Unsupported or corrupt document: {0}")]
    Unsupported(String),
    #[error("Document engine unavailable: {0}")]
    EngineUnavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageFetchError {
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    OutOfRange { page: usize, page_count: usize },
    #[error("Document handle has been released")]
    Released,
    #[error("Failed to fetch page: {0}")]
    Engine(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Page has invalid natural size {width}x{height}")]
    InvalidPageSize { width: f32, height: f32 },
    #[error("Document handle has been released")]
    Released,
    #[error("Failed to render page: {0}")]
    Engine(String),
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to load document: {0}")]
    Load(#[from] DocumentLoadError),
    #[error("Page fetch error: {0}")]
    PageFetch(#[from] PageFetchError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

/// Opaque locator of the document to display (a path or a `file://` URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentReference(String);

impl DocumentReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the reference, without query or fragment.
    pub fn display_name(&self) -> &str {
        let without_query = self.0.split(['?', '#']).next().unwrap_or_default();
        without_query
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.0)
    }

    /// Resolve the reference to a local file path.
    ///
    /// Accepts bare paths and `file://` URLs; any other scheme is rejected.
    pub fn to_local_path(&self) -> std::result::Result<PathBuf, DocumentLoadError> {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            return Err(DocumentLoadError::MalformedReference(
                "empty reference".to_string(),
            ));
        }

        if let Some(path) = trimmed.strip_prefix("file://") {
            if path.is_empty() {
                return Err(DocumentLoadError::MalformedReference(self.0.clone()));
            }
            return Ok(PathBuf::from(path));
        }

        if let Some((scheme, _)) = trimmed.split_once("://") {
            return Err(DocumentLoadError::MalformedReference(format!(
                "unsupported scheme '{}' in {}",
                scheme, self.0
            )));
        }

        Ok(PathBuf::from(trimmed))
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentReference {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for DocumentReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&Path> for DocumentReference {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for DocumentReference {
    fn from(path: PathBuf) -> Self {
        Self::from(path.as_path())
    }
}

/// Identity of one adopted document handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// Live size of the area available for displaying a page, in display units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionSize {
    pub width: f32,
    pub height: f32,
}

impl RegionSize {
    pub const ZERO: RegionSize = RegionSize {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Non-positive or non-finite sizes are a transient layout state, not an error
    pub fn is_renderable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl fmt::Display for RegionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Natural size of a page at scale 1, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// RGBA pixels for one rendered page
#[derive(Clone, PartialEq, Eq)]
pub struct RasterSurface {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Surface filled with a single color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self::new(width, height, rgba.repeat(pixels))
    }

    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

impl fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_strips_directories_and_query() {
        let reference = DocumentReference::new("https://example.com/docs/report.pdf?token=1#page=2");
        assert_eq!(reference.display_name(), "report.pdf");

        let reference = DocumentReference::new("C:\\papers\\thesis.pdf");
        assert_eq!(reference.display_name(), "thesis.pdf");

        let reference = DocumentReference::new("plain.pdf");
        assert_eq!(reference.display_name(), "plain.pdf");
    }

    #[test]
    fn test_local_path_resolution() {
        let reference = DocumentReference::new("file:///tmp/a.pdf");
        assert_eq!(reference.to_local_path().unwrap(), PathBuf::from("/tmp/a.pdf"));

        let reference = DocumentReference::new("/tmp/b.pdf");
        assert_eq!(reference.to_local_path().unwrap(), PathBuf::from("/tmp/b.pdf"));

        assert!(matches!(
            DocumentReference::new("   ").to_local_path(),
            Err(DocumentLoadError::MalformedReference(_))
        ));
        assert!(matches!(
            DocumentReference::new("ftp://host/c.pdf").to_local_path(),
            Err(DocumentLoadError::MalformedReference(_))
        ));
    }

    #[test]
    fn test_region_size_renderable() {
        assert!(RegionSize::new(300.0, 600.0).is_renderable());
        assert!(!RegionSize::ZERO.is_renderable());
        assert!(!RegionSize::new(-1.0, 600.0).is_renderable());
        assert!(!RegionSize::new(300.0, f32::NAN).is_renderable());
        assert!(!RegionSize::new(f32::INFINITY, 10.0).is_renderable());
    }

    #[test]
    fn test_filled_surface_size() {
        let surface = RasterSurface::filled(3, 2, [255, 0, 0, 255]);
        assert_eq!(surface.byte_len(), 3 * 2 * 4);
        assert_eq!(&surface.rgba[..4], &[255, 0, 0, 255]);
    }
}
