//! In-memory engine whose opens and renders can be held back by the test.

#![allow(dead_code)]

use pdf_viewer_core::{
    DocumentEngine, DocumentHandle, DocumentLoadError, DocumentReference, PageFetchError, PageRef,
    PageSize, RasterSurface, RenderError,
};
use pdf_viewer_runtime::{Viewer, ViewerOptions, ViewerUpdate, spawn_viewer};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound on how long a gated call waits for its release
const GATE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a test waits for an expected update
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

pub const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

#[derive(Default)]
struct GateState {
    gated: HashSet<String>,
    released: HashSet<String>,
    waiting: HashSet<String>,
}

#[derive(Default)]
pub struct Gates {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Gates {
    pub fn hold(&self, key: impl Into<String>) {
        self.state.lock().unwrap().gated.insert(key.into());
    }

    pub fn release(&self, key: &str) {
        self.state.lock().unwrap().released.insert(key.to_string());
        self.changed.notify_all();
    }

    /// Whether a call is currently blocked on `key`
    pub fn is_waiting(&self, key: &str) -> bool {
        self.state.lock().unwrap().waiting.contains(key)
    }

    fn pass(&self, key: &str) {
        let mut guard = self.state.lock().unwrap();
        guard.waiting.insert(key.to_string());
        let (mut guard, _) = self
            .changed
            .wait_timeout_while(guard, GATE_TIMEOUT, |state| {
                state.gated.contains(key) && !state.released.contains(key)
            })
            .unwrap();
        guard.waiting.remove(key);
    }
}

pub fn open_key(reference: &str) -> String {
    format!("open:{}", reference)
}

/// Renders are keyed by the surface width they produce
pub fn render_key(reference: &str, page: usize, width: u32) -> String {
    format!("render:{}:{}:{}", reference, page, width)
}

#[derive(Default)]
pub struct ScriptedEngine {
    documents: Mutex<HashMap<String, Vec<PageSize>>>,
    failing_pages: Mutex<HashSet<(String, usize)>>,
    opened: Mutex<Vec<(String, Arc<ScriptedDocument>)>>,
    render_calls: Arc<Mutex<Vec<String>>>,
    pub gates: Arc<Gates>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_document(&self, reference: &str, page_count: usize) {
        self.documents
            .lock()
            .unwrap()
            .insert(reference.to_string(), vec![LETTER; page_count]);
    }

    pub fn fail_page(&self, reference: &str, page: usize) {
        self.failing_pages
            .lock()
            .unwrap()
            .insert((reference.to_string(), page));
    }

    /// Every handle the engine opened for `reference`, in order
    pub fn handles(&self, reference: &str) -> Vec<Arc<ScriptedDocument>> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == reference)
            .map(|(_, handle)| Arc::clone(handle))
            .collect()
    }

    pub fn render_calls(&self) -> Vec<String> {
        self.render_calls.lock().unwrap().clone()
    }

    pub fn render_calls_for(&self, reference: &str) -> usize {
        let prefix = format!("render:{}:", reference);
        self.render_calls()
            .iter()
            .filter(|key| key.starts_with(&prefix))
            .count()
    }
}

impl DocumentEngine for ScriptedEngine {
    fn open(
        &self,
        reference: &DocumentReference,
    ) -> Result<Arc<dyn DocumentHandle>, DocumentLoadError> {
        self.gates.pass(&open_key(reference.as_str()));

        let pages = self
            .documents
            .lock()
            .unwrap()
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| DocumentLoadError::Fetch(format!("{} not found", reference)))?;

        let failing_pages = self
            .failing_pages
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == reference.as_str())
            .map(|(_, page)| *page)
            .collect();

        let document = Arc::new(ScriptedDocument {
            reference: reference.as_str().to_string(),
            pages,
            failing_pages,
            released: AtomicBool::new(false),
            render_calls: Arc::clone(&self.render_calls),
            gates: Arc::clone(&self.gates),
        });
        self.opened
            .lock()
            .unwrap()
            .push((reference.as_str().to_string(), Arc::clone(&document)));
        Ok(document)
    }
}

pub struct ScriptedDocument {
    reference: String,
    pages: Vec<PageSize>,
    failing_pages: HashSet<usize>,
    released: AtomicBool,
    render_calls: Arc<Mutex<Vec<String>>>,
    gates: Arc<Gates>,
}

impl ScriptedDocument {
    pub fn is_released_now(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl DocumentHandle for ScriptedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, page_number: usize) -> Result<Box<dyn PageRef>, PageFetchError> {
        if self.is_released() {
            return Err(PageFetchError::Released);
        }
        if self.failing_pages.contains(&page_number) {
            return Err(PageFetchError::Engine(format!(
                "page {} is damaged",
                page_number
            )));
        }
        let size = page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .copied()
            .ok_or(PageFetchError::OutOfRange {
                page: page_number,
                page_count: self.pages.len(),
            })?;

        Ok(Box::new(ScriptedPage {
            reference: self.reference.clone(),
            page: page_number,
            size,
            render_calls: Arc::clone(&self.render_calls),
            gates: Arc::clone(&self.gates),
        }))
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct ScriptedPage {
    reference: String,
    page: usize,
    size: PageSize,
    render_calls: Arc<Mutex<Vec<String>>>,
    gates: Arc<Gates>,
}

impl PageRef for ScriptedPage {
    fn natural_size(&self) -> PageSize {
        self.size
    }

    fn render_at(&self, scale: f32) -> Result<RasterSurface, RenderError> {
        let width = (self.size.width * scale).round() as u32;
        let height = (self.size.height * scale).round() as u32;
        let key = render_key(&self.reference, self.page, width);

        self.render_calls.lock().unwrap().push(key.clone());
        self.gates.pass(&key);
        Ok(RasterSurface::filled(width, height, [255, 255, 255, 255]))
    }
}

pub fn start(engine: &Arc<ScriptedEngine>, options: ViewerOptions) -> Viewer {
    let engine: Arc<dyn DocumentEngine> = engine.clone();
    spawn_viewer(&tokio::runtime::Handle::current(), engine, options)
}

/// Wait for the first update matching `predicate`, skipping the others
pub async fn wait_for(
    updates: &mut mpsc::UnboundedReceiver<ViewerUpdate>,
    mut predicate: impl FnMut(&ViewerUpdate) -> bool,
) -> ViewerUpdate {
    tokio::time::timeout(UPDATE_TIMEOUT, async {
        loop {
            match updates.recv().await {
                Some(update) if predicate(&update) => return update,
                Some(_) => continue,
                None => panic!("viewer stopped before the expected update"),
            }
        }
    })
    .await
    .expect("timed out waiting for viewer update")
}

/// Collect every update until one matches `predicate` (inclusive)
pub async fn collect_until(
    updates: &mut mpsc::UnboundedReceiver<ViewerUpdate>,
    mut predicate: impl FnMut(&ViewerUpdate) -> bool,
) -> Vec<ViewerUpdate> {
    let mut seen = Vec::new();
    tokio::time::timeout(UPDATE_TIMEOUT, async {
        loop {
            match updates.recv().await {
                Some(update) => {
                    let done = predicate(&update);
                    seen.push(update);
                    if done {
                        return;
                    }
                }
                None => panic!("viewer stopped before the expected update"),
            }
        }
    })
    .await
    .expect("timed out waiting for viewer update");
    seen
}

/// Poll `condition` until it holds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(UPDATE_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}
