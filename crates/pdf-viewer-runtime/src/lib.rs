use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub mod logger;
mod worker;

pub use logger::{AppLogger, LogEntry};

// Re-export types from the core crate
pub use pdf_viewer_core::{
    CommittedFrame, DocumentEngine, DocumentId, DocumentReference, Generation, NavigationIntent,
    RasterSurface, RegionSize, RenderInputs, ToolbarState, ViewerOptions,
};

/// Commands sent from the UI to the viewer worker
#[derive(Debug)]
pub enum ViewerCommand {
    Open {
        reference: DocumentReference,
    },
    Close,
    /// The display region was laid out for the first time
    Attach {
        size: RegionSize,
    },
    Resize {
        size: RegionSize,
    },
    Detach,
    Navigate {
        intent: NavigationIntent,
    },
    Snapshot {
        reply: oneshot::Sender<ViewerSnapshot>,
    },
    Shutdown,
}

/// Updates sent from the viewer worker to the UI
#[derive(Debug, Clone)]
pub enum ViewerUpdate {
    DocumentLoading {
        reference: DocumentReference,
    },
    DocumentLoaded {
        document: DocumentId,
        reference: DocumentReference,
        page_count: usize,
    },
    DocumentLoadFailed {
        reference: DocumentReference,
        message: String,
    },
    DocumentClosed {
        document: DocumentId,
    },
    ToolbarChanged {
        toolbar: ToolbarState,
    },
    FrameCommitted {
        frame: CommittedFrame,
    },
    FrameCleared,
    RenderDiscarded {
        generation: Generation,
    },
    RenderFailed {
        generation: Generation,
        page: usize,
        message: String,
    },
    Shutdown,
}

/// Point-in-time view of the worker's state
#[derive(Debug, Clone)]
pub struct ViewerSnapshot {
    pub toolbar: ToolbarState,
    pub inputs: RenderInputs,
    pub frame: Option<CommittedFrame>,
    pub commit_count: u64,
    pub renders_in_flight: usize,
}

/// Cloneable sender side of a running viewer
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    command_tx: mpsc::UnboundedSender<ViewerCommand>,
}

impl ViewerHandle {
    /// Returns `false` once the worker has stopped
    pub fn send(&self, command: ViewerCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }

    pub fn open(&self, reference: impl Into<DocumentReference>) -> bool {
        self.send(ViewerCommand::Open {
            reference: reference.into(),
        })
    }

    pub fn close(&self) -> bool {
        self.send(ViewerCommand::Close)
    }

    pub fn attach(&self, width: f32, height: f32) -> bool {
        self.send(ViewerCommand::Attach {
            size: RegionSize::new(width, height),
        })
    }

    pub fn resize(&self, width: f32, height: f32) -> bool {
        self.send(ViewerCommand::Resize {
            size: RegionSize::new(width, height),
        })
    }

    pub fn detach(&self) -> bool {
        self.send(ViewerCommand::Detach)
    }

    pub fn next_page(&self) -> bool {
        self.navigate(NavigationIntent::Next)
    }

    pub fn previous_page(&self) -> bool {
        self.navigate(NavigationIntent::Previous)
    }

    pub fn go_to(&self, page: usize) -> bool {
        self.navigate(NavigationIntent::GoTo(page))
    }

    pub fn navigate(&self, intent: NavigationIntent) -> bool {
        self.send(ViewerCommand::Navigate { intent })
    }

    /// Ask the worker for its state after every command sent so far
    pub async fn snapshot(&self) -> Option<ViewerSnapshot> {
        let (reply, rx) = oneshot::channel();
        if !self.send(ViewerCommand::Snapshot { reply }) {
            return None;
        }
        rx.await.ok()
    }

    pub fn shutdown(&self) -> bool {
        self.send(ViewerCommand::Shutdown)
    }
}

/// A spawned viewer worker
pub struct Viewer {
    pub handle: ViewerHandle,
    pub updates: mpsc::UnboundedReceiver<ViewerUpdate>,
    pub task: JoinHandle<()>,
}

/// Spawn the viewer worker on `runtime`
pub fn spawn_viewer(
    runtime: &tokio::runtime::Handle,
    engine: Arc<dyn DocumentEngine>,
    options: ViewerOptions,
) -> Viewer {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, updates) = mpsc::unbounded_channel();

    let task = runtime.spawn(worker::worker_task(engine, options, command_rx, update_tx));

    Viewer {
        handle: ViewerHandle { command_tx },
        updates,
        task,
    }
}
