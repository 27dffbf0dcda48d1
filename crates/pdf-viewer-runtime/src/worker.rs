use pdf_viewer_core::{
    DocumentEngine, DocumentHandle, DocumentLoadError, DocumentReference, OpenOutcome,
    OpenTicket, Refresh, RegionSize, RenderJob, RenderOutcome, RenderRequest, RenderedPage,
    Schedule, ViewerError, ViewerOptions, ViewerState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{ViewerCommand, ViewerSnapshot, ViewerUpdate};

/// Completions reported back to the worker by spawned tasks
enum WorkerEvent {
    Opened {
        ticket: OpenTicket,
        result: Result<Arc<dyn DocumentHandle>, DocumentLoadError>,
    },
    Rendered {
        request: RenderRequest,
        result: pdf_viewer_core::Result<Option<RenderedPage>>,
    },
    ResizeSettled {
        token: u64,
        size: RegionSize,
    },
}

/// Async worker task that owns the viewer state and serializes every decision
pub(crate) async fn worker_task(
    engine: Arc<dyn DocumentEngine>,
    options: ViewerOptions,
    mut command_rx: mpsc::UnboundedReceiver<ViewerCommand>,
    update_tx: mpsc::UnboundedSender<ViewerUpdate>,
) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut worker = Worker {
        engine,
        options,
        state: ViewerState::new(),
        update_tx,
        event_tx,
        resize_token: 0,
        renders_in_flight: 0,
    };

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(ViewerCommand::Shutdown) | None => break,
                Some(command) => worker.handle_command(command),
            },
            Some(event) = event_rx.recv() => worker.handle_event(event),
        }
    }

    release_pending(&mut event_rx);
    worker.shutdown();
}

/// Close the event channel and release documents that resolved too late.
///
/// Once closed, opens still running see a send error and release their own
/// handle in `spawn_open`.
fn release_pending(event_rx: &mut mpsc::UnboundedReceiver<WorkerEvent>) {
    event_rx.close();
    while let Ok(event) = event_rx.try_recv() {
        if let WorkerEvent::Opened {
            ticket,
            result: Ok(handle),
        } = event
        {
            log::debug!("Releasing {} opened during shutdown", ticket.reference());
            handle.release();
        }
    }
}

struct Worker {
    engine: Arc<dyn DocumentEngine>,
    options: ViewerOptions,
    state: ViewerState,
    update_tx: mpsc::UnboundedSender<ViewerUpdate>,
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
    resize_token: u64,
    renders_in_flight: usize,
}

impl Worker {
    fn handle_command(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::Open { reference } => self.open(reference),
            ViewerCommand::Close => {
                if let Some(document) = self.state.close() {
                    log::info!("Closed document {:?}", document);
                    self.send(ViewerUpdate::DocumentClosed { document });
                }
                self.publish_toolbar();
                self.refresh();
            }
            ViewerCommand::Attach { size } => {
                // A pending coalesced resize is older than this layout
                self.resize_token += 1;
                self.state.attach(size);
                self.refresh();
            }
            ViewerCommand::Resize { size } => match self.options.resize_debounce() {
                Some(window) => self.debounce_resize(size, window),
                None => self.apply_resize(size),
            },
            ViewerCommand::Detach => {
                self.resize_token += 1;
                self.state.detach();
                self.refresh();
            }
            ViewerCommand::Navigate { intent } => {
                let change = self.state.navigate(intent);
                if change.changed {
                    log::debug!("Navigated to page {}", change.page);
                    self.publish_toolbar();
                    self.refresh();
                }
            }
            ViewerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            ViewerCommand::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Opened { ticket, result } => self.finish_open(ticket, result),
            WorkerEvent::Rendered { request, result } => {
                self.renders_in_flight = self.renders_in_flight.saturating_sub(1);
                self.finish_render(request, result);
            }
            WorkerEvent::ResizeSettled { token, size } => {
                if token == self.resize_token {
                    self.apply_resize(size);
                } else {
                    log::debug!("Dropping coalesced resize to {}", size);
                }
            }
        }
    }

    fn open(&mut self, reference: DocumentReference) {
        let previous = self.state.document();
        let Some(ticket) = self.state.open(reference.clone()) else {
            return;
        };

        if let Some(document) = previous {
            self.send(ViewerUpdate::DocumentClosed { document });
        }
        log::info!("Loading {}", reference);
        self.send(ViewerUpdate::DocumentLoading { reference });
        self.publish_toolbar();
        self.refresh();
        self.spawn_open(ticket);
    }

    fn finish_open(
        &mut self,
        ticket: OpenTicket,
        result: Result<Arc<dyn DocumentHandle>, DocumentLoadError>,
    ) {
        match self.state.finish_open(&ticket, result) {
            OpenOutcome::Loaded {
                document,
                page_count,
            } => {
                log::info!("Loaded {} with {} pages", ticket.reference(), page_count);
                self.send(ViewerUpdate::DocumentLoaded {
                    document,
                    reference: ticket.reference().clone(),
                    page_count,
                });
                self.publish_toolbar();
                self.refresh();
            }
            OpenOutcome::Failed(e) => {
                log::error!("Failed to load {}: {}", ticket.reference(), e);
                self.send(ViewerUpdate::DocumentLoadFailed {
                    reference: ticket.reference().clone(),
                    message: format!("Failed to load document: {}", e),
                });
                self.publish_toolbar();
            }
            OpenOutcome::Superseded => {
                log::debug!("Discarded superseded open of {}", ticket.reference());
            }
        }
    }

    fn finish_render(
        &mut self,
        request: RenderRequest,
        result: pdf_viewer_core::Result<Option<RenderedPage>>,
    ) {
        match self.state.complete(request, result) {
            RenderOutcome::Committed { frame, released } => {
                if let Some(released) = released {
                    log::debug!(
                        "Replaced frame {:?} with {:?}",
                        released.request.generation,
                        frame.request.generation
                    );
                }
                log::debug!(
                    "Committed page {} at scale {:.4} ({}x{})",
                    frame.request.page,
                    frame.scale,
                    frame.surface.width,
                    frame.surface.height
                );
                self.send(ViewerUpdate::FrameCommitted { frame });
            }
            RenderOutcome::Discarded(generation) => {
                self.send(ViewerUpdate::RenderDiscarded { generation });
            }
            RenderOutcome::Failed { request, error } => {
                self.send(ViewerUpdate::RenderFailed {
                    generation: request.generation,
                    page: request.page,
                    message: error.to_string(),
                });
            }
        }
    }

    fn apply_resize(&mut self, size: RegionSize) {
        if self.state.resize(size) {
            self.refresh();
        }
    }

    fn debounce_resize(&mut self, size: RegionSize, window: Duration) {
        self.resize_token += 1;
        let token = self.resize_token;
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = event_tx.send(WorkerEvent::ResizeSettled { token, size });
        });
    }

    fn refresh(&mut self) {
        let Refresh { schedule, cleared } = self.state.refresh();
        if cleared.is_some() {
            self.send(ViewerUpdate::FrameCleared);
        }

        match schedule {
            Schedule::Render(job) => self.spawn_render(job),
            Schedule::Suppressed(generation) => {
                log::debug!("Nothing to render for {:?}", generation);
            }
            Schedule::Unchanged => {}
        }
    }

    fn spawn_open(&self, ticket: OpenTicket) {
        let engine = Arc::clone(&self.engine);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let reference = ticket.reference().clone();
            let result = match tokio::task::spawn_blocking(move || engine.open(&reference)).await
            {
                Ok(result) => result,
                Err(e) => Err(DocumentLoadError::EngineUnavailable(format!(
                    "Task join error: {}",
                    e
                ))),
            };

            // The worker is gone; nobody else will release this handle
            if let Err(mpsc::error::SendError(WorkerEvent::Opened {
                result: Ok(handle),
                ..
            })) = event_tx.send(WorkerEvent::Opened { ticket, result })
            {
                handle.release();
            }
        });
    }

    fn spawn_render(&mut self, job: RenderJob) {
        log::debug!(
            "Rendering page {} into {} for {:?}",
            job.request.page,
            job.request.region,
            job.request.generation
        );
        self.renders_in_flight += 1;
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let request = job.request;
            let result = match tokio::task::spawn_blocking(move || job.run()).await {
                Ok(result) => result,
                Err(e) => Err(ViewerError::TaskJoin(e)),
            };
            let _ = event_tx.send(WorkerEvent::Rendered { request, result });
        });
    }

    fn publish_toolbar(&self) {
        self.send(ViewerUpdate::ToolbarChanged {
            toolbar: self.state.toolbar(),
        });
    }

    fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            toolbar: self.state.toolbar(),
            inputs: self.state.inputs(),
            frame: self.state.display().frame().cloned(),
            commit_count: self.state.display().commit_count(),
            renders_in_flight: self.renders_in_flight,
        }
    }

    fn shutdown(&mut self) {
        let document = self.state.document();
        let released = self.state.teardown();
        if let Some(document) = document {
            self.send(ViewerUpdate::DocumentClosed { document });
        }
        if released.is_some() {
            self.send(ViewerUpdate::FrameCleared);
        }
        log::info!("Viewer shut down");
        self.send(ViewerUpdate::Shutdown);
    }

    fn send(&self, update: ViewerUpdate) {
        let _ = self.update_tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_viewer_core::{DocumentSession, PageFetchError, PageRef};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Handle {
        released: AtomicBool,
    }

    impl DocumentHandle for Handle {
        fn page_count(&self) -> usize {
            1
        }

        fn page(&self, _page_number: usize) -> Result<Box<dyn PageRef>, PageFetchError> {
            Err(PageFetchError::Released)
        }

        fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
        }

        fn is_released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_queued_open_is_released_on_shutdown() {
        let mut session = DocumentSession::new();
        let ticket = session.open(DocumentReference::new("a.pdf")).unwrap();
        let handle = Arc::new(Handle::default());
        let shared: Arc<dyn DocumentHandle> = handle.clone();

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        assert!(
            event_tx
                .send(WorkerEvent::Opened {
                    ticket,
                    result: Ok(shared),
                })
                .is_ok()
        );
        assert!(
            event_tx
                .send(WorkerEvent::ResizeSettled {
                    token: 1,
                    size: RegionSize::new(10.0, 10.0),
                })
                .is_ok()
        );

        release_pending(&mut event_rx);

        assert!(handle.is_released());
        assert!(event_rx.try_recv().is_err());
    }

    #[test]
    fn test_open_after_close_is_refused() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkerEvent>();
        release_pending(&mut event_rx);

        let mut session = DocumentSession::new();
        let ticket = session.open(DocumentReference::new("b.pdf")).unwrap();
        let handle: Arc<dyn DocumentHandle> = Arc::new(Handle::default());
        let sent = event_tx.send(WorkerEvent::Opened {
            ticket,
            result: Ok(handle),
        });

        // spawn_open releases the handle it gets back here
        let Err(mpsc::error::SendError(WorkerEvent::Opened {
            result: Ok(returned),
            ..
        })) = sent
        else {
            panic!("send to a closed worker must fail");
        };
        returned.release();
        assert!(returned.is_released());
    }
}
