//! Lifecycle of the one document handle a viewer may hold.

use std::sync::Arc;

use crate::engine::DocumentHandle;
use crate::types::{DocumentId, DocumentLoadError, DocumentReference};

/// Identifies one call to [`DocumentSession::open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    id: u64,
    reference: DocumentReference,
}

impl OpenTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }
}

/// Result of resolving an open ticket
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Loaded {
        document: DocumentId,
        page_count: usize,
    },
    Failed(DocumentLoadError),
    /// The ticket was abandoned; a resolved handle has already been released
    Superseded,
}

struct AdoptedDocument {
    id: DocumentId,
    reference: DocumentReference,
    handle: Arc<dyn DocumentHandle>,
}

pub struct DocumentSession {
    current: Option<AdoptedDocument>,
    pending: Option<OpenTicket>,
    next_ticket: u64,
    next_document: u64,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self {
            current: None,
            pending: None,
            next_ticket: 0,
            next_document: 0,
        }
    }

    /// Begin opening `reference`, releasing whatever is currently adopted.
    ///
    /// Returns `None` when the reference is already adopted or pending.
    pub fn open(&mut self, reference: DocumentReference) -> Option<OpenTicket> {
        if self.reference() == Some(&reference) {
            log::debug!("Ignoring open of unchanged reference {}", reference);
            return None;
        }

        self.release_current();

        self.next_ticket += 1;
        let ticket = OpenTicket {
            id: self.next_ticket,
            reference,
        };
        self.pending = Some(ticket.clone());
        Some(ticket)
    }

    pub fn finish_open(
        &mut self,
        ticket: &OpenTicket,
        result: Result<Arc<dyn DocumentHandle>, DocumentLoadError>,
    ) -> OpenOutcome {
        let is_pending = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.id == ticket.id);

        if !is_pending {
            if let Ok(handle) = result {
                log::debug!("Releasing superseded document {}", ticket.reference);
                handle.release();
            }
            return OpenOutcome::Superseded;
        }

        self.pending = None;
        match result {
            Ok(handle) => {
                self.next_document += 1;
                let id = DocumentId(self.next_document);
                let page_count = handle.page_count();
                self.current = Some(AdoptedDocument {
                    id,
                    reference: ticket.reference.clone(),
                    handle,
                });
                OpenOutcome::Loaded {
                    document: id,
                    page_count,
                }
            }
            Err(e) => OpenOutcome::Failed(e),
        }
    }

    /// Release the adopted handle and abandon any pending open. Idempotent.
    pub fn close(&mut self) -> Option<DocumentId> {
        self.pending = None;
        self.release_current()
    }

    fn release_current(&mut self) -> Option<DocumentId> {
        self.current.take().map(|document| {
            document.handle.release();
            document.id
        })
    }

    pub fn handle(&self) -> Option<&Arc<dyn DocumentHandle>> {
        self.current.as_ref().map(|document| &document.handle)
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.current.as_ref().map(|document| document.id)
    }

    /// Reference being loaded, or else the one adopted
    pub fn reference(&self) -> Option<&DocumentReference> {
        self.pending
            .as_ref()
            .map(|ticket| &ticket.reference)
            .or_else(|| self.current.as_ref().map(|document| &document.reference))
    }

    pub fn page_count(&self) -> usize {
        self.current
            .as_ref()
            .map(|document| document.handle.page_count())
            .unwrap_or(0)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.close();
    }
}
