//! Debounced coalescing of rapid property edits
//!
//! Continuous edits to one annotation (dragging an opacity slider, typing in a
//! text box) are buffered: the state before the first edit is kept, and every
//! further edit to the same annotation pushes the deadline back. When the
//! deadline passes, or a different annotation is edited, the buffer becomes a
//! single modify command from the buffered original to the latest state.

use crate::annotation::{Annotation, AnnotationId};
use crate::clock::Timestamp;
use crate::command::{Change, Command};
use crate::document::{DocumentContent, DocumentId};

/// The one buffered edit awaiting its deadline
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    document: DocumentId,
    before: Annotation,
    deadline: Timestamp,
}

impl PendingEdit {
    /// Start buffering with the annotation's state before the first edit
    pub fn new(document: DocumentId, before: Annotation, now: Timestamp, delay_ms: u64) -> Self {
        Self {
            document,
            before,
            deadline: now.plus_millis(delay_ms),
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn annotation_id(&self) -> AnnotationId {
        self.before.id()
    }

    /// Annotation state captured before the first buffered edit
    pub fn before(&self) -> &Annotation {
        &self.before
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    /// Whether this buffer belongs to the given (document, annotation) pair
    pub fn is_for(&self, document: DocumentId, id: &AnnotationId) -> bool {
        self.document == document && self.before.id() == *id
    }

    /// Push the deadline back after another edit to the same pair
    pub fn restart(&mut self, now: Timestamp, delay_ms: u64) {
        self.deadline = now.plus_millis(delay_ms);
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.deadline
    }

    /// Modify command from the buffered original to the annotation's current state
    ///
    /// `None` when the edits cancelled out or the annotation is gone.
    pub fn into_command(self, content: &DocumentContent) -> Option<Command> {
        let id = self.before.id();
        let Some(current) = content.annotations.get(&id) else {
            tracing::debug!(%id, "buffered annotation was removed before flush");
            return None;
        };
        Change::non_trivial(self.before, current.clone()).map(Command::ModifyAnnotation)
    }
}
