//! Editing session
//!
//! The [`Editor`] is the single writer over all open documents. It drives the
//! edit state machine:
//!
//! ```text
//! Idle ──edit──▶ Buffering ──deadline / other target / undo / gesture──▶ Idle
//!  │                                                     (one Modify recorded)
//!  └──begin──▶ Gesturing ──end──▶ Idle (at most one command recorded)
//!                  └──abandon──▶ Idle (snapshots restored, nothing recorded)
//! ```
//!
//! Every timestamp comes from the injected [`Clock`], so deadline behaviour is
//! deterministic under a [`ManualClock`](crate::clock::ManualClock).

use std::sync::Arc;

use crate::alignment::{Alignment, Distribution};
use crate::annotation::{Annotation, AnnotationId, PageCoordinate};
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::coalesce::PendingEdit;
use crate::command::Command;
use crate::config::EngineConfig;
use crate::cursor::{CursorCache, CursorStyle};
use crate::document::{Document, DocumentId, DocumentManager};
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::geometry;
use crate::gesture::{Gesture, GestureKind, Modifiers};
use crate::handles::{self, Handle, HandleRole};
use crate::selection::Selection;
use crate::snapping::{SmartGuides, SnapEngine};

/// What the editor is doing between calls
#[derive(Debug, Default)]
pub enum EditState {
    #[default]
    Idle,
    /// A property edit is waiting for its coalescing deadline
    Buffering(PendingEdit),
    /// A pointer gesture is in progress
    Gesturing(Gesture),
}

pub struct Editor {
    manager: DocumentManager,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    state: EditState,
    snap_engine: SnapEngine,
    cursors: CursorCache,
}

impl Editor {
    /// Create an editor on the system clock
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            manager: DocumentManager::with_undo_limit(config.undo_limit),
            snap_engine: SnapEngine::from_config(&config),
            clock,
            config,
            state: EditState::Idle,
            cursors: CursorCache::new(),
        }
    }

    /// Create an editor configured from `PDF_MARKUP_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_gesturing(&self) -> bool {
        matches!(self.state, EditState::Gesturing(_))
    }

    pub fn has_pending_edit(&self) -> bool {
        matches!(self.state, EditState::Buffering(_))
    }

    pub fn set_smart_guides_enabled(&mut self, enabled: bool) {
        self.config.smart_guides_enabled = enabled;
        self.snap_engine.set_enabled(enabled);
    }

    // Documents

    pub fn documents(&self) -> &DocumentManager {
        &self.manager
    }

    pub fn open_document(&mut self, title: impl Into<String>, page_count: u16) -> DocumentId {
        self.manager.open(title, page_count)
    }

    /// Close a document, settling any edit in flight on it first
    ///
    /// A pending coalesced edit is recorded; a gesture is abandoned.
    pub fn close_document(&mut self, id: DocumentId) -> EngineResult<Document> {
        match &self.state {
            EditState::Buffering(pending) if pending.document() == id => {
                self.flush();
            }
            EditState::Gesturing(gesture) if gesture.document() == id => {
                self.abandon_gesture();
            }
            _ => {}
        }
        self.manager.close(id)
    }

    pub fn document(&self, id: DocumentId) -> EngineResult<&Document> {
        self.manager.get(id)
    }

    /// Mutable document access for recording helpers
    ///
    /// Any pending coalesced edit is flushed first so it lands on the undo
    /// stack before whatever the caller records. Refused during a gesture.
    pub fn document_mut(&mut self, id: DocumentId) -> EngineResult<&mut Document> {
        self.settle("document edit during gesture")?;
        self.manager.get_mut(id)
    }

    // Queries

    /// Topmost annotation under `point` on a page
    pub fn hit_test(
        &self,
        document: DocumentId,
        page_index: u16,
        point: PageCoordinate,
        view_scale: f32,
    ) -> EngineResult<Option<AnnotationId>> {
        let doc = self.manager.get(document)?;
        Ok(geometry::hit_test(doc.annotations(), page_index, &point, view_scale, &self.config).map(Annotation::id))
    }

    pub fn handles(&self, document: DocumentId, id: &AnnotationId, view_scale: f32) -> EngineResult<Vec<Handle>> {
        let annotation = self.manager.get(document)?.annotation(id)?;
        Ok(handles::generate_handles(annotation, view_scale, &self.config))
    }

    pub fn handle_at(
        &self,
        document: DocumentId,
        id: &AnnotationId,
        point: PageCoordinate,
        view_scale: f32,
    ) -> EngineResult<Option<HandleRole>> {
        let annotation = self.manager.get(document)?.annotation(id)?;
        Ok(handles::hit_test_handle(annotation, &point, view_scale, &self.config))
    }

    /// Cursor to show while hovering a handle of an annotation
    pub fn cursor_for(&mut self, document: DocumentId, id: &AnnotationId, role: HandleRole) -> EngineResult<CursorStyle> {
        let rotation = self.manager.get(document)?.annotation(id)?.effective_rotation();
        Ok(self.cursors.cursor_for(role, rotation))
    }

    // Gestures

    pub fn begin_move(&mut self, document: DocumentId, ids: &[AnnotationId], origin: PageCoordinate) -> EngineResult<()> {
        self.begin(document, GestureKind::Move, origin, ids)
    }

    pub fn begin_resize(
        &mut self,
        document: DocumentId,
        id: AnnotationId,
        role: HandleRole,
        origin: PageCoordinate,
    ) -> EngineResult<()> {
        self.begin(document, GestureKind::Resize(role), origin, &[id])
    }

    pub fn begin_rotate(&mut self, document: DocumentId, id: AnnotationId, origin: PageCoordinate) -> EngineResult<()> {
        self.begin(document, GestureKind::Rotate, origin, &[id])
    }

    fn begin(
        &mut self,
        document: DocumentId,
        kind: GestureKind,
        origin: PageCoordinate,
        ids: &[AnnotationId],
    ) -> EngineResult<()> {
        self.settle("a gesture is already in progress")?;
        let doc = self.manager.get(document)?;
        let gesture = Gesture::begin(document, kind, origin, doc.annotations(), ids)?;
        self.state = EditState::Gesturing(gesture);
        Ok(())
    }

    /// Move the gesture to the pointer's current position
    pub fn update_gesture(&mut self, pointer: PageCoordinate, modifiers: Modifiers) -> EngineResult<SmartGuides> {
        let EditState::Gesturing(gesture) = &self.state else {
            return Err(EngineError::GestureState("no gesture in progress"));
        };
        let now = self.clock.now();
        let doc = self.manager.get_mut(gesture.document())?;
        Ok(gesture.update(
            &mut doc.content_mut().annotations,
            pointer,
            modifiers,
            &self.config,
            &self.snap_engine,
            now,
        ))
    }

    /// Finish the gesture, recording one command if anything changed
    pub fn end_gesture(&mut self) -> EngineResult<bool> {
        let gesture = match std::mem::take(&mut self.state) {
            EditState::Gesturing(gesture) => gesture,
            other => {
                self.state = other;
                return Err(EngineError::GestureState("no gesture in progress"));
            }
        };
        let doc = self.manager.get_mut(gesture.document())?;
        match gesture.finish(doc.annotations()) {
            Some(command) => {
                doc.execute(command);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Cancel the gesture and restore the annotations it touched
    ///
    /// Hosts must call this when a gesture cannot complete (page change,
    /// focus loss, tool switch). Returns false when no gesture was active.
    pub fn abandon_gesture(&mut self) -> bool {
        let gesture = match std::mem::take(&mut self.state) {
            EditState::Gesturing(gesture) => gesture,
            other => {
                self.state = other;
                return false;
            }
        };
        match self.manager.get_mut(gesture.document()) {
            Ok(doc) => gesture.abandon(&mut doc.content_mut().annotations),
            Err(_) => tracing::debug!(document = gesture.document(), "abandoned gesture on a closed document"),
        }
        true
    }

    // Property edits

    /// Edit one annotation through the coalescing buffer
    ///
    /// Consecutive edits to the same annotation within the coalescing delay
    /// become one undo step. An edit that changes nothing is ignored.
    pub fn edit_annotation<F>(&mut self, document: DocumentId, id: &AnnotationId, edit: F) -> EngineResult<()>
    where
        F: FnOnce(&mut Annotation),
    {
        if self.is_gesturing() {
            return Err(EngineError::GestureState("property edit during gesture"));
        }
        let now = self.clock.now();
        if let EditState::Buffering(pending) = &self.state {
            if pending.is_expired(now) || !pending.is_for(document, id) {
                self.flush();
            }
        }

        let previous = {
            let doc = self.manager.get_mut(document)?;
            let live = doc
                .content_mut()
                .annotations
                .get_mut(id)
                .ok_or(EngineError::AnnotationNotFound(*id))?;
            let previous = live.clone();
            edit(&mut *live);
            if *live == previous {
                tracing::trace!(%id, "property edit changed nothing");
                return Ok(());
            }
            live.touch(now);
            if let Err(err) = live.validate() {
                *live = previous;
                return Err(err);
            }
            previous
        };

        let delay = self.config.coalesce_delay_ms;
        match &mut self.state {
            EditState::Buffering(pending) => pending.restart(now, delay),
            state => *state = EditState::Buffering(PendingEdit::new(document, previous, now, delay)),
        }
        Ok(())
    }

    /// Flush the pending edit if its deadline has passed
    ///
    /// Hosts call this from their event loop tick. Returns true if a command
    /// was recorded.
    pub fn poll(&mut self) -> bool {
        match &self.state {
            EditState::Buffering(pending) if pending.is_expired(self.clock.now()) => self.flush(),
            _ => false,
        }
    }

    /// Record the pending edit now, regardless of its deadline
    ///
    /// Returns true if a command was recorded.
    pub fn flush(&mut self) -> bool {
        let pending = match std::mem::take(&mut self.state) {
            EditState::Buffering(pending) => pending,
            other => {
                self.state = other;
                return false;
            }
        };
        let Ok(doc) = self.manager.get_mut(pending.document()) else {
            tracing::debug!(document = pending.document(), "dropping buffered edit for closed document");
            return false;
        };
        match pending.into_command(doc.content()) {
            Some(command) => {
                tracing::debug!(description = %command.description(), "flushing coalesced edit");
                doc.execute(command);
                true
            }
            None => false,
        }
    }

    /// Flush any buffered edit; fail if a gesture is running
    fn settle(&mut self, misuse: &'static str) -> EngineResult<()> {
        if self.is_gesturing() {
            return Err(EngineError::GestureState(misuse));
        }
        self.flush();
        Ok(())
    }

    // Command stacks

    /// Apply a command on a document and record it
    pub fn perform(&mut self, document: DocumentId, command: Command) -> EngineResult<()> {
        self.document_mut(document)?.perform(command);
        Ok(())
    }

    /// Record a command the caller has already applied
    pub fn execute(&mut self, document: DocumentId, command: Command) -> EngineResult<()> {
        self.document_mut(document)?.execute(command);
        Ok(())
    }

    pub fn undo(&mut self, document: DocumentId) -> EngineResult<bool> {
        self.settle("undo during gesture")?;
        Ok(self.manager.get_mut(document)?.undo())
    }

    pub fn redo(&mut self, document: DocumentId) -> EngineResult<bool> {
        self.settle("redo during gesture")?;
        Ok(self.manager.get_mut(document)?.redo())
    }

    /// Whether undo would do anything, counting a pending buffered edit
    pub fn can_undo(&self, document: DocumentId) -> EngineResult<bool> {
        Ok(self.manager.get(document)?.can_undo() || self.pending_command(document).is_some())
    }

    /// Whether redo would do anything
    ///
    /// A pending buffered edit clears the redo stack once flushed, so it
    /// counts as nothing to redo.
    pub fn can_redo(&self, document: DocumentId) -> EngineResult<bool> {
        Ok(self.manager.get(document)?.can_redo() && self.pending_command(document).is_none())
    }

    pub fn undo_description(&self, document: DocumentId) -> EngineResult<Option<String>> {
        if let Some(command) = self.pending_command(document) {
            return Ok(Some(command.description()));
        }
        Ok(self.manager.get(document)?.undo_description())
    }

    pub fn redo_description(&self, document: DocumentId) -> EngineResult<Option<String>> {
        if self.pending_command(document).is_some() {
            return Ok(None);
        }
        Ok(self.manager.get(document)?.redo_description())
    }

    /// The command the pending edit on `document` would flush to
    fn pending_command(&self, document: DocumentId) -> Option<Command> {
        let EditState::Buffering(pending) = &self.state else {
            return None;
        };
        if pending.document() != document {
            return None;
        }
        let doc = self.manager.get(document).ok()?;
        pending.clone().into_command(doc.content())
    }

    // Alignment

    /// Align a selection as one undo step. Returns how many annotations moved.
    pub fn align(&mut self, document: DocumentId, selection: &Selection, alignment: Alignment) -> EngineResult<usize> {
        let now = self.clock.now();
        Ok(self.document_mut(document)?.align(selection.ids(), alignment, now))
    }

    /// Distribute a selection as one undo step. Returns how many annotations moved.
    pub fn distribute(
        &mut self,
        document: DocumentId,
        selection: &Selection,
        distribution: Distribution,
    ) -> EngineResult<usize> {
        let now = self.clock.now();
        Ok(self.document_mut(document)?.distribute(selection.ids(), distribution, now))
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("documents", &self.manager.document_count())
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{BoxKind, Rect, Shape};
    use crate::clock::ManualClock;

    fn setup() -> (Editor, ManualClock, DocumentId, AnnotationId) {
        let clock = ManualClock::new();
        let mut editor = Editor::with_clock(EngineConfig::default(), Arc::new(clock.clone()));
        let doc = editor.open_document("site.pdf", 2);
        let rect = Annotation::new(
            0,
            Shape::Boxed {
                kind: BoxKind::Rectangle,
                rect: Rect::new(0.0, 0.0, 40.0, 20.0),
            },
            Timestamp(0),
        );
        let id = editor.document_mut(doc).unwrap().add_annotation(rect).unwrap();
        (editor, clock, doc, id)
    }

    fn depth(editor: &Editor, doc: DocumentId) -> usize {
        editor.document(doc).unwrap().history().undo_depth()
    }

    #[test]
    fn test_edits_within_delay_coalesce() {
        let (mut editor, clock, doc, id) = setup();
        for i in 1..=5 {
            editor
                .edit_annotation(doc, &id, |a| a.style_mut().stroke_width = i as f32)
                .unwrap();
            clock.advance(100);
        }
        assert!(editor.has_pending_edit());
        assert!(!editor.poll());
        assert_eq!(editor.undo_description(doc).unwrap().as_deref(), Some("Edit Rectangle"));

        clock.advance(400);
        assert!(editor.poll());
        assert_eq!(depth(&editor, doc), 2);
        assert!(matches!(editor.state(), EditState::Idle));
    }

    #[test]
    fn test_other_target_flushes() {
        let (mut editor, _clock, doc, first) = setup();
        let second = editor
            .document_mut(doc)
            .unwrap()
            .add_annotation(Annotation::new(
                1,
                Shape::Boxed {
                    kind: BoxKind::Ellipse,
                    rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                },
                Timestamp(0),
            ))
            .unwrap();

        editor.edit_annotation(doc, &first, |a| a.style_mut().opacity = 0.5).unwrap();
        editor.edit_annotation(doc, &second, |a| a.style_mut().opacity = 0.5).unwrap();
        assert_eq!(depth(&editor, doc), 3);
        assert!(editor.flush());
        assert_eq!(depth(&editor, doc), 4);
    }

    #[test]
    fn test_undo_flushes_then_reverts() {
        let (mut editor, _clock, doc, id) = setup();
        editor.edit_annotation(doc, &id, |a| a.style_mut().opacity = 0.2).unwrap();
        assert!(editor.can_undo(doc).unwrap());

        assert!(editor.undo(doc).unwrap());
        let restored = editor.document(doc).unwrap().annotation(&id).unwrap();
        assert!((restored.style().opacity - 1.0).abs() < f32::EPSILON);
        assert!(editor.can_redo(doc).unwrap());
    }

    #[test]
    fn test_noop_edit_starts_nothing() {
        let (mut editor, _clock, doc, id) = setup();
        editor.edit_annotation(doc, &id, |_| {}).unwrap();
        assert!(!editor.has_pending_edit());
    }

    #[test]
    fn test_gesture_state_misuse() {
        let (mut editor, _clock, doc, id) = setup();
        assert!(matches!(editor.end_gesture(), Err(EngineError::GestureState(_))));
        assert!(!editor.abandon_gesture());

        editor.begin_move(doc, &[id], PageCoordinate::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            editor.begin_rotate(doc, id, PageCoordinate::new(0.0, 0.0)),
            Err(EngineError::GestureState(_))
        ));
        assert!(matches!(editor.undo(doc), Err(EngineError::GestureState(_))));
        assert!(editor
            .edit_annotation(doc, &id, |a| a.style_mut().opacity = 0.1)
            .is_err());
        assert!(editor.abandon_gesture());
    }

    #[test]
    fn test_gesture_flushes_pending_edit() {
        let (mut editor, _clock, doc, id) = setup();
        editor.edit_annotation(doc, &id, |a| a.style_mut().opacity = 0.3).unwrap();
        editor.begin_move(doc, &[id], PageCoordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(depth(&editor, doc), 2);

        editor
            .update_gesture(PageCoordinate::new(10.0, 10.0), Modifiers::default())
            .unwrap();
        assert!(editor.end_gesture().unwrap());
        assert_eq!(depth(&editor, doc), 3);
    }

    #[test]
    fn test_close_document_abandons_gesture() {
        let (mut editor, _clock, doc, id) = setup();
        editor.begin_move(doc, &[id], PageCoordinate::new(0.0, 0.0)).unwrap();
        editor
            .update_gesture(PageCoordinate::new(50.0, 50.0), Modifiers::default())
            .unwrap();

        let closed = editor.close_document(doc).unwrap();
        assert!(!editor.is_gesturing());
        let rect = geometry::bounds_of(closed.annotation(&id).unwrap()).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 40.0, 20.0));
        assert!(matches!(editor.document(doc), Err(EngineError::DocumentNotFound(_))));
    }

    #[test]
    fn test_cursor_for_rotated_annotation() {
        let (mut editor, _clock, doc, id) = setup();
        assert_eq!(
            editor.cursor_for(doc, &id, HandleRole::Right).unwrap(),
            CursorStyle::EwResize
        );
        editor
            .document_mut(doc)
            .unwrap()
            .modify_annotation(&id, Timestamp(1), |a| a.set_rotation(Some(90.0)))
            .unwrap();
        assert_eq!(
            editor.cursor_for(doc, &id, HandleRole::Right).unwrap(),
            CursorStyle::NsResize
        );
    }
}
