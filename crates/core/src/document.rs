//! Document state model and management
//!
//! A [`Document`] owns its annotation store, document-level entities, and its
//! own undo history. Every mutation made through a `Document` helper is
//! recorded as one [`Command`] on that document's stacks; the
//! [`DocumentManager`] hands out explicit document handles so callers never
//! depend on an ambient "current document".

use std::collections::{BTreeMap, HashMap};

use crate::alignment::{self, Alignment, Distribution};
use crate::annotation::{Annotation, AnnotationId};
use crate::clock::Timestamp;
use crate::command::{Change, Command, DeleteScope, Placed};
use crate::entities::{Bookmark, Entity, PageRange, PageRotation, Watermark};
use crate::error::{EngineError, EngineResult};
use crate::history::{History, DEFAULT_UNDO_LIMIT};
use crate::measurement::{self, MeasureScale, MeasurementValue};
use crate::store::{AnnotationStore, ZOrderChange};

/// Unique identifier for a document
pub type DocumentId = u64;

/// Everything undoable about one document
///
/// Snapshot commands clone this whole value, so it holds only editable
/// state and nothing derived from the PDF itself.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentContent {
    pub annotations: AnnotationStore,
    pub page_count: u16,
    pub watermarks: Vec<Watermark>,
    pub bookmarks: Vec<Bookmark>,
    /// Pages with a non-zero rotation
    page_rotations: BTreeMap<u16, PageRotation>,
    /// Per-page measurement calibration
    page_scales: BTreeMap<u16, MeasureScale>,
}

impl DocumentContent {
    pub fn new(page_count: u16) -> Self {
        Self {
            annotations: AnnotationStore::new(),
            page_count,
            watermarks: Vec::new(),
            bookmarks: Vec::new(),
            page_rotations: BTreeMap::new(),
            page_scales: BTreeMap::new(),
        }
    }

    pub fn page_rotation(&self, page_index: u16) -> PageRotation {
        self.page_rotations.get(&page_index).copied().unwrap_or_default()
    }

    pub fn set_page_rotation(&mut self, page_index: u16, rotation: PageRotation) {
        if rotation == PageRotation::Deg0 {
            self.page_rotations.remove(&page_index);
        } else {
            self.page_rotations.insert(page_index, rotation);
        }
    }

    /// Calibration for a page, if one was set
    pub fn page_scale(&self, page_index: u16) -> Option<&MeasureScale> {
        self.page_scales.get(&page_index)
    }

    /// Calibration for a page, falling back to 1:1 page units
    pub fn scale_for(&self, page_index: u16) -> MeasureScale {
        self.page_scale(page_index).cloned().unwrap_or_default()
    }

    pub fn set_page_scale(&mut self, page_index: u16, scale: Option<MeasureScale>) {
        match scale {
            Some(scale) => {
                self.page_scales.insert(page_index, scale);
            }
            None => {
                self.page_scales.remove(&page_index);
            }
        }
    }

    fn check_page(&self, page_index: u16) -> EngineResult<()> {
        if page_index < self.page_count {
            Ok(())
        } else {
            Err(EngineError::PageOutOfRange {
                page: page_index,
                count: self.page_count,
            })
        }
    }

    /// Renumber every page-bound item; items mapped to `None` are dropped
    fn remap_pages(&mut self, map: impl Fn(u16) -> Option<u16>) {
        let doomed: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|a| map(a.page_index()).is_none())
            .map(Annotation::id)
            .collect();
        for id in &doomed {
            self.annotations.remove(id);
        }
        for annotation in self.annotations.iter_mut() {
            if let Some(page) = map(annotation.page_index()) {
                annotation.set_page_index(page);
            }
        }

        self.page_rotations = std::mem::take(&mut self.page_rotations)
            .into_iter()
            .filter_map(|(page, rotation)| Some((map(page)?, rotation)))
            .collect();
        self.page_scales = std::mem::take(&mut self.page_scales)
            .into_iter()
            .filter_map(|(page, scale)| Some((map(page)?, scale)))
            .collect();

        self.bookmarks.retain(|b| map(b.page_index).is_some());
        for bookmark in &mut self.bookmarks {
            if let Some(page) = map(bookmark.page_index) {
                bookmark.page_index = page;
            }
        }
        for watermark in &mut self.watermarks {
            if let PageRange::Custom(pages) = &mut watermark.page_range {
                *pages = pages.iter().filter_map(|p| map(*p)).collect();
            }
        }
    }
}

/// An open document with its own undo history
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    title: String,
    content: DocumentContent,
    history: History,
    current_page: u16,
    modified: bool,
}

impl Document {
    /// Create a new document
    pub fn new(id: DocumentId, title: impl Into<String>, page_count: u16, undo_limit: usize) -> Self {
        Self {
            id,
            title: title.into(),
            content: DocumentContent::new(page_count),
            history: History::new(undo_limit),
            current_page: 0,
            modified: false,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    /// Live content for in-progress edits
    ///
    /// Changes made here are not recorded; callers must follow up with
    /// [`execute`](Self::execute) or restore what they touched.
    pub fn content_mut(&mut self) -> &mut DocumentContent {
        &mut self.content
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.content.annotations
    }

    pub fn annotation(&self, id: &AnnotationId) -> EngineResult<&Annotation> {
        self.content
            .annotations
            .get(id)
            .ok_or(EngineError::AnnotationNotFound(*id))
    }

    pub fn page_count(&self) -> u16 {
        self.content.page_count
    }

    pub fn current_page(&self) -> u16 {
        self.current_page
    }

    /// Set the current page. Returns false if the index is out of range.
    pub fn set_current_page(&mut self, page_index: u16) -> bool {
        if page_index < self.content.page_count {
            self.current_page = page_index;
            true
        } else {
            false
        }
    }

    /// Annotations on the current page in z-order
    pub fn current_page_annotations(&self) -> impl DoubleEndedIterator<Item = &Annotation> + '_ {
        self.content.annotations.on_page(self.current_page)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag after the host has persisted the document
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_max_undo_depth(limit);
    }

    // Command stacks

    /// Record a command whose effect is already applied to the content
    pub fn execute(&mut self, command: Command) {
        self.history.record(command);
        self.modified = true;
    }

    /// Apply a command and record it
    pub fn perform(&mut self, command: Command) {
        command.apply(&mut self.content);
        self.execute(command);
    }

    /// Revert the last command. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.content);
        self.modified |= undone;
        undone
    }

    /// Re-apply the last undone command. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.content);
        self.modified |= redone;
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_description()
    }

    // Annotations

    /// Add an annotation on top of the z-order
    pub fn add_annotation(&mut self, annotation: Annotation) -> EngineResult<AnnotationId> {
        self.check_insertable(&annotation)?;
        let id = annotation.id();
        let index = self.content.annotations.len();
        self.perform(Command::AddAnnotation(Placed::new(annotation, index)));
        Ok(id)
    }

    /// Add several annotations as one undo step (paste, import)
    ///
    /// Nothing is added if any annotation is invalid.
    pub fn add_annotations(&mut self, annotations: Vec<Annotation>) -> EngineResult<usize> {
        for (i, annotation) in annotations.iter().enumerate() {
            self.check_insertable(annotation)?;
            if annotations[..i].iter().any(|a| a.id() == annotation.id()) {
                return Err(EngineError::DuplicateAnnotation(annotation.id()));
            }
        }
        if annotations.is_empty() {
            return Ok(0);
        }

        let start = self.content.annotations.len();
        let items: Vec<_> = annotations
            .into_iter()
            .enumerate()
            .map(|(offset, annotation)| Placed::new(annotation, start + offset))
            .collect();
        let count = items.len();
        self.perform(Command::BulkAdd(items));
        Ok(count)
    }

    fn check_insertable(&self, annotation: &Annotation) -> EngineResult<()> {
        annotation.validate()?;
        if self.content.annotations.contains(&annotation.id()) {
            return Err(EngineError::DuplicateAnnotation(annotation.id()));
        }
        self.content.check_page(annotation.page_index())
    }

    pub fn delete_annotation(&mut self, id: &AnnotationId) -> EngineResult<Annotation> {
        let (annotation, index) = self
            .content
            .annotations
            .remove(id)
            .ok_or(EngineError::AnnotationNotFound(*id))?;
        self.execute(Command::DeleteAnnotation(Placed::new(annotation.clone(), index)));
        Ok(annotation)
    }

    /// Delete several annotations as one undo step. Unknown ids are skipped.
    ///
    /// Returns the number of annotations removed.
    pub fn delete_annotations(&mut self, ids: &[AnnotationId]) -> usize {
        self.bulk_delete(ids, DeleteScope::Selection)
    }

    /// Remove every annotation on one page as one undo step
    pub fn clear_page(&mut self, page_index: u16) -> usize {
        let ids = self.content.annotations.ids_on_page(page_index);
        self.bulk_delete(&ids, DeleteScope::Page(page_index))
    }

    /// Remove every annotation in the document as one undo step
    pub fn clear_all(&mut self) -> usize {
        let ids = self.content.annotations.ids().to_vec();
        self.bulk_delete(&ids, DeleteScope::All)
    }

    fn bulk_delete(&mut self, ids: &[AnnotationId], scope: DeleteScope) -> usize {
        let items: Vec<Placed<Annotation>> = self
            .content
            .annotations
            .indices_of(ids)
            .into_iter()
            .filter_map(|(index, id)| {
                let annotation = self.content.annotations.get(&id)?.clone();
                Some(Placed::new(annotation, index))
            })
            .collect();
        if items.is_empty() {
            tracing::trace!(?scope, "bulk delete matched nothing");
            return 0;
        }

        let count = items.len();
        self.perform(Command::BulkDelete { scope, items });
        count
    }

    /// Edit one annotation and record the change
    ///
    /// Returns false, recording nothing, when `edit` left the annotation as it
    /// was. Locked annotations can still have their properties edited.
    pub fn modify_annotation<F>(&mut self, id: &AnnotationId, now: Timestamp, edit: F) -> EngineResult<bool>
    where
        F: FnOnce(&mut Annotation),
    {
        let before = self.annotation(id)?.clone();
        let mut after = before.clone();
        edit(&mut after);
        if after == before {
            return Ok(false);
        }
        after.touch(now);
        after.validate()?;
        self.perform(Command::ModifyAnnotation(Change::new(before, after)));
        Ok(true)
    }

    /// Change an annotation's stacking order
    ///
    /// Returns false when it is already at the requested position.
    pub fn reorder(&mut self, id: &AnnotationId, change: ZOrderChange) -> EngineResult<bool> {
        let from = self
            .content
            .annotations
            .index_of(id)
            .ok_or(EngineError::AnnotationNotFound(*id))?;
        let Some(to) = self.content.annotations.reorder_target(id, change) else {
            return Ok(false);
        };
        self.perform(Command::Reorder { id: *id, from, to });
        Ok(true)
    }

    /// Align a selection and record it as one undo step
    pub fn align(&mut self, ids: &[AnnotationId], alignment: Alignment, now: Timestamp) -> usize {
        let changes = alignment::align(&mut self.content.annotations, ids, alignment, now);
        self.record_bulk_modify(alignment.label(), changes)
    }

    /// Distribute a selection and record it as one undo step
    pub fn distribute(&mut self, ids: &[AnnotationId], distribution: Distribution, now: Timestamp) -> usize {
        let changes = alignment::distribute(&mut self.content.annotations, ids, distribution, now);
        self.record_bulk_modify(distribution.label(), changes)
    }

    /// Record already-applied per-annotation changes as one command
    pub fn record_bulk_modify(&mut self, label: impl Into<String>, changes: Vec<Change<Annotation>>) -> usize {
        let count = changes.len();
        if count > 0 {
            self.execute(Command::BulkModify {
                label: label.into(),
                changes,
            });
        }
        count
    }

    // Pages

    /// Rotate a page by a quarter turn
    pub fn rotate_page(&mut self, page_index: u16, clockwise: bool) -> EngineResult<PageRotation> {
        let current = self.content.page_rotation(page_index);
        let next = if clockwise {
            current.rotated_clockwise()
        } else {
            current.rotated_counter_clockwise()
        };
        self.set_page_rotation(page_index, next)?;
        Ok(next)
    }

    pub fn set_page_rotation(&mut self, page_index: u16, rotation: PageRotation) -> EngineResult<()> {
        self.content.check_page(page_index)?;
        let before = self.content.page_rotation(page_index);
        if before != rotation {
            self.perform(Command::RotatePage {
                page_index,
                before,
                after: rotation,
            });
        }
        Ok(())
    }

    /// Apply a page-structure edit as one whole-content snapshot command
    ///
    /// Returns false, recording nothing, when `edit` changed nothing.
    pub fn apply_structural_change<F>(&mut self, label: impl Into<String>, edit: F) -> bool
    where
        F: FnOnce(&mut DocumentContent),
    {
        let before = self.content.clone();
        edit(&mut self.content);
        if self.content == before {
            return false;
        }
        if self.current_page >= self.content.page_count {
            self.current_page = self.content.page_count.saturating_sub(1);
        }
        let after = self.content.clone();
        self.execute(Command::DocumentSnapshot {
            label: label.into(),
            before: Box::new(before),
            after: Box::new(after),
        });
        true
    }

    /// Insert blank pages before `at`, shifting later pages down
    pub fn insert_pages(&mut self, at: u16, count: u16) -> EngineResult<()> {
        if at > self.content.page_count {
            return Err(EngineError::PageOutOfRange {
                page: at,
                count: self.content.page_count,
            });
        }
        let label = if count == 1 {
            "Insert Page".to_string()
        } else {
            format!("Insert {count} Pages")
        };
        self.apply_structural_change(label, |content| {
            content.remap_pages(|p| Some(if p >= at { p.saturating_add(count) } else { p }));
            content.page_count = content.page_count.saturating_add(count);
        });
        Ok(())
    }

    /// Delete a page together with everything placed on it
    pub fn delete_page(&mut self, page_index: u16) -> EngineResult<()> {
        self.content.check_page(page_index)?;
        self.apply_structural_change(format!("Delete Page {}", page_index + 1), |content| {
            content.remap_pages(|p| match p.cmp(&page_index) {
                std::cmp::Ordering::Less => Some(p),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(p - 1),
            });
            content.page_count -= 1;
        });
        Ok(())
    }

    /// Move a page to a new position, carrying its content along
    pub fn move_page(&mut self, from: u16, to: u16) -> EngineResult<()> {
        self.content.check_page(from)?;
        self.content.check_page(to)?;
        self.apply_structural_change("Reorder Pages", |content| {
            content.remap_pages(|p| {
                Some(if p == from {
                    to
                } else if from < to && p > from && p <= to {
                    p - 1
                } else if to < from && p >= to && p < from {
                    p + 1
                } else {
                    p
                })
            });
        });
        Ok(())
    }

    // Watermarks and bookmarks

    pub fn add_watermark(&mut self, watermark: Watermark) -> uuid::Uuid {
        let id = watermark.id;
        let index = self.content.watermarks.len();
        self.perform(Command::AddWatermark(Placed::new(watermark, index)));
        id
    }

    pub fn delete_watermark(&mut self, id: uuid::Uuid) -> EngineResult<Watermark> {
        let placed = take_entity(&mut self.content.watermarks, id)?;
        let removed = placed.item.clone();
        self.execute(Command::DeleteWatermark(placed));
        Ok(removed)
    }

    pub fn modify_watermark<F>(&mut self, id: uuid::Uuid, edit: F) -> EngineResult<bool>
    where
        F: FnOnce(&mut Watermark),
    {
        match edit_entity(&self.content.watermarks, id, edit)? {
            Some(change) => {
                self.perform(Command::ModifyWatermark(change));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn add_bookmark(&mut self, bookmark: Bookmark) -> EngineResult<uuid::Uuid> {
        self.content.check_page(bookmark.page_index)?;
        let id = bookmark.id;
        let index = self.content.bookmarks.len();
        self.perform(Command::AddBookmark(Placed::new(bookmark, index)));
        Ok(id)
    }

    /// Delete a bookmark. Children are left in place with a dangling parent.
    pub fn delete_bookmark(&mut self, id: uuid::Uuid) -> EngineResult<Bookmark> {
        let placed = take_entity(&mut self.content.bookmarks, id)?;
        let removed = placed.item.clone();
        self.execute(Command::DeleteBookmark(placed));
        Ok(removed)
    }

    pub fn modify_bookmark<F>(&mut self, id: uuid::Uuid, edit: F) -> EngineResult<bool>
    where
        F: FnOnce(&mut Bookmark),
    {
        match edit_entity(&self.content.bookmarks, id, edit)? {
            Some(change) => {
                self.perform(Command::ModifyBookmark(change));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // Measurement

    /// Set or clear a page's measurement calibration (not undoable)
    pub fn set_page_scale(&mut self, page_index: u16, scale: Option<MeasureScale>) -> EngineResult<()> {
        self.content.check_page(page_index)?;
        self.content.set_page_scale(page_index, scale);
        self.modified = true;
        Ok(())
    }

    /// Real-world value of a measurement annotation using its page's scale
    pub fn measure(&self, id: &AnnotationId) -> EngineResult<Option<MeasurementValue>> {
        let annotation = self.annotation(id)?;
        let scale = self.content.scale_for(annotation.page_index());
        Ok(measurement::measure(annotation, &scale))
    }
}

fn entity_index<T: Entity>(list: &[T], id: uuid::Uuid) -> EngineResult<usize> {
    list.iter()
        .position(|e| e.entity_id() == id)
        .ok_or(EngineError::EntityNotFound { kind: T::KIND, id })
}

fn take_entity<T: Entity>(list: &mut Vec<T>, id: uuid::Uuid) -> EngineResult<Placed<T>> {
    let index = entity_index(list, id)?;
    Ok(Placed::new(list.remove(index), index))
}

fn edit_entity<T, F>(list: &[T], id: uuid::Uuid, edit: F) -> EngineResult<Option<Change<T>>>
where
    T: Entity + PartialEq,
    F: FnOnce(&mut T),
{
    let before = list[entity_index(list, id)?].clone();
    let mut after = before.clone();
    edit(&mut after);
    // the id is the lookup key and must survive the edit
    if after.entity_id() != id {
        tracing::warn!(kind = T::KIND, %id, "entity edit changed the id; ignoring");
        return Ok(None);
    }
    Ok(Change::non_trivial(before, after))
}

/// Document manager for handling multiple open documents
///
/// Documents are addressed by explicit id; the active document is only a
/// convenience for hosts with a single focused view.
#[derive(Debug)]
pub struct DocumentManager {
    documents: HashMap<DocumentId, Document>,
    next_id: DocumentId,
    active_document: Option<DocumentId>,
    undo_limit: usize,
}

impl DocumentManager {
    /// Create a new document manager
    pub fn new() -> Self {
        Self::with_undo_limit(DEFAULT_UNDO_LIMIT)
    }

    /// Create a manager whose documents keep at most `undo_limit` undo entries
    pub fn with_undo_limit(undo_limit: usize) -> Self {
        Self {
            documents: HashMap::new(),
            next_id: 1,
            active_document: None,
            undo_limit,
        }
    }

    /// Open a new document and return its id
    ///
    /// The first document opened becomes the active one.
    pub fn open(&mut self, title: impl Into<String>, page_count: u16) -> DocumentId {
        let id = self.next_id;
        self.next_id += 1;

        let document = Document::new(id, title, page_count, self.undo_limit);
        tracing::debug!(id, title = document.title(), page_count, "document opened");
        self.documents.insert(id, document);

        if self.active_document.is_none() {
            self.active_document = Some(id);
        }
        id
    }

    pub fn get(&self, id: DocumentId) -> EngineResult<&Document> {
        self.documents.get(&id).ok_or(EngineError::DocumentNotFound(id))
    }

    pub fn get_mut(&mut self, id: DocumentId) -> EngineResult<&mut Document> {
        self.documents.get_mut(&id).ok_or(EngineError::DocumentNotFound(id))
    }

    /// Close a document, returning it to the caller
    pub fn close(&mut self, id: DocumentId) -> EngineResult<Document> {
        let document = self.documents.remove(&id).ok_or(EngineError::DocumentNotFound(id))?;
        if self.active_document == Some(id) {
            self.active_document = None;
        }
        tracing::debug!(id, "document closed");
        Ok(document)
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active_document
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active_document.and_then(|id| self.documents.get(&id))
    }

    pub fn set_active(&mut self, id: DocumentId) -> EngineResult<()> {
        if !self.documents.contains_key(&id) {
            return Err(EngineError::DocumentNotFound(id));
        }
        self.active_document = Some(id);
        Ok(())
    }

    /// Ids of all open documents in opening order
    pub fn open_documents(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.documents.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_open(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }
}

impl Default for DocumentManager {
    fn default() -> Self {
        Self::new()
    }
}
