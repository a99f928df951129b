//! Reversible document commands
//!
//! A [`Command`] is an immutable record of one mutation carrying the full
//! before and after state it needs, so it can be re-applied or rolled back
//! without re-deriving anything from the live document. Deletions remember
//! the index the removed item occupied so rollback restores z-order exactly.

use crate::annotation::{Annotation, AnnotationId};
use crate::document::DocumentContent;
use crate::entities::{Bookmark, Entity, PageRotation, Watermark};

/// An item together with its position in an ordered list
#[derive(Debug, Clone, PartialEq)]
pub struct Placed<T> {
    pub item: T,
    pub index: usize,
}

impl<T> Placed<T> {
    pub fn new(item: T, index: usize) -> Self {
        Self { item, index }
    }
}

/// Before and after state of one edited item
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

impl<T: PartialEq> Change<T> {
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }

    /// `None` when nothing actually changed
    pub fn non_trivial(before: T, after: T) -> Option<Self> {
        (before != after).then_some(Self { before, after })
    }
}

/// What a bulk deletion removed, for its undo description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    Selection,
    Page(u16),
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddAnnotation(Placed<Annotation>),
    DeleteAnnotation(Placed<Annotation>),
    ModifyAnnotation(Change<Annotation>),
    BulkAdd(Vec<Placed<Annotation>>),
    /// Items sorted by ascending index
    BulkDelete {
        scope: DeleteScope,
        items: Vec<Placed<Annotation>>,
    },
    BulkModify {
        label: String,
        changes: Vec<Change<Annotation>>,
    },
    Reorder {
        id: AnnotationId,
        from: usize,
        to: usize,
    },
    RotatePage {
        page_index: u16,
        before: PageRotation,
        after: PageRotation,
    },
    AddWatermark(Placed<Watermark>),
    DeleteWatermark(Placed<Watermark>),
    ModifyWatermark(Change<Watermark>),
    AddBookmark(Placed<Bookmark>),
    DeleteBookmark(Placed<Bookmark>),
    ModifyBookmark(Change<Bookmark>),
    /// Whole-content swap for page insert, delete, and reorder
    DocumentSnapshot {
        label: String,
        before: Box<DocumentContent>,
        after: Box<DocumentContent>,
    },
}

impl Command {
    /// Apply the forward direction of this command
    pub fn apply(&self, content: &mut DocumentContent) {
        match self {
            Command::AddAnnotation(placed) => {
                content.annotations.insert_at(placed.index, placed.item.clone());
            }
            Command::DeleteAnnotation(placed) => remove_annotation(content, &placed.item.id()),
            Command::ModifyAnnotation(change) => replace_annotation(content, &change.after),
            Command::BulkAdd(items) => insert_annotations(content, items),
            Command::BulkDelete { items, .. } => remove_annotations(content, items),
            Command::BulkModify { changes, .. } => {
                for change in changes {
                    replace_annotation(content, &change.after);
                }
            }
            Command::Reorder { id, to, .. } => {
                content.annotations.move_to(id, *to);
            }
            Command::RotatePage {
                page_index, after, ..
            } => content.set_page_rotation(*page_index, *after),
            Command::AddWatermark(placed) => insert_entity(&mut content.watermarks, placed),
            Command::DeleteWatermark(placed) => remove_entity(&mut content.watermarks, &placed.item),
            Command::ModifyWatermark(change) => replace_entity(&mut content.watermarks, &change.after),
            Command::AddBookmark(placed) => insert_entity(&mut content.bookmarks, placed),
            Command::DeleteBookmark(placed) => remove_entity(&mut content.bookmarks, &placed.item),
            Command::ModifyBookmark(change) => replace_entity(&mut content.bookmarks, &change.after),
            Command::DocumentSnapshot { after, .. } => *content = (**after).clone(),
        }
    }

    /// Undo the effect of [`apply`](Self::apply)
    pub fn rollback(&self, content: &mut DocumentContent) {
        match self {
            Command::AddAnnotation(placed) => remove_annotation(content, &placed.item.id()),
            Command::DeleteAnnotation(placed) => {
                content.annotations.insert_at(placed.index, placed.item.clone());
            }
            Command::ModifyAnnotation(change) => replace_annotation(content, &change.before),
            Command::BulkAdd(items) => remove_annotations(content, items),
            Command::BulkDelete { items, .. } => insert_annotations(content, items),
            Command::BulkModify { changes, .. } => {
                for change in changes.iter().rev() {
                    replace_annotation(content, &change.before);
                }
            }
            Command::Reorder { id, from, .. } => {
                content.annotations.move_to(id, *from);
            }
            Command::RotatePage {
                page_index, before, ..
            } => content.set_page_rotation(*page_index, *before),
            Command::AddWatermark(placed) => remove_entity(&mut content.watermarks, &placed.item),
            Command::DeleteWatermark(placed) => insert_entity(&mut content.watermarks, placed),
            Command::ModifyWatermark(change) => replace_entity(&mut content.watermarks, &change.before),
            Command::AddBookmark(placed) => remove_entity(&mut content.bookmarks, &placed.item),
            Command::DeleteBookmark(placed) => insert_entity(&mut content.bookmarks, placed),
            Command::ModifyBookmark(change) => replace_entity(&mut content.bookmarks, &change.before),
            Command::DocumentSnapshot { before, .. } => *content = (**before).clone(),
        }
    }

    /// Human-readable description for undo/redo menus
    pub fn description(&self) -> String {
        match self {
            Command::AddAnnotation(p) => format!("Add {}", p.item.kind().label()),
            Command::DeleteAnnotation(p) => format!("Delete {}", p.item.kind().label()),
            Command::ModifyAnnotation(c) => format!("Edit {}", c.after.kind().label()),
            Command::BulkAdd(items) => format!("Add {}", plural(items.len(), "annotation")),
            Command::BulkDelete { scope, items } => match scope {
                DeleteScope::Selection => format!("Delete {}", plural(items.len(), "annotation")),
                DeleteScope::Page(page) => format!("Clear Page {}", page + 1),
                DeleteScope::All => "Clear All Annotations".to_string(),
            },
            Command::BulkModify { label, .. } => label.clone(),
            Command::Reorder { .. } => "Change Stacking Order".to_string(),
            Command::RotatePage { page_index, .. } => format!("Rotate Page {}", page_index + 1),
            Command::AddWatermark(_) => "Add Watermark".to_string(),
            Command::DeleteWatermark(_) => "Delete Watermark".to_string(),
            Command::ModifyWatermark(_) => "Edit Watermark".to_string(),
            Command::AddBookmark(p) => format!("Add Bookmark \"{}\"", p.item.title),
            Command::DeleteBookmark(p) => format!("Delete Bookmark \"{}\"", p.item.title),
            Command::ModifyBookmark(_) => "Edit Bookmark".to_string(),
            Command::DocumentSnapshot { label, .. } => label.clone(),
        }
    }

    /// Ids of annotations this command touches
    pub fn annotation_ids(&self) -> Vec<AnnotationId> {
        match self {
            Command::AddAnnotation(p) | Command::DeleteAnnotation(p) => vec![p.item.id()],
            Command::ModifyAnnotation(c) => vec![c.after.id()],
            Command::BulkAdd(items) | Command::BulkDelete { items, .. } => {
                items.iter().map(|p| p.item.id()).collect()
            }
            Command::BulkModify { changes, .. } => changes.iter().map(|c| c.after.id()).collect(),
            Command::Reorder { id, .. } => vec![*id],
            _ => Vec::new(),
        }
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn remove_annotation(content: &mut DocumentContent, id: &AnnotationId) {
    if content.annotations.remove(id).is_none() {
        tracing::warn!(%id, "command referenced an annotation that is not in the store");
    }
}

/// Items go back at their recorded indices in a single merge over the z-order
fn insert_annotations(content: &mut DocumentContent, items: &[Placed<Annotation>]) {
    content
        .annotations
        .insert_many(items.iter().map(|placed| (placed.index, placed.item.clone())));
}

fn remove_annotations(content: &mut DocumentContent, items: &[Placed<Annotation>]) {
    let ids: Vec<AnnotationId> = items.iter().map(|placed| placed.item.id()).collect();
    let removed = content.annotations.remove_many(&ids);
    if removed.len() != ids.len() {
        tracing::warn!(
            expected = ids.len(),
            removed = removed.len(),
            "bulk command referenced annotations that are not in the store"
        );
    }
}

fn replace_annotation(content: &mut DocumentContent, annotation: &Annotation) {
    if content.annotations.replace(annotation.clone()).is_none() {
        tracing::warn!(id = %annotation.id(), "command referenced an annotation that is not in the store");
    }
}

fn insert_entity<T: Entity>(list: &mut Vec<T>, placed: &Placed<T>) {
    let index = placed.index.min(list.len());
    list.insert(index, placed.item.clone());
}

fn remove_entity<T: Entity>(list: &mut Vec<T>, item: &T) {
    let id = item.entity_id();
    let before = list.len();
    list.retain(|e| e.entity_id() != id);
    if list.len() == before {
        tracing::warn!(kind = T::KIND, %id, "command referenced a missing entity");
    }
}

fn replace_entity<T: Entity>(list: &mut [T], item: &T) {
    let id = item.entity_id();
    match list.iter_mut().find(|e| e.entity_id() == id) {
        Some(slot) => *slot = item.clone(),
        None => tracing::warn!(kind = T::KIND, %id, "command referenced a missing entity"),
    }
}
