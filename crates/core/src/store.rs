//! Ordered annotation store
//!
//! Annotations live in an id-keyed map, with an explicit order list giving the
//! z-order (last entry is drawn on top). Commands remember the index an
//! annotation occupied so undo can reinsert it exactly where it was.

use std::collections::{HashMap, HashSet};

use crate::annotation::{Annotation, AnnotationId};

/// Z-order edits available to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ZOrderChange {
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
}

/// Annotations of one document in z-order
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationStore {
    annotations: HashMap<AnnotationId, Annotation>,
    order: Vec<AnnotationId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.annotations.contains_key(id)
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    pub fn get_mut(&mut self, id: &AnnotationId) -> Option<&mut Annotation> {
        self.annotations.get_mut(id)
    }

    /// Z-order position of an annotation
    pub fn index_of(&self, id: &AnnotationId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Append on top of the z-order. Returns the index used.
    pub fn push(&mut self, annotation: Annotation) -> usize {
        self.insert_at(self.order.len(), annotation)
    }

    /// Insert at a z-order position, clamped to the end of the list
    ///
    /// An annotation whose id is already present replaces the stored value in
    /// place and keeps its position. Returns the index the annotation occupies.
    pub fn insert_at(&mut self, index: usize, annotation: Annotation) -> usize {
        let id = annotation.id();
        if self.annotations.insert(id, annotation).is_some() {
            tracing::debug!(%id, "insert replaced an existing annotation");
            return self.index_of(&id).unwrap_or(self.order.len());
        }
        let index = index.min(self.order.len());
        self.order.insert(index, id);
        index
    }

    /// Remove an annotation, returning it with the index it occupied
    pub fn remove(&mut self, id: &AnnotationId) -> Option<(Annotation, usize)> {
        let annotation = self.annotations.remove(id)?;
        let index = self.index_of(id)?;
        self.order.remove(index);
        Some((annotation, index))
    }

    /// Z-order positions of several annotations, found in one pass, ascending
    pub fn indices_of(&self, ids: &[AnnotationId]) -> Vec<(usize, AnnotationId)> {
        let wanted: HashSet<&AnnotationId> = ids.iter().collect();
        self.order
            .iter()
            .enumerate()
            .filter(|(_, id)| wanted.contains(id))
            .map(|(index, id)| (index, *id))
            .collect()
    }

    /// Remove several annotations in one pass over the z-order
    ///
    /// Returns the removed annotations with the indices they occupied,
    /// ascending. Unknown ids are skipped.
    pub fn remove_many(&mut self, ids: &[AnnotationId]) -> Vec<(Annotation, usize)> {
        let wanted: HashSet<&AnnotationId> = ids.iter().collect();
        let annotations = &mut self.annotations;
        let mut removed = Vec::with_capacity(wanted.len());
        let mut index = 0;
        self.order.retain(|id| {
            let keep = !wanted.contains(id);
            if !keep {
                if let Some(annotation) = annotations.remove(id) {
                    removed.push((annotation, index));
                }
            }
            index += 1;
            keep
        });
        removed
    }

    /// Insert several annotations at their z-order positions in one merge
    ///
    /// Equivalent to calling [`insert_at`](Self::insert_at) for each item in
    /// ascending index order: each lands at its index, clamped to the end.
    pub fn insert_many(&mut self, items: impl IntoIterator<Item = (usize, Annotation)>) {
        let mut fresh = Vec::new();
        for (index, annotation) in items {
            let id = annotation.id();
            if self.annotations.insert(id, annotation).is_some() {
                tracing::debug!(%id, "insert replaced an existing annotation");
                continue;
            }
            fresh.push((index, id));
        }
        if fresh.is_empty() {
            return;
        }
        fresh.sort_by_key(|(index, _)| *index);

        let mut existing = std::mem::take(&mut self.order).into_iter();
        let mut merged = Vec::with_capacity(existing.len() + fresh.len());
        for (index, id) in fresh {
            while merged.len() < index {
                match existing.next() {
                    Some(other) => merged.push(other),
                    None => break,
                }
            }
            merged.push(id);
        }
        merged.extend(existing);
        self.order = merged;
    }

    /// Overwrite an annotation in place, keeping its z-order position
    ///
    /// Returns the previous value, or `None` if the id is not stored.
    pub fn replace(&mut self, annotation: Annotation) -> Option<Annotation> {
        let slot = self.annotations.get_mut(&annotation.id())?;
        Some(std::mem::replace(slot, annotation))
    }

    /// Move an annotation to a new z-order position (clamped)
    pub fn move_to(&mut self, id: &AnnotationId, index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let id = self.order.remove(from);
        let index = index.min(self.order.len());
        self.order.insert(index, id);
        true
    }

    /// Target index for a z-order edit, or `None` if nothing would change
    ///
    /// Forward and backward step past the nearest annotation on the same page,
    /// since annotations on other pages never overlap visually.
    pub fn reorder_target(&self, id: &AnnotationId, change: ZOrderChange) -> Option<usize> {
        let from = self.index_of(id)?;
        let page = self.annotations.get(id)?.page_index();
        let last = self.order.len().saturating_sub(1);
        let on_page = |i: &usize| {
            self.annotations
                .get(&self.order[*i])
                .is_some_and(|a| a.page_index() == page)
        };
        let target = match change {
            ZOrderChange::BringToFront => last,
            ZOrderChange::SendToBack => 0,
            ZOrderChange::BringForward => ((from + 1)..self.order.len()).find(on_page)?,
            ZOrderChange::SendBackward => (0..from).rev().find(on_page)?,
        };
        (target != from).then_some(target)
    }

    /// Ids in z-order, bottom first
    pub fn ids(&self) -> &[AnnotationId] {
        &self.order
    }

    /// All annotations in z-order, bottom first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> + '_ {
        self.order.iter().filter_map(|id| self.annotations.get(id))
    }

    /// Mutable access to every annotation, in no particular order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Annotation> + '_ {
        self.annotations.values_mut()
    }

    /// Annotations on one page in z-order, bottom first
    pub fn on_page(&self, page_index: u16) -> impl DoubleEndedIterator<Item = &Annotation> + '_ {
        self.iter().filter(move |a| a.page_index() == page_index)
    }

    /// Ids on one page in z-order
    pub fn ids_on_page(&self, page_index: u16) -> Vec<AnnotationId> {
        self.on_page(page_index).map(Annotation::id).collect()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.order.clear();
    }
}
