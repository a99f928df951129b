//! Selection of annotations by id
//!
//! A selection never owns annotations; it only names them. Ids whose
//! annotations have been removed from the store are skipped when resolved.

use crate::annotation::{Annotation, AnnotationId, Rect};
use crate::geometry::bounds_of;
use crate::store::AnnotationStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<AnnotationId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(id: AnnotationId) -> Self {
        Self { ids: vec![id] }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = AnnotationId>) -> Self {
        let mut selection = Self::new();
        for id in ids {
            selection.add(id);
        }
        selection
    }

    /// Add an id, keeping selection order and ignoring duplicates
    pub fn add(&mut self, id: AnnotationId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &AnnotationId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|candidate| candidate != id);
        self.ids.len() != before
    }

    /// Add the id if absent, remove it if present (shift-click)
    pub fn toggle(&mut self, id: AnnotationId) {
        if !self.remove(&id) {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[AnnotationId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// First selected id
    pub fn primary(&self) -> Option<AnnotationId> {
        self.ids.first().copied()
    }

    /// Drop ids that no longer resolve in the store
    pub fn retain_existing(&mut self, store: &AnnotationStore) {
        self.ids.retain(|id| store.contains(id));
    }

    /// Selected annotations that still exist, in selection order
    pub fn resolve<'a>(&'a self, store: &'a AnnotationStore) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.ids.iter().filter_map(move |id| store.get(id))
    }

    /// Union of member bounds, ignoring members without bounds
    pub fn aggregate_bounds(&self, store: &AnnotationStore) -> Option<Rect> {
        self.resolve(store)
            .filter_map(bounds_of)
            .reduce(|acc, b| acc.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{BoxKind, PageCoordinate, Shape};
    use crate::clock::Timestamp;

    fn rectangle(x: f32, y: f32, w: f32, h: f32) -> Annotation {
        Annotation::new(
            0,
            Shape::Boxed {
                kind: BoxKind::Rectangle,
                rect: Rect::new(x, y, w, h),
            },
            Timestamp(0),
        )
    }

    #[test]
    fn test_add_toggle_remove() {
        let a = AnnotationId::new_v4();
        let b = AnnotationId::new_v4();
        let mut selection = Selection::single(a);
        selection.add(a);
        assert_eq!(selection.len(), 1);

        selection.toggle(b);
        assert_eq!(selection.ids(), &[a, b]);
        selection.toggle(a);
        assert_eq!(selection.ids(), &[b]);
        assert_eq!(selection.primary(), Some(b));

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_aggregate_bounds_skips_missing_and_unbounded() {
        let mut store = AnnotationStore::new();
        let a = rectangle(0.0, 0.0, 10.0, 10.0);
        let b = rectangle(20.0, 5.0, 10.0, 30.0);
        let text = Annotation::new(
            0,
            Shape::Text {
                origin: PageCoordinate::new(500.0, 500.0),
                font_size: 12.0,
                measured_width: None,
            },
            Timestamp(0),
        );
        let selection = Selection::from_ids([a.id(), b.id(), text.id(), AnnotationId::new_v4()]);
        store.push(a);
        store.push(b);
        store.push(text);

        assert_eq!(
            selection.aggregate_bounds(&store),
            Some(Rect::new(0.0, 0.0, 30.0, 35.0))
        );
        assert_eq!(selection.resolve(&store).count(), 3);
    }

    #[test]
    fn test_retain_existing() {
        let mut store = AnnotationStore::new();
        let a = rectangle(0.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::from_ids([a.id(), AnnotationId::new_v4()]);
        store.push(a);

        selection.retain_existing(&store);
        assert_eq!(selection.len(), 1);
        assert_eq!(Selection::new().aggregate_bounds(&store), None);
    }
}
