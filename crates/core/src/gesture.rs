//! Pointer gestures over annotations
//!
//! A gesture snapshots the annotations it touches when it begins. Every
//! update restores the live annotations from those snapshots and re-applies
//! the full delta from the gesture origin, so repeated updates never drift.
//! Finishing turns the net change into at most one command; abandoning puts
//! the snapshots back.

use crate::annotation::{Annotation, AnnotationId, PageCoordinate, Rect};
use crate::clock::Timestamp;
use crate::command::{Change, Command};
use crate::config::EngineConfig;
use crate::document::DocumentId;
use crate::error::{EngineError, EngineResult};
use crate::geometry::bounds_of;
use crate::handles::HandleRole;
use crate::snapping::{SmartGuides, SnapEngine};
use crate::store::AnnotationStore;
use crate::transform::{apply_move, apply_resize, apply_rotation, ResizeOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Drag one or more annotations
    Move,
    /// Drag one handle of a single annotation
    Resize(HandleRole),
    /// Drag the rotation handle of a single annotation
    Rotate,
}

impl GestureKind {
    fn verb(&self) -> &'static str {
        match self {
            GestureKind::Move => "Move",
            GestureKind::Resize(_) => "Resize",
            GestureKind::Rotate => "Rotate",
        }
    }
}

/// Keyboard modifiers held during an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift: keep aspect ratio, snap line angles
    pub constrain: bool,
}

impl Modifiers {
    pub fn constrained() -> Self {
        Self { constrain: true }
    }
}

#[derive(Debug, Clone)]
pub struct Gesture {
    document: DocumentId,
    kind: GestureKind,
    origin: PageCoordinate,
    page_index: u16,
    snapshots: Vec<Annotation>,
}

impl Gesture {
    /// Capture snapshots of `ids` and start a gesture at `origin`
    ///
    /// Move accepts one or more annotations, all on one page; resize and
    /// rotate take exactly one.
    pub fn begin(
        document: DocumentId,
        kind: GestureKind,
        origin: PageCoordinate,
        store: &AnnotationStore,
        ids: &[AnnotationId],
    ) -> EngineResult<Self> {
        match (kind, ids.len()) {
            (_, 0) => return Err(EngineError::GestureState("gesture needs at least one annotation")),
            (GestureKind::Resize(_) | GestureKind::Rotate, n) if n > 1 => {
                return Err(EngineError::GestureState("resize and rotate take a single annotation"))
            }
            _ => {}
        }

        let mut snapshots: Vec<Annotation> = Vec::with_capacity(ids.len());
        for id in ids {
            if snapshots.iter().any(|s| s.id() == *id) {
                continue;
            }
            let annotation = store.get(id).ok_or(EngineError::AnnotationNotFound(*id))?;
            snapshots.push(annotation.clone());
        }
        let page_index = snapshots
            .first()
            .map(Annotation::page_index)
            .ok_or(EngineError::GestureState("gesture needs at least one annotation"))?;
        if snapshots.iter().any(|s| s.page_index() != page_index) {
            return Err(EngineError::GestureState("move spans multiple pages"));
        }

        tracing::debug!(document, ?kind, count = snapshots.len(), "gesture started");
        Ok(Self {
            document,
            kind,
            origin,
            page_index,
            snapshots,
        })
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn origin(&self) -> PageCoordinate {
        self.origin
    }

    pub fn annotation_ids(&self) -> Vec<AnnotationId> {
        self.snapshots.iter().map(Annotation::id).collect()
    }

    /// Pre-gesture state of the touched annotations
    pub fn snapshots(&self) -> &[Annotation] {
        &self.snapshots
    }

    /// Union of the snapshots' bounds
    fn snapshot_bounds(&self) -> Option<Rect> {
        self.snapshots
            .iter()
            .filter_map(bounds_of)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Re-apply the gesture for the pointer's current position
    ///
    /// Returns the smart guides a move produced (empty for other gestures).
    pub fn update(
        &self,
        store: &mut AnnotationStore,
        pointer: PageCoordinate,
        modifiers: Modifiers,
        config: &EngineConfig,
        snap: &SnapEngine,
        now: Timestamp,
    ) -> SmartGuides {
        let mut dx = pointer.x - self.origin.x;
        let mut dy = pointer.y - self.origin.y;
        let mut guides = SmartGuides::default();

        if self.kind == GestureKind::Move {
            if let Some(bounds) = self.snapshot_bounds() {
                let exclude = self.annotation_ids();
                guides = snap.find_guides(&bounds, dx, dy, store, self.page_index, &exclude);
                (dx, dy) = guides.snapped_delta(dx, dy);
            }
        }

        for snapshot in &self.snapshots {
            let Some(live) = store.get_mut(&snapshot.id()) else {
                tracing::warn!(id = %snapshot.id(), "annotation disappeared during gesture");
                continue;
            };
            *live = snapshot.clone();
            match self.kind {
                GestureKind::Move => apply_move(live, dx, dy, now),
                GestureKind::Resize(role) => {
                    let options = ResizeOptions {
                        constrain: modifiers.constrain,
                        angle_snap: config.angle_snap(),
                    };
                    apply_resize(live, snapshot, role, dx, dy, options, now);
                }
                GestureKind::Rotate => apply_rotation(live, snapshot, &pointer, config.angle_snap(), now),
            }
        }
        guides
    }

    /// Net change since the gesture began as one command, if anything changed
    pub fn finish(self, store: &AnnotationStore) -> Option<Command> {
        let verb = self.kind.verb();
        let mut changes: Vec<Change<Annotation>> = self
            .snapshots
            .into_iter()
            .filter_map(|before| {
                let after = store.get(&before.id())?.clone();
                Change::non_trivial(before, after)
            })
            .collect();

        let command = match changes.len() {
            0 => {
                tracing::debug!(document = self.document, "gesture ended without changes");
                return None;
            }
            1 => Command::ModifyAnnotation(changes.remove(0)),
            n => Command::BulkModify {
                label: format!("{verb} {n} annotations"),
                changes,
            },
        };
        tracing::debug!(document = self.document, description = %command.description(), "gesture ended");
        Some(command)
    }

    /// Restore every touched annotation to its snapshot
    pub fn abandon(self, store: &mut AnnotationStore) {
        tracing::warn!(
            document = self.document,
            kind = ?self.kind,
            count = self.snapshots.len(),
            "gesture abandoned; restoring snapshots"
        );
        for snapshot in self.snapshots {
            store.replace(snapshot);
        }
    }
}
