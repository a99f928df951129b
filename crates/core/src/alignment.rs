//! Alignment and distribution of multi-selections
//!
//! Every repositioning goes through [`apply_move`], so locked members stay put
//! and satellite geometry follows. The returned changes are recorded by the
//! caller as a single bulk command.

use crate::annotation::{Annotation, AnnotationId, Rect};
use crate::clock::Timestamp;
use crate::command::Change;
use crate::geometry::bounds_of;
use crate::store::AnnotationStore;
use crate::transform::apply_move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Alignment {
    Left,
    /// Horizontal centers
    Center,
    Right,
    Top,
    /// Vertical centers
    Middle,
    Bottom,
}

impl Alignment {
    pub fn label(&self) -> &'static str {
        match self {
            Alignment::Left => "Align Left",
            Alignment::Center => "Align Center",
            Alignment::Right => "Align Right",
            Alignment::Top => "Align Top",
            Alignment::Middle => "Align Middle",
            Alignment::Bottom => "Align Bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Distribution {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
    /// Equal horizontal gaps between neighbours
    SpaceHorizontal,
    /// Equal vertical gaps between neighbours
    SpaceVertical,
}

impl Distribution {
    pub fn label(&self) -> &'static str {
        match self {
            Distribution::Left => "Distribute Left Edges",
            Distribution::Center => "Distribute Centers",
            Distribution::Right => "Distribute Right Edges",
            Distribution::Top => "Distribute Top Edges",
            Distribution::Middle => "Distribute Middles",
            Distribution::Bottom => "Distribute Bottom Edges",
            Distribution::SpaceHorizontal => "Distribute Horizontally",
            Distribution::SpaceVertical => "Distribute Vertically",
        }
    }

    fn is_horizontal(&self) -> bool {
        matches!(
            self,
            Distribution::Left | Distribution::Center | Distribution::Right | Distribution::SpaceHorizontal
        )
    }

    /// Reference coordinate that the evenly-stepped distributions space out
    fn reference(&self, b: &Rect) -> f32 {
        match self {
            Distribution::Left | Distribution::SpaceHorizontal => b.x,
            Distribution::Center => b.x + b.width / 2.0,
            Distribution::Right => b.right(),
            Distribution::Top | Distribution::SpaceVertical => b.y,
            Distribution::Middle => b.y + b.height / 2.0,
            Distribution::Bottom => b.bottom(),
        }
    }
}

/// Selection members that exist and have bounds, without duplicates
fn members(store: &AnnotationStore, ids: &[AnnotationId]) -> Vec<(AnnotationId, Rect)> {
    let mut out: Vec<(AnnotationId, Rect)> = Vec::with_capacity(ids.len());
    for id in ids {
        if out.iter().any(|(seen, _)| seen == id) {
            continue;
        }
        if let Some(bounds) = store.get(id).and_then(bounds_of) {
            out.push((*id, bounds));
        }
    }
    out
}

fn move_member(
    store: &mut AnnotationStore,
    id: &AnnotationId,
    dx: f32,
    dy: f32,
    now: Timestamp,
    changes: &mut Vec<Change<Annotation>>,
) {
    let Some(annotation) = store.get_mut(id) else {
        return;
    };
    let before = annotation.clone();
    apply_move(annotation, dx, dy, now);
    if let Some(change) = Change::non_trivial(before, annotation.clone()) {
        changes.push(change);
    }
}

/// Align every member's edge or center to the selection's
///
/// Needs at least two members with bounds; otherwise nothing moves.
pub fn align(
    store: &mut AnnotationStore,
    ids: &[AnnotationId],
    alignment: Alignment,
    now: Timestamp,
) -> Vec<Change<Annotation>> {
    let members = members(store, ids);
    if members.len() < 2 {
        tracing::trace!(count = members.len(), "alignment needs at least two members");
        return Vec::new();
    }

    let Some(union) = members.iter().map(|(_, b)| *b).reduce(|acc, b| acc.union(&b)) else {
        return Vec::new();
    };
    let union_center = union.center();

    let mut changes = Vec::new();
    for (id, b) in &members {
        let (dx, dy) = match alignment {
            Alignment::Left => (union.x - b.x, 0.0),
            Alignment::Center => (union_center.x - b.center().x, 0.0),
            Alignment::Right => (union.right() - b.right(), 0.0),
            Alignment::Top => (0.0, union.y - b.y),
            Alignment::Middle => (0.0, union_center.y - b.center().y),
            Alignment::Bottom => (0.0, union.bottom() - b.bottom()),
        };
        move_member(store, id, dx, dy, now, &mut changes);
    }
    changes
}

/// Spread members evenly along one axis
///
/// Edge and center distributions keep the outermost members in place and step
/// the chosen reference coordinate evenly between them. Space distributions
/// keep the first leading edge and place members flush with equal gaps.
/// Needs at least three members with bounds; otherwise nothing moves.
pub fn distribute(
    store: &mut AnnotationStore,
    ids: &[AnnotationId],
    distribution: Distribution,
    now: Timestamp,
) -> Vec<Change<Annotation>> {
    let mut members = members(store, ids);
    if members.len() < 3 {
        tracing::trace!(count = members.len(), "distribution needs at least three members");
        return Vec::new();
    }

    members.sort_by(|(_, a), (_, b)| distribution.reference(a).total_cmp(&distribution.reference(b)));
    let horizontal = distribution.is_horizontal();
    let n = members.len();
    let (first, last) = (&members[0].1, &members[n - 1].1);

    let targets: Vec<f32> = match distribution {
        Distribution::SpaceHorizontal | Distribution::SpaceVertical => {
            let size = |b: &Rect| if horizontal { b.width } else { b.height };
            let start = distribution.reference(first);
            let end = if horizontal { last.right() } else { last.bottom() };
            let total: f32 = members.iter().map(|(_, b)| size(b)).sum();
            let gap = ((end - start) - total) / (n - 1) as f32;

            let mut cursor = start;
            members
                .iter()
                .map(|(_, b)| {
                    let target = cursor;
                    cursor += size(b) + gap;
                    target
                })
                .collect()
        }
        _ => {
            let start = distribution.reference(first);
            let step = (distribution.reference(last) - start) / (n - 1) as f32;
            (0..n).map(|i| start + step * i as f32).collect()
        }
    };

    let mut changes = Vec::new();
    for ((id, b), target) in members.iter().zip(targets) {
        let delta = target - distribution.reference(b);
        let (dx, dy) = if horizontal { (delta, 0.0) } else { (0.0, delta) };
        move_member(store, id, dx, dy, now, &mut changes);
    }
    changes
}
