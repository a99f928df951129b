//! Move, resize, and rotate mutators
//!
//! Resize and rotate are computed from an immutable pre-gesture snapshot and
//! the cumulative pointer delta, so repeated updates during a drag never
//! accumulate rounding drift. Locked annotations are left untouched.

use crate::annotation::{Annotation, BoxKind, PageCoordinate, Quad, Rect, Shape, Size};
use crate::clock::Timestamp;
use crate::geometry::{bounds_of, normalize_degrees, rotate_point, shape_bounds, snap_angle};
use crate::handles::HandleRole;

/// Minimum width and height for most rect-like shapes
pub const MIN_SIZE: f32 = 10.0;
/// Minimum width and height for images and notes
pub const MIN_IMAGE_SIZE: f32 = 20.0;
/// Minimum callout box width
pub const MIN_CALLOUT_WIDTH: f32 = 50.0;
/// Minimum callout box height
pub const MIN_CALLOUT_HEIGHT: f32 = 30.0;

/// Modifier state applied to a resize
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResizeOptions {
    /// Keep proportions (images, paths) or snap the line angle (endpoints)
    pub constrain: bool,
    /// Angle increment for constrained endpoint drags
    pub angle_snap: Option<f32>,
}

impl ResizeOptions {
    pub fn constrained(angle_snap: Option<f32>) -> Self {
        Self {
            constrain: true,
            angle_snap,
        }
    }
}

/// Translate every coordinate of the annotation by (dx, dy)
///
/// Satellite geometry moves too: callout arms, and the per-line rects and
/// quad corners of text markups.
pub fn apply_move(annotation: &mut Annotation, dx: f32, dy: f32, now: Timestamp) {
    if annotation.is_locked() {
        tracing::trace!(id = %annotation.id(), "move ignored on locked annotation");
        return;
    }
    if dx == 0.0 && dy == 0.0 {
        return;
    }

    translate_shape(annotation.shape_mut(), dx, dy);
    annotation.touch(now);
}

/// Translate every stored coordinate of a shape
fn translate_shape(shape: &mut Shape, dx: f32, dy: f32) {
    match shape {
        Shape::Path { points, .. } => {
            for p in points.iter_mut() {
                *p = p.offset(dx, dy);
            }
        }
        Shape::Segment { start, end, .. } => {
            *start = start.offset(dx, dy);
            *end = end.offset(dx, dy);
        }
        Shape::Boxed { rect, .. } => rect.translate(dx, dy),
        Shape::Callout { rect, arm } => {
            rect.translate(dx, dy);
            arm.tip = arm.tip.offset(dx, dy);
            arm.knee = arm.knee.offset(dx, dy);
        }
        Shape::TextMarkup {
            rect,
            line_rects,
            quads,
            ..
        } => {
            rect.translate(dx, dy);
            for r in line_rects.iter_mut() {
                r.translate(dx, dy);
            }
            for Quad { points } in quads.iter_mut() {
                for p in points.iter_mut() {
                    *p = p.offset(dx, dy);
                }
            }
        }
        Shape::Note { origin, .. } | Shape::Text { origin, .. } => *origin = origin.offset(dx, dy),
    }
}

/// Resize by dragging `role` a cumulative (dx, dy) away from where it was in
/// `snapshot`
///
/// Rect-like shapes adjust the edges the role controls and floor the size,
/// keeping the opposite edge anchored. Paths scale every point from the
/// snapshot's bounding box. Endpoints and callout arm points move directly.
/// Text markups and plain text have no resize behaviour.
///
/// On a rotated snapshot the page-space drag is first mapped into the shape's
/// unrotated frame, and the result is shifted so the anchored side stays put
/// on the page even though the rotation center moved with the new bounds.
pub fn apply_resize(
    annotation: &mut Annotation,
    snapshot: &Annotation,
    role: HandleRole,
    dx: f32,
    dy: f32,
    options: ResizeOptions,
    now: Timestamp,
) {
    if annotation.is_locked() {
        tracing::trace!(id = %annotation.id(), "resize ignored on locked annotation");
        return;
    }

    let rotation = snapshot.effective_rotation();
    let (dx, dy) = match rotation {
        Some(degrees) => {
            let local = rotate_point(&PageCoordinate::new(dx, dy), &PageCoordinate::new(0.0, 0.0), -degrees);
            (local.x, local.y)
        }
        None => (dx, dy),
    };

    let resized = match snapshot.shape() {
        Shape::Boxed { kind, rect } => {
            let rect = rect.normalized();
            let resized = match kind {
                BoxKind::Image {
                    pixel_width,
                    pixel_height,
                } if options.constrain && role.is_corner() => {
                    let aspect = if *pixel_width > 0 && *pixel_height > 0 {
                        *pixel_width as f32 / *pixel_height as f32
                    } else if rect.height > 0.0 {
                        rect.width / rect.height
                    } else {
                        1.0
                    };
                    Some(resize_with_aspect(&rect, role, dx, aspect, MIN_IMAGE_SIZE))
                }
                BoxKind::Image { .. } => resize_rect(&rect, role, dx, dy, MIN_IMAGE_SIZE, MIN_IMAGE_SIZE),
                _ => resize_rect(&rect, role, dx, dy, MIN_SIZE, MIN_SIZE),
            };
            resized.map(|rect| Shape::Boxed { kind: *kind, rect })
        }
        Shape::Note { origin, size } => {
            let rect = Shape::note_rect(origin, size.as_ref());
            resize_rect(&rect, role, dx, dy, MIN_IMAGE_SIZE, MIN_IMAGE_SIZE).map(|r| Shape::Note {
                origin: PageCoordinate::new(r.x, r.y),
                size: Some(Size::new(r.width, r.height)),
            })
        }
        Shape::Callout { rect, arm } => {
            let mut arm = *arm;
            let rect = rect.normalized();
            match role {
                HandleRole::CalloutTip => {
                    arm.tip = arm.tip.offset(dx, dy);
                    Some(Shape::Callout { rect, arm })
                }
                HandleRole::CalloutKnee => {
                    arm.knee = arm.knee.offset(dx, dy);
                    Some(Shape::Callout { rect, arm })
                }
                r if r.is_corner() => resize_rect(&rect, r, dx, dy, MIN_CALLOUT_WIDTH, MIN_CALLOUT_HEIGHT)
                    .map(|rect| Shape::Callout { rect, arm }),
                _ => None,
            }
        }
        Shape::Segment { kind, start, end } => {
            let (mut start, mut end) = (*start, *end);
            let snap = options.angle_snap.filter(|_| options.constrain);
            match role {
                HandleRole::LineStart => start = drag_endpoint(&start, &end, dx, dy, snap),
                HandleRole::LineEnd => end = drag_endpoint(&end, &start, dx, dy, snap),
                _ => {}
            }
            match role {
                HandleRole::LineStart | HandleRole::LineEnd => Some(Shape::Segment { kind: *kind, start, end }),
                _ => None,
            }
        }
        Shape::Path { kind, points } if role.is_corner() => {
            Rect::from_points(points.iter()).map(|bounds| Shape::Path {
                kind: *kind,
                points: scale_points(points, &bounds, role, dx, dy, options.constrain),
            })
        }
        Shape::Path { .. } | Shape::TextMarkup { .. } | Shape::Text { .. } => None,
    };

    match resized {
        Some(mut shape) => {
            if let Some(degrees) = rotation {
                keep_rotated_anchor(&mut shape, snapshot.shape(), degrees);
            }
            *annotation.shape_mut() = shape;
            annotation.touch(now);
        }
        None => {
            tracing::trace!(id = %annotation.id(), ?role, "resize has no effect for this handle");
        }
    }
}

/// Shift a resized shape so points that stayed fixed in its local frame also
/// stay fixed on the page
///
/// The page position of a local point is `C + R(L - C)`. When the bounds
/// center moves by `d`, every unmoved local point drifts by `d - R(d)`, so the
/// shape is translated by `R(d) - d`.
fn keep_rotated_anchor(shape: &mut Shape, before: &Shape, degrees: f32) {
    let (Some(old), Some(new)) = (shape_bounds(before), shape_bounds(shape)) else {
        return;
    };
    let (old, new) = (old.center(), new.center());
    let drift = PageCoordinate::new(new.x - old.x, new.y - old.y);
    let turned = rotate_point(&drift, &PageCoordinate::new(0.0, 0.0), degrees);
    translate_shape(shape, turned.x - drift.x, turned.y - drift.y);
}

/// Adjust the edges `role` controls and floor the size
///
/// Returns `None` for roles that do not resize a rectangle.
fn resize_rect(rect: &Rect, role: HandleRole, dx: f32, dy: f32, min_w: f32, min_h: f32) -> Option<Rect> {
    if !(role.is_corner() || role.is_edge()) {
        return None;
    }

    let (mut left, mut top, mut right, mut bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    if role.moves_left() {
        left += dx;
    }
    if role.moves_right() {
        right += dx;
    }
    if role.moves_top() {
        top += dy;
    }
    if role.moves_bottom() {
        bottom += dy;
    }

    if right - left < min_w {
        if role.moves_left() {
            left = right - min_w;
        } else {
            right = left + min_w;
        }
    }
    if bottom - top < min_h {
        if role.moves_top() {
            top = bottom - min_h;
        } else {
            bottom = top + min_h;
        }
    }

    Some(Rect::new(left, top, right - left, bottom - top))
}

/// Corner resize that keeps `width / height == aspect`, anchored at the
/// opposite corner and driven by the horizontal delta
fn resize_with_aspect(rect: &Rect, role: HandleRole, dx: f32, aspect: f32, min: f32) -> Rect {
    let mut width = if role.moves_left() {
        rect.width - dx
    } else {
        rect.width + dx
    };
    let mut height = width / aspect;

    if width < min {
        width = min;
        height = width / aspect;
    }
    if height < min {
        height = min;
        width = height * aspect;
    }

    let x = if role.moves_left() { rect.right() - width } else { rect.x };
    let y = if role.moves_top() { rect.bottom() - height } else { rect.y };
    Rect::new(x, y, width, height)
}

/// Move an endpoint by (dx, dy); with a snap increment the segment keeps the
/// dragged length but its angle is rounded to the increment
fn drag_endpoint(
    point: &PageCoordinate,
    anchor: &PageCoordinate,
    dx: f32,
    dy: f32,
    snap: Option<f32>,
) -> PageCoordinate {
    let moved = point.offset(dx, dy);
    let Some(increment) = snap else {
        return moved;
    };
    let vx = moved.x - anchor.x;
    let vy = moved.y - anchor.y;
    let length = (vx * vx + vy * vy).sqrt();
    let angle = snap_angle(vy.atan2(vx).to_degrees(), increment).to_radians();
    PageCoordinate::new(anchor.x + length * angle.cos(), anchor.y + length * angle.sin())
}

/// Remap every point from the old bounding box to the box produced by
/// dragging a corner
fn scale_points(
    points: &[PageCoordinate],
    bounds: &Rect,
    role: HandleRole,
    dx: f32,
    dy: f32,
    uniform: bool,
) -> Vec<PageCoordinate> {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (bounds.x, bounds.y, bounds.right(), bounds.bottom());
    if role.moves_left() {
        min_x += dx;
    } else {
        max_x += dx;
    }
    if role.moves_top() {
        min_y += dy;
    } else {
        max_y += dy;
    }

    // Degenerate axes (a horizontal polyline, say) divide by one instead of zero.
    let orig_w = if bounds.width.abs() > f32::EPSILON { bounds.width } else { 1.0 };
    let orig_h = if bounds.height.abs() > f32::EPSILON { bounds.height } else { 1.0 };
    let mut sx = (max_x - min_x) / orig_w;
    let mut sy = (max_y - min_y) / orig_h;

    if uniform {
        let s = if sx.abs() >= sy.abs() { sx } else { sy };
        sx = s;
        sy = s;
        // re-anchor on the corner opposite the dragged one
        if role.moves_left() {
            min_x = bounds.right() - bounds.width * s;
        }
        if role.moves_top() {
            min_y = bounds.bottom() - bounds.height * s;
        }
    }

    points
        .iter()
        .map(|p| PageCoordinate::new(min_x + (p.x - bounds.x) * sx, min_y + (p.y - bounds.y) * sy))
        .collect()
}

/// Rotate so the handle above the shape follows the pointer
///
/// `rotation = atan2(py - cy, px - cx) + 90` about the snapshot's bounding-box
/// center, optionally snapped, normalized into `[0, 360)`. Only rotatable
/// kinds respond.
pub fn apply_rotation(
    annotation: &mut Annotation,
    snapshot: &Annotation,
    pointer: &PageCoordinate,
    snap_increment: Option<f32>,
    now: Timestamp,
) {
    if annotation.is_locked() {
        tracing::trace!(id = %annotation.id(), "rotate ignored on locked annotation");
        return;
    }
    if !snapshot.kind().is_rotatable() {
        tracing::trace!(id = %annotation.id(), kind = %snapshot.kind(), "rotate ignored for kind");
        return;
    }
    let Some(bounds) = bounds_of(snapshot) else {
        return;
    };

    let center = bounds.center();
    let mut degrees = (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() + 90.0;
    if let Some(increment) = snap_increment {
        degrees = snap_angle(degrees, increment);
    }

    annotation.set_rotation(Some(normalize_degrees(degrees)));
    annotation.touch(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{CalloutArm, MarkupKind, PathKind, SegmentKind};

    const EPS: f32 = 1e-3;

    fn pt(x: f32, y: f32) -> PageCoordinate {
        PageCoordinate::new(x, y)
    }

    fn ann(shape: Shape) -> Annotation {
        Annotation::new(0, shape, Timestamp(0))
    }

    fn rect_of(a: &Annotation) -> Rect {
        match a.shape() {
            Shape::Boxed { rect, .. } | Shape::Callout { rect, .. } => *rect,
            other => panic!("not rect-based: {other:?}"),
        }
    }

    fn assert_rect(actual: Rect, expected: Rect) {
        assert!(
            (actual.x - expected.x).abs() < EPS
                && (actual.y - expected.y).abs() < EPS
                && (actual.width - expected.width).abs() < EPS
                && (actual.height - expected.height).abs() < EPS,
            "{actual:?} != {expected:?}"
        );
    }

    fn rectangle() -> Annotation {
        ann(Shape::Boxed {
            kind: BoxKind::Rectangle,
            rect: Rect::new(100.0, 100.0, 50.0, 40.0),
        })
    }

    #[test]
    fn test_move_translates_satellites() {
        let rect = Rect::new(100.0, 100.0, 80.0, 40.0);
        let mut callout = ann(Shape::Callout {
            rect,
            arm: CalloutArm::default_for(&rect),
        });
        apply_move(&mut callout, 10.0, -5.0, Timestamp(3));
        let Shape::Callout { rect, arm } = callout.shape() else {
            unreachable!()
        };
        assert_eq!(rect.x, 110.0);
        assert_eq!(arm.tip, pt(50.0, 135.0));
        assert_eq!(arm.knee, pt(80.0, 115.0));
        assert_eq!(callout.metadata().modified_at, Timestamp(3));

        let line = Rect::new(0.0, 0.0, 10.0, 5.0);
        let mut markup = ann(Shape::TextMarkup {
            kind: MarkupKind::Underline,
            rect: line,
            line_rects: vec![line],
            quads: vec![Quad::from_rect(&line)],
        });
        apply_move(&mut markup, 2.0, 3.0, Timestamp(1));
        let Shape::TextMarkup { line_rects, quads, .. } = markup.shape() else {
            unreachable!()
        };
        assert_eq!(line_rects[0], Rect::new(2.0, 3.0, 10.0, 5.0));
        assert_eq!(quads[0].points[3], pt(12.0, 8.0));
    }

    #[test]
    fn test_locked_annotation_is_untouched() {
        let mut a = rectangle().locked();
        let before = a.clone();
        apply_move(&mut a, 5.0, 5.0, Timestamp(9));
        apply_resize(&mut a, &before, HandleRole::Right, 20.0, 0.0, ResizeOptions::default(), Timestamp(9));
        apply_rotation(&mut a, &before, &pt(200.0, 120.0), None, Timestamp(9));
        assert_eq!(a, before);
    }

    #[test]
    fn test_resize_roles() {
        let snap = rectangle();
        let opts = ResizeOptions::default();
        let cases = [
            (HandleRole::TopLeft, Rect::new(90.0, 95.0, 60.0, 45.0)),
            (HandleRole::TopRight, Rect::new(100.0, 95.0, 40.0, 45.0)),
            (HandleRole::BottomLeft, Rect::new(90.0, 100.0, 60.0, 35.0)),
            (HandleRole::BottomRight, Rect::new(100.0, 100.0, 40.0, 35.0)),
            (HandleRole::Top, Rect::new(100.0, 95.0, 50.0, 45.0)),
            (HandleRole::Bottom, Rect::new(100.0, 100.0, 50.0, 35.0)),
            (HandleRole::Left, Rect::new(90.0, 100.0, 60.0, 40.0)),
            (HandleRole::Right, Rect::new(100.0, 100.0, 40.0, 40.0)),
        ];
        for (role, expected) in cases {
            let mut live = snap.clone();
            apply_resize(&mut live, &snap, role, -10.0, -5.0, opts, Timestamp(1));
            assert_rect(rect_of(&live), expected);
        }
    }

    #[test]
    fn test_resize_floor_keeps_opposite_edge() {
        let snap = rectangle();
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::Left, 100.0, 0.0, ResizeOptions::default(), Timestamp(1));
        assert_rect(rect_of(&live), Rect::new(140.0, 100.0, 10.0, 40.0));

        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::Bottom, 0.0, -100.0, ResizeOptions::default(), Timestamp(1));
        assert_rect(rect_of(&live), Rect::new(100.0, 100.0, 50.0, 10.0));
    }

    #[test]
    fn test_resize_is_computed_from_snapshot() {
        let snap = rectangle();
        let mut live = snap.clone();
        for step in 1..=5 {
            apply_resize(
                &mut live,
                &snap,
                HandleRole::Right,
                step as f32 * 2.0,
                0.0,
                ResizeOptions::default(),
                Timestamp(step),
            );
        }
        assert_rect(rect_of(&live), Rect::new(100.0, 100.0, 60.0, 40.0));
    }

    #[test]
    fn test_rotated_resize_follows_visible_handle_axis() {
        // center (20, 10); a quarter turn puts the Right handle at (20, 30)
        let snap = ann(Shape::Boxed {
            kind: BoxKind::Rectangle,
            rect: Rect::new(0.0, 0.0, 40.0, 20.0),
        })
        .with_rotation(90.0);

        // dragging down the page pulls the Right edge outward
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::Right, 0.0, 10.0, ResizeOptions::default(), Timestamp(1));
        assert_rect(rect_of(&live), Rect::new(-5.0, 5.0, 50.0, 20.0));

        // the Left edge midpoint stays at (20, -10) on the page
        let center = rect_of(&live).center();
        let left = rotate_point(&pt(rect_of(&live).x, center.y), &center, 90.0);
        assert!((left.x - 20.0).abs() < EPS && (left.y + 10.0).abs() < EPS);

        // dragging across the handle's axis does nothing
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::Right, 10.0, 0.0, ResizeOptions::default(), Timestamp(1));
        assert_rect(rect_of(&live), Rect::new(0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn test_rotated_corner_keeps_opposite_corner() {
        let snap = rectangle().with_rotation(30.0);
        let before = rect_of(&snap);
        let anchor_before = rotate_point(&pt(before.x, before.y), &before.center(), 30.0);

        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::BottomRight, 12.0, -7.0, ResizeOptions::default(), Timestamp(1));
        let after = rect_of(&live);
        let anchor_after = rotate_point(&pt(after.x, after.y), &after.center(), 30.0);
        assert!((anchor_before.x - anchor_after.x).abs() < EPS);
        assert!((anchor_before.y - anchor_after.y).abs() < EPS);
        assert!(after.width != before.width || after.height != before.height);
    }

    #[test]
    fn test_image_aspect_locked_corner() {
        let snap = ann(Shape::Boxed {
            kind: BoxKind::Image {
                pixel_width: 400,
                pixel_height: 200,
            },
            rect: Rect::new(0.0, 0.0, 100.0, 50.0),
        });
        let mut live = snap.clone();
        apply_resize(
            &mut live,
            &snap,
            HandleRole::TopLeft,
            -20.0,
            7.0,
            ResizeOptions::constrained(None),
            Timestamp(1),
        );
        // width 120 at 2:1, anchored on the bottom-right corner (100, 50)
        assert_rect(rect_of(&live), Rect::new(-20.0, -10.0, 120.0, 60.0));

        let mut live = snap.clone();
        apply_resize(
            &mut live,
            &snap,
            HandleRole::BottomRight,
            -200.0,
            0.0,
            ResizeOptions::constrained(None),
            Timestamp(1),
        );
        assert_rect(rect_of(&live), Rect::new(0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn test_callout_resize_floor_and_arm() {
        let rect = Rect::new(100.0, 100.0, 80.0, 40.0);
        let snap = ann(Shape::Callout {
            rect,
            arm: CalloutArm::default_for(&rect),
        });

        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::BottomRight, -60.0, -30.0, ResizeOptions::default(), Timestamp(1));
        assert_rect(rect_of(&live), Rect::new(100.0, 100.0, 50.0, 30.0));

        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::CalloutKnee, 5.0, 5.0, ResizeOptions::default(), Timestamp(1));
        let Shape::Callout { arm, rect } = live.shape() else {
            unreachable!()
        };
        assert_eq!(arm.knee, pt(75.0, 125.0));
        assert_eq!(*rect, Rect::new(100.0, 100.0, 80.0, 40.0));

        // edge handles do not exist on callouts
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::Top, 0.0, 10.0, ResizeOptions::default(), Timestamp(1));
        assert_eq!(live, snap);
    }

    #[test]
    fn test_note_resize_floor() {
        let snap = ann(Shape::Note {
            origin: pt(0.0, 0.0),
            size: None,
        });
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::BottomRight, -10.0, 6.0, ResizeOptions::default(), Timestamp(1));
        assert_eq!(
            live.shape(),
            &Shape::Note {
                origin: pt(0.0, 0.0),
                size: Some(Size::new(20.0, 30.0)),
            }
        );
    }

    #[test]
    fn test_line_endpoint_angle_snap() {
        let snap = ann(Shape::Segment {
            kind: SegmentKind::Line,
            start: pt(0.0, 0.0),
            end: pt(100.0, 0.0),
        });
        let mut live = snap.clone();
        apply_resize(
            &mut live,
            &snap,
            HandleRole::LineEnd,
            0.0,
            10.0,
            ResizeOptions::constrained(Some(15.0)),
            Timestamp(1),
        );
        let Shape::Segment { start, end, .. } = live.shape() else {
            unreachable!()
        };
        assert_eq!(*start, pt(0.0, 0.0));
        // ~5.7 degrees rounds to 0, length preserved
        assert!((end.x - 100.0f32.hypot(10.0)).abs() < EPS);
        assert!(end.y.abs() < EPS);

        let mut free = snap.clone();
        apply_resize(&mut free, &snap, HandleRole::LineStart, 3.0, 4.0, ResizeOptions::default(), Timestamp(1));
        let Shape::Segment { start, .. } = free.shape() else {
            unreachable!()
        };
        assert_eq!(*start, pt(3.0, 4.0));
    }

    #[test]
    fn test_path_scales_from_bounds() {
        let snap = ann(Shape::Path {
            kind: PathKind::Freehand,
            points: vec![pt(0.0, 0.0), pt(10.0, 5.0), pt(20.0, 10.0)],
        });
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::BottomRight, 20.0, 0.0, ResizeOptions::default(), Timestamp(1));
        let Shape::Path { points, .. } = live.shape() else {
            unreachable!()
        };
        assert_eq!(points, &vec![pt(0.0, 0.0), pt(20.0, 5.0), pt(40.0, 10.0)]);

        let mut live = snap.clone();
        apply_resize(
            &mut live,
            &snap,
            HandleRole::TopLeft,
            -20.0,
            0.0,
            ResizeOptions::constrained(None),
            Timestamp(1),
        );
        let Shape::Path { points, .. } = live.shape() else {
            unreachable!()
        };
        // uniform scale 2 anchored at the bottom-right corner (20, 10)
        assert!((points[0].x + 20.0).abs() < EPS && (points[0].y + 10.0).abs() < EPS);
        assert!((points[2].x - 20.0).abs() < EPS && (points[2].y - 10.0).abs() < EPS);
    }

    #[test]
    fn test_markup_resize_is_noop() {
        let line = Rect::new(0.0, 0.0, 10.0, 5.0);
        let snap = ann(Shape::TextMarkup {
            kind: MarkupKind::Highlight,
            rect: line,
            line_rects: vec![line],
            quads: Vec::new(),
        });
        let mut live = snap.clone();
        apply_resize(&mut live, &snap, HandleRole::BottomRight, 5.0, 5.0, ResizeOptions::default(), Timestamp(4));
        assert_eq!(live, snap);
    }

    #[test]
    fn test_rotation_follows_pointer() {
        let snap = rectangle();
        // center (125, 120); pointer straight right means a quarter turn
        let mut live = snap.clone();
        apply_rotation(&mut live, &snap, &pt(200.0, 120.0), None, Timestamp(2));
        assert!((live.rotation().unwrap() - 90.0).abs() < EPS);

        // pointer straight above is back to zero
        apply_rotation(&mut live, &snap, &pt(125.0, 0.0), None, Timestamp(2));
        assert!(live.rotation().unwrap().abs() < EPS);

        // snapped
        apply_rotation(&mut live, &snap, &pt(200.0, 122.0), Some(15.0), Timestamp(2));
        assert!((live.rotation().unwrap() - 90.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_ignored_for_lines() {
        let snap = ann(Shape::Segment {
            kind: SegmentKind::Arrow,
            start: pt(0.0, 0.0),
            end: pt(10.0, 10.0),
        });
        let mut live = snap.clone();
        apply_rotation(&mut live, &snap, &pt(50.0, 50.0), None, Timestamp(1));
        assert_eq!(live.rotation(), None);
    }
}
