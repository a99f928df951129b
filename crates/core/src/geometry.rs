//! Geometry service
//!
//! Bounds, hit-testing, drag containment, and rotation mapping for every
//! shape representation. Rotated shapes are tested by mapping the query point
//! back into the shape's unrotated frame:
//! `local = R(-rotation) * (point - center) + center`.

use crate::annotation::{Annotation, PageCoordinate, PathKind, Rect, SegmentKind, Shape, BoxKind};
use crate::config::EngineConfig;
use crate::store::AnnotationStore;

/// Rotate `point` about `center` by `degrees` (clockwise on a y-down page)
pub fn rotate_point(point: &PageCoordinate, center: &PageCoordinate, degrees: f32) -> PageCoordinate {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    PageCoordinate::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// Inverse of [`rotate_point`]
pub fn inverse_rotate_point(point: &PageCoordinate, center: &PageCoordinate, degrees: f32) -> PageCoordinate {
    rotate_point(point, center, -degrees)
}

/// Distance from `point` to the segment `a`-`b`
pub fn distance_to_segment(point: &PageCoordinate, a: &PageCoordinate, b: &PageCoordinate) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return point.distance_to(a);
    }

    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance_to(&PageCoordinate::new(a.x + t * dx, a.y + t * dy))
}

/// Shortest distance from `point` to a chain of segments
///
/// A single point degenerates to point distance. With `closed`, the last
/// point also connects back to the first.
pub fn distance_to_polyline(point: &PageCoordinate, points: &[PageCoordinate], closed: bool) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => point.distance_to(only),
        _ => {
            let open = points
                .windows(2)
                .map(|pair| distance_to_segment(point, &pair[0], &pair[1]));
            let closing = (closed && points.len() >= 3)
                .then(|| distance_to_segment(point, &points[points.len() - 1], &points[0]));
            open.chain(closing).fold(f32::INFINITY, f32::min)
        }
    }
}

/// Normalized ellipse test: `((x-cx)/rx)^2 + ((y-cy)/ry)^2 <= 1`
pub fn point_in_ellipse(point: &PageCoordinate, rect: &Rect) -> bool {
    let rx = rect.width / 2.0;
    let ry = rect.height / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let c = rect.center();
    let nx = (point.x - c.x) / rx;
    let ny = (point.y - c.y) / ry;
    nx * nx + ny * ny <= 1.0
}

/// Whether `point` lies within `tolerance` of the rectangle's outline
pub fn is_near_rect_border(point: &PageCoordinate, rect: &Rect, tolerance: f32) -> bool {
    let outer = rect.inflate(tolerance);
    if !outer.contains(point) {
        return false;
    }
    let inner = rect.inflate(-tolerance);
    if inner.width <= 0.0 || inner.height <= 0.0 {
        return true;
    }
    // Strict interior: a point on the inner edge still counts as border.
    !(point.x > inner.x && point.x < inner.right() && point.y > inner.y && point.y < inner.bottom())
}

/// Whether `point` lies within `tolerance` of the ellipse inscribed in `rect`
pub fn is_near_ellipse_border(point: &PageCoordinate, rect: &Rect, tolerance: f32) -> bool {
    let rx = rect.width / 2.0;
    let ry = rect.height / 2.0;
    let c = rect.center();
    let nx = point.x - c.x;
    let ny = point.y - c.y;

    let outer_rx = rx + tolerance;
    let outer_ry = ry + tolerance;
    let outer = (nx / outer_rx).powi(2) + (ny / outer_ry).powi(2);
    if outer > 1.0 {
        return false;
    }

    let inner_rx = (rx - tolerance).max(0.0);
    let inner_ry = (ry - tolerance).max(0.0);
    if inner_rx <= 0.0 || inner_ry <= 0.0 {
        return true;
    }
    (nx / inner_rx).powi(2) + (ny / inner_ry).powi(2) >= 1.0
}

/// Scale-aware hit tolerance so the on-screen target stays a fixed size
pub fn hit_tolerance(view_scale: f32, config: &EngineConfig) -> f32 {
    let scale = if view_scale > 0.0 { view_scale } else { 1.0 };
    (config.hit_tolerance_px / scale).max(config.min_hit_tolerance)
}

/// Round `degrees` to the nearest multiple of `increment`
pub fn snap_angle(degrees: f32, increment: f32) -> f32 {
    if increment <= 0.0 {
        return degrees;
    }
    (degrees / increment).round() * increment
}

/// Normalize an angle into `[0, 360)`
pub fn normalize_degrees(degrees: f32) -> f32 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Axis-aligned bounds in the shape's unrotated local space
///
/// `None` when the shape's extent cannot be determined, such as plain text
/// without a measured width or a path with no points.
pub fn bounds_of(annotation: &Annotation) -> Option<Rect> {
    shape_bounds(annotation.shape())
}

/// Bounds of a bare shape, see [`bounds_of`]
pub fn shape_bounds(shape: &Shape) -> Option<Rect> {
    match shape {
        Shape::Path { points, .. } => Rect::from_points(points.iter()),
        Shape::Segment { start, end, .. } => Rect::from_points([start, end]),
        Shape::Boxed { rect, .. } | Shape::Callout { rect, .. } | Shape::TextMarkup { rect, .. } => {
            Some(rect.normalized())
        }
        Shape::Note { origin, size } => Some(Shape::note_rect(origin, size.as_ref()).normalized()),
        Shape::Text {
            origin,
            font_size,
            measured_width,
        } => measured_width.map(|w| Rect::new(origin.x, origin.y - font_size, w, *font_size)),
    }
}

/// Map a page point into the annotation's unrotated frame
///
/// Returns the point unchanged for unrotated shapes or shapes without bounds.
pub fn to_local(annotation: &Annotation, point: &PageCoordinate) -> PageCoordinate {
    match (annotation.effective_rotation(), bounds_of(annotation)) {
        (Some(rotation), Some(bounds)) => inverse_rotate_point(point, &bounds.center(), rotation),
        _ => *point,
    }
}

/// Whether `point` hits the annotation under the given tolerance
pub fn hits(annotation: &Annotation, point: &PageCoordinate, tolerance: f32) -> bool {
    let local = to_local(annotation, point);
    let filled = annotation.is_filled();

    match annotation.shape() {
        Shape::Path { kind, points } => {
            let closed = *kind == PathKind::MeasureArea;
            distance_to_polyline(&local, points, closed) < tolerance
        }
        Shape::Segment { start, end, .. } => distance_to_segment(&local, start, end) < tolerance,
        Shape::Boxed { kind, rect } => {
            let rect = rect.normalized();
            match kind {
                BoxKind::Rectangle => {
                    (filled && rect.contains(&local)) || is_near_rect_border(&local, &rect, tolerance)
                }
                BoxKind::Ellipse => {
                    (filled && point_in_ellipse(&local, &rect))
                        || is_near_ellipse_border(&local, &rect, tolerance)
                }
                _ => rect.contains(&local),
            }
        }
        Shape::Callout { rect, arm } => {
            rect.normalized().contains(&local)
                || local.distance_to(&arm.tip) < tolerance * 1.5
                || local.distance_to(&arm.knee) < tolerance * 1.5
        }
        Shape::TextMarkup { rect, line_rects, .. } => markup_contains(&local, rect, line_rects),
        Shape::Note { .. } | Shape::Text { .. } => {
            bounds_of(annotation).is_some_and(|b| b.contains(&local))
        }
    }
}

/// Whether a drag started at `point` should grab the annotation
///
/// Same rules as [`hits`] but with fixed tolerances: interiors always count,
/// lines use `drag_line_tolerance`, measurement shapes `drag_measure_tolerance`.
pub fn contains_point(annotation: &Annotation, point: &PageCoordinate, config: &EngineConfig) -> bool {
    let local = to_local(annotation, point);

    match annotation.shape() {
        Shape::Path { kind, points } => match kind {
            PathKind::Freehand | PathKind::Polyline => {
                bounds_of(annotation).is_some_and(|b| b.contains(&local))
            }
            PathKind::MeasureArea | PathKind::MeasurePerimeter => {
                let closed = *kind == PathKind::MeasureArea;
                distance_to_polyline(&local, points, closed) < config.drag_measure_tolerance
            }
        },
        Shape::Segment { kind, start, end } => {
            let tolerance = match kind {
                SegmentKind::Line | SegmentKind::Arrow => config.drag_line_tolerance,
                SegmentKind::MeasureDistance => config.drag_measure_tolerance,
            };
            distance_to_segment(&local, start, end) < tolerance
        }
        Shape::Boxed {
            kind: BoxKind::Ellipse,
            rect,
        } => point_in_ellipse(&local, &rect.normalized()),
        Shape::TextMarkup { rect, line_rects, .. } => markup_contains(&local, rect, line_rects),
        Shape::Boxed { .. } | Shape::Callout { .. } | Shape::Note { .. } | Shape::Text { .. } => {
            bounds_of(annotation).is_some_and(|b| b.contains(&local))
        }
    }
}

fn markup_contains(point: &PageCoordinate, rect: &Rect, line_rects: &[Rect]) -> bool {
    if line_rects.is_empty() {
        return rect.normalized().contains(point);
    }
    line_rects.iter().any(|r| r.normalized().contains(point))
}

/// Topmost annotation on `page_index` under `point`
///
/// Scans in reverse z-order so the last-drawn shape wins.
pub fn hit_test<'a>(
    store: &'a AnnotationStore,
    page_index: u16,
    point: &PageCoordinate,
    view_scale: f32,
    config: &EngineConfig,
) -> Option<&'a Annotation> {
    let tolerance = hit_tolerance(view_scale, config);
    store
        .on_page(page_index)
        .rev()
        .find(|annotation| hits(annotation, point, tolerance))
}

/// Topmost annotation on `page_index` that a drag at `point` would grab
pub fn grab_test<'a>(
    store: &'a AnnotationStore,
    page_index: u16,
    point: &PageCoordinate,
    config: &EngineConfig,
) -> Option<&'a Annotation> {
    store
        .on_page(page_index)
        .rev()
        .find(|annotation| contains_point(annotation, point, config))
}

/// Annotations on a page whose bounds intersect a marquee rectangle
pub fn annotations_in_rect<'a>(
    store: &'a AnnotationStore,
    page_index: u16,
    marquee: &Rect,
) -> Vec<&'a Annotation> {
    let marquee = marquee.normalized();
    store
        .on_page(page_index)
        .filter(|annotation| {
            bounds_of(annotation).is_some_and(|b| {
                b.x <= marquee.right() && b.right() >= marquee.x && b.y <= marquee.bottom() && b.bottom() >= marquee.y
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationStyle, CalloutArm, Color, MarkupKind, Size};
    use crate::clock::Timestamp;

    const EPS: f32 = 1e-3;

    fn pt(x: f32, y: f32) -> PageCoordinate {
        PageCoordinate::new(x, y)
    }

    fn ann(shape: Shape) -> Annotation {
        Annotation::new(0, shape, Timestamp(0))
    }

    fn rectangle(x: f32, y: f32, w: f32, h: f32) -> Annotation {
        ann(Shape::Boxed {
            kind: BoxKind::Rectangle,
            rect: Rect::new(x, y, w, h),
        })
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(&pt(60.0, 50.0), &pt(50.0, 50.0), 90.0);
        assert!((p.x - 50.0).abs() < EPS);
        assert!((p.y - 60.0).abs() < EPS);

        let back = inverse_rotate_point(&p, &pt(50.0, 50.0), 90.0);
        assert!((back.x - 60.0).abs() < EPS);
        assert!((back.y - 50.0).abs() < EPS);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = pt(0.0, 0.0);
        let b = pt(10.0, 0.0);
        assert!((distance_to_segment(&pt(5.0, 3.0), &a, &b) - 3.0).abs() < EPS);
        assert!((distance_to_segment(&pt(13.0, 4.0), &a, &b) - 5.0).abs() < EPS);
        assert!((distance_to_segment(&pt(3.0, 4.0), &a, &a) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_hit_tolerance_is_scale_aware() {
        let config = EngineConfig::default();
        assert!((hit_tolerance(1.0, &config) - 10.0).abs() < EPS);
        assert!((hit_tolerance(2.0, &config) - 5.0).abs() < EPS);
        assert!((hit_tolerance(10.0, &config) - 2.0).abs() < EPS);
        assert!((hit_tolerance(0.0, &config) - 10.0).abs() < EPS);
    }

    #[test]
    fn test_snap_and_normalize_angles() {
        assert_eq!(snap_angle(37.0, 15.0), 30.0);
        assert_eq!(snap_angle(38.0, 15.0), 45.0);
        assert_eq!(snap_angle(38.0, 0.0), 38.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(450.0), 90.0);
    }

    #[test]
    fn test_bounds_per_representation() {
        let path = ann(Shape::Path {
            kind: PathKind::Freehand,
            points: vec![pt(1.0, 5.0), pt(4.0, 2.0), pt(3.0, 9.0)],
        });
        assert_eq!(bounds_of(&path), Some(Rect::new(1.0, 2.0, 3.0, 7.0)));

        let line = ann(Shape::Segment {
            kind: SegmentKind::Arrow,
            start: pt(10.0, 10.0),
            end: pt(0.0, 20.0),
        });
        assert_eq!(bounds_of(&line), Some(Rect::new(0.0, 10.0, 10.0, 10.0)));

        let note = ann(Shape::Note {
            origin: pt(5.0, 5.0),
            size: None,
        });
        assert_eq!(bounds_of(&note), Some(Rect::new(5.0, 5.0, 24.0, 24.0)));

        let sized = ann(Shape::Note {
            origin: pt(5.0, 5.0),
            size: Some(Size::new(30.0, 40.0)),
        });
        assert_eq!(bounds_of(&sized), Some(Rect::new(5.0, 5.0, 30.0, 40.0)));
    }

    #[test]
    fn test_text_bounds_need_measurement() {
        let unmeasured = ann(Shape::Text {
            origin: pt(10.0, 50.0),
            font_size: 12.0,
            measured_width: None,
        });
        assert_eq!(bounds_of(&unmeasured), None);
        assert!(!hits(&unmeasured, &pt(10.0, 45.0), 10.0));

        let measured = ann(Shape::Text {
            origin: pt(10.0, 50.0),
            font_size: 12.0,
            measured_width: Some(80.0),
        });
        assert_eq!(bounds_of(&measured), Some(Rect::new(10.0, 38.0, 80.0, 12.0)));
        assert!(hits(&measured, &pt(50.0, 45.0), 10.0));
    }

    #[test]
    fn test_unfilled_rectangle_hits_border_only() {
        let r = rectangle(0.0, 0.0, 100.0, 100.0);
        assert!(hits(&r, &pt(0.0, 50.0), 5.0));
        assert!(hits(&r, &pt(-4.0, 50.0), 5.0));
        assert!(!hits(&r, &pt(50.0, 50.0), 5.0));
        assert!(!hits(&r, &pt(-6.0, 50.0), 5.0));
    }

    #[test]
    fn test_filled_rectangle_hits_interior() {
        let r = rectangle(0.0, 0.0, 100.0, 100.0).with_style(AnnotationStyle::filled(Color::BLUE));
        assert!(hits(&r, &pt(50.0, 50.0), 5.0));
    }

    #[test]
    fn test_ellipse_hits() {
        let e = ann(Shape::Boxed {
            kind: BoxKind::Ellipse,
            rect: Rect::new(0.0, 0.0, 100.0, 50.0),
        });
        assert!(hits(&e, &pt(100.0, 25.0), 3.0));
        assert!(!hits(&e, &pt(50.0, 25.0), 3.0));
        // corner of the bounding box is outside the ellipse band
        assert!(!hits(&e, &pt(2.0, 2.0), 3.0));

        let filled = e.with_style(AnnotationStyle::filled(Color::YELLOW));
        assert!(hits(&filled, &pt(50.0, 25.0), 3.0));
        assert!(contains_point(&filled, &pt(50.0, 25.0), &EngineConfig::default()));
    }

    #[test]
    fn test_measure_area_closing_edge() {
        let area = ann(Shape::Path {
            kind: PathKind::MeasureArea,
            points: vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)],
        });
        // on the closing edge from (100,100) back to (0,0)
        assert!(hits(&area, &pt(50.0, 51.0), 3.0));

        let perimeter = ann(Shape::Path {
            kind: PathKind::MeasurePerimeter,
            points: vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)],
        });
        assert!(!hits(&perimeter, &pt(50.0, 51.0), 3.0));
    }

    #[test]
    fn test_callout_hits_arm_points() {
        let rect = Rect::new(100.0, 100.0, 80.0, 40.0);
        let c = ann(Shape::Callout {
            rect,
            arm: CalloutArm::default_for(&rect),
        });
        assert!(hits(&c, &pt(120.0, 120.0), 10.0));
        assert!(hits(&c, &pt(52.0, 140.0), 10.0));
        assert!(!hits(&c, &pt(20.0, 140.0), 10.0));
    }

    #[test]
    fn test_text_markup_uses_line_rects() {
        let lines = vec![Rect::new(0.0, 0.0, 100.0, 10.0), Rect::new(0.0, 12.0, 40.0, 10.0)];
        let m = ann(Shape::TextMarkup {
            kind: MarkupKind::Highlight,
            rect: Rect::new(0.0, 0.0, 100.0, 22.0),
            line_rects: lines,
            quads: Vec::new(),
        });
        assert!(hits(&m, &pt(20.0, 15.0), 10.0));
        assert!(!hits(&m, &pt(80.0, 15.0), 10.0));
    }

    #[test]
    fn test_rotated_rectangle_hits_its_rotated_edge() {
        // 40x20 centered at (50,50), rotated a quarter turn
        let r = rectangle(30.0, 40.0, 40.0, 20.0).with_rotation(90.0);
        // the bottom edge midpoint (50,60) lands at (40,50)
        assert!(hits(&r, &pt(40.0, 50.0), 2.0));
        // the unrotated right edge is now empty space
        assert!(!hits(&r, &pt(70.0, 50.0), 2.0));
    }

    #[test]
    fn test_contains_point_fixed_tolerances() {
        let config = EngineConfig::default();
        let line = ann(Shape::Segment {
            kind: SegmentKind::Line,
            start: pt(0.0, 0.0),
            end: pt(100.0, 0.0),
        });
        assert!(contains_point(&line, &pt(50.0, 14.0), &config));
        assert!(!contains_point(&line, &pt(50.0, 16.0), &config));

        let distance = ann(Shape::Segment {
            kind: SegmentKind::MeasureDistance,
            start: pt(0.0, 0.0),
            end: pt(100.0, 0.0),
        });
        assert!(contains_point(&distance, &pt(50.0, 7.0), &config));
        assert!(!contains_point(&distance, &pt(50.0, 9.0), &config));

        let unfilled = rectangle(0.0, 0.0, 100.0, 100.0);
        assert!(contains_point(&unfilled, &pt(50.0, 50.0), &config));

        let freehand = ann(Shape::Path {
            kind: PathKind::Freehand,
            points: vec![pt(0.0, 0.0), pt(100.0, 100.0)],
        });
        assert!(contains_point(&freehand, &pt(90.0, 10.0), &config));
    }

    #[test]
    fn test_hit_test_prefers_topmost_on_page() {
        let config = EngineConfig::default();
        let mut store = AnnotationStore::new();
        let bottom = rectangle(0.0, 0.0, 50.0, 50.0).with_style(AnnotationStyle::filled(Color::RED));
        let top = rectangle(10.0, 10.0, 50.0, 50.0).with_style(AnnotationStyle::filled(Color::RED));
        let elsewhere = Annotation::new(
            1,
            Shape::Boxed {
                kind: BoxKind::Rectangle,
                rect: Rect::new(0.0, 0.0, 500.0, 500.0),
            },
            Timestamp(0),
        )
        .with_style(AnnotationStyle::filled(Color::RED));
        let (bottom_id, top_id) = (bottom.id(), top.id());
        store.push(bottom);
        store.push(top);
        store.push(elsewhere);

        let hit = hit_test(&store, 0, &pt(20.0, 20.0), 1.0, &config).map(Annotation::id);
        assert_eq!(hit, Some(top_id));
        let hit = hit_test(&store, 0, &pt(5.0, 5.0), 1.0, &config).map(Annotation::id);
        assert_eq!(hit, Some(bottom_id));
        assert!(hit_test(&store, 0, &pt(300.0, 300.0), 1.0, &config).is_none());
        assert_eq!(
            grab_test(&store, 0, &pt(20.0, 20.0), &config).map(Annotation::id),
            Some(top_id)
        );
    }

    #[test]
    fn test_annotations_in_rect() {
        let mut store = AnnotationStore::new();
        store.push(rectangle(0.0, 0.0, 10.0, 10.0));
        store.push(rectangle(100.0, 100.0, 10.0, 10.0));
        let found = annotations_in_rect(&store, 0, &Rect::new(-5.0, -5.0, 20.0, 20.0));
        assert_eq!(found.len(), 1);
    }
}
