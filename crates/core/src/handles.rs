//! Control handles for selected annotations
//!
//! Handles are laid out per shape representation and sized so they stay a
//! constant size on screen. When an annotation is rotated, every handle
//! center is rotated with it about the bounding-box center.

use crate::annotation::{Annotation, PageCoordinate, Rect, Shape};
use crate::config::EngineConfig;
use crate::geometry::{bounds_of, rotate_point};

/// Role of a control handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HandleRole {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    /// Rotation handle above the top edge
    Rotate,
    LineStart,
    LineEnd,
    /// Tip of a callout's leader arm
    CalloutTip,
    /// Bend point of a callout's leader arm
    CalloutKnee,
}

impl HandleRole {
    pub const CORNERS: [HandleRole; 4] = [
        HandleRole::TopLeft,
        HandleRole::TopRight,
        HandleRole::BottomLeft,
        HandleRole::BottomRight,
    ];

    pub const EDGES: [HandleRole; 4] = [
        HandleRole::Top,
        HandleRole::Bottom,
        HandleRole::Left,
        HandleRole::Right,
    ];

    pub fn is_corner(&self) -> bool {
        Self::CORNERS.contains(self)
    }

    pub fn is_edge(&self) -> bool {
        Self::EDGES.contains(self)
    }

    /// Whether dragging this handle moves the left edge
    pub fn moves_left(&self) -> bool {
        matches!(self, HandleRole::TopLeft | HandleRole::BottomLeft | HandleRole::Left)
    }

    /// Whether dragging this handle moves the top edge
    pub fn moves_top(&self) -> bool {
        matches!(self, HandleRole::TopLeft | HandleRole::TopRight | HandleRole::Top)
    }

    /// Whether dragging this handle moves the right edge
    pub fn moves_right(&self) -> bool {
        matches!(self, HandleRole::TopRight | HandleRole::BottomRight | HandleRole::Right)
    }

    /// Whether dragging this handle moves the bottom edge
    pub fn moves_bottom(&self) -> bool {
        matches!(self, HandleRole::BottomLeft | HandleRole::BottomRight | HandleRole::Bottom)
    }
}

/// A control point with a square hit area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub role: HandleRole,
    pub center: PageCoordinate,
    /// Side length in page units
    pub size: f32,
}

impl Handle {
    pub fn new(role: HandleRole, center: PageCoordinate, size: f32) -> Self {
        Self { role, center, size }
    }

    /// Check if a point falls inside this handle's square
    pub fn contains(&self, point: &PageCoordinate) -> bool {
        let half = self.size / 2.0;
        (point.x - self.center.x).abs() <= half && (point.y - self.center.y).abs() <= half
    }
}

/// Handle side length in page units for the current zoom
pub fn handle_size(view_scale: f32, config: &EngineConfig) -> f32 {
    let scale = if view_scale > 0.0 { view_scale } else { 1.0 };
    config.handle_size / scale
}

/// Ordered handles for an annotation
///
/// - rect-like shapes: 4 corners, 4 edge midpoints, then a rotation handle
///   if the type can rotate
/// - lines, arrows and distance measurements: start and end
/// - callouts: 4 corners, arm tip, arm knee
/// - paths, text markups and measured text: 4 corners only
///
/// Shapes without bounds get no handles.
pub fn generate_handles(annotation: &Annotation, view_scale: f32, config: &EngineConfig) -> Vec<Handle> {
    let size = handle_size(view_scale, config);
    let handle = |role, center| Handle::new(role, center, size);

    let mut handles = match annotation.shape() {
        Shape::Segment { start, end, .. } => vec![
            handle(HandleRole::LineStart, *start),
            handle(HandleRole::LineEnd, *end),
        ],
        Shape::Callout { rect, arm } => {
            let mut handles = corner_handles(&rect.normalized(), size);
            handles.push(handle(HandleRole::CalloutTip, arm.tip));
            handles.push(handle(HandleRole::CalloutKnee, arm.knee));
            handles
        }
        Shape::Boxed { .. } | Shape::Note { .. } => {
            let Some(bounds) = bounds_of(annotation) else {
                return Vec::new();
            };
            let mut handles = corner_handles(&bounds, size);
            handles.extend(edge_handles(&bounds, size));
            if annotation.kind().is_rotatable() {
                let top_center = PageCoordinate::new(
                    bounds.x + bounds.width / 2.0,
                    bounds.y - config.rotation_handle_offset,
                );
                handles.push(handle(HandleRole::Rotate, top_center));
            }
            handles
        }
        Shape::Path { .. } | Shape::TextMarkup { .. } | Shape::Text { .. } => match bounds_of(annotation) {
            Some(bounds) => corner_handles(&bounds, size),
            None => Vec::new(),
        },
    };

    if let (Some(rotation), Some(bounds)) = (annotation.effective_rotation(), bounds_of(annotation)) {
        let center = bounds.center();
        for h in &mut handles {
            h.center = rotate_point(&h.center, &center, rotation);
        }
    }

    handles
}

fn corner_handles(bounds: &Rect, size: f32) -> Vec<Handle> {
    vec![
        Handle::new(HandleRole::TopLeft, PageCoordinate::new(bounds.x, bounds.y), size),
        Handle::new(HandleRole::TopRight, PageCoordinate::new(bounds.right(), bounds.y), size),
        Handle::new(HandleRole::BottomLeft, PageCoordinate::new(bounds.x, bounds.bottom()), size),
        Handle::new(
            HandleRole::BottomRight,
            PageCoordinate::new(bounds.right(), bounds.bottom()),
            size,
        ),
    ]
}

fn edge_handles(bounds: &Rect, size: f32) -> [Handle; 4] {
    let c = bounds.center();
    [
        Handle::new(HandleRole::Top, PageCoordinate::new(c.x, bounds.y), size),
        Handle::new(HandleRole::Bottom, PageCoordinate::new(c.x, bounds.bottom()), size),
        Handle::new(HandleRole::Left, PageCoordinate::new(bounds.x, c.y), size),
        Handle::new(HandleRole::Right, PageCoordinate::new(bounds.right(), c.y), size),
    ]
}

/// First handle, in generation order, whose square contains `point`
///
/// Overlapping handles on tiny or sharply rotated shapes resolve to whichever
/// was generated first.
pub fn hit_test_handle(
    annotation: &Annotation,
    point: &PageCoordinate,
    view_scale: f32,
    config: &EngineConfig,
) -> Option<HandleRole> {
    generate_handles(annotation, view_scale, config)
        .into_iter()
        .find(|h| h.contains(point))
        .map(|h| h.role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{BoxKind, CalloutArm, PathKind, SegmentKind};
    use crate::clock::Timestamp;

    const EPS: f32 = 1e-3;

    fn pt(x: f32, y: f32) -> PageCoordinate {
        PageCoordinate::new(x, y)
    }

    fn boxed(kind: BoxKind, rect: Rect) -> Annotation {
        Annotation::new(0, Shape::Boxed { kind, rect }, Timestamp(0))
    }

    fn roles(handles: &[Handle]) -> Vec<HandleRole> {
        handles.iter().map(|h| h.role).collect()
    }

    #[test]
    fn test_rect_handles_in_order() {
        let config = EngineConfig::default();
        let a = boxed(BoxKind::Rectangle, Rect::new(10.0, 20.0, 100.0, 50.0));
        let handles = generate_handles(&a, 1.0, &config);

        assert_eq!(
            roles(&handles),
            vec![
                HandleRole::TopLeft,
                HandleRole::TopRight,
                HandleRole::BottomLeft,
                HandleRole::BottomRight,
                HandleRole::Top,
                HandleRole::Bottom,
                HandleRole::Left,
                HandleRole::Right,
                HandleRole::Rotate,
            ]
        );
        assert_eq!(handles[3].center, pt(110.0, 70.0));
        assert_eq!(handles[8].center, pt(60.0, -5.0));
        assert!(handles.iter().all(|h| (h.size - 8.0).abs() < EPS));
    }

    #[test]
    fn test_non_rotatable_box_has_no_rotate_handle() {
        let config = EngineConfig::default();
        let stamp = boxed(BoxKind::Stamp, Rect::new(0.0, 0.0, 50.0, 50.0));
        let handles = generate_handles(&stamp, 1.0, &config);
        assert_eq!(handles.len(), 8);
        assert!(!roles(&handles).contains(&HandleRole::Rotate));
    }

    #[test]
    fn test_handle_size_is_constant_on_screen() {
        let config = EngineConfig::default();
        let a = boxed(BoxKind::Rectangle, Rect::new(0.0, 0.0, 100.0, 100.0));
        let handles = generate_handles(&a, 2.0, &config);
        assert!((handles[0].size - 4.0).abs() < EPS);
    }

    #[test]
    fn test_line_and_callout_handles() {
        let config = EngineConfig::default();
        let line = Annotation::new(
            0,
            Shape::Segment {
                kind: SegmentKind::Line,
                start: pt(0.0, 0.0),
                end: pt(50.0, 50.0),
            },
            Timestamp(0),
        );
        assert_eq!(
            roles(&generate_handles(&line, 1.0, &config)),
            vec![HandleRole::LineStart, HandleRole::LineEnd]
        );

        let rect = Rect::new(100.0, 100.0, 80.0, 40.0);
        let callout = Annotation::new(
            0,
            Shape::Callout {
                rect,
                arm: CalloutArm::default_for(&rect),
            },
            Timestamp(0),
        );
        let handles = generate_handles(&callout, 1.0, &config);
        assert_eq!(handles.len(), 6);
        assert_eq!(handles[4].role, HandleRole::CalloutTip);
        assert_eq!(handles[4].center, pt(40.0, 140.0));
        assert_eq!(handles[5].role, HandleRole::CalloutKnee);
    }

    #[test]
    fn test_path_gets_corners_only() {
        let config = EngineConfig::default();
        let path = Annotation::new(
            0,
            Shape::Path {
                kind: PathKind::Polyline,
                points: vec![pt(0.0, 0.0), pt(10.0, 30.0)],
            },
            Timestamp(0),
        );
        let handles = generate_handles(&path, 1.0, &config);
        assert_eq!(roles(&handles), HandleRole::CORNERS.to_vec());
    }

    #[test]
    fn test_rotated_handles_follow_rotation() {
        let config = EngineConfig::default();
        let a = boxed(BoxKind::Rectangle, Rect::new(30.0, 40.0, 40.0, 20.0)).with_rotation(90.0);
        let handles = generate_handles(&a, 1.0, &config);

        let bottom = handles.iter().find(|h| h.role == HandleRole::Bottom).unwrap();
        assert!((bottom.center.x - 40.0).abs() < EPS);
        assert!((bottom.center.y - 50.0).abs() < EPS);

        let rotate = handles.iter().find(|h| h.role == HandleRole::Rotate).unwrap();
        assert!((rotate.center.x - 85.0).abs() < EPS);
        assert!((rotate.center.y - 50.0).abs() < EPS);

        // the pre-rotation bottom-edge point no longer grabs any handle
        assert_eq!(hit_test_handle(&a, &pt(50.0, 60.0), 1.0, &config), None);
        assert_eq!(
            hit_test_handle(&a, &pt(41.0, 51.0), 1.0, &config),
            Some(HandleRole::Bottom)
        );
    }

    #[test]
    fn test_hit_test_handle_first_in_order_wins() {
        let config = EngineConfig::default();
        // 4x4 box: every handle overlaps the top-left one
        let tiny = boxed(BoxKind::Rectangle, Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(
            hit_test_handle(&tiny, &pt(2.0, 2.0), 1.0, &config),
            Some(HandleRole::TopLeft)
        );
    }

    #[test]
    fn test_role_edge_predicates() {
        assert!(HandleRole::TopLeft.moves_left());
        assert!(HandleRole::TopLeft.moves_top());
        assert!(!HandleRole::TopLeft.moves_right());
        assert!(HandleRole::Bottom.moves_bottom());
        assert!(HandleRole::Right.is_edge());
        assert!(HandleRole::BottomRight.is_corner());
        assert!(!HandleRole::Rotate.is_corner());
    }
}
