//! Smart guides for dragging annotations
//!
//! While a selection is dragged, its tentative bounds are compared with every
//! other annotation on the page. Matching edges or centers within the
//! threshold produce guide lines for the renderer, and the first match on each
//! axis yields an offset the caller adds to its delta to land exactly on it.

use crate::annotation::{AnnotationId, Rect};
use crate::config::EngineConfig;
use crate::geometry::bounds_of;
use crate::store::AnnotationStore;

/// Guide lines and snap offsets for one tentative move
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartGuides {
    /// x positions of vertical guide lines
    pub vertical: Vec<f32>,
    /// y positions of horizontal guide lines
    pub horizontal: Vec<f32>,
    /// Offset to add to dx so the first matched x reference lines up exactly
    pub snap_x: Option<f32>,
    /// Offset to add to dy so the first matched y reference lines up exactly
    pub snap_y: Option<f32>,
}

impl SmartGuides {
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }

    /// Delta clamped onto the snap positions
    pub fn snapped_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx + self.snap_x.unwrap_or(0.0), dy + self.snap_y.unwrap_or(0.0))
    }
}

/// Reference values along one axis: leading edge, trailing edge, center
#[derive(Debug, Clone, Copy)]
struct AxisSpan {
    start: f32,
    end: f32,
    center: f32,
}

impl AxisSpan {
    fn horizontal(rect: &Rect) -> Self {
        Self {
            start: rect.x,
            end: rect.right(),
            center: rect.x + rect.width / 2.0,
        }
    }

    fn vertical(rect: &Rect) -> Self {
        Self {
            start: rect.y,
            end: rect.bottom(),
            center: rect.y + rect.height / 2.0,
        }
    }

    /// The five (moving, target) pairs compared on each axis, in priority order
    fn pairs(&self, target: &AxisSpan) -> [(f32, f32); 5] {
        [
            (self.start, target.start),
            (self.start, target.end),
            (self.end, target.start),
            (self.end, target.end),
            (self.center, target.center),
        ]
    }
}

/// Detects guide lines against sibling annotations
#[derive(Debug, Clone)]
pub struct SnapEngine {
    enabled: bool,
    /// Proximity threshold in page units (strictly less than)
    threshold: f32,
}

impl SnapEngine {
    /// Create a snap engine with the default 6-unit threshold
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            enabled: config.smart_guides_enabled,
            threshold: config.guide_threshold,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Guides for `moving` translated by (dx, dy) on `page_index`
    ///
    /// Annotations listed in `exclude` (normally the selection being dragged)
    /// and annotations without bounds are ignored.
    pub fn find_guides(
        &self,
        moving: &Rect,
        dx: f32,
        dy: f32,
        store: &AnnotationStore,
        page_index: u16,
        exclude: &[AnnotationId],
    ) -> SmartGuides {
        let mut guides = SmartGuides::default();
        if !self.enabled {
            return guides;
        }

        let mut tentative = *moving;
        tentative.translate(dx, dy);
        let moving_x = AxisSpan::horizontal(&tentative);
        let moving_y = AxisSpan::vertical(&tentative);

        let siblings = store
            .on_page(page_index)
            .filter(|a| !exclude.contains(&a.id()))
            .filter_map(bounds_of);

        for target in siblings {
            for (from, to) in moving_x.pairs(&AxisSpan::horizontal(&target)) {
                if (from - to).abs() < self.threshold {
                    push_unique(&mut guides.vertical, to);
                    guides.snap_x.get_or_insert(to - from);
                }
            }
            for (from, to) in moving_y.pairs(&AxisSpan::vertical(&target)) {
                if (from - to).abs() < self.threshold {
                    push_unique(&mut guides.horizontal, to);
                    guides.snap_y.get_or_insert(to - from);
                }
            }
        }

        if !guides.is_empty() {
            tracing::trace!(
                vertical = guides.vertical.len(),
                horizontal = guides.horizontal.len(),
                "smart guides found"
            );
        }
        guides
    }
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(lines: &mut Vec<f32>, position: f32) {
    if !lines.iter().any(|p| (p - position).abs() < f32::EPSILON) {
        lines.push(position);
    }
}
