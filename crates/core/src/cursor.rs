//! Directional cursors for handle drags
//!
//! Each resize role has a base direction. Adding the annotation's rotation
//! gives the on-screen direction; near an axis or diagonal the matching
//! standard cursor is used, otherwise a rotated double-arrow bitmap is
//! rasterised once per whole degree and cached.

use std::collections::HashMap;
use std::sync::Arc;

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::handles::HandleRole;

/// Side length of custom cursor bitmaps in pixels
pub const CURSOR_SIZE: u32 = 32;

/// Within this many degrees of a standard direction, use the standard cursor
const STANDARD_SNAP_DEGREES: f32 = 2.0;

/// Cursor to show while hovering or dragging a handle
#[derive(Debug, Clone, PartialEq)]
pub enum CursorStyle {
    /// Horizontal double arrow
    EwResize,
    /// Diagonal double arrow, top-left to bottom-right
    NwseResize,
    /// Vertical double arrow
    NsResize,
    /// Diagonal double arrow, top-right to bottom-left
    NeswResize,
    Crosshair,
    Move,
    Grab,
    /// Double arrow at an arbitrary angle
    Custom(Arc<CursorBitmap>),
}

/// Premultiplied RGBA cursor image
#[derive(Debug, PartialEq)]
pub struct CursorBitmap {
    /// Direction of the arrow in whole degrees, `[0, 180)`
    pub angle: u16,
    pub width: u32,
    pub height: u32,
    pub hotspot_x: u32,
    pub hotspot_y: u32,
    pub rgba: Vec<u8>,
}

/// Base direction of a resize role in degrees, `None` for non-resize roles
fn base_angle(role: HandleRole) -> Option<f32> {
    match role {
        HandleRole::Left | HandleRole::Right => Some(0.0),
        HandleRole::TopLeft | HandleRole::BottomRight => Some(45.0),
        HandleRole::Top | HandleRole::Bottom => Some(90.0),
        HandleRole::TopRight | HandleRole::BottomLeft => Some(135.0),
        _ => None,
    }
}

fn standard_style(angle: f32) -> CursorStyle {
    let bucket = ((angle / 45.0).round() as i32).rem_euclid(4);
    match bucket {
        0 => CursorStyle::EwResize,
        1 => CursorStyle::NwseResize,
        2 => CursorStyle::NsResize,
        _ => CursorStyle::NeswResize,
    }
}

/// Cache of rasterised rotated cursors keyed by whole degree
#[derive(Debug, Default)]
pub struct CursorCache {
    bitmaps: HashMap<u16, Arc<CursorBitmap>>,
}

impl CursorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached bitmaps
    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    /// Cursor for a handle role on a shape with the given rotation
    pub fn cursor_for(&mut self, role: HandleRole, rotation: Option<f32>) -> CursorStyle {
        let base = match role {
            HandleRole::Rotate => return CursorStyle::Grab,
            HandleRole::CalloutKnee => return CursorStyle::Move,
            HandleRole::LineStart | HandleRole::LineEnd | HandleRole::CalloutTip => {
                return CursorStyle::Crosshair
            }
            other => match base_angle(other) {
                Some(angle) => angle,
                None => return CursorStyle::Move,
            },
        };

        let angle = (base + rotation.unwrap_or(0.0)).rem_euclid(180.0);
        let nearest = (angle / 45.0).round() * 45.0;
        if (angle - nearest).abs() <= STANDARD_SNAP_DEGREES {
            return standard_style(nearest);
        }

        let key = (angle.round() as u16) % 180;
        if let Some(bitmap) = self.bitmaps.get(&key) {
            return CursorStyle::Custom(Arc::clone(bitmap));
        }

        match rasterize(key) {
            Some(bitmap) => {
                let bitmap = Arc::new(bitmap);
                self.bitmaps.insert(key, Arc::clone(&bitmap));
                tracing::trace!(angle = key, "rasterised rotated cursor");
                CursorStyle::Custom(bitmap)
            }
            None => {
                tracing::warn!(angle = key, "cursor rasterisation failed, using nearest standard cursor");
                standard_style(nearest)
            }
        }
    }
}

/// Draw a double-headed arrow through the bitmap center at `angle` degrees
fn rasterize(angle: u16) -> Option<CursorBitmap> {
    let mut pixmap = Pixmap::new(CURSOR_SIZE, CURSOR_SIZE)?;
    let c = CURSOR_SIZE as f32 / 2.0;
    let reach = 11.0;
    let head = 4.0;

    let mut pb = PathBuilder::new();
    pb.move_to(c - reach, c);
    pb.line_to(c + reach, c);
    pb.move_to(c - reach + head, c - head);
    pb.line_to(c - reach, c);
    pb.line_to(c - reach + head, c + head);
    pb.move_to(c + reach - head, c - head);
    pb.line_to(c + reach, c);
    pb.line_to(c + reach - head, c + head);
    let path = pb.finish()?;

    let transform = Transform::from_rotate_at(angle as f32, c, c);
    let outline = Stroke {
        width: 4.0,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let core = Stroke {
        width: 1.5,
        ..outline.clone()
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color_rgba8(255, 255, 255, 255);
    pixmap.stroke_path(&path, &paint, &outline, transform, None);
    paint.set_color_rgba8(0, 0, 0, 255);
    pixmap.stroke_path(&path, &paint, &core, transform, None);

    Some(CursorBitmap {
        angle,
        width: CURSOR_SIZE,
        height: CURSOR_SIZE,
        hotspot_x: CURSOR_SIZE / 2,
        hotspot_y: CURSOR_SIZE / 2,
        rgba: pixmap.take(),
    })
}
