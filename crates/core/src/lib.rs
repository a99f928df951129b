//! PDF Markup Core Library
//!
//! Annotation geometry, transform, and undo engine for the PDF markup editor:
//! hit-testing and handles per shape, move/resize/rotate against gesture
//! snapshots, alignment and smart guides over selections, and per-document
//! reversible command history with debounced coalescing of rapid edits.

pub mod alignment;
pub mod annotation;
pub mod clock;
pub mod coalesce;
pub mod command;
pub mod config;
pub mod cursor;
pub mod document;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod handles;
pub mod history;
pub mod measurement;
pub mod selection;
pub mod session;
pub mod snapping;
pub mod store;
pub mod transform;

pub use alignment::{align, distribute, Alignment, Distribution};
pub use annotation::{
    Annotation, AnnotationFlags, AnnotationId, AnnotationKind, AnnotationMetadata, AnnotationStyle, BoxKind,
    CalloutArm, Color, MarkupKind, PageCoordinate, PathKind, Quad, Rect, Reply, SegmentKind, Shape, Size,
};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use coalesce::PendingEdit;
pub use command::{Change, Command, DeleteScope, Placed};
pub use config::EngineConfig;
pub use cursor::{CursorBitmap, CursorCache, CursorStyle};
pub use document::{Document, DocumentContent, DocumentId, DocumentManager};
pub use entities::{Bookmark, PageRange, PageRotation, Watermark, WatermarkPosition};
pub use error::{ConfigError, EngineError, EngineResult};
pub use geometry::{bounds_of, contains_point, hit_test};
pub use gesture::{Gesture, GestureKind, Modifiers};
pub use handles::{generate_handles, hit_test_handle, Handle, HandleRole};
pub use history::{History, DEFAULT_UNDO_LIMIT};
pub use measurement::{MeasureScale, MeasurementKind, MeasurementValue, ScaleType};
pub use selection::Selection;
pub use session::{EditState, Editor};
pub use snapping::{SmartGuides, SnapEngine};
pub use store::{AnnotationStore, ZOrderChange};
pub use transform::{apply_move, apply_resize, apply_rotation, ResizeOptions};
