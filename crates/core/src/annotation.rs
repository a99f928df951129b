//! Annotation data model
//!
//! Every markup type owns exactly one geometry representation, expressed as a
//! [`Shape`] variant. Code that needs geometry matches on the shape; there are
//! no optional geometry fields to check.
//!
//! Coordinates are page-local `f32` units with the origin at the top-left of
//! the page and y increasing downward. Rotation is stored separately, in
//! degrees about the unrotated bounding-box center, and never baked into the
//! stored coordinates.

use crate::clock::Timestamp;
use crate::error::{EngineError, EngineResult};

/// Unique identifier for an annotation
///
/// Stable across the document lifetime. Generated using UUID v4.
pub type AnnotationId = uuid::Uuid;

/// Default side length of a sticky note without an explicit size
pub const NOTE_DEFAULT_SIZE: f32 = 24.0;

/// Point in page-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct PageCoordinate {
    pub x: f32,
    pub y: f32,
}

impl PageCoordinate {
    /// Create a new page coordinate
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another coordinate
    pub fn distance_to(&self, other: &PageCoordinate) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Return this point translated by (dx, dy)
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point, or `None` for no points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a PageCoordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> PageCoordinate {
        PageCoordinate::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Rectangle with non-negative width and height covering the same area
    pub fn normalized(&self) -> Self {
        let x = self.x.min(self.x + self.width);
        let y = self.y.min(self.y + self.height);
        Self::new(x, y, self.width.abs(), self.height.abs())
    }

    /// Inclusive containment test
    pub fn contains(&self, point: &PageCoordinate) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Rectangle grown by `amount` on every side (shrunk for negative amounts)
    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    pub fn union(&self, other: &Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// The four corners in top-left, top-right, bottom-right, bottom-left order
    pub fn corners(&self) -> [PageCoordinate; 4] {
        [
            PageCoordinate::new(self.x, self.y),
            PageCoordinate::new(self.right(), self.y),
            PageCoordinate::new(self.right(), self.bottom()),
            PageCoordinate::new(self.x, self.bottom()),
        ]
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Width and height pair
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
}

/// Every annotation type the engine knows, with its stable string tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnnotationKind {
    Freehand,
    Line,
    Arrow,
    Polyline,
    Rectangle,
    Ellipse,
    Polygon,
    Cloud,
    TextBox,
    Callout,
    Note,
    Text,
    Image,
    Stamp,
    Signature,
    Redaction,
    AreaHighlight,
    MeasureDistance,
    MeasureArea,
    MeasurePerimeter,
    TextHighlight,
    TextStrikethrough,
    TextUnderline,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 23] = [
        AnnotationKind::Freehand,
        AnnotationKind::Line,
        AnnotationKind::Arrow,
        AnnotationKind::Polyline,
        AnnotationKind::Rectangle,
        AnnotationKind::Ellipse,
        AnnotationKind::Polygon,
        AnnotationKind::Cloud,
        AnnotationKind::TextBox,
        AnnotationKind::Callout,
        AnnotationKind::Note,
        AnnotationKind::Text,
        AnnotationKind::Image,
        AnnotationKind::Stamp,
        AnnotationKind::Signature,
        AnnotationKind::Redaction,
        AnnotationKind::AreaHighlight,
        AnnotationKind::MeasureDistance,
        AnnotationKind::MeasureArea,
        AnnotationKind::MeasurePerimeter,
        AnnotationKind::TextHighlight,
        AnnotationKind::TextStrikethrough,
        AnnotationKind::TextUnderline,
    ];

    /// Stable tag used by importers and clipboard payloads
    pub fn tag(&self) -> &'static str {
        match self {
            AnnotationKind::Freehand => "draw",
            AnnotationKind::Line => "line",
            AnnotationKind::Arrow => "arrow",
            AnnotationKind::Polyline => "polyline",
            AnnotationKind::Rectangle => "box",
            AnnotationKind::Ellipse => "circle",
            AnnotationKind::Polygon => "polygon",
            AnnotationKind::Cloud => "cloud",
            AnnotationKind::TextBox => "textbox",
            AnnotationKind::Callout => "callout",
            AnnotationKind::Note => "comment",
            AnnotationKind::Text => "text",
            AnnotationKind::Image => "image",
            AnnotationKind::Stamp => "stamp",
            AnnotationKind::Signature => "signature",
            AnnotationKind::Redaction => "redaction",
            AnnotationKind::AreaHighlight => "highlight",
            AnnotationKind::MeasureDistance => "measureDistance",
            AnnotationKind::MeasureArea => "measureArea",
            AnnotationKind::MeasurePerimeter => "measurePerimeter",
            AnnotationKind::TextHighlight => "textHighlight",
            AnnotationKind::TextStrikethrough => "textStrikethrough",
            AnnotationKind::TextUnderline => "textUnderline",
        }
    }

    /// Resolve a tag back to its kind
    ///
    /// An unknown tag means a data-model violation upstream (usually in
    /// deserialization) and is reported as an internal-consistency fault.
    pub fn from_tag(tag: &str) -> EngineResult<Self> {
        match Self::ALL.iter().find(|kind| kind.tag() == tag) {
            Some(kind) => Ok(*kind),
            None => {
                tracing::error!(tag, "unknown annotation type tag");
                Err(EngineError::UnknownTypeTag(tag.to_string()))
            }
        }
    }

    /// Human-readable label used in undo descriptions
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::Freehand => "Drawing",
            AnnotationKind::Line => "Line",
            AnnotationKind::Arrow => "Arrow",
            AnnotationKind::Polyline => "Polyline",
            AnnotationKind::Rectangle => "Rectangle",
            AnnotationKind::Ellipse => "Ellipse",
            AnnotationKind::Polygon => "Polygon",
            AnnotationKind::Cloud => "Cloud",
            AnnotationKind::TextBox => "Text Box",
            AnnotationKind::Callout => "Callout",
            AnnotationKind::Note => "Comment",
            AnnotationKind::Text => "Text",
            AnnotationKind::Image => "Image",
            AnnotationKind::Stamp => "Stamp",
            AnnotationKind::Signature => "Signature",
            AnnotationKind::Redaction => "Redaction",
            AnnotationKind::AreaHighlight => "Highlight",
            AnnotationKind::MeasureDistance => "Distance Measurement",
            AnnotationKind::MeasureArea => "Area Measurement",
            AnnotationKind::MeasurePerimeter => "Perimeter Measurement",
            AnnotationKind::TextHighlight => "Text Highlight",
            AnnotationKind::TextStrikethrough => "Strikethrough",
            AnnotationKind::TextUnderline => "Underline",
        }
    }

    /// Whether rotation handles and rotate gestures apply to this kind
    pub fn is_rotatable(&self) -> bool {
        matches!(
            self,
            AnnotationKind::Image
                | AnnotationKind::Note
                | AnnotationKind::Rectangle
                | AnnotationKind::Ellipse
                | AnnotationKind::AreaHighlight
                | AnnotationKind::Polygon
                | AnnotationKind::Cloud
                | AnnotationKind::TextBox
        )
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Point-list shape types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PathKind {
    Freehand,
    Polyline,
    MeasureArea,
    MeasurePerimeter,
}

/// Two-point shape types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SegmentKind {
    Line,
    Arrow,
    MeasureDistance,
}

/// Rect-based shape types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BoxKind {
    Rectangle,
    Ellipse,
    Polygon,
    Cloud,
    TextBox,
    /// Raster image with its original pixel dimensions
    Image { pixel_width: u32, pixel_height: u32 },
    Stamp,
    Signature,
    Redaction,
    AreaHighlight,
}

/// Text-markup types drawn over selected page text
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MarkupKind {
    Highlight,
    Strikethrough,
    Underline,
}

/// Leader line of a callout: tip touches the target, knee bends toward the box
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalloutArm {
    pub tip: PageCoordinate,
    pub knee: PageCoordinate,
}

impl CalloutArm {
    /// Default arm placement to the left of a callout box
    pub fn default_for(rect: &Rect) -> Self {
        Self {
            tip: PageCoordinate::new(rect.x - 60.0, rect.y + rect.height),
            knee: PageCoordinate::new(rect.x - 30.0, rect.y + rect.height / 2.0),
        }
    }
}

/// One quad-point group of a text markup
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quad {
    pub points: [PageCoordinate; 4],
}

impl Quad {
    /// Quad covering a rectangle, in PDF quad-point order
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            points: [
                PageCoordinate::new(rect.x, rect.y),
                PageCoordinate::new(rect.right(), rect.y),
                PageCoordinate::new(rect.x, rect.bottom()),
                PageCoordinate::new(rect.right(), rect.bottom()),
            ],
        }
    }
}

/// Geometry of an annotation, one variant per representation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Shape {
    /// Point list: freehand, polyline, area and perimeter measurements
    Path {
        kind: PathKind,
        points: Vec<PageCoordinate>,
    },

    /// Two points: line, arrow, distance measurement
    Segment {
        kind: SegmentKind,
        start: PageCoordinate,
        end: PageCoordinate,
    },

    /// Rectangle-based shapes
    Boxed { kind: BoxKind, rect: Rect },

    /// Text box with a leader arm
    Callout { rect: Rect, arm: CalloutArm },

    /// Highlight, strikethrough, or underline over text runs
    TextMarkup {
        kind: MarkupKind,
        /// Union of the line rects
        rect: Rect,
        line_rects: Vec<Rect>,
        quads: Vec<Quad>,
    },

    /// Sticky note anchored at a point
    Note {
        origin: PageCoordinate,
        size: Option<Size>,
    },

    /// Plain text anchored at its baseline start
    Text {
        origin: PageCoordinate,
        font_size: f32,
        /// Rendered width, supplied by the text layout collaborator
        measured_width: Option<f32>,
    },
}

impl Shape {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Shape::Path { kind, .. } => match kind {
                PathKind::Freehand => AnnotationKind::Freehand,
                PathKind::Polyline => AnnotationKind::Polyline,
                PathKind::MeasureArea => AnnotationKind::MeasureArea,
                PathKind::MeasurePerimeter => AnnotationKind::MeasurePerimeter,
            },
            Shape::Segment { kind, .. } => match kind {
                SegmentKind::Line => AnnotationKind::Line,
                SegmentKind::Arrow => AnnotationKind::Arrow,
                SegmentKind::MeasureDistance => AnnotationKind::MeasureDistance,
            },
            Shape::Boxed { kind, .. } => match kind {
                BoxKind::Rectangle => AnnotationKind::Rectangle,
                BoxKind::Ellipse => AnnotationKind::Ellipse,
                BoxKind::Polygon => AnnotationKind::Polygon,
                BoxKind::Cloud => AnnotationKind::Cloud,
                BoxKind::TextBox => AnnotationKind::TextBox,
                BoxKind::Image { .. } => AnnotationKind::Image,
                BoxKind::Stamp => AnnotationKind::Stamp,
                BoxKind::Signature => AnnotationKind::Signature,
                BoxKind::Redaction => AnnotationKind::Redaction,
                BoxKind::AreaHighlight => AnnotationKind::AreaHighlight,
            },
            Shape::Callout { .. } => AnnotationKind::Callout,
            Shape::TextMarkup { kind, .. } => match kind {
                MarkupKind::Highlight => AnnotationKind::TextHighlight,
                MarkupKind::Strikethrough => AnnotationKind::TextStrikethrough,
                MarkupKind::Underline => AnnotationKind::TextUnderline,
            },
            Shape::Note { .. } => AnnotationKind::Note,
            Shape::Text { .. } => AnnotationKind::Text,
        }
    }

    /// Rectangle occupied by a note, applying the default size
    pub fn note_rect(origin: &PageCoordinate, size: Option<&Size>) -> Rect {
        let (w, h) = size.map_or((NOTE_DEFAULT_SIZE, NOTE_DEFAULT_SIZE), |s| (s.width, s.height));
        Rect::new(origin.x, origin.y, w, h)
    }

    /// Describe the first missing or unusable geometry field, if any
    fn geometry_problem(&self) -> Option<String> {
        match self {
            Shape::Path { kind, points } => {
                if points.is_empty() {
                    return Some("empty point list".to_string());
                }
                let needed = match kind {
                    PathKind::Freehand => 1,
                    PathKind::Polyline | PathKind::MeasurePerimeter => 2,
                    PathKind::MeasureArea => 3,
                };
                if points.len() < needed {
                    return Some(format!("{:?} needs at least {} points", kind, needed));
                }
                if !points.iter().all(PageCoordinate::is_finite) {
                    return Some("non-finite point".to_string());
                }
                None
            }
            Shape::Segment { start, end, .. } => {
                (!start.is_finite() || !end.is_finite()).then(|| "non-finite endpoint".to_string())
            }
            Shape::Boxed { rect, .. } => (!rect.is_finite()).then(|| "non-finite rect".to_string()),
            Shape::Callout { rect, arm } => (!rect.is_finite()
                || !arm.tip.is_finite()
                || !arm.knee.is_finite())
            .then(|| "non-finite callout geometry".to_string()),
            Shape::TextMarkup { rect, line_rects, .. } => {
                if !rect.is_finite() || !line_rects.iter().all(Rect::is_finite) {
                    Some("non-finite markup rect".to_string())
                } else {
                    None
                }
            }
            Shape::Note { origin, .. } => (!origin.is_finite()).then(|| "non-finite origin".to_string()),
            Shape::Text {
                origin, font_size, ..
            } => {
                if !origin.is_finite() {
                    Some("non-finite origin".to_string())
                } else if !(font_size.is_finite() && *font_size > 0.0) {
                    Some("font size must be positive".to_string())
                } else {
                    None
                }
            }
        }
    }
}

/// Visual styling for annotation rendering
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationStyle {
    /// Stroke color for lines and outlines
    pub stroke_color: Color,

    /// Stroke width in page units
    pub stroke_width: f32,

    /// Fill color for closed shapes. A fill makes rectangles and ellipses
    /// hit-test across their interior instead of only along the border.
    pub fill_color: Option<Color>,

    /// Opacity (0.0 = transparent, 1.0 = opaque)
    pub opacity: f32,
}

impl AnnotationStyle {
    /// Create default style (red stroke, 2pt width, no fill)
    pub fn new() -> Self {
        Self {
            stroke_color: Color::RED,
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }

    /// Default style with a fill color
    pub fn filled(fill: Color) -> Self {
        Self {
            fill_color: Some(fill),
            ..Self::new()
        }
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self::new()
    }
}

/// Authoring metadata
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct AnnotationMetadata {
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl AnnotationMetadata {
    pub fn new(now: Timestamp) -> Self {
        Self {
            author: None,
            subject: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Update the modified timestamp
    pub fn touch(&mut self, now: Timestamp) {
        self.modified_at = now;
    }
}

/// Behavioural flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationFlags {
    /// Locked annotations ignore move, resize, and rotate
    pub locked: bool,
    pub printable: bool,
    pub read_only: bool,
    pub marked: bool,
}

impl Default for AnnotationFlags {
    fn default() -> Self {
        Self {
            locked: false,
            printable: true,
            read_only: false,
            marked: false,
        }
    }
}

/// One entry in an annotation's reply thread
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Reply {
    pub id: uuid::Uuid,
    pub author: String,
    pub text: String,
    pub created_at: Timestamp,
}

impl Reply {
    pub fn new(author: impl Into<String>, text: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            author: author.into(),
            text: text.into(),
            created_at: now,
        }
    }
}

/// A user-placed markup object on one page
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    /// Page index this annotation belongs to (0-based)
    page_index: u16,
    shape: Shape,
    style: AnnotationStyle,
    metadata: AnnotationMetadata,
    flags: AnnotationFlags,
    /// Degrees about the unrotated bounding-box center
    rotation: Option<f32>,
    replies: Vec<Reply>,
}

impl Annotation {
    /// Create a new annotation with generated ID
    pub fn new(page_index: u16, shape: Shape, now: Timestamp) -> Self {
        Self::with_id(AnnotationId::new_v4(), page_index, shape, now)
    }

    /// Create a new annotation with specific ID (for import and paste)
    pub fn with_id(id: AnnotationId, page_index: u16, shape: Shape, now: Timestamp) -> Self {
        Self {
            id,
            page_index,
            shape,
            style: AnnotationStyle::new(),
            metadata: AnnotationMetadata::new(now),
            flags: AnnotationFlags::default(),
            rotation: None,
            replies: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.metadata.author = Some(author.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.flags.locked = true;
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn page_index(&self) -> u16 {
        self.page_index
    }

    /// Reassign the owning page after pages were inserted or removed
    pub fn set_page_index(&mut self, page_index: u16) {
        self.page_index = page_index;
    }

    pub fn kind(&self) -> AnnotationKind {
        self.shape.kind()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut AnnotationStyle {
        &mut self.style
    }

    pub fn metadata(&self) -> &AnnotationMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut AnnotationMetadata {
        &mut self.metadata
    }

    pub fn flags(&self) -> &AnnotationFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut AnnotationFlags {
        &mut self.flags
    }

    pub fn is_locked(&self) -> bool {
        self.flags.locked
    }

    /// Rotation in degrees, if any
    pub fn rotation(&self) -> Option<f32> {
        self.rotation
    }

    /// Rotation that actually affects geometry (unset and zero are equivalent)
    pub fn effective_rotation(&self) -> Option<f32> {
        self.rotation.filter(|r| r.abs() > f32::EPSILON)
    }

    pub fn set_rotation(&mut self, degrees: Option<f32>) {
        self.rotation = degrees;
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    pub fn add_reply(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    pub fn is_filled(&self) -> bool {
        self.style.fill_color.is_some()
    }

    /// Stamp the modification time
    pub fn touch(&mut self, now: Timestamp) {
        self.metadata.touch(now);
    }

    /// Check that the shape carries every geometry field its type requires
    ///
    /// A failure indicates an upstream data-model violation and is reported
    /// as an internal-consistency fault.
    pub fn validate(&self) -> EngineResult<()> {
        match self.shape.geometry_problem() {
            None => Ok(()),
            Some(detail) => {
                tracing::error!(id = %self.id, kind = %self.kind(), %detail, "annotation geometry is invalid");
                Err(EngineError::MissingGeometry {
                    id: self.id,
                    detail,
                })
            }
        }
    }
}
