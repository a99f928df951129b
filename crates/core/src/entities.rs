//! Document-level entities edited alongside annotations
//!
//! Page rotations, watermarks, and bookmarks share the annotation undo
//! stacks, so their edits are recorded as commands too.

use crate::annotation::Color;

/// Clockwise page rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum PageRotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl PageRotation {
    pub fn degrees(&self) -> u16 {
        match self {
            PageRotation::Deg0 => 0,
            PageRotation::Deg90 => 90,
            PageRotation::Deg180 => 180,
            PageRotation::Deg270 => 270,
        }
    }

    /// Rotation for a multiple of 90 degrees (negative values wrap)
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(PageRotation::Deg0),
            90 => Some(PageRotation::Deg90),
            180 => Some(PageRotation::Deg180),
            270 => Some(PageRotation::Deg270),
            _ => None,
        }
    }

    pub fn rotated_clockwise(&self) -> Self {
        match self {
            PageRotation::Deg0 => PageRotation::Deg90,
            PageRotation::Deg90 => PageRotation::Deg180,
            PageRotation::Deg180 => PageRotation::Deg270,
            PageRotation::Deg270 => PageRotation::Deg0,
        }
    }

    pub fn rotated_counter_clockwise(&self) -> Self {
        match self {
            PageRotation::Deg0 => PageRotation::Deg270,
            PageRotation::Deg90 => PageRotation::Deg0,
            PageRotation::Deg180 => PageRotation::Deg90,
            PageRotation::Deg270 => PageRotation::Deg180,
        }
    }
}

/// An entity kept in an ordered list and addressed by id
pub trait Entity: Clone {
    /// Name used in errors and undo descriptions
    const KIND: &'static str;

    fn entity_id(&self) -> uuid::Uuid;
}

/// Pages a watermark is stamped on
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum PageRange {
    #[default]
    All,
    First,
    /// Explicit zero-based page indices
    Custom(Vec<u16>),
}

impl PageRange {
    pub fn contains(&self, page_index: u16) -> bool {
        match self {
            PageRange::All => true,
            PageRange::First => page_index == 0,
            PageRange::Custom(pages) => pages.contains(&page_index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum WatermarkPosition {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Text watermark stamped across pages
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Watermark {
    pub id: uuid::Uuid,
    pub text: String,
    pub enabled: bool,
    pub page_range: PageRange,
    pub position: WatermarkPosition,
    pub opacity: f32,
    /// Degrees, counter-clockwise
    pub rotation: f32,
    pub font_size: f32,
    pub color: Color,
}

impl Watermark {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            text: text.into(),
            enabled: true,
            page_range: PageRange::All,
            position: WatermarkPosition::Center,
            opacity: 0.3,
            rotation: 45.0,
            font_size: 72.0,
            color: Color::rgb(128, 128, 128),
        }
    }

    /// Whether this watermark is drawn on the given page
    pub fn applies_to(&self, page_index: u16) -> bool {
        self.enabled && self.page_range.contains(page_index)
    }
}

impl Entity for Watermark {
    const KIND: &'static str = "watermark";

    fn entity_id(&self) -> uuid::Uuid {
        self.id
    }
}

/// Outline entry pointing at a page location
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bookmark {
    pub id: uuid::Uuid,
    pub title: String,
    pub page_index: u16,
    /// Destination scroll position on the page
    pub top: Option<f32>,
    pub left: Option<f32>,
    pub zoom: Option<f32>,
    /// Parent bookmark for nested outlines
    pub parent: Option<uuid::Uuid>,
    pub expanded: bool,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Color>,
    pub sort_order: i32,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, page_index: u16) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            title: title.into(),
            page_index,
            top: None,
            left: None,
            zoom: None,
            parent: None,
            expanded: true,
            bold: false,
            italic: false,
            color: None,
            sort_order: 0,
        }
    }

    pub fn with_parent(mut self, parent: uuid::Uuid) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Entity for Bookmark {
    const KIND: &'static str = "bookmark";

    fn entity_id(&self) -> uuid::Uuid {
        self.id
    }
}
