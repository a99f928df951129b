//! Measurement values and scale calibration
//!
//! Distance, area, and perimeter annotations store raw page geometry. A
//! [`MeasureScale`] converts page units into real-world units for display.

use std::fmt;

use crate::annotation::{Annotation, PageCoordinate, PathKind, SegmentKind, Shape};

/// How page units map onto real-world units
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ScaleType {
    /// Page units per real-world unit (e.g. 72 points per inch)
    Manual { ratio: f32 },
    /// Two page points known to be `distance` real-world units apart
    TwoPoint {
        p1: PageCoordinate,
        p2: PageCoordinate,
        distance: f32,
    },
}

impl ScaleType {
    /// Page units per real-world unit
    ///
    /// Degenerate calibrations fall back to 1:1.
    pub fn ratio(&self) -> f32 {
        let ratio = match self {
            ScaleType::Manual { ratio } => *ratio,
            ScaleType::TwoPoint { p1, p2, distance } => {
                let page_distance = p1.distance_to(p2);
                if *distance > 0.0 {
                    page_distance / distance
                } else {
                    0.0
                }
            }
        };
        if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        }
    }
}

/// Scale calibration for one page
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasureScale {
    scale_type: ScaleType,
    unit: String,
}

impl MeasureScale {
    pub fn new(scale_type: ScaleType, unit: impl Into<String>) -> Self {
        Self {
            scale_type,
            unit: unit.into(),
        }
    }

    /// Create a manual scale with a ratio
    pub fn manual(ratio: f32, unit: impl Into<String>) -> Self {
        Self::new(ScaleType::Manual { ratio }, unit)
    }

    /// Create a two-point calibration
    pub fn two_point(p1: PageCoordinate, p2: PageCoordinate, distance: f32, unit: impl Into<String>) -> Self {
        Self::new(ScaleType::TwoPoint { p1, p2, distance }, unit)
    }

    pub fn scale_type(&self) -> &ScaleType {
        &self.scale_type
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Page units per real-world unit
    pub fn ratio(&self) -> f32 {
        self.scale_type.ratio()
    }

    /// Convert a page-unit length into real-world units
    pub fn to_real_world(&self, page_distance: f32) -> f32 {
        page_distance / self.ratio()
    }

    /// Convert a page-unit area into real-world square units
    pub fn area_to_real_world(&self, page_area: f32) -> f32 {
        let r = self.ratio();
        page_area / (r * r)
    }
}

impl Default for MeasureScale {
    fn default() -> Self {
        Self::manual(1.0, "px")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MeasurementKind {
    Distance,
    Area,
    Perimeter,
}

/// A computed real-world measurement
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementValue {
    pub kind: MeasurementKind,
    pub value: f32,
    pub unit: String,
}

impl fmt::Display for MeasurementValue {
    /// `0` below 0.01, three decimals below 1, two below 100, otherwise one
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.kind {
            MeasurementKind::Area => format!("{}²", self.unit),
            _ => self.unit.clone(),
        };
        let v = self.value;
        if v.abs() < 0.01 {
            write!(f, "0 {unit}")
        } else if v.abs() < 1.0 {
            write!(f, "{v:.3} {unit}")
        } else if v.abs() < 100.0 {
            write!(f, "{v:.2} {unit}")
        } else {
            write!(f, "{v:.1} {unit}")
        }
    }
}

/// Sum of segment lengths along a point list
pub fn path_length(points: &[PageCoordinate]) -> f32 {
    points.windows(2).map(|pair| pair[0].distance_to(&pair[1])).sum()
}

/// Shoelace area of a closed polygon
pub fn polygon_area(points: &[PageCoordinate]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() / 2.0
}

/// Real-world measurement for a measurement annotation, `None` otherwise
pub fn measure(annotation: &Annotation, scale: &MeasureScale) -> Option<MeasurementValue> {
    let (kind, value) = match annotation.shape() {
        Shape::Segment {
            kind: SegmentKind::MeasureDistance,
            start,
            end,
        } => (MeasurementKind::Distance, scale.to_real_world(start.distance_to(end))),
        Shape::Path {
            kind: PathKind::MeasureArea,
            points,
        } => (MeasurementKind::Area, scale.area_to_real_world(polygon_area(points))),
        Shape::Path {
            kind: PathKind::MeasurePerimeter,
            points,
        } => (MeasurementKind::Perimeter, scale.to_real_world(path_length(points))),
        _ => return None,
    };
    Some(MeasurementValue {
        kind,
        value,
        unit: scale.unit().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;

    fn pt(x: f32, y: f32) -> PageCoordinate {
        PageCoordinate::new(x, y)
    }

    fn value(kind: MeasurementKind, value: f32) -> MeasurementValue {
        MeasurementValue {
            kind,
            value,
            unit: "ft".to_string(),
        }
    }

    #[test]
    fn test_scale_ratios() {
        assert_eq!(MeasureScale::manual(72.0, "in").ratio(), 72.0);
        let two_point = MeasureScale::two_point(pt(0.0, 0.0), pt(300.0, 400.0), 10.0, "m");
        assert!((two_point.ratio() - 50.0).abs() < 1e-4);
        assert!((two_point.to_real_world(100.0) - 2.0).abs() < 1e-4);

        let degenerate = MeasureScale::two_point(pt(5.0, 5.0), pt(5.0, 5.0), 10.0, "m");
        assert_eq!(degenerate.ratio(), 1.0);
        assert_eq!(MeasureScale::manual(0.0, "m").ratio(), 1.0);
    }

    #[test]
    fn test_polygon_area_and_length() {
        let square = [pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)];
        assert!((polygon_area(&square) - 100.0).abs() < 1e-4);
        assert!((path_length(&square) - 30.0).abs() < 1e-4);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_measure_annotations() {
        let scale = MeasureScale::manual(2.0, "ft");
        let distance = Annotation::new(
            0,
            Shape::Segment {
                kind: SegmentKind::MeasureDistance,
                start: pt(0.0, 0.0),
                end: pt(30.0, 40.0),
            },
            Timestamp(0),
        );
        let m = measure(&distance, &scale).unwrap();
        assert_eq!(m.kind, MeasurementKind::Distance);
        assert!((m.value - 25.0).abs() < 1e-4);

        let area = Annotation::new(
            0,
            Shape::Path {
                kind: PathKind::MeasureArea,
                points: vec![pt(0.0, 0.0), pt(20.0, 0.0), pt(20.0, 20.0), pt(0.0, 20.0)],
            },
            Timestamp(0),
        );
        let m = measure(&area, &scale).unwrap();
        assert!((m.value - 100.0).abs() < 1e-3);
        assert_eq!(m.to_string(), "100.0 ft²");

        let line = Annotation::new(
            0,
            Shape::Segment {
                kind: SegmentKind::Line,
                start: pt(0.0, 0.0),
                end: pt(1.0, 1.0),
            },
            Timestamp(0),
        );
        assert!(measure(&line, &scale).is_none());
    }

    #[test]
    fn test_display_precision() {
        assert_eq!(value(MeasurementKind::Distance, 0.004).to_string(), "0 ft");
        assert_eq!(value(MeasurementKind::Distance, 0.5).to_string(), "0.500 ft");
        assert_eq!(value(MeasurementKind::Perimeter, 12.346).to_string(), "12.35 ft");
        assert_eq!(value(MeasurementKind::Distance, 250.0).to_string(), "250.0 ft");
    }
}
