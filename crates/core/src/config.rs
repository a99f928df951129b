//! Engine configuration
//!
//! Tunables for handle layout, hit tolerances, history depth, edit coalescing,
//! and snapping. A configuration can be built programmatically, parsed from a
//! JSON document, or overlaid from `PDF_MARKUP_*` environment variables.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Configuration shared by the geometry, handle, history, and session layers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// On-screen handle side length in pixels
    pub handle_size: f32,
    /// Distance of the rotation handle above the top edge, in page units
    pub rotation_handle_offset: f32,
    /// On-screen hit tolerance in pixels, divided by the view scale
    pub hit_tolerance_px: f32,
    /// Lower bound for the scaled hit tolerance, in page units
    pub min_hit_tolerance: f32,
    /// Fixed drag-start tolerance for lines and arrows
    pub drag_line_tolerance: f32,
    /// Fixed drag-start tolerance for measurement shapes
    pub drag_measure_tolerance: f32,
    /// Maximum undo entries kept per document
    pub undo_limit: usize,
    /// Idle delay before a buffered property edit is committed
    pub coalesce_delay_ms: u64,
    /// Smart-guide proximity threshold in page units
    pub guide_threshold: f32,
    /// Angle increment used for constrained rotation and line endpoints
    pub angle_snap_degrees: f32,
    pub angle_snap_enabled: bool,
    pub smart_guides_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handle_size: 8.0,
            rotation_handle_offset: 25.0,
            hit_tolerance_px: 10.0,
            min_hit_tolerance: 2.0,
            drag_line_tolerance: 15.0,
            drag_measure_tolerance: 8.0,
            undo_limit: 100,
            coalesce_delay_ms: 400,
            guide_threshold: 6.0,
            angle_snap_degrees: 15.0,
            angle_snap_enabled: true,
            smart_guides_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Sets the on-screen handle size.
    pub fn with_handle_size(mut self, px: f32) -> Self {
        self.handle_size = px;
        self
    }

    /// Sets the on-screen hit tolerance.
    pub fn with_hit_tolerance(mut self, px: f32) -> Self {
        self.hit_tolerance_px = px;
        self
    }

    /// Sets the per-document undo depth.
    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit;
        self
    }

    /// Sets the coalescing delay for property edits.
    pub fn with_coalesce_delay_ms(mut self, ms: u64) -> Self {
        self.coalesce_delay_ms = ms;
        self
    }

    /// Sets the smart-guide threshold.
    pub fn with_guide_threshold(mut self, threshold: f32) -> Self {
        self.guide_threshold = threshold;
        self
    }

    /// Sets the angle snap increment and enables angle snapping.
    pub fn with_angle_snap(mut self, degrees: f32) -> Self {
        self.angle_snap_degrees = degrees;
        self.angle_snap_enabled = true;
        self
    }

    /// Disables angle snapping.
    pub fn without_angle_snap(mut self) -> Self {
        self.angle_snap_enabled = false;
        self
    }

    /// Enables or disables smart guides during moves.
    pub fn with_smart_guides(mut self, enabled: bool) -> Self {
        self.smart_guides_enabled = enabled;
        self
    }

    /// Angle increment to apply under a constrain modifier, if snapping is on.
    pub fn angle_snap(&self) -> Option<f32> {
        (self.angle_snap_enabled && self.angle_snap_degrees > 0.0).then_some(self.angle_snap_degrees)
    }

    /// Checks that every numeric field is usable.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("handle_size", self.handle_size),
            ("hit_tolerance_px", self.hit_tolerance_px),
            ("drag_line_tolerance", self.drag_line_tolerance),
            ("drag_measure_tolerance", self.drag_measure_tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue(name.to_string()));
            }
        }

        let non_negative = [
            ("rotation_handle_offset", self.rotation_handle_offset),
            ("min_hit_tolerance", self.min_hit_tolerance),
            ("guide_threshold", self.guide_threshold),
            ("angle_snap_degrees", self.angle_snap_degrees),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue(name.to_string()));
            }
        }

        if self.undo_limit == 0 {
            return Err(ConfigError::InvalidValue("undo_limit".to_string()));
        }

        Ok(())
    }

    /// Parses a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Writes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Loads configuration from environment variables over the defaults.
    ///
    /// Environment variables:
    /// - `PDF_MARKUP_HANDLE_SIZE`
    /// - `PDF_MARKUP_HIT_TOLERANCE`
    /// - `PDF_MARKUP_UNDO_LIMIT`
    /// - `PDF_MARKUP_COALESCE_DELAY_MS`
    /// - `PDF_MARKUP_GUIDE_THRESHOLD`
    /// - `PDF_MARKUP_ANGLE_SNAP_DEGREES`
    /// - `PDF_MARKUP_SMART_GUIDES` (`true`/`false`)
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable or out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = env_value("PDF_MARKUP_HANDLE_SIZE")? {
            config.handle_size = v;
        }
        if let Some(v) = env_value("PDF_MARKUP_HIT_TOLERANCE")? {
            config.hit_tolerance_px = v;
        }
        if let Some(v) = env_value("PDF_MARKUP_UNDO_LIMIT")? {
            config.undo_limit = v;
        }
        if let Some(v) = env_value("PDF_MARKUP_COALESCE_DELAY_MS")? {
            config.coalesce_delay_ms = v;
        }
        if let Some(v) = env_value("PDF_MARKUP_GUIDE_THRESHOLD")? {
            config.guide_threshold = v;
        }
        if let Some(v) = env_value("PDF_MARKUP_ANGLE_SNAP_DEGREES")? {
            config.angle_snap_degrees = v;
        }
        if let Some(v) = env_value("PDF_MARKUP_SMART_GUIDES")? {
            config.smart_guides_enabled = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn env_value<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(None),
    }
}
